//! CLI argument parsing for ekf-bias

use crate::sampler::SamplingStrategy;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Report format written to stdout
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text report (default)
    Text,
    /// JSON report for machine parsing
    Json,
}

/// How the log file is decoded
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum InputFormat {
    /// Pick by file extension (.jsonl/.json are JSON lines, anything else DataFlash)
    Auto,
    /// ArduPilot DataFlash binary log (.bin)
    Dataflash,
    /// One JSON record per line
    Jsonl,
}

impl InputFormat {
    /// Resolve `Auto` against the input path
    pub fn resolve(self, path: &std::path::Path) -> InputFormat {
        match self {
            InputFormat::Auto => match path.extension().and_then(|e| e.to_str()) {
                Some(ext) if ext.eq_ignore_ascii_case("jsonl") || ext.eq_ignore_ascii_case("json") => {
                    InputFormat::Jsonl
                }
                _ => InputFormat::Dataflash,
            },
            other => other,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "ekf-bias")]
#[command(version)]
#[command(about = "EKF3 Z-axis bias analysis tool", long_about = None)]
#[command(after_help = "Examples:
  ekf-bias flight.bin                        # Basic analysis
  ekf-bias replay_output.bin --plot          # With plot
  ekf-bias replay_output.bin --csv out.csv   # Export to CSV

Notes:
  - For replay comparison, use the output log from the Replay tool
  - Original data is core C=0, replayed data is core C=100
  - Use --plot to visualize the bias over time")]
pub struct Cli {
    /// Log file (.bin DataFlash log, or .jsonl record dump)
    #[arg(value_name = "LOGFILE")]
    pub logfile: PathBuf,

    /// Write a plot next to the log file (<stem>_zbias.svg)
    #[arg(long)]
    pub plot: bool,

    /// Save plot to this file
    #[arg(long = "plot-file", value_name = "PATH")]
    pub plot_file: Option<PathBuf>,

    /// Export time-aligned bias data to a CSV file
    #[arg(long, value_name = "PATH")]
    pub csv: Option<PathBuf>,

    /// Suppress the report
    #[arg(short, long)]
    pub quiet: bool,

    /// Report format
    #[arg(long = "format", value_enum, default_value = "text")]
    pub format: OutputFormat,

    /// Log decoding
    #[arg(long = "input-format", value_enum, default_value = "auto")]
    pub input_format: InputFormat,

    /// Analysis configuration file (TOML)
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Core label of the original data (default: 0)
    #[arg(long = "original-label", value_name = "CORE", allow_negative_numbers = true)]
    pub original_label: Option<i64>,

    /// Core label of the replayed data (default: 100)
    #[arg(long = "replayed-label", value_name = "CORE", allow_negative_numbers = true)]
    pub replayed_label: Option<i64>,

    /// Checkpoint lookup window in seconds (default: 1.0)
    #[arg(long, value_name = "SECONDS")]
    pub tolerance: Option<f64>,

    /// Checkpoint sample selection: first or nearest (default: first)
    #[arg(long, value_name = "STRATEGY")]
    pub strategy: Option<SamplingStrategy>,

    /// List the source labels present in the log with sample counts
    #[arg(long = "list-sources")]
    pub list_sources: bool,

    /// Enable debug tracing output on stderr
    #[arg(long)]
    pub debug: bool,
}

impl Cli {
    /// Whether any plot output was requested
    pub fn wants_plot(&self) -> bool {
        self.plot || self.plot_file.is_some()
    }

    /// Destination of the plot, if requested
    pub fn plot_path(&self) -> Option<PathBuf> {
        if let Some(ref path) = self.plot_file {
            return Some(path.clone());
        }
        if !self.plot {
            return None;
        }
        let stem = self
            .logfile
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "ekf".to_string());
        Some(self.logfile.with_file_name(format!("{}_zbias.svg", stem)))
    }
}
