use anyhow::{Context, Result};
use clap::Parser;
use ekf_bias::cli::{Cli, InputFormat, OutputFormat};
use ekf_bias::comparison::{self, ComparisonResult};
use ekf_bias::config::AnalysisConfig;
use ekf_bias::csv_output::CsvOutput;
use ekf_bias::dataflash::DataFlashLog;
use ekf_bias::export::ExportTable;
use ekf_bias::extract::{ExtractedData, Extractor};
use ekf_bias::json_output::JsonReport;
use ekf_bias::jsonl::JsonlReader;
use ekf_bias::partition::partition_all;
use ekf_bias::records::SourceLabel;
use ekf_bias::report::TextReport;
use std::path::Path;
use std::process::ExitCode;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

/// Plot rendering is compiled in only with the `plot` feature
const PLOT_AVAILABLE: bool = cfg!(feature = "plot");

/// Initialize tracing subscriber for debug output
fn init_tracing(debug: bool) {
    if debug {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::from_default_env().add_directive(tracing::Level::TRACE.into()),
            )
            .with_writer(std::io::stderr)
            .init();
    }
}

/// Build the analysis configuration: file, then command-line overrides
fn load_config(args: &Cli) -> Result<AnalysisConfig> {
    let mut config = match args.config {
        Some(ref path) => AnalysisConfig::from_file(path)?,
        None => AnalysisConfig::default(),
    };

    if let Some(label) = args.original_label {
        config.original_label = SourceLabel(label);
    }
    if let Some(label) = args.replayed_label {
        config.replayed_label = SourceLabel(label);
    }
    if let Some(tolerance) = args.tolerance {
        config.tolerance_s = tolerance;
    }
    if let Some(strategy) = args.strategy {
        config.strategy = strategy;
    }

    config.validate()?;
    debug!(?config, "analysis configuration");
    Ok(config)
}

/// Decode the log and extract the analysis sequences in one pass
fn extract_log(path: &Path, format: InputFormat) -> Result<ExtractedData> {
    let mut extractor = Extractor::new();

    match format.resolve(path) {
        InputFormat::Jsonl => {
            let reader = JsonlReader::open(path)
                .with_context(|| format!("Failed to open {}", path.display()))?;
            for record in reader {
                extractor.push(record?);
            }
        }
        InputFormat::Dataflash | InputFormat::Auto => {
            let log = DataFlashLog::open(path)
                .with_context(|| format!("Failed to open {}", path.display()))?;
            let mut parser = log.parser();
            for message in parser.by_ref() {
                extractor.push(message.to_record()?);
            }

            let stats = parser.stats();
            debug!(
                messages = stats.messages,
                skipped_bytes = stats.skipped_bytes,
                rejected_formats = stats.rejected_formats,
                "DataFlash log decoded"
            );
            if stats.truncated {
                warn!("Log ends partway through a message; the last message was dropped");
            }
        }
    }

    Ok(extractor.finish()?)
}

/// Print the source labels present in the log
fn print_sources(data: &ExtractedData) {
    println!("Sources in log:");
    for (label, series) in partition_all(&data.bias) {
        match series.time_range() {
            Some((start, end)) => println!(
                "  {:<8} {:>8} samples  {:.1}s to {:.1}s",
                label.to_string(),
                series.len(),
                start,
                end
            ),
            None => println!("  {:<8} {:>8} samples", label.to_string(), series.len()),
        }
    }
}

#[cfg(feature = "plot")]
fn write_plot(result: &ComparisonResult, path: &Path) -> Result<()> {
    ekf_bias::plot::render_svg(result, path)
        .with_context(|| format!("Failed to write plot to {}", path.display()))
}

#[cfg(not(feature = "plot"))]
fn write_plot(_result: &ComparisonResult, _path: &Path) -> Result<()> {
    anyhow::bail!("Plotting is not available in this build (enable the `plot` feature)")
}

fn run(args: Cli) -> Result<()> {
    if !args.logfile.exists() {
        anyhow::bail!("File not found: {}", args.logfile.display());
    }

    if args.wants_plot() && !PLOT_AVAILABLE {
        anyhow::bail!("Plotting is not available in this build (enable the `plot` feature)");
    }

    let config = load_config(&args)?;

    eprintln!("Loading: {}", args.logfile.display());
    let data = extract_log(&args.logfile, args.input_format)?;

    if args.list_sources {
        print_sources(&data);
        return Ok(());
    }

    let result = comparison::compare(&data.bias, &config)?;

    if !args.quiet {
        match args.format {
            OutputFormat::Text => print!("{}", TextReport(&result)),
            OutputFormat::Json => println!("{}", JsonReport::from_comparison(&result).to_json()?),
        }
    }

    if let Some(ref csv_path) = args.csv {
        let table = ExportTable::from_comparison(&result);
        CsvOutput::new(&table).write_to(csv_path)?;
        eprintln!("CSV exported to: {}", csv_path.display());
    }

    if let Some(plot_path) = args.plot_path() {
        write_plot(&result, &plot_path)?;
        eprintln!("Plot saved to: {}", plot_path.display());
    }

    Ok(())
}

fn main() -> ExitCode {
    let args = Cli::parse();

    // Initialize tracing if --debug flag is set
    init_tracing(args.debug);

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
