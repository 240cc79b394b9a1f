//! Original vs. replayed bias comparison
//!
//! Builds the per-source statistics and the five-checkpoint phase table that
//! the report, CSV export and plot are all derived from.

use crate::config::AnalysisConfig;
use crate::error::AnalysisError;
use crate::partition::{partition, SourceSeries};
use crate::records::BiasSample;
use crate::sampler::sample_at;
use crate::stats::Statistics;
use serde::Serialize;
use std::fmt;
use tracing::{debug, info};

/// Fixed checkpoint positions within the original series' time span
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Phase {
    #[serde(rename = "Start")]
    Start,
    #[serde(rename = "25%")]
    Quarter,
    #[serde(rename = "50%")]
    Half,
    #[serde(rename = "75%")]
    ThreeQuarters,
    #[serde(rename = "End")]
    End,
}

impl Phase {
    pub const ALL: [Phase; 5] = [
        Phase::Start,
        Phase::Quarter,
        Phase::Half,
        Phase::ThreeQuarters,
        Phase::End,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Phase::Start => "Start",
            Phase::Quarter => "25%",
            Phase::Half => "50%",
            Phase::ThreeQuarters => "75%",
            Phase::End => "End",
        }
    }

    /// Checkpoint time for a run spanning `[t_start, t_end]`
    ///
    /// Start and End sit one second inside the span. On short runs the
    /// checkpoints may collapse or invert; they are never reordered.
    pub fn time(&self, t_start: f64, t_end: f64) -> f64 {
        let duration = t_end - t_start;
        match self {
            Phase::Start => t_start + 1.0,
            Phase::Quarter => t_start + duration * 0.25,
            Phase::Half => t_start + duration * 0.50,
            Phase::ThreeQuarters => t_start + duration * 0.75,
            Phase::End => t_end - 1.0,
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.label())
    }
}

/// One row of the phase table
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SampleRow {
    /// Checkpoint time (seconds)
    pub time: f64,
    pub phase: Phase,
    pub original: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub replayed: Option<f64>,
    /// `replayed - original`, only when both are present
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delta: Option<f64>,
}

/// Everything downstream presentation and export consume
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonResult {
    pub original: SourceSeries,
    pub replayed: SourceSeries,
    pub original_stats: Statistics,
    pub replayed_stats: Option<Statistics>,
    /// `(t_start, t_end)` of the original series
    pub time_range: (f64, f64),
    pub rows: Vec<SampleRow>,
    pub has_replay: bool,
}

impl ComparisonResult {
    pub fn duration(&self) -> f64 {
        self.time_range.1 - self.time_range.0
    }

    /// Drift removed by the replay: original range minus replayed range
    pub fn drift_improvement(&self) -> Option<f64> {
        self.replayed_stats
            .map(|replayed| self.original_stats.range - replayed.range)
    }
}

/// Compare original and replayed bias series
///
/// Fails with [`AnalysisError::NoOriginalSamples`] when the original source
/// has no data; a missing replay degrades to a single-source result.
pub fn compare(
    samples: &[BiasSample],
    config: &AnalysisConfig,
) -> Result<ComparisonResult, AnalysisError> {
    config.validate()?;

    let original = partition(samples, config.original_label);
    let replayed = partition(samples, config.replayed_label);
    let has_replay = !replayed.is_empty();

    let (t_start, t_end) = original
        .time_range()
        .ok_or(AnalysisError::NoOriginalSamples {
            label: config.original_label,
        })?;

    let original_stats =
        Statistics::compute(&original.values()).ok_or(AnalysisError::NoOriginalSamples {
            label: config.original_label,
        })?;
    let replayed_stats = Statistics::compute(&replayed.values());

    info!(
        original = original.len(),
        replayed = replayed.len(),
        t_start,
        t_end,
        "comparing bias series"
    );

    let mut rows = Vec::with_capacity(Phase::ALL.len());
    for phase in Phase::ALL {
        let time = phase.time(t_start, t_end);

        let Some(original_value) = sample_at(&original, time, config.tolerance_s, config.strategy)
        else {
            debug!(%phase, time, "no original sample near checkpoint");
            continue;
        };

        let replayed_value = if has_replay {
            sample_at(&replayed, time, config.tolerance_s, config.strategy)
        } else {
            None
        };

        rows.push(SampleRow {
            time,
            phase,
            original: original_value,
            replayed: replayed_value,
            delta: replayed_value.map(|r| r - original_value),
        });
    }

    Ok(ComparisonResult {
        original,
        replayed,
        original_stats,
        replayed_stats,
        time_range: (t_start, t_end),
        rows,
        has_replay,
    })
}
