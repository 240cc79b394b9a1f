//! JSON output format for bias comparisons (`--format json`)

use crate::comparison::{ComparisonResult, SampleRow};
use crate::records::SourceLabel;
use crate::stats::Statistics;
use serde::Serialize;

/// Summary of one source
#[derive(Debug, Clone, Serialize)]
pub struct JsonSource {
    pub label: SourceLabel,
    pub samples: usize,
    /// Absent when the source has no samples
    #[serde(skip_serializing_if = "Option::is_none")]
    pub statistics: Option<Statistics>,
}

/// Complete JSON report
#[derive(Debug, Clone, Serialize)]
pub struct JsonReport {
    pub t_start: f64,
    pub t_end: f64,
    pub duration: f64,
    pub has_replay: bool,
    pub original: JsonSource,
    pub replayed: JsonSource,
    /// Original drift minus replayed drift
    #[serde(skip_serializing_if = "Option::is_none")]
    pub drift_improvement: Option<f64>,
    pub checkpoints: Vec<SampleRow>,
}

impl JsonReport {
    pub fn from_comparison(result: &ComparisonResult) -> Self {
        Self {
            t_start: result.time_range.0,
            t_end: result.time_range.1,
            duration: result.duration(),
            has_replay: result.has_replay,
            original: JsonSource {
                label: result.original.label(),
                samples: result.original.len(),
                statistics: Some(result.original_stats),
            },
            replayed: JsonSource {
                label: result.replayed.label(),
                samples: result.replayed.len(),
                statistics: result.replayed_stats,
            },
            drift_improvement: result.drift_improvement(),
            checkpoints: result.rows.clone(),
        }
    }

    /// Serialize to pretty-printed JSON
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
