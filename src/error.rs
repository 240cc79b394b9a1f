//! Analysis error taxonomy
//!
//! Missing-at-time and absent statistics are not errors; they are `Option`s
//! on the sampler and statistics APIs. Only conditions that make the whole
//! comparison impossible live here.

use crate::records::SourceLabel;
use thiserror::Error;

/// Errors that stop the bias comparison
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalysisError {
    #[error("No XKF2 messages found in log")]
    NoBiasSamples,

    #[error("No bias samples for original source {label}")]
    NoOriginalSamples { label: SourceLabel },

    #[error("Invalid analysis configuration: {0}")]
    InvalidConfig(String),
}
