//! Analysis configuration
//!
//! Loaded from an optional TOML file, then overridden by command-line flags.
//!
//! # Example ekf-bias.toml
//!
//! ```toml
//! original_label = 0
//! replayed_label = 100
//! tolerance_s = 1.0
//! strategy = "first"
//! ```

use crate::error::AnalysisError;
use crate::records::SourceLabel;
use crate::sampler::{SamplingStrategy, DEFAULT_TOLERANCE_S};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Parameters of one bias comparison
///
/// # Example
/// ```
/// use ekf_bias::config::AnalysisConfig;
///
/// let config = AnalysisConfig::default();
/// assert_eq!(config.tolerance_s, 1.0);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Core label of the data as flown
    pub original_label: SourceLabel,

    /// Core label of the replayed data
    pub replayed_label: SourceLabel,

    /// Checkpoint lookup window in seconds (strict upper bound on |dt|)
    pub tolerance_s: f64,

    /// Which sample wins when several fall inside the window
    pub strategy: SamplingStrategy,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            original_label: SourceLabel::ORIGINAL,
            replayed_label: SourceLabel::REPLAYED,
            tolerance_s: DEFAULT_TOLERANCE_S,
            strategy: SamplingStrategy::First,
        }
    }
}

impl AnalysisConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;

        Self::from_toml_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))
    }

    /// Load configuration from a TOML string; missing keys take defaults
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: AnalysisConfig =
            toml::from_str(content).context("Invalid analysis configuration TOML")?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), AnalysisError> {
        if !self.tolerance_s.is_finite() || self.tolerance_s <= 0.0 {
            return Err(AnalysisError::InvalidConfig(format!(
                "tolerance_s must be a positive number of seconds, got {}",
                self.tolerance_s
            )));
        }

        if self.original_label == self.replayed_label {
            return Err(AnalysisError::InvalidConfig(format!(
                "original and replayed labels must differ (both {})",
                self.original_label
            )));
        }

        Ok(())
    }
}
