//! Descriptive statistics over bias values
//!
//! Range (max - min) is the drift proxy used throughout the report.

use serde::{Deserialize, Serialize};

/// Summary of a non-empty sample set
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Statistics {
    pub mean: f64,
    /// Sample standard deviation (n - 1 divisor), 0 for a single value
    pub std: f64,
    pub min: f64,
    pub max: f64,
    /// `max - min`
    pub range: f64,
}

impl Statistics {
    /// Compute statistics, `None` for an empty input
    pub fn compute(values: &[f64]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }

        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        let std = if values.len() > 1 {
            let sum_sq = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>();
            (sum_sq / (n - 1.0)).sqrt()
        } else {
            0.0
        };
        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);

        Some(Self {
            mean,
            std,
            min,
            max,
            range: max - min,
        })
    }

    /// Drift as reported to the user
    pub fn drift(&self) -> f64 {
        self.range
    }
}
