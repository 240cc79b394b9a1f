//! Tolerance-window lookup of a series value at a target time

use crate::partition::SourceSeries;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Default lookup window (seconds)
pub const DEFAULT_TOLERANCE_S: f64 = 1.0;

/// How a match is chosen when several samples fall inside the window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SamplingStrategy {
    /// First sample in series order within the window (not necessarily the closest)
    #[default]
    First,
    /// Sample closest to the target within the window; earliest wins ties
    Nearest,
}

impl FromStr for SamplingStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "first" => Ok(Self::First),
            "nearest" => Ok(Self::Nearest),
            other => Err(format!(
                "unknown sampling strategy '{}' (expected 'first' or 'nearest')",
                other
            )),
        }
    }
}

impl fmt::Display for SamplingStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::First => "first",
            Self::Nearest => "nearest",
        })
    }
}

/// Value of the matching sample with `|time - target| < tolerance`
///
/// `None` means "no data for this time"; callers skip rather than substitute.
pub fn sample_at(
    series: &SourceSeries,
    target: f64,
    tolerance: f64,
    strategy: SamplingStrategy,
) -> Option<f64> {
    let mut within = series
        .iter()
        .map(|s| ((s.time - target).abs(), s.value))
        .filter(|(dt, _)| *dt < tolerance);

    match strategy {
        SamplingStrategy::First => within.next().map(|(_, value)| value),
        SamplingStrategy::Nearest => within
            .fold(None, |best: Option<(f64, f64)>, (dt, value)| match best {
                Some((best_dt, _)) if best_dt <= dt => best,
                _ => Some((dt, value)),
            })
            .map(|(_, value)| value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::partition::partition;
    use crate::records::{BiasSample, SourceLabel};

    fn series(points: &[(f64, f64)]) -> SourceSeries {
        let samples: Vec<BiasSample> = points
            .iter()
            .map(|&(time, value)| BiasSample {
                time,
                source: SourceLabel::ORIGINAL,
                value,
            })
            .collect();
        partition(&samples, SourceLabel::ORIGINAL)
    }

    #[test]
    fn test_sample_within_tolerance() {
        let s = series(&[(0.0, 0.10), (10.0, 0.12), (20.0, 0.08)]);
        assert_eq!(
            sample_at(&s, 0.5, DEFAULT_TOLERANCE_S, SamplingStrategy::First),
            Some(0.10)
        );
    }

    #[test]
    fn test_sample_tolerance_is_strict() {
        let s = series(&[(0.0, 0.10)]);
        assert_eq!(sample_at(&s, 1.0, 1.0, SamplingStrategy::First), None);
        assert_eq!(sample_at(&s, 0.999, 1.0, SamplingStrategy::First), Some(0.10));
    }

    #[test]
    fn test_sample_outside_gap_is_absent() {
        let s = series(&[(0.0, 0.1), (100.0, 0.2)]);
        assert_eq!(sample_at(&s, 50.0, 1.0, SamplingStrategy::First), None);
        assert_eq!(sample_at(&s, 50.0, 1.0, SamplingStrategy::Nearest), None);
    }

    #[test]
    fn test_first_strategy_is_not_nearest() {
        let s = series(&[(9.2, 1.0), (10.0, 2.0)]);
        assert_eq!(sample_at(&s, 10.0, 1.0, SamplingStrategy::First), Some(1.0));
        assert_eq!(sample_at(&s, 10.0, 1.0, SamplingStrategy::Nearest), Some(2.0));
    }

    #[test]
    fn test_nearest_strategy_tie_keeps_earliest() {
        let s = series(&[(9.5, 1.0), (10.5, 2.0)]);
        assert_eq!(sample_at(&s, 10.0, 1.0, SamplingStrategy::Nearest), Some(1.0));
    }

    #[test]
    fn test_sample_empty_series() {
        let s = series(&[]);
        assert_eq!(sample_at(&s, 0.0, 1.0, SamplingStrategy::First), None);
    }

    #[test]
    fn test_strategy_parse() {
        assert_eq!("first".parse::<SamplingStrategy>(), Ok(SamplingStrategy::First));
        assert_eq!("nearest".parse::<SamplingStrategy>(), Ok(SamplingStrategy::Nearest));
        assert!("closest".parse::<SamplingStrategy>().is_err());
        assert_eq!(SamplingStrategy::Nearest.to_string(), "nearest");
    }

    #[test]
    fn test_sample_idempotent() {
        let s = series(&[(0.0, 0.1), (0.5, 0.2), (1.0, 0.3)]);
        let first = sample_at(&s, 0.7, 1.0, SamplingStrategy::Nearest);
        let second = sample_at(&s, 0.7, 1.0, SamplingStrategy::Nearest);
        assert_eq!(first, second);
    }
}
