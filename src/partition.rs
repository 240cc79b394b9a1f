//! Source partitioning
//!
//! Splits the extracted bias samples by EKF core label. Pure filters; log
//! order is preserved, so each series stays time-ordered.

use crate::records::{BiasSample, SourceLabel};
use serde::Serialize;
use std::collections::BTreeMap;

/// Time-ordered bias samples belonging to one source
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceSeries {
    label: SourceLabel,
    samples: Vec<BiasSample>,
}

impl SourceSeries {
    /// Empty series for `label`
    pub fn empty(label: SourceLabel) -> Self {
        Self {
            label,
            samples: Vec::new(),
        }
    }

    pub fn label(&self) -> SourceLabel {
        self.label
    }

    pub fn samples(&self) -> &[BiasSample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// An empty series means the source is absent from the log
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, BiasSample> {
        self.samples.iter()
    }

    /// Bias values in order
    pub fn values(&self) -> Vec<f64> {
        self.samples.iter().map(|s| s.value).collect()
    }

    /// `(time, value)` pairs in order, as consumed by plotting
    pub fn points(&self) -> Vec<(f64, f64)> {
        self.samples.iter().map(|s| (s.time, s.value)).collect()
    }

    /// Earliest and latest timestamps, `None` for an empty series
    pub fn time_range(&self) -> Option<(f64, f64)> {
        let first = self.samples.first()?.time;
        Some(self.samples.iter().fold((first, first), |(lo, hi), s| {
            (lo.min(s.time), hi.max(s.time))
        }))
    }
}

impl<'a> IntoIterator for &'a SourceSeries {
    type Item = &'a BiasSample;
    type IntoIter = std::slice::Iter<'a, BiasSample>;

    fn into_iter(self) -> Self::IntoIter {
        self.samples.iter()
    }
}

/// All samples whose source equals `label`, in input order
pub fn partition(samples: &[BiasSample], label: SourceLabel) -> SourceSeries {
    SourceSeries {
        label,
        samples: samples
            .iter()
            .filter(|s| s.source == label)
            .copied()
            .collect(),
    }
}

/// One series per distinct label present in `samples`
pub fn partition_all(samples: &[BiasSample]) -> BTreeMap<SourceLabel, SourceSeries> {
    let mut series: BTreeMap<SourceLabel, SourceSeries> = BTreeMap::new();
    for sample in samples {
        series
            .entry(sample.source)
            .or_insert_with(|| SourceSeries::empty(sample.source))
            .samples
            .push(*sample);
    }
    series
}
