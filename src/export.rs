//! Time-aligned export table
//!
//! With a replay present, both sources are joined on timestamps rounded to
//! hundredths of a second. Samples of one source that round to the same key
//! collide and the later one wins.

use crate::comparison::ComparisonResult;
use crate::partition::SourceSeries;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// Join-key resolution: timestamps are rounded to 1 / `KEY_SCALE` seconds
const KEY_SCALE: f64 = 100.0;

/// A value cell that is explicitly marked when a source has no sample
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ExportCell {
    Value(f64),
    Missing,
}

impl ExportCell {
    pub fn value(&self) -> Option<f64> {
        match self {
            ExportCell::Value(v) => Some(*v),
            ExportCell::Missing => None,
        }
    }
}

impl From<Option<f64>> for ExportCell {
    fn from(value: Option<f64>) -> Self {
        value.map_or(ExportCell::Missing, ExportCell::Value)
    }
}

/// One exported row: timestamp, original value, replayed value (when exported)
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ExportRow {
    pub time: f64,
    pub original: ExportCell,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub replayed: Option<ExportCell>,
}

/// Rows ready for a tabular writer
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportTable {
    /// Whether rows carry a replayed column (and timestamps are rounded keys)
    pub aligned: bool,
    pub rows: Vec<ExportRow>,
}

impl ExportTable {
    /// Build the export rows for a comparison
    pub fn from_comparison(result: &ComparisonResult) -> Self {
        if result.has_replay {
            Self::aligned(&result.original, &result.replayed)
        } else {
            Self::single(&result.original)
        }
    }

    /// Column names in row order
    pub fn columns(&self) -> &'static [&'static str] {
        if self.aligned {
            &["time_s", "original_AZ", "replayed_AZ"]
        } else {
            &["time_s", "AZ"]
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn single(original: &SourceSeries) -> Self {
        Self {
            aligned: false,
            rows: original
                .iter()
                .map(|s| ExportRow {
                    time: s.time,
                    original: ExportCell::Value(s.value),
                    replayed: None,
                })
                .collect(),
        }
    }

    fn aligned(original: &SourceSeries, replayed: &SourceSeries) -> Self {
        let original_by_key = keyed(original);
        let replayed_by_key = keyed(replayed);

        let keys: BTreeSet<i64> = original_by_key
            .keys()
            .chain(replayed_by_key.keys())
            .copied()
            .collect();

        let rows = keys
            .into_iter()
            .map(|key| ExportRow {
                time: key as f64 / KEY_SCALE,
                original: original_by_key.get(&key).copied().into(),
                replayed: Some(replayed_by_key.get(&key).copied().into()),
            })
            .collect();

        Self {
            aligned: true,
            rows,
        }
    }
}

/// Round a timestamp to its join key in hundredths of a second
///
/// Rounding works on the exact binary value of `time` (ties to even), so
/// 0.015, stored just below the half, keys to 1 and not 2.
pub fn join_key(time: f64) -> i64 {
    format!("{:.2}", time)
        .replace('.', "")
        .parse()
        // Only non-finite or out-of-range times get here; the cast saturates.
        .unwrap_or_else(|_| (time * KEY_SCALE).round() as i64)
}

fn keyed(series: &SourceSeries) -> BTreeMap<i64, f64> {
    let mut by_key = BTreeMap::new();
    for sample in series {
        by_key.insert(join_key(sample.time), sample.value);
    }
    by_key
}
