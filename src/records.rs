//! Typed log records and the samples derived from them
//!
//! Every input source (DataFlash binary logs, JSON-lines dumps) is decoded
//! into [`LogRecord`] once, at the input boundary. Downstream code only sees
//! the sample types defined here.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Native log timestamps are integer microseconds; all analysis runs in seconds.
pub const MICROS_PER_SECOND: f64 = 1_000_000.0;

/// EV message id for "armed"
pub const EVENT_ARMED: u8 = 10;

/// EV message id for "disarmed"
pub const EVENT_DISARMED: u8 = 11;

/// Convert a native microsecond timestamp to seconds
pub fn micros_to_seconds(time_us: u64) -> f64 {
    time_us as f64 / MICROS_PER_SECOND
}

/// Discriminator for the processing run (EKF core index) that produced a sample
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(transparent)]
pub struct SourceLabel(pub i64);

impl SourceLabel {
    /// Core 0: data as originally estimated in flight
    pub const ORIGINAL: SourceLabel = SourceLabel(0);
    /// Core 100: the same IMU replayed through the patched estimator
    pub const REPLAYED: SourceLabel = SourceLabel(100);
}

impl fmt::Display for SourceLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "C={}", self.0)
    }
}

impl From<i64> for SourceLabel {
    fn from(value: i64) -> Self {
        SourceLabel(value)
    }
}

/// A decoded log record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum LogRecord {
    /// XKF2: estimator accelerometer bias
    #[serde(rename = "XKF2")]
    Bias {
        time_us: u64,
        core: i64,
        ax: f64,
        ay: f64,
        az: f64,
    },
    /// XKF1: estimator velocity/position state
    #[serde(rename = "XKF1")]
    State {
        time_us: u64,
        core: i64,
        vn: f64,
        ve: f64,
        vd: f64,
        pd: f64,
    },
    /// EV: discrete vehicle event
    #[serde(rename = "EV")]
    Event { time_us: u64, id: u8 },
    /// Any record type the analysis does not use
    #[serde(other)]
    Other,
}

/// One Z-axis bias value from one source at one point in time
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BiasSample {
    /// Seconds since boot
    pub time: f64,
    pub source: SourceLabel,
    /// Z-axis accelerometer bias (m/s²)
    pub value: f64,
}

/// Velocity/position state extracted in the same pass as the bias samples
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AuxiliarySample {
    pub time: f64,
    pub source: SourceLabel,
    pub vn: f64,
    pub ve: f64,
    pub vd: f64,
    pub pd: f64,
}

/// Arm/disarm transition
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ArmEvent {
    pub time: f64,
    pub armed: bool,
}
