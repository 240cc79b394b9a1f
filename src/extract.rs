//! Record extraction: typed log records into per-type sample sequences
//!
//! Single pass, no backtracking. Timestamps are converted from microseconds
//! to seconds here and nowhere else.

use crate::error::AnalysisError;
use crate::records::{
    micros_to_seconds, ArmEvent, AuxiliarySample, BiasSample, LogRecord, SourceLabel,
    EVENT_ARMED, EVENT_DISARMED,
};
use tracing::{debug, trace};

/// Everything the analysis pulls out of one log
#[derive(Debug, Clone, Default)]
pub struct ExtractedData {
    /// XKF2 Z-axis bias samples, in log order
    pub bias: Vec<BiasSample>,
    /// XKF1 velocity/position samples, in log order
    pub auxiliary: Vec<AuxiliarySample>,
    /// Arm/disarm events, in log order
    pub arm_events: Vec<ArmEvent>,
}

/// Incremental extractor
///
/// Lets a fallible decoder stream records in one at a time:
///
/// ```
/// use ekf_bias::extract::Extractor;
/// use ekf_bias::records::LogRecord;
///
/// let mut extractor = Extractor::new();
/// extractor.push(LogRecord::Bias { time_us: 0, core: 0, ax: 0.0, ay: 0.0, az: 0.1 });
/// let data = extractor.finish().unwrap();
/// assert_eq!(data.bias.len(), 1);
/// ```
#[derive(Debug, Default)]
pub struct Extractor {
    data: ExtractedData,
    skipped: u64,
}

impl Extractor {
    /// Create an empty extractor
    pub fn new() -> Self {
        Self::default()
    }

    /// Consume one record
    pub fn push(&mut self, record: LogRecord) {
        match record {
            LogRecord::Bias {
                time_us, core, az, ..
            } => self.data.bias.push(BiasSample {
                time: micros_to_seconds(time_us),
                source: SourceLabel(core),
                value: az,
            }),
            LogRecord::State {
                time_us,
                core,
                vn,
                ve,
                vd,
                pd,
            } => self.data.auxiliary.push(AuxiliarySample {
                time: micros_to_seconds(time_us),
                source: SourceLabel(core),
                vn,
                ve,
                vd,
                pd,
            }),
            LogRecord::Event { time_us, id } => match id {
                EVENT_ARMED | EVENT_DISARMED => self.data.arm_events.push(ArmEvent {
                    time: micros_to_seconds(time_us),
                    armed: id == EVENT_ARMED,
                }),
                _ => {
                    trace!(id, "ignoring event");
                    self.skipped += 1;
                }
            },
            LogRecord::Other => self.skipped += 1,
        }
    }

    /// Finish extraction
    ///
    /// Fails with [`AnalysisError::NoBiasSamples`] when no XKF2 record was seen.
    pub fn finish(self) -> Result<ExtractedData, AnalysisError> {
        debug!(
            bias = self.data.bias.len(),
            auxiliary = self.data.auxiliary.len(),
            arm_events = self.data.arm_events.len(),
            skipped = self.skipped,
            "extraction finished"
        );

        if self.data.bias.is_empty() {
            return Err(AnalysisError::NoBiasSamples);
        }

        Ok(self.data)
    }
}

/// Extract bias, auxiliary and arm-event sequences from a record stream
pub fn extract<I>(records: I) -> Result<ExtractedData, AnalysisError>
where
    I: IntoIterator<Item = LogRecord>,
{
    let mut extractor = Extractor::new();
    for record in records {
        extractor.push(record);
    }
    extractor.finish()
}
