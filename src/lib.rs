//! ekf-bias - EKF3 Z-axis accelerometer bias comparison
//!
//! This library compares the estimator's Z-axis accel bias between the
//! original (core 0) and replayed (core 100) runs recorded in one ArduPilot
//! log, to quantify how much a processing fix reduced bias drift.
//!
//! ```
//! use ekf_bias::{comparison, config::AnalysisConfig, extract, records::LogRecord};
//!
//! let records = vec![
//!     LogRecord::Bias { time_us: 0, core: 0, ax: 0.0, ay: 0.0, az: 0.5 },
//!     LogRecord::Bias { time_us: 0, core: 100, ax: 0.0, ay: 0.0, az: 0.3 },
//! ];
//! let data = extract::extract(records).unwrap();
//! let result = comparison::compare(&data.bias, &AnalysisConfig::default()).unwrap();
//! assert!(result.has_replay);
//! ```

pub mod cli;
pub mod comparison;
pub mod config;
pub mod csv_output;
pub mod dataflash;
pub mod error;
pub mod export;
pub mod extract;
pub mod json_output;
pub mod jsonl;
pub mod partition;
#[cfg(feature = "plot")]
pub mod plot;
pub mod records;
pub mod report;
pub mod sampler;
pub mod stats;
