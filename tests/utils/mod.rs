// Integration test utilities
//
// Builders for synthetic flight logs in both input formats.

#![allow(dead_code)]

use std::path::{Path, PathBuf};

const HEAD: [u8; 2] = [0xA3, 0x95];
const FMT_TYPE: u8 = 128;

const XKF1_TYPE: u8 = 160;
const XKF2_TYPE: u8 = 161;
const EV_TYPE: u8 = 162;
const BARO_TYPE: u8 = 163;

/// One synthetic log entry
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Entry {
    Bias { time_us: u64, core: u8, az: f32 },
    State { time_us: u64, core: u8, vd: f32 },
    Event { time_us: u64, id: u8 },
    Baro { time_us: u64, alt: f32 },
}

/// Ordered list of entries that can be written as DataFlash or JSON lines
#[derive(Debug, Clone, Default)]
pub struct FlightLog {
    pub entries: Vec<Entry>,
}

impl FlightLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bias samples at `hz` for `[0, duration_s]` with a linear drift of `slope` per second
    pub fn with_bias(mut self, core: u8, duration_s: u32, hz: u32, offset: f32, slope: f32) -> Self {
        for i in 0..=duration_s * hz {
            let t = i as f32 / hz as f32;
            self.entries.push(Entry::Bias {
                time_us: u64::from(i) * 1_000_000 / u64::from(hz),
                core,
                az: offset + slope * t,
            });
        }
        self
    }

    pub fn push(mut self, entry: Entry) -> Self {
        self.entries.push(entry);
        self
    }

    /// Render as a DataFlash binary log
    pub fn to_dataflash(&self) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend(fmt_message(FMT_TYPE, 89, "FMT", "BBnNZ", "Type,Length,Name,Format,Columns"));
        out.extend(fmt_message(XKF1_TYPE, 32, "XKF1", "QBfffff", "TimeUS,C,Roll,VN,VE,VD,PD"));
        out.extend(fmt_message(XKF2_TYPE, 32, "XKF2", "QBfffff", "TimeUS,C,AX,AY,AZ,VWN,VWE"));
        out.extend(fmt_message(EV_TYPE, 12, "EV", "QB", "TimeUS,Id"));
        out.extend(fmt_message(BARO_TYPE, 15, "BARO", "Qf", "TimeUS,Alt"));

        for entry in &self.entries {
            match *entry {
                Entry::Bias { time_us, core, az } => {
                    let mut p = header(XKF2_TYPE, time_us);
                    p.push(core);
                    for v in [0.0f32, 0.0, az, 0.0, 0.0] {
                        p.extend(v.to_le_bytes());
                    }
                    out.extend(p);
                }
                Entry::State { time_us, core, vd } => {
                    let mut p = header(XKF1_TYPE, time_us);
                    p.push(core);
                    for v in [0.0f32, 1.0, 2.0, vd, -10.0] {
                        p.extend(v.to_le_bytes());
                    }
                    out.extend(p);
                }
                Entry::Event { time_us, id } => {
                    let mut p = header(EV_TYPE, time_us);
                    p.push(id);
                    out.extend(p);
                }
                Entry::Baro { time_us, alt } => {
                    let mut p = header(BARO_TYPE, time_us);
                    p.extend(alt.to_le_bytes());
                    out.extend(p);
                }
            }
        }
        out
    }

    /// Render as JSON lines, one record per entry
    pub fn to_jsonl(&self) -> String {
        let mut out = String::new();
        for entry in &self.entries {
            let line = match *entry {
                Entry::Bias { time_us, core, az } => serde_json::json!({
                    "type": "XKF2", "time_us": time_us, "core": core,
                    "ax": 0.0, "ay": 0.0, "az": f64::from(az),
                }),
                Entry::State { time_us, core, vd } => serde_json::json!({
                    "type": "XKF1", "time_us": time_us, "core": core,
                    "vn": 1.0, "ve": 2.0, "vd": f64::from(vd), "pd": -10.0,
                }),
                Entry::Event { time_us, id } => serde_json::json!({
                    "type": "EV", "time_us": time_us, "id": id,
                }),
                Entry::Baro { time_us, alt } => serde_json::json!({
                    "type": "BARO", "time_us": time_us, "alt": f64::from(alt),
                }),
            };
            out.push_str(&line.to_string());
            out.push('\n');
        }
        out
    }

    pub fn write_dataflash(&self, dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, self.to_dataflash()).unwrap();
        path
    }

    pub fn write_jsonl(&self, dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, self.to_jsonl()).unwrap();
        path
    }
}

/// Original core 0 drifting upward, replay core 100 holding steady
pub fn replay_flight() -> FlightLog {
    FlightLog::new()
        .push(Entry::Event { time_us: 0, id: 10 })
        .with_bias(0, 100, 10, 0.125, 0.005)
        .with_bias(100, 100, 10, 0.125, 0.0)
        .push(Entry::Event { time_us: 100_000_000, id: 11 })
}

/// Original core 0 only
pub fn original_flight() -> FlightLog {
    FlightLog::new().with_bias(0, 100, 10, 0.125, 0.005)
}

fn fmt_message(msg_type: u8, length: u8, name: &str, format: &str, columns: &str) -> Vec<u8> {
    let mut out = vec![HEAD[0], HEAD[1], FMT_TYPE, msg_type, length];
    for (text, width) in [(name, 4), (format, 16), (columns, 64)] {
        let mut field = text.as_bytes().to_vec();
        field.resize(width, 0);
        out.extend(field);
    }
    out
}

fn header(msg_type: u8, time_us: u64) -> Vec<u8> {
    let mut out = vec![HEAD[0], HEAD[1], msg_type];
    out.extend(time_us.to_le_bytes());
    out
}
