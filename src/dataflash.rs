//! ArduPilot DataFlash (`.bin`) log decoding
//!
//! A log is a flat sequence of messages, each framed as
//! `0xA3 0x95 <type> <payload>`. Payload layouts are self-described by `FMT`
//! messages (type 128), which must precede the first message of the type they
//! define:
//!
//! | offset | size | field                                  |
//! |--------|------|----------------------------------------|
//! | 3      | 1    | described type                         |
//! | 4      | 1    | total message length, header included  |
//! | 5      | 4    | name                                   |
//! | 9      | 16   | format characters                      |
//! | 25     | 64   | comma-separated column names           |
//!
//! All numeric fields are little-endian. Bytes that do not start a message of
//! a known type are skipped one at a time until the stream resynchronizes.

use crate::records::LogRecord;
use memmap2::Mmap;
use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, warn};

pub const HEAD_BYTE1: u8 = 0xA3;
pub const HEAD_BYTE2: u8 = 0x95;

/// Message type of FMT itself
pub const FMT_TYPE: u8 = 128;

/// Total FMT message length, header included
pub const FMT_LENGTH: usize = 89;

const HEADER_LEN: usize = 3;

/// Message names decoded into [`LogRecord`]s
pub const RECORD_TYPES: [&str; 3] = ["XKF2", "XKF1", "EV"];

/// Errors that can occur while reading a DataFlash log
#[derive(Error, Debug)]
pub enum DataFlashError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Invalid FMT for message type {msg_type}: {reason}")]
    BadFormat { msg_type: u8, reason: String },

    #[error("{message} message has no {column} column")]
    MissingColumn {
        message: String,
        column: &'static str,
    },

    #[error("{message} column {column} is out of range")]
    InvalidColumn {
        message: String,
        column: &'static str,
    },
}

/// A decoded field value
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Int(i64),
    UInt(u64),
    Float(f64),
    Text(String),
    Array(Vec<i16>),
}

impl FieldValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Int(v) => Some(*v as f64),
            FieldValue::UInt(v) => Some(*v as f64),
            FieldValue::Float(v) => Some(*v),
            FieldValue::Text(_) | FieldValue::Array(_) => None,
        }
    }

    pub fn as_u64(&self) -> Option<u64> {
        match self {
            FieldValue::Int(v) => u64::try_from(*v).ok(),
            FieldValue::UInt(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            FieldValue::Int(v) => Some(*v),
            FieldValue::UInt(v) => i64::try_from(*v).ok(),
            _ => None,
        }
    }
}

/// Payload size of one format character, `None` if unsupported
fn field_size(ch: char) -> Option<usize> {
    Some(match ch {
        'b' | 'B' | 'M' => 1,
        'h' | 'H' | 'c' | 'C' | 'g' => 2,
        'i' | 'I' | 'f' | 'e' | 'E' | 'L' | 'n' => 4,
        'd' | 'q' | 'Q' => 8,
        'N' => 16,
        'Z' | 'a' => 64,
        _ => return None,
    })
}

/// Layout of one message type, as declared by a FMT message
#[derive(Debug, Clone, PartialEq)]
pub struct MessageFormat {
    pub msg_type: u8,
    /// Total length including the 3-byte header
    pub length: usize,
    pub name: String,
    pub format: String,
    pub columns: Vec<String>,
}

impl MessageFormat {
    /// Parse a FMT payload (the 86 bytes following the header)
    pub fn parse(body: &[u8]) -> Result<Self, DataFlashError> {
        let msg_type = body.first().copied().unwrap_or_default();
        let bad = |reason: String| DataFlashError::BadFormat { msg_type, reason };

        if body.len() < FMT_LENGTH - HEADER_LEN {
            return Err(bad(format!("FMT payload is {} bytes", body.len())));
        }

        let length = body[1] as usize;
        let name = c_string(&body[2..6]);
        let format = c_string(&body[6..22]);
        let columns: Vec<String> = c_string(&body[22..86])
            .split(',')
            .filter(|c| !c.is_empty())
            .map(str::to_string)
            .collect();

        if name.is_empty() {
            return Err(bad("empty message name".to_string()));
        }

        let mut payload_len = 0;
        for ch in format.chars() {
            payload_len += field_size(ch)
                .ok_or_else(|| bad(format!("{}: unsupported format character '{}'", name, ch)))?;
        }

        if payload_len + HEADER_LEN != length {
            return Err(bad(format!(
                "{}: format '{}' needs {} bytes but length is {}",
                name,
                format,
                payload_len + HEADER_LEN,
                length
            )));
        }

        if columns.len() != format.chars().count() {
            return Err(bad(format!(
                "{}: {} columns for {} format characters",
                name,
                columns.len(),
                format.chars().count()
            )));
        }

        Ok(Self {
            msg_type,
            length,
            name,
            format,
            columns,
        })
    }

    /// Decode a payload of exactly `length - 3` bytes
    fn decode(&self, payload: &[u8]) -> DecodedMessage {
        let mut fields = Vec::with_capacity(self.columns.len());
        let mut offset = 0;

        for (ch, column) in self.format.chars().zip(&self.columns) {
            // Sizes were validated against `length` when the FMT was parsed.
            let size = field_size(ch).unwrap_or_default();
            let raw = &payload[offset..offset + size];
            offset += size;
            fields.push((column.clone(), decode_field(ch, raw)));
        }

        DecodedMessage {
            name: self.name.clone(),
            fields,
        }
    }
}

fn c_string(bytes: &[u8]) -> String {
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    String::from_utf8_lossy(&bytes[..end]).trim().to_string()
}

fn le<const N: usize>(raw: &[u8]) -> [u8; N] {
    let mut buf = [0u8; N];
    buf.copy_from_slice(&raw[..N]);
    buf
}

fn decode_field(ch: char, raw: &[u8]) -> FieldValue {
    match ch {
        'b' => FieldValue::Int(i8::from_le_bytes(le(raw)) as i64),
        'B' | 'M' => FieldValue::UInt(raw[0] as u64),
        'h' => FieldValue::Int(i16::from_le_bytes(le(raw)) as i64),
        'H' => FieldValue::UInt(u16::from_le_bytes(le(raw)) as u64),
        'i' => FieldValue::Int(i32::from_le_bytes(le(raw)) as i64),
        'I' => FieldValue::UInt(u32::from_le_bytes(le(raw)) as u64),
        'q' => FieldValue::Int(i64::from_le_bytes(le(raw))),
        'Q' => FieldValue::UInt(u64::from_le_bytes(le(raw))),
        'f' => FieldValue::Float(f32::from_le_bytes(le(raw)) as f64),
        'd' => FieldValue::Float(f64::from_le_bytes(le(raw))),
        'g' => FieldValue::Float(half_to_f32(u16::from_le_bytes(le(raw))) as f64),
        'c' => FieldValue::Float(i16::from_le_bytes(le(raw)) as f64 * 0.01),
        'C' => FieldValue::Float(u16::from_le_bytes(le(raw)) as f64 * 0.01),
        'e' => FieldValue::Float(i32::from_le_bytes(le(raw)) as f64 * 0.01),
        'E' => FieldValue::Float(u32::from_le_bytes(le(raw)) as f64 * 0.01),
        'L' => FieldValue::Float(i32::from_le_bytes(le(raw)) as f64 * 1.0e-7),
        'a' => FieldValue::Array(
            raw.chunks_exact(2)
                .map(|pair| i16::from_le_bytes([pair[0], pair[1]]))
                .collect(),
        ),
        // 'n', 'N', 'Z'
        _ => FieldValue::Text(c_string(raw)),
    }
}

/// IEEE 754 binary16 to f32
fn half_to_f32(bits: u16) -> f32 {
    let sign = if bits & 0x8000 != 0 { -1.0 } else { 1.0 };
    let exponent = ((bits >> 10) & 0x1f) as i32;
    let mantissa = (bits & 0x3ff) as f32;

    match exponent {
        0 => sign * mantissa * 2f32.powi(-24),
        0x1f if mantissa == 0.0 => sign * f32::INFINITY,
        0x1f => f32::NAN,
        _ => sign * (1.0 + mantissa / 1024.0) * 2f32.powi(exponent - 15),
    }
}

/// One decoded message with its columns in declaration order
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedMessage {
    pub name: String,
    pub fields: Vec<(String, FieldValue)>,
}

impl DecodedMessage {
    pub fn get(&self, column: &str) -> Option<&FieldValue> {
        self.fields
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }

    fn missing(&self, column: &'static str) -> DataFlashError {
        DataFlashError::MissingColumn {
            message: self.name.clone(),
            column,
        }
    }

    fn invalid(&self, column: &'static str) -> DataFlashError {
        DataFlashError::InvalidColumn {
            message: self.name.clone(),
            column,
        }
    }

    fn f64_column(&self, column: &'static str) -> Result<f64, DataFlashError> {
        self.get(column)
            .ok_or_else(|| self.missing(column))?
            .as_f64()
            .ok_or_else(|| self.invalid(column))
    }

    fn u64_column(&self, column: &'static str) -> Result<u64, DataFlashError> {
        self.get(column)
            .ok_or_else(|| self.missing(column))?
            .as_u64()
            .ok_or_else(|| self.invalid(column))
    }

    fn i64_column(&self, column: &'static str) -> Result<i64, DataFlashError> {
        self.get(column)
            .ok_or_else(|| self.missing(column))?
            .as_i64()
            .ok_or_else(|| self.invalid(column))
    }

    /// Convert into a typed record; names outside [`RECORD_TYPES`] become `Other`
    pub fn to_record(&self) -> Result<LogRecord, DataFlashError> {
        Ok(match self.name.as_str() {
            "XKF2" => LogRecord::Bias {
                time_us: self.u64_column("TimeUS")?,
                core: self.i64_column("C")?,
                ax: self.f64_column("AX")?,
                ay: self.f64_column("AY")?,
                az: self.f64_column("AZ")?,
            },
            "XKF1" => LogRecord::State {
                time_us: self.u64_column("TimeUS")?,
                core: self.i64_column("C")?,
                vn: self.f64_column("VN")?,
                ve: self.f64_column("VE")?,
                vd: self.f64_column("VD")?,
                pd: self.f64_column("PD")?,
            },
            "EV" => LogRecord::Event {
                time_us: self.u64_column("TimeUS")?,
                id: u8::try_from(self.u64_column("Id")?).map_err(|_| self.invalid("Id"))?,
            },
            _ => LogRecord::Other,
        })
    }
}

/// Counters describing one pass over a log
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParseStats {
    /// Complete messages of a known type (FMT included)
    pub messages: u64,
    /// Bytes skipped while resynchronizing
    pub skipped_bytes: u64,
    /// FMT messages that could not be used
    pub rejected_formats: u64,
    /// Whether the log ended partway through a message
    pub truncated: bool,
}

/// Single-pass message iterator over raw log bytes
pub struct DataFlashParser<'a> {
    data: &'a [u8],
    pos: usize,
    formats: HashMap<u8, MessageFormat>,
    wanted: Option<HashSet<String>>,
    stats: ParseStats,
}

impl<'a> DataFlashParser<'a> {
    /// Decode every message type
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            pos: 0,
            formats: HashMap::new(),
            wanted: None,
            stats: ParseStats::default(),
        }
    }

    /// Decode only the named message types; others are skipped by length
    pub fn with_filter(data: &'a [u8], names: &[&str]) -> Self {
        Self {
            wanted: Some(names.iter().map(|n| n.to_string()).collect()),
            ..Self::new(data)
        }
    }

    pub fn stats(&self) -> &ParseStats {
        &self.stats
    }

    /// Formats seen so far, by message type
    pub fn formats(&self) -> &HashMap<u8, MessageFormat> {
        &self.formats
    }

    fn skip_byte(&mut self) {
        self.pos += 1;
        self.stats.skipped_bytes += 1;
    }

    fn truncate(&mut self, needed: usize) {
        debug!(
            offset = self.pos,
            needed,
            available = self.data.len() - self.pos,
            "log ends inside a message"
        );
        self.stats.truncated = true;
        self.pos = self.data.len();
    }

    fn read_format(&mut self) {
        if self.pos + FMT_LENGTH > self.data.len() {
            self.truncate(FMT_LENGTH);
            return;
        }

        let body = &self.data[self.pos + HEADER_LEN..self.pos + FMT_LENGTH];
        self.pos += FMT_LENGTH;
        self.stats.messages += 1;

        match MessageFormat::parse(body) {
            Ok(format) if format.msg_type == FMT_TYPE => {}
            Ok(format) => {
                debug!(msg_type = format.msg_type, name = %format.name, "format registered");
                self.formats.insert(format.msg_type, format);
            }
            Err(e) => {
                warn!("Skipping FMT message: {}", e);
                self.stats.rejected_formats += 1;
            }
        }
    }
}

impl<'a> Iterator for DataFlashParser<'a> {
    type Item = DecodedMessage;

    fn next(&mut self) -> Option<Self::Item> {
        while self.pos + HEADER_LEN <= self.data.len() {
            let data = self.data;
            if data[self.pos] != HEAD_BYTE1 || data[self.pos + 1] != HEAD_BYTE2 {
                self.skip_byte();
                continue;
            }

            let msg_type = data[self.pos + 2];
            if msg_type == FMT_TYPE {
                self.read_format();
                continue;
            }

            let Some(format) = self.formats.get(&msg_type) else {
                self.skip_byte();
                continue;
            };

            let end = self.pos + format.length;
            if end > data.len() {
                let needed = format.length;
                self.truncate(needed);
                return None;
            }

            let payload = &data[self.pos + HEADER_LEN..end];
            self.pos = end;
            self.stats.messages += 1;

            let wanted = self
                .wanted
                .as_ref()
                .map_or(true, |names| names.contains(&format.name));
            if wanted {
                return Some(format.decode(payload));
            }
        }

        if self.pos < self.data.len() {
            self.stats.skipped_bytes += (self.data.len() - self.pos) as u64;
            self.pos = self.data.len();
        }
        None
    }
}

/// Decode the analysis records (XKF2, XKF1, EV) from raw log bytes
pub fn decode_records(data: &[u8]) -> Result<Vec<LogRecord>, DataFlashError> {
    DataFlashParser::with_filter(data, &RECORD_TYPES)
        .map(|msg| msg.to_record())
        .collect()
}

/// A memory-mapped DataFlash log file
pub struct DataFlashLog {
    mmap: Mmap,
}

impl DataFlashLog {
    /// Open and map a log file
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, DataFlashError> {
        let file = File::open(path)?;
        // SAFETY: the map is read-only and the log is not written during analysis.
        let mmap = unsafe { Mmap::map(&file) }?;
        Ok(Self { mmap })
    }

    pub fn bytes(&self) -> &[u8] {
        &self.mmap
    }

    /// Parser restricted to the analysis record types
    pub fn parser(&self) -> DataFlashParser<'_> {
        DataFlashParser::with_filter(self.bytes(), &RECORD_TYPES)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fmt_message(msg_type: u8, length: u8, name: &str, format: &str, columns: &str) -> Vec<u8> {
        let mut out = vec![HEAD_BYTE1, HEAD_BYTE2, FMT_TYPE, msg_type, length];
        for (text, width) in [(name, 4), (format, 16), (columns, 64)] {
            let mut field = text.as_bytes().to_vec();
            field.resize(width, 0);
            out.extend(field);
        }
        out
    }

    fn message(msg_type: u8, payload: &[u8]) -> Vec<u8> {
        let mut out = vec![HEAD_BYTE1, HEAD_BYTE2, msg_type];
        out.extend_from_slice(payload);
        out
    }

    fn xkf2_payload(time_us: u64, core: u8, az: f32) -> Vec<u8> {
        let mut p = time_us.to_le_bytes().to_vec();
        p.push(core);
        p.extend(0.25f32.to_le_bytes());
        p.extend((-0.25f32).to_le_bytes());
        p.extend(az.to_le_bytes());
        p
    }

    fn xkf2_fmt() -> Vec<u8> {
        fmt_message(200, 3 + 8 + 1 + 12, "XKF2", "QBfff", "TimeUS,C,AX,AY,AZ")
    }

    #[test]
    fn test_fmt_length_constant() {
        assert_eq!(fmt_message(1, 3, "X", "", "").len(), FMT_LENGTH);
    }

    #[test]
    fn test_parse_format() {
        let raw = xkf2_fmt();
        let format = MessageFormat::parse(&raw[HEADER_LEN..]).unwrap();
        assert_eq!(format.msg_type, 200);
        assert_eq!(format.name, "XKF2");
        assert_eq!(format.columns, vec!["TimeUS", "C", "AX", "AY", "AZ"]);
        assert_eq!(format.length, 24);
    }

    #[test]
    fn test_parse_format_rejects_length_mismatch() {
        let raw = fmt_message(200, 30, "XKF2", "QBfff", "TimeUS,C,AX,AY,AZ");
        let err = MessageFormat::parse(&raw[HEADER_LEN..]).unwrap_err();
        assert!(err.to_string().contains("needs 24 bytes"));
    }

    #[test]
    fn test_parse_format_rejects_unknown_char() {
        let raw = fmt_message(201, 4, "ODD", "X", "Val");
        assert!(MessageFormat::parse(&raw[HEADER_LEN..]).is_err());
    }

    #[test]
    fn test_decode_bias_record() {
        let mut log = xkf2_fmt();
        log.extend(message(200, &xkf2_payload(2_000_000, 100, 0.5)));

        let records = decode_records(&log).unwrap();
        assert_eq!(
            records,
            vec![LogRecord::Bias {
                time_us: 2_000_000,
                core: 100,
                ax: 0.25,
                ay: -0.25,
                az: 0.5
            }]
        );
    }

    #[test]
    fn test_resync_after_garbage() {
        let mut log = xkf2_fmt();
        log.extend([0x00, 0xA3, 0x11, 0x95]);
        log.extend(message(200, &xkf2_payload(1, 0, 0.5)));
        log.extend(message(77, &[1, 2, 3]));
        log.extend(message(200, &xkf2_payload(2, 0, 0.5)));

        let mut parser = DataFlashParser::new(&log);
        let names: Vec<String> = parser.by_ref().map(|m| m.name).collect();
        assert_eq!(names, vec!["XKF2", "XKF2"]);
        assert_eq!(parser.stats().skipped_bytes, 4 + 6);
        assert_eq!(parser.stats().messages, 3);
        assert!(!parser.stats().truncated);
    }

    #[test]
    fn test_truncated_final_message() {
        let mut log = xkf2_fmt();
        log.extend(message(200, &xkf2_payload(1, 0, 0.5)));
        let mut partial = message(200, &xkf2_payload(2, 0, 0.5));
        partial.truncate(10);
        log.extend(partial);

        let mut parser = DataFlashParser::new(&log);
        assert_eq!(parser.by_ref().count(), 1);
        assert!(parser.stats().truncated);
    }

    #[test]
    fn test_filter_skips_other_types() {
        let mut log = xkf2_fmt();
        log.extend(fmt_message(201, 3 + 8 + 4, "BARO", "Qf", "TimeUS,Alt"));
        let mut baro = 5u64.to_le_bytes().to_vec();
        baro.extend(12.5f32.to_le_bytes());
        log.extend(message(201, &baro));
        log.extend(message(200, &xkf2_payload(6, 0, 0.1)));

        let all: Vec<String> = DataFlashParser::new(&log).map(|m| m.name).collect();
        assert_eq!(all, vec!["BARO", "XKF2"]);

        let filtered: Vec<String> = DataFlashParser::with_filter(&log, &RECORD_TYPES)
            .map(|m| m.name)
            .collect();
        assert_eq!(filtered, vec!["XKF2"]);
    }

    #[test]
    fn test_scaled_fields() {
        let mut log = fmt_message(202, 3 + 2 + 4 + 4, "SCL", "cEL", "A,B,Lat");
        let mut payload = (-150i16).to_le_bytes().to_vec();
        payload.extend(250u32.to_le_bytes());
        payload.extend(123_456_789i32.to_le_bytes());
        log.extend(message(202, &payload));

        let msg = DataFlashParser::new(&log).next().unwrap();
        assert!((msg.get("A").unwrap().as_f64().unwrap() + 1.5).abs() < 1e-12);
        assert!((msg.get("B").unwrap().as_f64().unwrap() - 2.5).abs() < 1e-12);
        assert!((msg.get("Lat").unwrap().as_f64().unwrap() - 12.3456789).abs() < 1e-9);
    }

    #[test]
    fn test_text_and_half_fields() {
        let mut log = fmt_message(203, 3 + 4 + 2, "TXT", "ng", "Tag,H");
        let mut payload = b"EKF\0".to_vec();
        payload.extend(0x3C00u16.to_le_bytes());
        log.extend(message(203, &payload));

        let msg = DataFlashParser::new(&log).next().unwrap();
        assert_eq!(msg.get("Tag"), Some(&FieldValue::Text("EKF".to_string())));
        assert_eq!(msg.get("H").unwrap().as_f64(), Some(1.0));
    }

    #[test]
    fn test_half_to_f32() {
        assert_eq!(half_to_f32(0x0000), 0.0);
        assert_eq!(half_to_f32(0x3C00), 1.0);
        assert_eq!(half_to_f32(0xC000), -2.0);
        assert_eq!(half_to_f32(0x3800), 0.5);
        assert!(half_to_f32(0x7C00).is_infinite());
        assert!(half_to_f32(0x7E00).is_nan());
    }

    #[test]
    fn test_event_record() {
        let mut log = fmt_message(204, 3 + 8 + 1, "EV", "QB", "TimeUS,Id");
        let mut payload = 7_000_000u64.to_le_bytes().to_vec();
        payload.push(10);
        log.extend(message(204, &payload));

        assert_eq!(
            decode_records(&log).unwrap(),
            vec![LogRecord::Event {
                time_us: 7_000_000,
                id: 10
            }]
        );
    }

    #[test]
    fn test_missing_column_is_error() {
        let mut log = fmt_message(200, 3 + 8 + 4, "XKF2", "Qf", "TimeUS,AZ");
        let mut payload = 1u64.to_le_bytes().to_vec();
        payload.extend(0.1f32.to_le_bytes());
        log.extend(message(200, &payload));

        let err = decode_records(&log).unwrap_err();
        assert!(matches!(
            err,
            DataFlashError::MissingColumn { column: "C", .. }
        ));
    }

    #[test]
    fn test_empty_input() {
        let mut parser = DataFlashParser::new(&[]);
        assert!(parser.next().is_none());
        assert_eq!(parser.stats(), &ParseStats::default());
    }

    #[test]
    fn test_open_missing_file() {
        assert!(matches!(
            DataFlashLog::open("/nonexistent/flight.bin"),
            Err(DataFlashError::Io(_))
        ));
    }
}
