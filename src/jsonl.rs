//! JSON-lines record input
//!
//! One [`LogRecord`] per line, tagged by `"type"`:
//!
//! ```text
//! {"type":"XKF2","time_us":1000000,"core":0,"ax":0.01,"ay":-0.02,"az":0.12}
//! {"type":"EV","time_us":1500000,"id":10}
//! ```
//!
//! Blank lines are ignored and unknown types decode to [`LogRecord::Other`].

use crate::records::LogRecord;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;
use thiserror::Error;

/// Errors reading a JSON-lines record dump
#[derive(Error, Debug)]
pub enum JsonlError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Invalid record on line {line}: {source}")]
    Parse {
        line: usize,
        #[source]
        source: serde_json::Error,
    },
}

/// Streaming reader over a JSON-lines source
pub struct JsonlReader<R> {
    lines: io::Lines<R>,
    line: usize,
}

impl JsonlReader<BufReader<File>> {
    /// Open a JSON-lines file
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, JsonlError> {
        Ok(Self::new(BufReader::new(File::open(path)?)))
    }
}

impl<R: BufRead> JsonlReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
            line: 0,
        }
    }
}

impl<R: BufRead> Iterator for JsonlReader<R> {
    type Item = Result<LogRecord, JsonlError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let text = match self.lines.next()? {
                Ok(text) => text,
                Err(e) => return Some(Err(e.into())),
            };
            self.line += 1;

            if text.trim().is_empty() {
                continue;
            }

            return Some(
                serde_json::from_str(&text).map_err(|source| JsonlError::Parse {
                    line: self.line,
                    source,
                }),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_jsonl_reads_records_and_skips_blank_lines() {
        let input = r#"{"type":"XKF2","time_us":0,"core":0,"ax":0.0,"ay":0.0,"az":0.1}

{"type":"EV","time_us":5,"id":10}
{"type":"BARO","Alt":12.0}
"#;
        let records: Vec<LogRecord> = JsonlReader::new(input.as_bytes())
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[1], LogRecord::Event { time_us: 5, id: 10 });
        assert_eq!(records[2], LogRecord::Other);
    }

    #[test]
    fn test_jsonl_reports_line_number() {
        let input = "\n{\"type\":\"XKF2\",\"time_us\":0}\n";
        let err = JsonlReader::new(input.as_bytes())
            .next()
            .unwrap()
            .unwrap_err();
        assert!(matches!(err, JsonlError::Parse { line: 2, .. }));
        assert!(err.to_string().starts_with("Invalid record on line 2"));
    }

    #[test]
    fn test_jsonl_open_missing_file() {
        assert!(matches!(
            JsonlReader::open("/nonexistent/records.jsonl"),
            Err(JsonlError::Io(_))
        ));
    }
}
