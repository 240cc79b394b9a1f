//! CSV output for the time-aligned bias export
//!
//! Missing cells are written as empty fields so spreadsheets see a gap, not a zero.
//! Numbers use the shortest round-trip text with a trailing `.0` on whole
//! values (`0.0`, `0.1`, `2.0`) and two-digit signed exponents (`1.5e-05`),
//! the layout of files written by the earlier Python tooling.

use crate::export::{ExportCell, ExportRow, ExportTable};
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

/// CSV output formatter
#[derive(Debug)]
pub struct CsvOutput<'a> {
    table: &'a ExportTable,
}

impl<'a> CsvOutput<'a> {
    /// Create a CSV formatter over an export table
    pub fn new(table: &'a ExportTable) -> Self {
        Self { table }
    }

    /// Generate CSV header row
    fn header(&self) -> String {
        self.table.columns().join(",")
    }

    fn format_cell(cell: &ExportCell) -> String {
        match cell {
            ExportCell::Value(v) => format_float(*v),
            ExportCell::Missing => String::new(),
        }
    }

    fn format_row(&self, row: &ExportRow) -> String {
        let mut fields = Vec::with_capacity(3);

        fields.push(format_float(row.time));
        fields.push(Self::format_cell(&row.original));

        if let Some(ref replayed) = row.replayed {
            fields.push(Self::format_cell(replayed));
        }

        fields.join(",")
    }

    /// Generate CSV output as string
    pub fn to_csv(&self) -> String {
        let mut output = String::new();

        output.push_str(&self.header());
        output.push('\n');

        for row in &self.table.rows {
            output.push_str(&self.format_row(row));
            output.push('\n');
        }

        output
    }

    /// Write the CSV to `path`
    pub fn write_to<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        fs::write(path, self.to_csv())
            .with_context(|| format!("Failed to write CSV to {}", path.display()))
    }
}

/// Shortest round-trip text, always with a decimal point or an exponent
fn format_float(value: f64) -> String {
    if value.is_nan() {
        return "nan".to_string();
    }

    // Debug switches to exponent form below 1e-4 and from 1e16 up
    let text = format!("{:?}", value);
    match text.split_once('e') {
        Some((mantissa, exponent)) => {
            let (sign, digits) = match exponent.strip_prefix('-') {
                Some(digits) => ('-', digits),
                None => ('+', exponent),
            };
            format!("{}e{}{:0>2}", mantissa, sign, digits)
        }
        None => text,
    }
}
