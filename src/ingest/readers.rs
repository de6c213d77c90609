//! Reader implementations
//!
//! Each reader handles one family of file formats. Rows whose cells are all
//! blank are skipped.

use super::types::{RawTable, RawValue, TabularReader};
use crate::error::{Error, Result};
use calamine::{open_workbook_auto, Data, Reader};
use std::path::Path;

// ============================================================================
// CSV Reader
// ============================================================================

/// CSV reader with configurable delimiter
#[derive(Debug, Clone)]
pub struct CsvReader {
    /// Field delimiter
    delimiter: u8,
}

impl Default for CsvReader {
    fn default() -> Self {
        Self { delimiter: b',' }
    }
}

impl CsvReader {
    /// Create a new CSV reader with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a CSV reader with a custom delimiter
    pub fn with_delimiter(delimiter: u8) -> Self {
        Self { delimiter }
    }

    /// Parse CSV content from any byte source
    pub fn read_from<R: std::io::Read>(&self, source: R, label: &str) -> Result<RawTable> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(self.delimiter)
            .has_headers(true)
            .flexible(true)
            .from_reader(source);

        let headers: Vec<String> = reader
            .byte_headers()
            .map_err(|e| Error::unreadable(label, format!("Failed to read CSV header: {e}")))?
            .iter()
            .map(|h| String::from_utf8_lossy(h).trim_start_matches('\u{feff}').to_string())
            .collect();

        if headers.iter().all(String::is_empty) {
            return Err(Error::unreadable(label, "CSV has no header row"));
        }

        let mut rows = Vec::new();
        for (line, record) in reader.byte_records().enumerate() {
            let record = record.map_err(|e| {
                Error::unreadable(label, format!("Malformed CSV at record {}: {e}", line + 1))
            })?;

            let cells: Vec<Option<RawValue>> = (0..headers.len())
                .map(|i| {
                    record
                        .get(i)
                        .map(|bytes| RawValue::text(String::from_utf8_lossy(bytes).into_owned()))
                })
                .collect();

            if is_blank_row(&cells) {
                continue;
            }
            rows.push(cells);
        }

        Ok(RawTable::new(headers, rows))
    }
}

impl TabularReader for CsvReader {
    fn read(&self, path: &Path) -> Result<RawTable> {
        let label = path.display().to_string();
        let file = std::fs::File::open(path)
            .map_err(|e| Error::unreadable(&label, format!("Failed to open file: {e}")))?;
        self.read_from(file, &label)
    }
}

// ============================================================================
// Excel Reader
// ============================================================================

/// Spreadsheet reader (xlsx, xlsm, xlsb, xls, ods), first worksheet only
#[derive(Debug, Clone, Default)]
pub struct ExcelReader;

impl ExcelReader {
    /// Create a new spreadsheet reader
    pub fn new() -> Self {
        Self
    }
}

impl TabularReader for ExcelReader {
    fn read(&self, path: &Path) -> Result<RawTable> {
        let label = path.display().to_string();

        let mut workbook = open_workbook_auto(path)
            .map_err(|e| Error::unreadable(&label, format!("Failed to open workbook: {e}")))?;

        let range = workbook
            .worksheet_range_at(0)
            .ok_or_else(|| Error::unreadable(&label, "Workbook has no worksheets"))?
            .map_err(|e| Error::unreadable(&label, format!("Failed to read worksheet: {e}")))?;

        let mut sheet_rows = range.rows();
        let headers: Vec<String> = sheet_rows
            .next()
            .ok_or_else(|| Error::unreadable(&label, "Worksheet has no header row"))?
            .iter()
            .map(|cell| match cell {
                Data::String(s) => s.clone(),
                Data::Empty => String::new(),
                other => other.to_string(),
            })
            .collect();

        let mut rows = Vec::new();
        for row in sheet_rows {
            let cells: Vec<Option<RawValue>> = (0..headers.len())
                .map(|i| row.get(i).map(cell_to_raw))
                .collect();

            if is_blank_row(&cells) {
                continue;
            }
            rows.push(cells);
        }

        tracing::debug!(file = %label, rows = rows.len(), "Read worksheet");
        Ok(RawTable::new(headers, rows))
    }
}

/// Convert a spreadsheet cell into a raw value
pub(super) fn cell_to_raw(cell: &Data) -> RawValue {
    match cell {
        Data::Empty => RawValue::Blank,
        Data::String(s) => RawValue::text(s.clone()),
        Data::Float(f) => RawValue::Number(*f),
        #[allow(clippy::cast_precision_loss)]
        Data::Int(i) => RawValue::Number(*i as f64),
        Data::Bool(b) => RawValue::Text(b.to_string()),
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(ts) if ts.time() == chrono::NaiveTime::MIN => {
                RawValue::Text(ts.format("%Y-%m-%d").to_string())
            }
            Some(ts) => RawValue::Text(ts.format("%Y-%m-%d %H:%M:%S").to_string()),
            None => RawValue::Number(dt.as_f64()),
        },
        Data::DateTimeIso(s) | Data::DurationIso(s) => RawValue::text(s.clone()),
        // Formula errors such as #N/A carry no usable value
        Data::Error(_) => RawValue::Blank,
    }
}

// ============================================================================
// Extension Dispatch
// ============================================================================

/// Picks a reader from the file extension
#[derive(Debug, Clone, Default)]
pub struct AutoReader {
    csv: CsvReader,
    excel: ExcelReader,
}

impl AutoReader {
    /// Create a new dispatching reader
    pub fn new() -> Self {
        Self::default()
    }
}

impl TabularReader for AutoReader {
    fn read(&self, path: &Path) -> Result<RawTable> {
        let extension = path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();

        match extension.as_str() {
            "csv" | "txt" => self.csv.read(path),
            "tsv" => CsvReader::with_delimiter(b'\t').read(path),
            "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => self.excel.read(path),
            other => Err(Error::unreadable(
                path.display().to_string(),
                format!("Unsupported file type '.{other}'"),
            )),
        }
    }
}

fn is_blank_row(cells: &[Option<RawValue>]) -> bool {
    cells
        .iter()
        .all(|c| c.as_ref().map_or(true, RawValue::is_blank))
}
