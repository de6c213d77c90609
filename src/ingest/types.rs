//! Raw table types and the reader trait
//!
//! A reader produces untyped cells keyed by whatever headers the file
//! happens to carry. Nothing here knows about profiles.

use crate::error::Result;
use std::fmt;
use std::path::Path;

/// An untyped cell value as produced by a tabular reader
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    /// Text cell (CSV cells are always text)
    Text(String),
    /// Numeric spreadsheet cell
    Number(f64),
    /// Present but empty cell
    Blank,
}

impl RawValue {
    /// Create a text value, mapping the empty string to `Blank`
    pub fn text(value: impl Into<String>) -> Self {
        let value = value.into();
        if value.is_empty() {
            Self::Blank
        } else {
            Self::Text(value)
        }
    }

    /// Whether the cell carries no content
    pub fn is_blank(&self) -> bool {
        matches!(self, Self::Blank)
    }
}

impl fmt::Display for RawValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawValue::Text(s) => write!(f, "{s}"),
            RawValue::Number(n) => write!(f, "{n}"),
            RawValue::Blank => Ok(()),
        }
    }
}

/// All rows of one input file, column-aligned with `headers`
///
/// A row shorter than the header list has missing (`None`) trailing cells.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    /// Headers exactly as they appear in the file
    pub headers: Vec<String>,
    /// Cells per row
    pub rows: Vec<Vec<Option<RawValue>>>,
}

impl RawTable {
    /// Create a table from headers and rows
    pub fn new(headers: Vec<String>, rows: Vec<Vec<Option<RawValue>>>) -> Self {
        Self { headers, rows }
    }

    /// Number of data rows
    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table has no data rows
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Iterate rows as header-keyed views
    pub fn iter_rows(&self) -> impl Iterator<Item = RawRow<'_>> {
        self.rows.iter().map(|cells| RawRow {
            headers: &self.headers,
            cells,
        })
    }
}

/// Header-keyed view over one raw row
#[derive(Debug, Clone, Copy)]
pub struct RawRow<'a> {
    headers: &'a [String],
    cells: &'a [Option<RawValue>],
}

impl<'a> RawRow<'a> {
    /// Cell under the given raw header (first match), `None` when missing
    pub fn get(&self, header: &str) -> Option<&'a RawValue> {
        let idx = self.headers.iter().position(|h| h == header)?;
        self.cell(idx)
    }

    /// Cell at a column position, `None` when missing
    pub fn cell(&self, idx: usize) -> Option<&'a RawValue> {
        self.cells.get(idx).and_then(Option::as_ref)
    }

    /// Iterate `(header, cell)` pairs in file order
    pub fn iter(&self) -> impl Iterator<Item = (&'a str, Option<&'a RawValue>)> + '_ {
        self.headers
            .iter()
            .enumerate()
            .map(|(i, h)| (h.as_str(), self.cell(i)))
    }
}

/// Trait for reading one input file into a raw table
pub trait TabularReader: Send + Sync {
    /// Read the file; corrupt or unsupported input fails with `UnreadableFile`
    fn read(&self, path: &Path) -> Result<RawTable>;
}
