//! Tabular input module
//!
//! Supports: CSV, TSV, Excel workbooks (xlsx, xls, xlsb, ods)
//!
//! # Overview
//!
//! Readers turn one input file into a `RawTable`: the file's own headers plus
//! untyped cells. Header mapping and typing happen later in `coerce`.

mod readers;
mod types;

pub use readers::{AutoReader, CsvReader, ExcelReader};
pub use types::{RawRow, RawTable, RawValue, TabularReader};
