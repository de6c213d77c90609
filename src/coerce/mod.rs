//! Type coercion module
//!
//! Turns a `RawTable` into a `TypedTable` under a `SchemaProfile`.
//!
//! # Overview
//!
//! - Header resolution: normalize, map through the profile, keep declared fields in order
//! - Per-cell rules: Date (null when unparsable), Number (`0.0` when unparsable),
//!   Text (trimmed, `nan` blanked, trailing `.0` stripped, categorical upper-cased)

mod engine;
mod types;
mod values;

pub use engine::{coerce_cell, coerce_table, resolve_headers, HeaderResolution};
pub use types::{TypedRow, TypedTable, TypedValue};
pub use values::{coerce_date, coerce_number, coerce_text, from_serial_date, parse_date, parse_number};
