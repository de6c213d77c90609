//! Schema profile module
//!
//! Static declarative data describing one ingestion mode.
//!
//! # Overview
//!
//! The profile module provides:
//! - `SchemaProfile` - header mapping, field types, target table, policy flags
//! - `ProfileKind` - Daily | MasterReference | Backfill
//! - Built-in profiles embedded in the binary, plus YAML loading with validation

mod builtin;
mod parser;
mod types;

pub use builtin::{get_builtin, is_builtin, list_builtin};
pub use parser::{load_profile, load_profile_from_str, validate_profile};
pub use types::{normalize_header, FieldDef, HeaderMapping, ProfileKind, SchemaProfile};

#[cfg(test)]
mod tests;
