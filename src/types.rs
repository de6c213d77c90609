//! Common types used throughout the uploader
//!
//! This module contains shared type definitions used across the
//! profile, coercion, staging and warehouse modules.

use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Semantic Type
// ============================================================================

/// Semantic type of a canonical field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SemanticType {
    /// Calendar date, null when unparsable
    Date,
    /// Double-precision number, `0.0` when unparsable
    Number,
    /// Trimmed string
    #[default]
    Text,
}

impl SemanticType {
    /// Warehouse column type used when creating the destination table
    pub fn sql_type(self) -> &'static str {
        match self {
            SemanticType::Date => "DATE",
            SemanticType::Number => "DOUBLE",
            SemanticType::Text => "VARCHAR",
        }
    }

    /// Arrow type used for staged artifacts
    pub fn arrow_type(self) -> arrow::datatypes::DataType {
        match self {
            SemanticType::Date => arrow::datatypes::DataType::Date32,
            SemanticType::Number => arrow::datatypes::DataType::Float64,
            SemanticType::Text => arrow::datatypes::DataType::Utf8,
        }
    }
}

// ============================================================================
// Write Disposition
// ============================================================================

/// How a load treats the destination table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WriteDisposition {
    /// Drop and recreate the table before loading
    Replace,
    /// Add rows to the existing table
    #[default]
    Append,
}

impl fmt::Display for WriteDisposition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WriteDisposition::Replace => write!(f, "replace"),
            WriteDisposition::Append => write!(f, "append"),
        }
    }
}

// ============================================================================
// Utilities
// ============================================================================

/// Quote an identifier for use in generated SQL
///
/// `pma.berjalan` becomes `"pma"."berjalan"`.
pub fn quote_ident(name: &str) -> String {
    name.split('.')
        .map(|part| format!("\"{}\"", part.replace('"', "\"\"")))
        .collect::<Vec<_>>()
        .join(".")
}

/// Quote a string literal for use in generated SQL
pub fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_semantic_type_serde() {
        let ty: SemanticType = serde_json::from_str("\"number\"").unwrap();
        assert_eq!(ty, SemanticType::Number);

        let json = serde_json::to_string(&SemanticType::Date).unwrap();
        assert_eq!(json, "\"date\"");
    }

    #[test]
    fn test_semantic_type_default() {
        assert_eq!(SemanticType::default(), SemanticType::Text);
    }

    #[test]
    fn test_sql_types() {
        assert_eq!(SemanticType::Date.sql_type(), "DATE");
        assert_eq!(SemanticType::Number.sql_type(), "DOUBLE");
        assert_eq!(SemanticType::Text.sql_type(), "VARCHAR");
    }

    #[test]
    fn test_write_disposition_display() {
        assert_eq!(WriteDisposition::Replace.to_string(), "replace");
        assert_eq!(WriteDisposition::Append.to_string(), "append");
    }

    #[test]
    fn test_quote_ident() {
        assert_eq!(quote_ident("pma.berjalan"), "\"pma\".\"berjalan\"");
        assert_eq!(quote_ident("tgl"), "\"tgl\"");
        assert_eq!(quote_ident("we\"ird"), "\"we\"\"ird\"");
    }

    #[test]
    fn test_quote_literal() {
        assert_eq!(quote_literal("gs://b/x.parquet"), "'gs://b/x.parquet'");
        assert_eq!(quote_literal("o'neil"), "'o''neil'");
    }
}
