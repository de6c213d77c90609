//! Profile types
//!
//! Declarative schema profile types for YAML parsing.

use crate::types::{SemanticType, WriteDisposition};
use arrow::datatypes::{Field, Schema};
use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Profile Kind
// ============================================================================

/// Which ingestion mode a profile drives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProfileKind {
    /// Daily transactions, cutoff-gated
    Daily,
    /// Reference data replaced wholesale
    MasterReference,
    /// Historical data appended under collision protection
    Backfill,
}

impl fmt::Display for ProfileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProfileKind::Daily => write!(f, "daily"),
            ProfileKind::MasterReference => write!(f, "master_reference"),
            ProfileKind::Backfill => write!(f, "backfill"),
        }
    }
}

// ============================================================================
// Fields
// ============================================================================

/// A canonical destination field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDef {
    /// Column name in the destination table
    pub name: String,
    /// Semantic type cells are coerced into
    #[serde(rename = "type")]
    pub semantic_type: SemanticType,
    /// Upper-case the cleaned text value
    #[serde(default)]
    pub categorical: bool,
}

impl FieldDef {
    /// Create a field definition
    pub fn new(name: impl Into<String>, semantic_type: SemanticType) -> Self {
        Self {
            name: name.into(),
            semantic_type,
            categorical: false,
        }
    }

    /// Mark the field as categorical
    #[must_use]
    pub fn categorical(mut self) -> Self {
        self.categorical = true;
        self
    }

    /// Arrow field for the staged artifact (always nullable)
    pub fn arrow_field(&self) -> Field {
        Field::new(&self.name, self.semantic_type.arrow_type(), true)
    }
}

/// One raw-header to field mapping entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaderMapping {
    /// Normalized (trimmed, upper-cased) input header
    pub header: String,
    /// Target field name
    pub field: String,
}

// ============================================================================
// Schema Profile
// ============================================================================

/// Declarative bundle of header mapping, field types, target table and policy flags
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaProfile {
    /// Profile name used for selection
    pub name: String,
    /// Ingestion mode
    pub kind: ProfileKind,
    /// Human-readable title
    #[serde(default)]
    pub title: Option<String>,
    /// Description of the profile
    #[serde(default)]
    pub description: Option<String>,
    /// Ordered raw header to field mapping
    pub header_map: Vec<HeaderMapping>,
    /// Ordered canonical fields
    pub fields: Vec<FieldDef>,
    /// Destination table, `dataset.table`
    pub target_table: String,
    /// Date field used for admission and collision checks
    #[serde(default)]
    pub date_field: Option<String>,
    /// Drop rows dated after the cutoff
    #[serde(default)]
    pub date_filter_enabled: bool,
    /// Probe the destination for overlapping dates
    #[serde(default)]
    pub collision_check_enabled: bool,
    /// Disposition used for the first commit of a run
    pub default_write_policy: WriteDisposition,
    /// Read ambiguous `a/b/yyyy` dates day-first
    #[serde(default)]
    pub day_first: bool,
}

impl SchemaProfile {
    /// Look up the field a normalized header maps to
    pub fn field_for_header(&self, header: &str) -> Option<&str> {
        self.header_map
            .iter()
            .find(|m| m.header == header)
            .map(|m| m.field.as_str())
    }

    /// Get a field by name
    pub fn field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Position of a field in the declared ordering
    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }

    /// The temporal admission field, if the profile declares one
    pub fn date_field_def(&self) -> Option<&FieldDef> {
        self.date_field.as_deref().and_then(|name| self.field(name))
    }

    /// Fixed destination schema, one nullable column per declared field
    pub fn arrow_schema(&self) -> Schema {
        Schema::new(
            self.fields
                .iter()
                .map(FieldDef::arrow_field)
                .collect::<Vec<_>>(),
        )
    }

    /// Display title, falling back to the name
    pub fn display_title(&self) -> &str {
        self.title.as_deref().unwrap_or(&self.name)
    }
}

/// Normalize a raw header for lookup: trimmed and upper-cased
pub fn normalize_header(header: &str) -> String {
    header.trim().to_uppercase()
}
