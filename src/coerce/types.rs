//! Typed table types
//!
//! Output of the coercion engine: rows restricted to the profile's fields,
//! each cell conforming to its field's semantic type.

use crate::profile::FieldDef;
use crate::types::SemanticType;
use chrono::NaiveDate;
use serde_json::Value;

/// A coerced cell value
#[derive(Debug, Clone, PartialEq)]
pub enum TypedValue {
    /// Calendar date, `None` when the cell was unparsable or missing
    Date(Option<NaiveDate>),
    /// Number, never null
    Number(f64),
    /// Cleaned text, never null
    Text(String),
}

impl TypedValue {
    /// Semantic type of this value
    pub fn semantic_type(&self) -> SemanticType {
        match self {
            TypedValue::Date(_) => SemanticType::Date,
            TypedValue::Number(_) => SemanticType::Number,
            TypedValue::Text(_) => SemanticType::Text,
        }
    }

    /// Date content, if this is a non-null date
    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            TypedValue::Date(d) => *d,
            _ => None,
        }
    }

    /// Numeric content, if this is a number
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            TypedValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Text content, if this is text
    pub fn as_str(&self) -> Option<&str> {
        match self {
            TypedValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// JSON rendering used for previews
    pub fn to_json(&self) -> Value {
        match self {
            TypedValue::Date(Some(d)) => Value::String(d.format("%Y-%m-%d").to_string()),
            TypedValue::Date(None) => Value::Null,
            TypedValue::Number(n) => {
                serde_json::Number::from_f64(*n).map_or(Value::Null, Value::Number)
            }
            TypedValue::Text(s) => Value::String(s.clone()),
        }
    }
}

/// One coerced row, aligned with `TypedTable::fields`
pub type TypedRow = Vec<TypedValue>;

/// Coerced rows of one input file
///
/// `fields` holds only the profile fields the file actually supplied, in
/// profile order. Fields absent from the input are absent here too; the
/// warehouse loads them as NULL.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TypedTable {
    /// Columns present, in profile order
    pub fields: Vec<FieldDef>,
    /// Rows aligned with `fields`
    pub rows: Vec<TypedRow>,
}

impl TypedTable {
    /// Create a table
    pub fn new(fields: Vec<FieldDef>, rows: Vec<TypedRow>) -> Self {
        Self { fields, rows }
    }

    /// Number of rows
    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table has no rows
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of a column by field name
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }

    /// Field names present, in order
    pub fn column_names(&self) -> Vec<&str> {
        self.fields.iter().map(|f| f.name.as_str()).collect()
    }

    /// Value of a named column in a given row
    pub fn value(&self, row: usize, name: &str) -> Option<&TypedValue> {
        let idx = self.column_index(name)?;
        self.rows.get(row)?.get(idx)
    }

    /// Keep only the rows matching a predicate, preserving order
    #[must_use]
    pub fn retain_rows<F: FnMut(&TypedRow) -> bool>(mut self, keep: F) -> Self {
        self.rows.retain(keep);
        self
    }

    /// Rows as JSON objects, for previews
    pub fn to_json_rows(&self, limit: usize) -> Vec<Value> {
        self.rows
            .iter()
            .take(limit)
            .map(|row| {
                let obj: serde_json::Map<String, Value> = self
                    .fields
                    .iter()
                    .zip(row)
                    .map(|(field, value)| (field.name.clone(), value.to_json()))
                    .collect();
                Value::Object(obj)
            })
            .collect()
    }
}
