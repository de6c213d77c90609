//! Typed table to Arrow conversion

use crate::coerce::{TypedTable, TypedValue};
use crate::error::{Error, Result};
use crate::profile::FieldDef;
use crate::types::SemanticType;
use arrow::array::{ArrayRef, Date32Array, Float64Array, StringArray};
use arrow::datatypes::{Date32Type, Schema};
use arrow::record_batch::RecordBatch;
use std::sync::Arc;

/// Arrow schema of a typed table's columns
pub fn table_schema(table: &TypedTable) -> Schema {
    Schema::new(
        table
            .fields
            .iter()
            .map(FieldDef::arrow_field)
            .collect::<Vec<_>>(),
    )
}

/// Convert a typed table into one RecordBatch
///
/// Column types follow the declared semantic types, never the data.
pub fn typed_to_batch(table: &TypedTable) -> Result<RecordBatch> {
    let schema = Arc::new(table_schema(table));

    let columns: Vec<ArrayRef> = table
        .fields
        .iter()
        .enumerate()
        .map(|(idx, field)| build_column(table, idx, field))
        .collect::<Result<_>>()?;

    Ok(RecordBatch::try_new(schema, columns)?)
}

fn build_column(table: &TypedTable, idx: usize, field: &FieldDef) -> Result<ArrayRef> {
    let cells = table.rows.iter().map(|row| row.get(idx));

    let array: ArrayRef = match field.semantic_type {
        SemanticType::Date => Arc::new(
            cells
                .map(|cell| match cell {
                    Some(TypedValue::Date(d)) => Ok(d.map(Date32Type::from_naive_date)),
                    other => mismatch(field, other),
                })
                .collect::<Result<Date32Array>>()?,
        ),
        SemanticType::Number => Arc::new(
            cells
                .map(|cell| match cell {
                    Some(TypedValue::Number(n)) => Ok(Some(*n)),
                    other => mismatch(field, other),
                })
                .collect::<Result<Float64Array>>()?,
        ),
        SemanticType::Text => Arc::new(
            cells
                .map(|cell| match cell {
                    Some(TypedValue::Text(s)) => Ok(Some(s.as_str())),
                    other => mismatch(field, other),
                })
                .collect::<Result<StringArray>>()?,
        ),
    };

    Ok(array)
}

fn mismatch<T>(field: &FieldDef, cell: Option<&TypedValue>) -> Result<T> {
    Err(Error::output(format!(
        "Column '{}' expects {:?}, found {:?}",
        field.name, field.semantic_type, cell
    )))
}
