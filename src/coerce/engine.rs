//! Header resolution and table coercion

use super::types::{TypedRow, TypedTable, TypedValue};
use super::values::{coerce_date, coerce_number, coerce_text};
use crate::ingest::{RawTable, RawValue};
use crate::profile::{normalize_header, FieldDef, SchemaProfile};
use crate::types::SemanticType;

/// Result of matching a file's headers against a profile
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderResolution {
    /// `(raw column index, field)` pairs in profile field order
    pub columns: Vec<(usize, FieldDef)>,
    /// Raw headers that mapped to no declared field
    pub unmapped: Vec<String>,
}

impl HeaderResolution {
    /// Field names resolved, in profile order
    pub fn field_names(&self) -> Vec<&str> {
        self.columns.iter().map(|(_, f)| f.name.as_str()).collect()
    }
}

/// Match raw headers to profile fields
///
/// Headers are trimmed and upper-cased, then looked up exactly in the
/// profile's header map. The result is intersected with the declared fields
/// and ordered like them. When several raw headers land on the same field
/// the leftmost one wins.
pub fn resolve_headers(headers: &[String], profile: &SchemaProfile) -> HeaderResolution {
    let mut source: Vec<Option<usize>> = vec![None; profile.fields.len()];
    let mut unmapped = Vec::new();

    for (raw_idx, header) in headers.iter().enumerate() {
        let normalized = normalize_header(header);
        let slot = profile
            .field_for_header(&normalized)
            .and_then(|field| profile.field_index(field));

        match slot {
            Some(field_idx) => {
                if source[field_idx].is_none() {
                    source[field_idx] = Some(raw_idx);
                }
            }
            None => unmapped.push(header.clone()),
        }
    }

    let columns = profile
        .fields
        .iter()
        .zip(source)
        .filter_map(|(field, raw_idx)| raw_idx.map(|idx| (idx, field.clone())))
        .collect();

    HeaderResolution { columns, unmapped }
}

/// Coerce one raw table into the profile's canonical typed form
///
/// Pure and total: malformed cells take their type's default.
pub fn coerce_table(raw: &RawTable, profile: &SchemaProfile) -> TypedTable {
    let resolution = resolve_headers(&raw.headers, profile);

    if !resolution.unmapped.is_empty() {
        tracing::debug!(
            profile = %profile.name,
            unmapped = ?resolution.unmapped,
            "Discarding unmapped headers"
        );
    }

    let rows: Vec<TypedRow> = raw
        .rows
        .iter()
        .map(|cells| {
            resolution
                .columns
                .iter()
                .map(|(idx, field)| {
                    let cell = cells.get(*idx).and_then(Option::as_ref);
                    coerce_cell(cell, field, profile.day_first)
                })
                .collect()
        })
        .collect();

    let fields = resolution.columns.into_iter().map(|(_, f)| f).collect();
    TypedTable::new(fields, rows)
}

/// Coerce one cell according to its field definition
pub fn coerce_cell(cell: Option<&RawValue>, field: &FieldDef, day_first: bool) -> TypedValue {
    match field.semantic_type {
        SemanticType::Date => TypedValue::Date(coerce_date(cell, day_first)),
        SemanticType::Number => TypedValue::Number(coerce_number(cell)),
        SemanticType::Text => TypedValue::Text(coerce_text(cell, field.categorical)),
    }
}
