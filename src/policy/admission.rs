//! Cutoff-date admission filter

use crate::coerce::TypedTable;
use chrono::NaiveDate;

/// Rows that passed the filter plus the audit count of those that did not
#[derive(Debug, Clone, PartialEq)]
pub struct Admission {
    /// Retained rows, original order
    pub table: TypedTable,
    /// Rows dropped for a null or post-cutoff date
    pub dropped: usize,
}

/// Keep exactly the rows whose date is non-null and on or before `cutoff`
///
/// When the table has no `date_field` column every row is undated and
/// dropped.
pub fn admit(table: TypedTable, date_field: &str, cutoff: NaiveDate) -> Admission {
    let before = table.num_rows();

    let table = match table.column_index(date_field) {
        Some(idx) => table.retain_rows(|row| {
            row.get(idx)
                .and_then(|v| v.as_date())
                .is_some_and(|date| date <= cutoff)
        }),
        None => table.retain_rows(|_| false),
    };

    let dropped = before - table.num_rows();
    Admission { table, dropped }
}
