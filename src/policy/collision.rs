//! Date-window collision policy
//!
//! Probes the destination for rows inside a file's `[min, max]` date span
//! and decides whether the file proceeds, overwrites that span, or is skipped.
//! The probe and the delete are separate statements; a single writer per
//! destination table keeps this safe.

use crate::coerce::TypedTable;
use crate::error::{Error, Result};
use crate::types::{quote_ident, quote_literal};
use crate::warehouse::Warehouse;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Date span of one file and how many destination rows already fall in it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollisionWindow {
    /// Earliest date in the file
    pub min_date: NaiveDate,
    /// Latest date in the file
    pub max_date: NaiveDate,
    /// Destination rows already dated inside the span
    pub existing_count: u64,
}

impl fmt::Display for CollisionWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{} .. {}] ({} existing rows)",
            self.min_date, self.max_date, self.existing_count
        )
    }
}

/// What to do with a file after probing the destination
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CollisionDecision {
    /// No overlap (or no dated rows); stage and commit
    Proceed,
    /// Overlapping rows were deleted; stage and commit
    Overwrite {
        /// Window that was cleared
        window: CollisionWindow,
        /// Rows removed from the destination
        deleted: usize,
    },
    /// Overlap under non-overwrite policy; discard the file
    Skip {
        /// Window that collided
        window: CollisionWindow,
    },
    /// The probe itself failed; proceed optimistically
    Unverified {
        /// Probe failure message
        reason: String,
    },
}

impl CollisionDecision {
    /// Whether the file goes on to staging
    pub fn proceeds(&self) -> bool {
        !matches!(self, CollisionDecision::Skip { .. })
    }
}

/// Inclusive `[min, max]` over the non-null dates of a column
pub fn date_span(table: &TypedTable, date_field: &str) -> Option<(NaiveDate, NaiveDate)> {
    let idx = table.column_index(date_field)?;
    table
        .rows
        .iter()
        .filter_map(|row| row.get(idx).and_then(|v| v.as_date()))
        .fold(None, |span, date| match span {
            None => Some((date, date)),
            Some((lo, hi)) => Some((lo.min(date), hi.max(date))),
        })
}

/// Probe the destination for an overlapping window and apply the policy
///
/// Only a failed overwrite delete is an error; a failed probe is reported
/// as `Unverified`.
pub async fn check_collision(
    warehouse: &dyn Warehouse,
    target_table: &str,
    date_field: &str,
    table: &TypedTable,
    overwrite: bool,
) -> Result<CollisionDecision> {
    let Some((min_date, max_date)) = date_span(table, date_field) else {
        return Ok(CollisionDecision::Proceed);
    };

    let range = range_predicate(date_field, min_date, max_date);
    let count_sql = format!(
        "SELECT COUNT(*) FROM {} WHERE {range}",
        quote_ident(target_table)
    );

    let existing_count = match warehouse.query(&count_sql).await.and_then(|rows| scalar_count(&rows)) {
        Ok(count) => count,
        Err(e) => {
            tracing::warn!(
                table = target_table,
                error = %e,
                "Collision probe failed, assuming no collision"
            );
            return Ok(CollisionDecision::Unverified {
                reason: e.to_string(),
            });
        }
    };

    let window = CollisionWindow {
        min_date,
        max_date,
        existing_count,
    };

    if existing_count == 0 {
        tracing::debug!(table = target_table, %window, "No collision");
        return Ok(CollisionDecision::Proceed);
    }

    if !overwrite {
        tracing::info!(table = target_table, %window, "Duplicate window, skipping file");
        return Ok(CollisionDecision::Skip { window });
    }

    let delete_sql = format!("DELETE FROM {} WHERE {range}", quote_ident(target_table));
    let deleted = warehouse.execute(&delete_sql).await.map_err(|e| {
        Error::warehouse(format!(
            "Failed to clear {target_table} for {min_date}..{max_date}: {e}"
        ))
    })?;

    tracing::info!(table = target_table, %window, deleted, "Overwrote existing window");
    Ok(CollisionDecision::Overwrite { window, deleted })
}

fn range_predicate(date_field: &str, min: NaiveDate, max: NaiveDate) -> String {
    format!(
        "{} BETWEEN DATE {} AND DATE {}",
        quote_ident(date_field),
        quote_literal(&min.format("%Y-%m-%d").to_string()),
        quote_literal(&max.format("%Y-%m-%d").to_string())
    )
}

/// Read the single count cell of a `SELECT COUNT(*)` result
fn scalar_count(rows: &[Vec<Value>]) -> Result<u64> {
    let cell = rows
        .first()
        .and_then(|row| row.first())
        .ok_or_else(|| Error::warehouse("Count query returned no rows"))?;

    match cell {
        Value::Number(n) => n
            .as_u64()
            .ok_or_else(|| Error::warehouse(format!("Unexpected count value: {n}"))),
        Value::String(s) => s
            .parse()
            .map_err(|_| Error::warehouse(format!("Unexpected count value: {s}"))),
        other => Err(Error::warehouse(format!("Unexpected count value: {other}"))),
    }
}
