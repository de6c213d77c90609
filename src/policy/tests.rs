//! Tests for collision policy

use super::*;
use crate::coerce::{TypedTable, TypedValue};
use crate::error::{Error, Result};
use crate::profile::FieldDef;
use crate::types::SemanticType;
use crate::warehouse::{DuckDbWarehouse, LoadJob, LoadRequest, Row, Warehouse};
use async_trait::async_trait;
use chrono::NaiveDate;
use pretty_assertions::assert_eq;
use serde_json::json;

fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn dated(dates: &[Option<NaiveDate>]) -> TypedTable {
    TypedTable::new(
        vec![FieldDef::new("tgl", SemanticType::Date)],
        dates.iter().map(|d| vec![TypedValue::Date(*d)]).collect(),
    )
}

async fn seeded_history() -> DuckDbWarehouse {
    let wh = DuckDbWarehouse::open_in_memory().unwrap();
    wh.execute("CREATE SCHEMA pma").await.unwrap();
    wh.execute("CREATE TABLE pma.history (tgl DATE, qty DOUBLE)")
        .await
        .unwrap();
    wh.execute(
        "INSERT INTO pma.history VALUES \
         (DATE '2024-01-04', 1), (DATE '2024-01-05', 2), (DATE '2024-01-05', 3)",
    )
    .await
    .unwrap();
    wh
}

/// Warehouse whose every call fails
struct BrokenWarehouse;

#[async_trait]
impl Warehouse for BrokenWarehouse {
    async fn check(&self) -> Result<()> {
        Err(Error::auth("offline"))
    }
    async fn query(&self, _sql: &str) -> Result<Vec<Row>> {
        Err(Error::warehouse("Table pma.history does not exist"))
    }
    async fn execute(&self, _sql: &str) -> Result<usize> {
        Err(Error::warehouse("offline"))
    }
    async fn bulk_load(&self, _request: LoadRequest) -> Result<LoadJob> {
        Err(Error::warehouse("offline"))
    }
}

/// Warehouse that reports overlap but cannot delete
struct ReadOnlyWarehouse;

#[async_trait]
impl Warehouse for ReadOnlyWarehouse {
    async fn check(&self) -> Result<()> {
        Ok(())
    }
    async fn query(&self, _sql: &str) -> Result<Vec<Row>> {
        Ok(vec![vec![json!(4)]])
    }
    async fn execute(&self, _sql: &str) -> Result<usize> {
        Err(Error::warehouse("permission denied"))
    }
    async fn bulk_load(&self, _request: LoadRequest) -> Result<LoadJob> {
        Err(Error::warehouse("permission denied"))
    }
}

// ============================================================================
// Window Tests
// ============================================================================

#[test]
fn test_date_span_ignores_nulls() {
    let table = dated(&[Some(ymd(2024, 1, 7)), None, Some(ymd(2024, 1, 2)), Some(ymd(2024, 1, 5))]);
    assert_eq!(date_span(&table, "tgl"), Some((ymd(2024, 1, 2), ymd(2024, 1, 7))));
}

#[test]
fn test_date_span_without_dates() {
    assert_eq!(date_span(&dated(&[None, None]), "tgl"), None);
    assert_eq!(date_span(&dated(&[Some(ymd(2024, 1, 1))]), "other"), None);
}

#[test]
fn test_window_display() {
    let window = CollisionWindow {
        min_date: ymd(2024, 1, 5),
        max_date: ymd(2024, 1, 6),
        existing_count: 2,
    };
    assert_eq!(window.to_string(), "[2024-01-05 .. 2024-01-06] (2 existing rows)");
}

// ============================================================================
// Decision Tests
// ============================================================================

#[tokio::test]
async fn test_no_overlap_proceeds() {
    let wh = seeded_history().await;
    let decision = check_collision(&wh, "pma.history", "tgl", &dated(&[Some(ymd(2024, 2, 1))]), false)
        .await
        .unwrap();
    assert_eq!(decision, CollisionDecision::Proceed);
}

#[tokio::test]
async fn test_overlap_without_overwrite_skips() {
    let wh = seeded_history().await;
    let decision = check_collision(&wh, "pma.history", "tgl", &dated(&[Some(ymd(2024, 1, 5))]), false)
        .await
        .unwrap();

    assert_eq!(
        decision,
        CollisionDecision::Skip {
            window: CollisionWindow {
                min_date: ymd(2024, 1, 5),
                max_date: ymd(2024, 1, 5),
                existing_count: 2,
            }
        }
    );
    assert!(!decision.proceeds());

    // Nothing was touched
    let rows = wh.query("SELECT COUNT(*) FROM pma.history").await.unwrap();
    assert_eq!(rows, vec![vec![json!(3)]]);
}

#[tokio::test]
async fn test_overlap_with_overwrite_deletes_only_the_window() {
    let wh = seeded_history().await;
    let decision = check_collision(&wh, "pma.history", "tgl", &dated(&[Some(ymd(2024, 1, 5))]), true)
        .await
        .unwrap();

    match &decision {
        CollisionDecision::Overwrite { window, deleted } => {
            assert_eq!(window.existing_count, 2);
            assert_eq!(*deleted, 2);
        }
        other => panic!("expected overwrite, got {other:?}"),
    }
    assert!(decision.proceeds());

    let rows = wh.query("SELECT tgl FROM pma.history").await.unwrap();
    assert_eq!(rows, vec![vec![json!("2024-01-04")]]);
}

#[tokio::test]
async fn test_missing_table_is_unverified() {
    let wh = DuckDbWarehouse::open_in_memory().unwrap();
    let decision = check_collision(&wh, "pma.history", "tgl", &dated(&[Some(ymd(2024, 1, 5))]), false)
        .await
        .unwrap();

    assert!(matches!(decision, CollisionDecision::Unverified { .. }));
    assert!(decision.proceeds());
}

#[tokio::test]
async fn test_probe_failure_is_unverified() {
    let decision = check_collision(
        &BrokenWarehouse,
        "pma.history",
        "tgl",
        &dated(&[Some(ymd(2024, 1, 5))]),
        true,
    )
    .await
    .unwrap();

    match decision {
        CollisionDecision::Unverified { reason } => assert!(reason.contains("does not exist")),
        other => panic!("expected unverified, got {other:?}"),
    }
}

#[tokio::test]
async fn test_undated_file_proceeds_without_probe() {
    // The broken warehouse would otherwise yield Unverified
    let decision = check_collision(&BrokenWarehouse, "pma.history", "tgl", &dated(&[None]), false)
        .await
        .unwrap();
    assert_eq!(decision, CollisionDecision::Proceed);
}

#[tokio::test]
async fn test_failed_overwrite_delete_is_fatal() {
    let err = check_collision(
        &ReadOnlyWarehouse,
        "pma.history",
        "tgl",
        &dated(&[Some(ymd(2024, 1, 5))]),
        true,
    )
    .await
    .unwrap_err();

    assert!(err.is_fatal());
}
