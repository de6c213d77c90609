//! End-to-end pipeline tests
//!
//! CSV files → coercion → admission/collision → local Parquet staging →
//! in-memory DuckDB, driven one `step()` at a time like the CLI does.

use chrono::NaiveDate;
use dbase_uploader::cli::Pipeline;
use dbase_uploader::controller::{RunOptions, Step};
use dbase_uploader::profile::load_profile;
use dbase_uploader::staging::{ParquetCompression, StagingArea};
use dbase_uploader::state::{FileRef, Outcome, Phase, ProcessingState, Session, StateManager};
use dbase_uploader::warehouse::{DuckDbWarehouse, Row, Warehouse};
use dbase_uploader::UploaderConfig;
use pretty_assertions::assert_eq;
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::{tempdir, TempDir};

struct Harness {
    dir: TempDir,
    pipeline: Pipeline,
}

impl Harness {
    fn new() -> Self {
        Self::with_config(UploaderConfig::default())
    }

    fn with_config(mut config: UploaderConfig) -> Self {
        let dir = tempdir().unwrap();
        config.staging.url = dir.path().join("bucket").display().to_string();
        config.warehouse.path = ":memory:".to_string();

        let staging = StagingArea::parse(&config.staging.url, None).unwrap();
        let warehouse = Arc::new(DuckDbWarehouse::open_in_memory().unwrap());
        let pipeline = Pipeline::from_parts(config, warehouse, staging);
        Self { dir, pipeline }
    }

    fn file(&self, name: &str, body: &str) -> FileRef {
        let path = self.dir.path().join(name);
        std::fs::write(&path, body).unwrap();
        FileRef::new(path)
    }

    fn session_path(&self) -> PathBuf {
        self.dir.path().join("state").join("session.json")
    }

    /// Run a whole queue to completion, stepping until not `Continue`
    async fn run(&self, profile: &str, options: RunOptions, queue: Vec<FileRef>) -> ProcessingState {
        let controller = self
            .pipeline
            .controller(load_profile(profile).unwrap(), options)
            .unwrap();
        controller.preflight().await.unwrap();

        let mut state = ProcessingState::new(queue);
        loop {
            let (next, step) = controller.step(state).await;
            state = next;
            if step != Step::Continue {
                return state;
            }
        }
    }

    async fn query(&self, sql: &str) -> Vec<Row> {
        self.pipeline.warehouse().query(sql).await.unwrap()
    }
}

fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn daily() -> RunOptions {
    RunOptions::new().with_cutoff(ymd(2024, 2, 9))
}

// ============================================================================
// Coercion Through The Whole Pipeline
// ============================================================================

#[tokio::test]
async fn test_headers_and_values_land_in_fixed_schema() {
    let h = Harness::new();
    let file = h.file(
        "daily.csv",
        concat!(
            "TGL,  Kode Outlet ,Channel,QTY,NO FAKTUR,DESCRIPTION,Notes\n",
            "2024-01-05,OUT1, rk ,\"1,000\",123.0,nan,ignore me\n",
            "2024-01-06,OUT2,gt,abc,F-2,Teh Botol,\n",
        ),
    );

    let state = h.run("daily", daily(), vec![file]).await;
    assert_eq!(state.phase(), Phase::Completed);

    let rows = h
        .query(
            "SELECT CAST(tgl AS VARCHAR), kode_outlet, channel, qty, no_faktur, description, value \
             FROM pma.berjalan ORDER BY kode_outlet",
        )
        .await;
    assert_eq!(
        rows,
        vec![
            vec![
                json!("2024-01-05"),
                json!("OUT1"),
                json!("RK"),
                json!(1000.0),
                json!("123"),
                json!(""),
                json!(null)
            ],
            vec![
                json!("2024-01-06"),
                json!("OUT2"),
                json!("GT"),
                json!(0.0),
                json!("F-2"),
                json!("Teh Botol"),
                json!(null)
            ],
        ]
    );

    // Unmapped headers never become columns
    let notes = h
        .query(
            "SELECT COUNT(*) FROM information_schema.columns \
             WHERE table_schema = 'pma' AND table_name = 'berjalan' AND column_name = 'notes'",
        )
        .await;
    assert_eq!(notes, vec![vec![json!(0)]]);
}

#[tokio::test]
async fn test_configured_parquet_encoding_loads() {
    let mut config = UploaderConfig::default();
    config.parquet.compression = ParquetCompression::Zstd;
    config.parquet.row_group_size = 1;
    config.parquet.dictionary = false;
    let h = Harness::with_config(config);

    let file = h.file(
        "jan.csv",
        "TGL,KODE OUTLET,QTY\n2024-01-05,OUT1,1\n2024-01-06,OUT2,2\n2024-01-07,OUT3,3\n",
    );
    let state = h.run("daily", daily(), vec![file]).await;
    assert!(matches!(state.log[0].outcome, Outcome::Loaded { rows: 3, .. }));

    let rows = h.query("SELECT SUM(qty) FROM pma.berjalan").await;
    assert_eq!(rows, vec![vec![json!(6.0)]]);
}

// ============================================================================
// Admission
// ============================================================================

#[tokio::test]
async fn test_cutoff_drops_late_and_undated_rows() {
    let h = Harness::new();
    let file = h.file(
        "feb.csv",
        concat!(
            "TGL,KODE OUTLET,QTY\n",
            "2024-02-09,OUT1,1\n",
            "2024-02-10,OUT2,2\n",
            "not a date,OUT3,3\n",
        ),
    );

    let state = h.run("daily", daily(), vec![file]).await;
    assert!(matches!(
        state.log[0].outcome,
        Outcome::Loaded {
            rows: 1,
            dropped: 2,
            ..
        }
    ));

    let rows = h.query("SELECT kode_outlet FROM pma.berjalan").await;
    assert_eq!(rows, vec![vec![json!("OUT1")]]);
}

// ============================================================================
// Collision Policy
// ============================================================================

#[tokio::test]
async fn test_duplicate_window_skipped_then_overwritten() {
    let h = Harness::new();
    let seed = h.file(
        "seed.csv",
        "TGL,KODE OUTLET,QTY\n2024-01-05,OLD1,1\n2024-01-05,OLD2,2\n2024-01-06,KEEP,3\n",
    );
    h.run("backfill", RunOptions::new(), vec![seed]).await;

    let rerun = h.file("jan5.csv", "TGL,KODE OUTLET,QTY\n2024-01-05,NEW1,9\n");

    // Overwrite off: nothing staged, one skip entry
    let state = h.run("backfill", RunOptions::new(), vec![rerun.clone()]).await;
    match &state.log[0].outcome {
        Outcome::SkippedDuplicate { window } => {
            assert_eq!(window.min_date, ymd(2024, 1, 5));
            assert_eq!(window.max_date, ymd(2024, 1, 5));
            assert_eq!(window.existing_count, 2);
        }
        other => panic!("expected a skip, got {other:?}"),
    }
    assert_eq!(h.query("SELECT COUNT(*) FROM pma.history").await, vec![vec![json!(3)]]);

    // Overwrite on: the day's rows are replaced, the neighbour survives
    let state = h
        .run("backfill", RunOptions::new().with_overwrite(true), vec![rerun])
        .await;
    assert!(matches!(
        state.log[0].outcome,
        Outcome::Loaded {
            rows: 1,
            overwritten: 2,
            ..
        }
    ));
    let rows = h
        .query("SELECT kode_outlet FROM pma.history ORDER BY kode_outlet")
        .await;
    assert_eq!(rows, vec![vec![json!("KEEP")], vec![json!("NEW1")]]);
}

// ============================================================================
// Replace Policy
// ============================================================================

#[tokio::test]
async fn test_replace_is_idempotent_across_runs() {
    let h = Harness::new();
    let file = h.file(
        "master.csv",
        "KD OUTLET,NAMA OUTLET,PMA\nOUT1,Toko A,pma1\nOUT2,Toko B,pma2\n",
    );
    let snapshot = "SELECT kode_outlet, nama_outlet, pma FROM pma.master_outlet ORDER BY kode_outlet";

    h.run("master", RunOptions::new(), vec![file.clone()]).await;
    let first = h.query(snapshot).await;

    h.run("master", RunOptions::new(), vec![file]).await;
    let second = h.query(snapshot).await;

    assert_eq!(first, second);
    assert_eq!(
        first,
        vec![
            vec![json!("OUT1"), json!("Toko A"), json!("PMA1")],
            vec![json!("OUT2"), json!("Toko B"), json!("PMA2")],
        ]
    );
}

#[tokio::test]
async fn test_replace_wipes_only_on_first_file_of_run() {
    let h = Harness::new();
    let stale = h.file("stale.csv", "TGL,KODE OUTLET,QTY\n2024-01-01,STALE,1\n");
    h.run("daily", daily(), vec![stale]).await;

    let queue = vec![
        h.file("a.csv", "TGL,KODE OUTLET,QTY\n2024-01-05,A,1\n"),
        h.file("b.csv", "TGL,KODE OUTLET,QTY\n2024-01-06,B,2\n"),
    ];
    h.run("daily", daily(), queue).await;

    let rows = h
        .query("SELECT kode_outlet FROM pma.berjalan ORDER BY kode_outlet")
        .await;
    assert_eq!(rows, vec![vec![json!("A")], vec![json!("B")]]);
}

// ============================================================================
// Resumable Sessions
// ============================================================================

#[tokio::test]
async fn test_three_files_across_invocations_then_reset() {
    let h = Harness::new();
    let queue = vec![
        h.file("1.csv", "TGL,KODE OUTLET,QTY\n2024-01-01,A,1\n"),
        h.file("2.csv", "TGL,KODE OUTLET,QTY\n2024-01-02,B,1\n"),
        h.file("3.csv", "TGL,KODE OUTLET,QTY\n2024-01-03,C,1\n"),
    ];

    let manager = StateManager::from_file(h.session_path()).unwrap();
    manager
        .start(Session::new(load_profile("daily").unwrap(), daily(), queue))
        .await
        .unwrap();

    // Each step is a fresh "process": reload the session, rebuild the controller
    let mut steps = Vec::new();
    for _ in 0..3 {
        let manager = StateManager::from_file(h.session_path()).unwrap();
        let session = manager.require_session().await.unwrap();
        let controller = h.pipeline.controller(session.profile, session.options).unwrap();

        let (next, step) = controller.step(session.state).await;
        manager.update_state(next).await.unwrap();
        steps.push(step);
    }
    assert_eq!(steps, vec![Step::Continue, Step::Continue, Step::Done]);

    let manager = StateManager::from_file(h.session_path()).unwrap();
    let state = manager.state().await;
    assert_eq!(state.index, 3);
    assert_eq!(state.phase(), Phase::Completed);
    assert!(matches!(
        state.log.last().map(|e| &e.outcome),
        Some(Outcome::Summary { loaded: 3, .. })
    ));
    assert_eq!(h.query("SELECT COUNT(*) FROM pma.berjalan").await, vec![vec![json!(3)]]);

    manager.reset().await.unwrap();
    let view = StateManager::from_file(h.session_path())
        .unwrap()
        .state()
        .await
        .view();
    assert_eq!(view.index, 0);
    assert!(!view.running);
    assert!(view.log.is_empty());
}
