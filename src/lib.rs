// Allow common clippy pedantic lints that aren't critical for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::struct_excessive_bools)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::unused_async)]

//! # dbase-uploader
//!
//! Profile-driven batch ingestion of spreadsheet and CSV files into a
//! columnar warehouse.
//!
//! ## Features
//!
//! - **Schema Profiles**: header mapping, field types and write policy in YAML
//! - **Total Coercion**: malformed cells become `0.0`, `""` or a null date, never an error
//! - **Cutoff Admission**: date-gated profiles drop rows past the operator's cutoff
//! - **Collision Policy**: backfills skip, or overwrite, date ranges already loaded
//! - **Parquet Staging**: one artifact per file in GCS, S3, R2, Azure or a local directory
//! - **Resumable Steps**: one file per `step()`, state persisted between invocations
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use dbase_uploader::{load_profile, ProcessingState, RunOptions, Step, StepController};
//!
//! let controller = StepController::new(
//!     load_profile("daily")?,
//!     RunOptions::new().with_cutoff(cutoff),
//!     reader,
//!     warehouse,
//!     staging,
//!     "staging",
//! )?;
//! controller.preflight().await?;
//!
//! let mut state = ProcessingState::new(queue);
//! loop {
//!     let (next, step) = controller.step(state).await;
//!     state = next;
//!     if step != Step::Continue {
//!         break;
//!     }
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                        Step Controller                           │
//! │        step(ProcessingState) → (ProcessingState, Step)           │
//! └──────────────────────────────────────────────────────────────────┘
//!                                 │
//! ┌──────────┬──────────┬─────────┴──┬────────────┬─────────────────┐
//! │  Ingest  │  Coerce  │   Policy   │  Staging   │  Commit         │
//! ├──────────┼──────────┼────────────┼────────────┼─────────────────┤
//! │ CSV      │ Headers  │ Cutoff     │ Arrow      │ Replace once    │
//! │ Excel    │ Date     │ Collision  │ Parquet    │ then Append     │
//! │ ODS      │ Number   │ Overwrite  │ Object     │ DuckDB load     │
//! │          │ Text     │            │ store      │ job             │
//! └──────────┴──────────┴────────────┴────────────┴─────────────────┘
//! ```

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types for the uploader
pub mod error;

/// Common types and type aliases
pub mod types;

/// Schema profiles and built-in definitions
pub mod profile;

/// Tabular readers (CSV, spreadsheets)
pub mod ingest;

/// Type coercion engine
pub mod coerce;

/// Admission filter and collision policy
pub mod policy;

/// Parquet staging in an object store
pub mod staging;

/// Destination warehouse (DuckDB)
pub mod warehouse;

/// Load committer
pub mod commit;

/// Processing state and session persistence
pub mod state;

/// Step controller
pub mod controller;

/// Uploader configuration
pub mod config;

/// Command-line interface
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use error::{Error, Result};
pub use types::*;

// Re-export commonly used types
pub use config::UploaderConfig;
pub use controller::{RunOptions, Step, StepController};
pub use profile::{load_profile, SchemaProfile};
pub use state::{FileRef, ProcessingState, Session, StateManager};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
