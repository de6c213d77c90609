//! Resumable step controller
//!
//! `step` processes exactly one queued file through coercion, admission,
//! collision, staging and commit, then hands the updated state back. The
//! caller owns the loop and may stop between any two steps.

use super::types::{RunOptions, Step};
use crate::coerce::coerce_table;
use crate::commit::LoadCommitter;
use crate::error::{Error, Result};
use crate::ingest::{RawTable, TabularReader};
use crate::policy::{admit, check_collision, CollisionDecision};
use crate::profile::SchemaProfile;
use crate::staging::{artifact_key, stage_table, ParquetWriterConfig, StagingArea};
use crate::state::{FileRef, LogEntry, Outcome, ProcessingState};
use crate::types::WriteDisposition;
use crate::warehouse::Warehouse;
use std::sync::Arc;

/// Drives a session's queue one file per `step`
pub struct StepController {
    profile: SchemaProfile,
    options: RunOptions,
    reader: Arc<dyn TabularReader>,
    warehouse: Arc<dyn Warehouse>,
    staging: StagingArea,
    staging_prefix: String,
    committer: LoadCommitter,
    parquet: ParquetWriterConfig,
}

/// Per-file result before it is folded into the state
struct FileResult {
    outcome: Outcome,
    replaced: bool,
}

impl StepController {
    /// Create a controller for one profile and set of options
    pub fn new(
        profile: SchemaProfile,
        options: RunOptions,
        reader: Arc<dyn TabularReader>,
        warehouse: Arc<dyn Warehouse>,
        staging: StagingArea,
        staging_prefix: impl Into<String>,
    ) -> Result<Self> {
        options.validate(&profile)?;
        let committer = LoadCommitter::new(Arc::clone(&warehouse), staging.clone());

        Ok(Self {
            profile,
            options,
            reader,
            warehouse,
            staging,
            staging_prefix: staging_prefix.into().trim_matches('/').to_string(),
            committer,
            parquet: ParquetWriterConfig::default(),
        })
    }

    /// Override the Parquet settings used for staged artifacts
    #[must_use]
    pub fn with_parquet_config(mut self, config: ParquetWriterConfig) -> Self {
        self.parquet = config;
        self
    }

    /// The active profile
    pub fn profile(&self) -> &SchemaProfile {
        &self.profile
    }

    /// Verify warehouse and staging access before any file is processed
    pub async fn preflight(&self) -> Result<()> {
        self.warehouse.check().await.map_err(as_auth)?;
        self.staging.check(&self.staging_prefix).await.map_err(as_auth)?;

        tracing::info!(
            profile = %self.profile.name,
            table = %self.profile.target_table,
            staging = %self.staging.uri(&self.staging_prefix),
            "Preflight passed"
        );
        Ok(())
    }

    /// Advance the state by one file
    pub async fn step(&self, mut state: ProcessingState) -> (ProcessingState, Step) {
        if state.is_complete() {
            if state.running {
                self.finish(&mut state);
            }
            return (state, Step::Done);
        }

        let index = state.index;
        let file = state.queue[index].clone();
        state.running = true;

        tracing::info!(
            file = %file.name(),
            index = index + 1,
            total = state.total(),
            "Processing file"
        );

        match self.process(&file, &state).await {
            Ok(result) => {
                if result.replaced {
                    state.table_replaced = true;
                }
                state.log.push(LogEntry::file(&file, result.outcome));
            }
            Err(e) if !e.is_fatal() => {
                tracing::warn!(file = %file.name(), error = %e, "File failed, continuing");
                state.log.push(LogEntry::file(&file, Outcome::Failed { error: e.to_string() }));
            }
            Err(e) => {
                tracing::error!(file = %file.name(), error = %e, "Fatal error, halting run");
                state.log.push(LogEntry::file(&file, Outcome::Halted { error: e.to_string() }));
                state.running = false;
                return (state, Step::Halted);
            }
        }

        state.index += 1;

        if state.is_complete() {
            self.finish(&mut state);
            (state, Step::Done)
        } else {
            (state, Step::Continue)
        }
    }

    fn finish(&self, state: &mut ProcessingState) {
        let summary = LogEntry::run(state.summary());
        tracing::info!(
            profile = %self.profile.name,
            table = %self.profile.target_table,
            "{summary}"
        );
        state.log.push(summary);
        state.running = false;
    }

    /// Run one file's full pipeline
    async fn process(&self, file: &FileRef, state: &ProcessingState) -> Result<FileResult> {
        let raw = self.read(file).await?;
        let typed = coerce_table(&raw, &self.profile);
        tracing::debug!(
            file = %file.name(),
            rows = typed.num_rows(),
            columns = typed.fields.len(),
            "Coerced"
        );

        // Admission
        let (table, dropped) = match (&self.profile.date_field, self.options.cutoff) {
            (Some(date_field), Some(cutoff)) if self.profile.date_filter_enabled => {
                let admission = admit(typed, date_field, cutoff);
                if admission.dropped > 0 {
                    tracing::info!(
                        file = %file.name(),
                        dropped = admission.dropped,
                        %cutoff,
                        "Rows dropped by cutoff"
                    );
                }
                (admission.table, admission.dropped)
            }
            _ => (typed, 0),
        };

        if table.is_empty() {
            tracing::info!(file = %file.name(), dropped, "No rows admitted");
            return Ok(FileResult {
                outcome: Outcome::NoRowsAdmitted { dropped },
                replaced: false,
            });
        }

        // Collision
        let mut overwritten = 0;
        let mut unverified = false;
        if let (true, Some(date_field)) =
            (self.profile.collision_check_enabled, &self.profile.date_field)
        {
            match check_collision(
                self.warehouse.as_ref(),
                &self.profile.target_table,
                date_field,
                &table,
                self.options.overwrite,
            )
            .await?
            {
                CollisionDecision::Proceed => {}
                CollisionDecision::Overwrite { deleted, .. } => overwritten = deleted,
                CollisionDecision::Unverified { .. } => unverified = true,
                CollisionDecision::Skip { window } => {
                    return Ok(FileResult {
                        outcome: Outcome::SkippedDuplicate { window },
                        replaced: false,
                    });
                }
            }
        }

        // Stage into a clean namespace
        self.staging.clear_prefix(&self.staging_prefix).await?;
        let run_prefix = format!("{}/{}", self.staging_prefix, state.run_id);
        let key = artifact_key(&self.staging_prefix, &state.run_id, state.index, file.path());
        let artifact = stage_table(&self.staging, &key, &table, &self.parquet).await?;
        tracing::info!(file = %file.name(), uri = %artifact.uri, rows = artifact.rows, "Staged");

        // Commit
        let disposition = LoadCommitter::disposition_for(&self.profile, state.table_replaced);
        let stats = self
            .committer
            .commit(&self.profile, &run_prefix, disposition)
            .await?;

        Ok(FileResult {
            outcome: Outcome::Loaded {
                rows: stats.rows_loaded,
                dropped,
                disposition,
                overwritten,
                unverified,
            },
            replaced: disposition == WriteDisposition::Replace,
        })
    }

    /// Read a file off the async runtime
    async fn read(&self, file: &FileRef) -> Result<RawTable> {
        let reader = Arc::clone(&self.reader);
        let path = file.path().to_path_buf();
        let label = file.name();

        tokio::task::spawn_blocking(move || reader.read(&path))
            .await
            .map_err(|e| Error::unreadable(label, format!("Reader aborted: {e}")))?
    }
}

fn as_auth(error: Error) -> Error {
    match error {
        Error::Auth { .. } => error,
        other => Error::auth(other.to_string()),
    }
}
