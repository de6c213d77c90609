//! Load committer
//!
//! Bulk-loads everything under a staging prefix into the profile's target
//! table, then clears the prefix.

use crate::error::{Error, Result};
use crate::profile::SchemaProfile;
use crate::staging::StagingArea;
use crate::types::WriteDisposition;
use crate::warehouse::{LoadRequest, LoadStats, Warehouse};
use std::sync::Arc;

/// Commits staged artifacts to the destination table
#[derive(Clone)]
pub struct LoadCommitter {
    warehouse: Arc<dyn Warehouse>,
    staging: StagingArea,
}

impl LoadCommitter {
    /// Create a committer over a warehouse and a staging area
    pub fn new(warehouse: Arc<dyn Warehouse>, staging: StagingArea) -> Self {
        Self { warehouse, staging }
    }

    /// Disposition for the next commit of a run
    ///
    /// A Replace profile wipes the table on its first commit only; every
    /// later commit of the same run appends.
    pub fn disposition_for(profile: &SchemaProfile, table_replaced: bool) -> WriteDisposition {
        match profile.default_write_policy {
            WriteDisposition::Replace if !table_replaced => WriteDisposition::Replace,
            _ => WriteDisposition::Append,
        }
    }

    /// Load every artifact under `prefix` and wait for the job
    ///
    /// Any failure is a `Commit` error. Staged artifacts are only removed
    /// after a successful load.
    pub async fn commit(
        &self,
        profile: &SchemaProfile,
        prefix: &str,
        disposition: WriteDisposition,
    ) -> Result<LoadStats> {
        let table = profile.target_table.as_str();

        let staged = self
            .staging
            .list_by_prefix(prefix)
            .await
            .map_err(|e| Error::commit(table, e.to_string()))?;
        if staged.is_empty() {
            return Err(Error::commit(table, format!("No staged artifacts under {prefix}")));
        }

        let request = LoadRequest {
            source_glob: self.staging.parquet_glob(prefix),
            table: table.to_string(),
            fields: profile.fields.clone(),
            disposition,
        };

        tracing::info!(
            table,
            %disposition,
            artifacts = staged.len(),
            source = %request.source_glob,
            "Committing staged artifacts"
        );

        let job = self
            .warehouse
            .bulk_load(request)
            .await
            .map_err(|e| Error::commit(table, e.to_string()))?;
        let stats = job
            .wait()
            .await
            .map_err(|e| Error::commit(table, e.to_string()))?;

        tracing::info!(table, rows = stats.rows_loaded, %disposition, "Load committed");

        match self.staging.clear_prefix(prefix).await {
            Ok(_) => {}
            Err(e) => tracing::warn!(prefix, error = %e, "Failed to clear staging after commit"),
        }

        Ok(stats)
    }
}
