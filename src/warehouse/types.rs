//! Warehouse client types and trait

use crate::error::{Error, Result};
use crate::profile::FieldDef;
use crate::types::WriteDisposition;
use async_trait::async_trait;
use serde_json::Value;
use tokio::task::JoinHandle;

/// One result row, column values in select order
pub type Row = Vec<Value>;

/// A bulk load of staged artifacts into a table
#[derive(Debug, Clone)]
pub struct LoadRequest {
    /// Artifact location, e.g. `gs://bucket/staging/*.parquet`
    pub source_glob: String,
    /// Destination table, `dataset.table`
    pub table: String,
    /// Fixed destination schema
    pub fields: Vec<FieldDef>,
    /// Replace or append
    pub disposition: WriteDisposition,
}

/// Outcome of a finished load job
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadStats {
    /// Destination table
    pub table: String,
    /// Rows inserted by this job
    pub rows_loaded: usize,
    /// Disposition the job ran under
    pub disposition: WriteDisposition,
}

enum JobState {
    Running(JoinHandle<Result<LoadStats>>),
    Finished(Result<LoadStats>),
}

/// Handle to a submitted load job
///
/// The load is all-or-nothing; `wait` reports its final outcome.
pub struct LoadJob {
    state: JobState,
}

impl LoadJob {
    /// Wrap a running background job
    pub fn spawned(handle: JoinHandle<Result<LoadStats>>) -> Self {
        Self {
            state: JobState::Running(handle),
        }
    }

    /// A job whose outcome is already known
    pub fn finished(result: Result<LoadStats>) -> Self {
        Self {
            state: JobState::Finished(result),
        }
    }

    /// Block until the job completes
    pub async fn wait(self) -> Result<LoadStats> {
        match self.state {
            JobState::Finished(result) => result,
            JobState::Running(handle) => handle
                .await
                .map_err(|e| Error::warehouse(format!("Load job aborted: {e}")))?,
        }
    }
}

impl std::fmt::Debug for LoadJob {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = match self.state {
            JobState::Running(_) => "running",
            JobState::Finished(_) => "finished",
        };
        f.debug_struct("LoadJob").field("state", &state).finish()
    }
}

/// Destination warehouse client
#[async_trait]
pub trait Warehouse: Send + Sync {
    /// Verify connectivity and credentials
    async fn check(&self) -> Result<()>;

    /// Run a query and return all rows
    async fn query(&self, sql: &str) -> Result<Vec<Row>>;

    /// Run a statement and return the number of affected rows
    async fn execute(&self, sql: &str) -> Result<usize>;

    /// Submit a bulk load under the request's fixed schema and disposition
    async fn bulk_load(&self, request: LoadRequest) -> Result<LoadJob>;
}
