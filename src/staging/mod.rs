//! Staging writer
//!
//! Serializes one file's admitted rows to a Parquet artifact and places it
//! in the shared staging namespace.
//!
//! # Overview
//!
//! - `typed_to_batch` - typed table to Arrow, schema from the declared fields
//! - `write_parquet_bytes` - in-memory Parquet serialization
//! - `StagingArea` - object store wrapper (GCS, S3, R2, Azure, local)
//! - `stage_table` - all of the above for one file

mod batch;
mod store;
mod writer;

pub use batch::{table_schema, typed_to_batch};
pub use store::{artifact_key, StagingArea};
pub use writer::{write_parquet_bytes, ParquetCompression, ParquetWriterConfig};

use crate::coerce::TypedTable;
use crate::error::Result;

/// An artifact placed in the staging namespace
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedArtifact {
    /// Key relative to the staging root
    pub key: String,
    /// Full URI, as the warehouse reads it
    pub uri: String,
    /// Rows in the artifact
    pub rows: usize,
    /// Serialized size
    pub bytes: usize,
}

/// Serialize a typed table and write it under `key`
pub async fn stage_table(
    area: &StagingArea,
    key: &str,
    table: &TypedTable,
    config: &ParquetWriterConfig,
) -> Result<StagedArtifact> {
    let batch = typed_to_batch(table)?;
    let data = write_parquet_bytes(&batch, config)?;
    let bytes = data.len();

    let uri = area.put(key, data).await?;
    tracing::debug!(uri = %uri, rows = batch.num_rows(), bytes, "Staged artifact");

    Ok(StagedArtifact {
        key: key.to_string(),
        uri,
        rows: batch.num_rows(),
        bytes,
    })
}
