//! Parquet serialization of staged batches
//!
//! Settings come from the `parquet:` section of the uploader configuration.

use crate::error::{Error, Result};
use arrow::record_batch::RecordBatch;
use bytes::Bytes;
use parquet::arrow::ArrowWriter;
use parquet::basic::{Compression, GzipLevel, ZstdLevel};
use parquet::file::properties::{EnabledStatistics, WriterProperties};
use serde::{Deserialize, Serialize};

/// Codec for staged artifacts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParquetCompression {
    #[default]
    Snappy,
    Zstd,
    Gzip,
    Lz4,
    #[serde(alias = "none")]
    Uncompressed,
}

impl ParquetCompression {
    fn codec(self) -> Compression {
        match self {
            Self::Snappy => Compression::SNAPPY,
            Self::Zstd => Compression::ZSTD(ZstdLevel::default()),
            Self::Gzip => Compression::GZIP(GzipLevel::default()),
            Self::Lz4 => Compression::LZ4_RAW,
            Self::Uncompressed => Compression::UNCOMPRESSED,
        }
    }
}

/// Parquet settings for staged artifacts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParquetWriterConfig {
    #[serde(default)]
    pub compression: ParquetCompression,

    /// Rows per row group; one file rarely fills more than one
    #[serde(default = "default_row_group_size")]
    pub row_group_size: usize,

    #[serde(default = "default_enabled")]
    pub dictionary: bool,

    /// Column min/max statistics in the footer
    #[serde(default = "default_enabled")]
    pub statistics: bool,
}

impl Default for ParquetWriterConfig {
    fn default() -> Self {
        Self {
            compression: ParquetCompression::default(),
            row_group_size: default_row_group_size(),
            dictionary: true,
            statistics: true,
        }
    }
}

fn default_row_group_size() -> usize {
    1024 * 1024
}

fn default_enabled() -> bool {
    true
}

impl ParquetWriterConfig {
    fn properties(&self) -> WriterProperties {
        let statistics = if self.statistics {
            EnabledStatistics::Page
        } else {
            EnabledStatistics::None
        };

        WriterProperties::builder()
            .set_compression(self.compression.codec())
            .set_max_row_group_size(self.row_group_size.max(1))
            .set_dictionary_enabled(self.dictionary)
            .set_statistics_enabled(statistics)
            .build()
    }
}

/// Serialize one RecordBatch into an in-memory Parquet file
pub fn write_parquet_bytes(batch: &RecordBatch, config: &ParquetWriterConfig) -> Result<Bytes> {
    let mut buffer = Vec::with_capacity(batch.get_array_memory_size() / 2);

    let mut writer = ArrowWriter::try_new(&mut buffer, batch.schema(), Some(config.properties()))
        .map_err(|e| Error::output(format!("Failed to create Parquet writer: {e}")))?;
    writer
        .write(batch)
        .map_err(|e| Error::output(format!("Failed to write batch: {e}")))?;
    let metadata = writer
        .close()
        .map_err(|e| Error::output(format!("Failed to close Parquet writer: {e}")))?;

    tracing::trace!(
        rows = metadata.num_rows,
        row_groups = metadata.row_groups.len(),
        bytes = buffer.len(),
        "Encoded Parquet artifact"
    );
    Ok(Bytes::from(buffer))
}
