//! Uploader configuration
//!
//! Where staged artifacts go, how they are encoded, which warehouse receives
//! them, and where the session is persisted. Loaded from a YAML or JSON file; every field has a
//! default so an empty file (or no file at all) is a valid configuration.

use crate::error::{Error, Result};
use crate::staging::ParquetWriterConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

// ============================================================================
// Top-Level Config
// ============================================================================

/// Complete uploader configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploaderConfig {
    /// Staging namespace settings
    #[serde(default)]
    pub staging: StagingConfig,

    /// Encoding of staged Parquet artifacts
    #[serde(default)]
    pub parquet: ParquetWriterConfig,

    /// Destination warehouse settings
    #[serde(default)]
    pub warehouse: WarehouseConfig,

    /// Service-account key file for the object store
    #[serde(default)]
    pub credentials: Option<PathBuf>,

    /// Session file location
    #[serde(default = "default_state_path")]
    pub state_path: PathBuf,
}

impl Default for UploaderConfig {
    fn default() -> Self {
        Self {
            staging: StagingConfig::default(),
            parquet: ParquetWriterConfig::default(),
            warehouse: WarehouseConfig::default(),
            credentials: None,
            state_path: default_state_path(),
        }
    }
}

fn default_state_path() -> PathBuf {
    PathBuf::from(".dbase-uploader/session.json")
}

// ============================================================================
// Staging
// ============================================================================

/// Object-store location for staged artifacts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StagingConfig {
    /// Bucket URL (`gs://`, `s3://`, `r2://`, `az://`) or local directory
    #[serde(default = "default_staging_url")]
    pub url: String,

    /// Key prefix owned by the uploader; cleared between files
    #[serde(default = "default_staging_prefix")]
    pub prefix: String,
}

impl Default for StagingConfig {
    fn default() -> Self {
        Self {
            url: default_staging_url(),
            prefix: default_staging_prefix(),
        }
    }
}

fn default_staging_url() -> String {
    "gs://transaksi-upload".to_string()
}

fn default_staging_prefix() -> String {
    "staging".to_string()
}

// ============================================================================
// Warehouse
// ============================================================================

/// Destination warehouse
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WarehouseConfig {
    /// DuckDB database file, or `:memory:`
    #[serde(default = "default_warehouse_path")]
    pub path: String,

    /// Schema used for target tables that are not already qualified
    #[serde(default = "default_dataset")]
    pub dataset: String,
}

impl Default for WarehouseConfig {
    fn default() -> Self {
        Self {
            path: default_warehouse_path(),
            dataset: default_dataset(),
        }
    }
}

fn default_warehouse_path() -> String {
    "warehouse.duckdb".to_string()
}

fn default_dataset() -> String {
    "pma".to_string()
}

// ============================================================================
// Loading
// ============================================================================

impl UploaderConfig {
    /// Load from a YAML or JSON file, picked by extension
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            Error::config(format!("Failed to read config file '{}': {e}", path.display()))
        })?;

        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

        let config = if is_json {
            Self::from_json(&content)?
        } else {
            Self::from_yaml(&content)?
        };
        config.validate()?;
        Ok(config)
    }

    /// Load from the given file, or fall back to defaults
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    /// Parse a YAML document
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Parse a JSON document
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Reject values that would make every run fail later
    pub fn validate(&self) -> Result<()> {
        if self.staging.url.trim().is_empty() {
            return Err(Error::missing_field("staging.url"));
        }
        if self.staging.prefix.trim_matches('/').is_empty() {
            return Err(Error::invalid_value(
                "staging.prefix",
                "must not be empty; the prefix is cleared between files",
            ));
        }
        if self.parquet.row_group_size == 0 {
            return Err(Error::invalid_value(
                "parquet.row_group_size",
                "must be at least 1",
            ));
        }
        if self.warehouse.path.trim().is_empty() {
            return Err(Error::missing_field("warehouse.path"));
        }
        if self.warehouse.dataset.trim().is_empty() {
            return Err(Error::missing_field("warehouse.dataset"));
        }
        Ok(())
    }

    /// Prefix a bare table name with the configured dataset
    pub fn qualify_table(&self, table: &str) -> String {
        if table.contains('.') {
            table.to_string()
        } else {
            format!("{}.{table}", self.warehouse.dataset)
        }
    }
}
