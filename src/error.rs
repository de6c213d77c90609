//! Error types for the uploader
//!
//! This module defines the error hierarchy for the whole crate.
//! All public APIs return `Result<T, Error>` where Error is defined here.
//!
//! Per-file problems (an unreadable input file) are recoverable and the
//! queue moves on. Anything that touches the staging namespace or the
//! destination table is fatal for the run, see [`Error::is_fatal`].

use thiserror::Error;

/// The main error type for the uploader
#[derive(Error, Debug)]
pub enum Error {
    // ============================================================================
    // Configuration Errors
    // ============================================================================
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Missing required config field: {field}")]
    MissingConfigField { field: String },

    #[error("Invalid config value for '{field}': {message}")]
    InvalidConfigValue { field: String, message: String },

    #[error("Failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    // ============================================================================
    // Authentication Errors
    // ============================================================================
    #[error("Authentication failed: {message}")]
    Auth { message: String },

    // ============================================================================
    // Ingestion Errors
    // ============================================================================
    #[error("Unreadable file '{path}': {message}")]
    UnreadableFile { path: String, message: String },

    // ============================================================================
    // Arrow/Parquet Errors
    // ============================================================================
    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    #[error("Parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    #[error("Output error: {message}")]
    Output { message: String },

    // ============================================================================
    // Staging & Warehouse Errors
    // ============================================================================
    #[error("Staging error: {message}")]
    Staging { message: String },

    #[error("Warehouse error: {message}")]
    Warehouse { message: String },

    #[error("Commit to '{table}' failed: {message}")]
    Commit { table: String, message: String },

    // ============================================================================
    // State Errors
    // ============================================================================
    #[error("State error: {message}")]
    State { message: String },

    // ============================================================================
    // I/O Errors
    // ============================================================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("File not found: {path}")]
    FileNotFound { path: String },

    // ============================================================================
    // Generic Errors
    // ============================================================================
    #[error("{0}")]
    Other(String),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

impl Error {
    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a missing field error
    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::MissingConfigField {
            field: field.into(),
        }
    }

    /// Create an invalid value error
    pub fn invalid_value(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidConfigValue {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create an auth error
    pub fn auth(message: impl Into<String>) -> Self {
        Self::Auth {
            message: message.into(),
        }
    }

    /// Create an unreadable file error
    pub fn unreadable(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::UnreadableFile {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create an output error
    pub fn output(message: impl Into<String>) -> Self {
        Self::Output {
            message: message.into(),
        }
    }

    /// Create a staging error
    pub fn staging(message: impl Into<String>) -> Self {
        Self::Staging {
            message: message.into(),
        }
    }

    /// Create a warehouse error
    pub fn warehouse(message: impl Into<String>) -> Self {
        Self::Warehouse {
            message: message.into(),
        }
    }

    /// Create a commit error
    pub fn commit(table: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Commit {
            table: table.into(),
            message: message.into(),
        }
    }

    /// Create a state error
    pub fn state(message: impl Into<String>) -> Self {
        Self::State {
            message: message.into(),
        }
    }

    /// Whether this error must halt the run instead of skipping one file
    pub fn is_fatal(&self) -> bool {
        match self {
            Error::UnreadableFile { .. } | Error::FileNotFound { .. } => false,
            Error::Staging { .. }
            | Error::Warehouse { .. }
            | Error::Commit { .. }
            | Error::Auth { .. } => true,
            // Serialization of one file's rows failing is confined to that file
            Error::Arrow(_) | Error::Parquet(_) | Error::Output { .. } => false,
            _ => true,
        }
    }
}

/// Result type alias for the uploader
pub type Result<T> = std::result::Result<T, Error>;

/// Extension trait for adding context to errors
pub trait ResultExt<T> {
    /// Add context to an error
    fn context(self, message: impl Into<String>) -> Result<T>;

    /// Add context with a closure (lazy evaluation)
    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T>;
}

impl<T, E: Into<Error>> ResultExt<T> for std::result::Result<T, E> {
    fn context(self, message: impl Into<String>) -> Result<T> {
        self.map_err(|e| {
            let inner = e.into();
            Error::Other(format!("{}: {}", message.into(), inner))
        })
    }

    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T> {
        self.map_err(|e| {
            let inner = e.into();
            Error::Other(format!("{}: {}", f(), inner))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::config("test message");
        assert_eq!(err.to_string(), "Configuration error: test message");

        let err = Error::missing_field("staging.url");
        assert_eq!(err.to_string(), "Missing required config field: staging.url");

        let err = Error::unreadable("jan.xlsx", "not a workbook");
        assert_eq!(err.to_string(), "Unreadable file 'jan.xlsx': not a workbook");

        let err = Error::commit("pma.berjalan", "job failed");
        assert_eq!(err.to_string(), "Commit to 'pma.berjalan' failed: job failed");
    }

    #[test]
    fn test_is_fatal() {
        assert!(Error::commit("t", "boom").is_fatal());
        assert!(Error::staging("put failed").is_fatal());
        assert!(Error::warehouse("delete failed").is_fatal());
        assert!(Error::auth("bad key").is_fatal());

        assert!(!Error::unreadable("a.csv", "garbage").is_fatal());
        assert!(!Error::output("empty batch").is_fatal());
        assert!(!Error::FileNotFound {
            path: "missing.csv".to_string()
        }
        .is_fatal());
    }

    #[test]
    fn test_result_context() {
        let result: Result<()> = Err(Error::config("inner"));
        let with_context = result.context("outer");
        assert!(with_context
            .unwrap_err()
            .to_string()
            .contains("outer: Configuration error: inner"));
    }
}
