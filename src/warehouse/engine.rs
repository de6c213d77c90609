//! DuckDB-backed warehouse
//!
//! The destination tables live in a DuckDB database file (or in memory).
//! Staged Parquet artifacts are loaded with `read_parquet`, which also reads
//! from S3/GCS once httpfs is configured.

use super::types::{LoadJob, LoadRequest, LoadStats, Row, Warehouse};
use crate::error::{Error, Result};
use crate::types::{quote_ident, quote_literal, WriteDisposition};
use async_trait::async_trait;
use duckdb::Connection;
use serde_json::Value;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};

/// Warehouse client backed by a DuckDB connection
pub struct DuckDbWarehouse {
    /// DuckDB connection, shared with background load jobs
    conn: Arc<Mutex<Connection>>,
    /// Database location (for logging)
    location: String,
}

impl DuckDbWarehouse {
    /// Open a database file, or an in-memory database for `:memory:`
    pub fn open(path: &str) -> Result<Self> {
        if path == ":memory:" {
            return Self::open_in_memory();
        }

        if let Some(parent) = std::path::Path::new(path).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)
            .map_err(|e| Error::warehouse(format!("Failed to open DuckDB at {path}: {e}")))?;

        tracing::debug!(path, "Opened warehouse");
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            location: path.to_string(),
        })
    }

    /// Open a throwaway in-memory database
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| Error::warehouse(format!("Failed to create DuckDB connection: {e}")))?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            location: ":memory:".to_string(),
        })
    }

    /// Database location
    pub fn location(&self) -> &str {
        &self.location
    }

    /// Configure cloud storage credentials (S3, R2, GCS) so remote staging can be read
    pub fn configure_cloud_storage(&self) -> Result<()> {
        with_conn(&self.conn, |conn| {
            conn.execute_batch("INSTALL httpfs; LOAD httpfs;")
                .map_err(|e| Error::config(format!("Failed to load httpfs extension: {e}")))?;

            // S3 credentials from environment
            if let (Ok(key_id), Ok(secret)) = (
                std::env::var("AWS_ACCESS_KEY_ID"),
                std::env::var("AWS_SECRET_ACCESS_KEY"),
            ) {
                let region =
                    std::env::var("AWS_DEFAULT_REGION").unwrap_or_else(|_| "us-east-1".to_string());
                let mut options = vec![
                    format!("KEY_ID {}", quote_literal(&key_id)),
                    format!("SECRET {}", quote_literal(&secret)),
                    format!("REGION {}", quote_literal(&region)),
                ];

                // Custom endpoint (R2, MinIO, etc.)
                if let Ok(endpoint) = std::env::var("AWS_ENDPOINT") {
                    let host = endpoint
                        .trim_start_matches("https://")
                        .trim_start_matches("http://");
                    options.push(format!("ENDPOINT {}", quote_literal(host)));
                    options.push("URL_STYLE 'path'".to_string());
                }

                conn.execute_batch(&format!(
                    "CREATE OR REPLACE SECRET staging_s3 (TYPE S3, {});",
                    options.join(", ")
                ))
                .map_err(|e| Error::config(format!("Failed to configure S3: {e}")))?;
            }

            // GCS through its S3-compatible HMAC keys
            if let (Ok(key_id), Ok(secret)) = (
                std::env::var("GCS_HMAC_KEY_ID"),
                std::env::var("GCS_HMAC_SECRET"),
            ) {
                conn.execute_batch(&format!(
                    "CREATE OR REPLACE SECRET staging_gcs (TYPE GCS, KEY_ID {}, SECRET {});",
                    quote_literal(&key_id),
                    quote_literal(&secret)
                ))
                .map_err(|e| Error::config(format!("Failed to configure GCS: {e}")))?;
            }

            Ok(())
        })
    }
}

#[async_trait]
impl Warehouse for DuckDbWarehouse {
    async fn check(&self) -> Result<()> {
        with_conn(&self.conn, |conn| {
            conn.execute_batch("SELECT 1")
                .map_err(|e| Error::auth(format!("Warehouse connection check failed: {e}")))
        })
    }

    async fn query(&self, sql: &str) -> Result<Vec<Row>> {
        tracing::debug!(sql, "Executing query");
        with_conn(&self.conn, |conn| query_rows(conn, sql))
    }

    async fn execute(&self, sql: &str) -> Result<usize> {
        tracing::debug!(sql, "Executing statement");
        with_conn(&self.conn, |conn| {
            conn.execute(sql, [])
                .map_err(|e| Error::warehouse(format!("Statement failed: {e}")))
        })
    }

    async fn bulk_load(&self, request: LoadRequest) -> Result<LoadJob> {
        if request.fields.is_empty() {
            return Err(Error::warehouse(format!(
                "No schema given for load into {}",
                request.table
            )));
        }

        let conn = Arc::clone(&self.conn);
        let handle =
            tokio::task::spawn_blocking(move || with_conn(&conn, |conn| run_load(conn, &request)));
        Ok(LoadJob::spawned(handle))
    }
}

fn with_conn<T>(
    conn: &Mutex<Connection>,
    f: impl FnOnce(&mut Connection) -> Result<T>,
) -> Result<T> {
    let mut guard = conn
        .lock()
        .map_err(|_| Error::warehouse("Warehouse connection lock poisoned"))?;
    f(&mut guard)
}

fn query_rows(conn: &Connection, sql: &str) -> Result<Vec<Row>> {
    let mut stmt = conn
        .prepare(sql)
        .map_err(|e| Error::warehouse(format!("Failed to prepare query: {e}")))?;
    let mut rows = stmt
        .query([])
        .map_err(|e| Error::warehouse(format!("Query failed: {e}")))?;

    let mut out = Vec::new();
    while let Some(row) = rows
        .next()
        .map_err(|e| Error::warehouse(format!("Failed to read row: {e}")))?
    {
        let width = row.as_ref().column_count();
        let mut values = Vec::with_capacity(width);
        for idx in 0..width {
            let value: duckdb::types::Value = row
                .get(idx)
                .map_err(|e| Error::warehouse(format!("Failed to read column {idx}: {e}")))?;
            values.push(duckdb_value_to_json(value));
        }
        out.push(values);
    }

    Ok(out)
}

/// Load every artifact matching the glob in a single transaction
fn run_load(conn: &mut Connection, request: &LoadRequest) -> Result<LoadStats> {
    let source = format!(
        "read_parquet({}, union_by_name = true)",
        quote_literal(&request.source_glob)
    );
    let present = staged_columns(conn, &source)?;

    let table = quote_ident(&request.table);
    let column_defs: Vec<String> = request
        .fields
        .iter()
        .map(|f| format!("{} {}", quote_ident(&f.name), f.semantic_type.sql_type()))
        .collect();
    let column_names: Vec<String> = request.fields.iter().map(|f| quote_ident(&f.name)).collect();

    // Columns the artifacts lack load as NULL; every column is cast to its declared type
    let projections: Vec<String> = request
        .fields
        .iter()
        .map(|f| {
            let name = quote_ident(&f.name);
            let ty = f.semantic_type.sql_type();
            if present.contains(&f.name) {
                format!("CAST({name} AS {ty}) AS {name}")
            } else {
                format!("CAST(NULL AS {ty}) AS {name}")
            }
        })
        .collect();

    let tx = conn
        .transaction()
        .map_err(|e| Error::warehouse(format!("Failed to begin load: {e}")))?;

    if let Some((schema, _)) = request.table.rsplit_once('.') {
        tx.execute_batch(&format!("CREATE SCHEMA IF NOT EXISTS {};", quote_ident(schema)))
            .map_err(|e| Error::warehouse(format!("Failed to create schema {schema}: {e}")))?;
    }

    if request.disposition == WriteDisposition::Replace {
        tx.execute_batch(&format!("DROP TABLE IF EXISTS {table};"))
            .map_err(|e| Error::warehouse(format!("Failed to drop {}: {e}", request.table)))?;
    }

    tx.execute_batch(&format!(
        "CREATE TABLE IF NOT EXISTS {table} ({});",
        column_defs.join(", ")
    ))
    .map_err(|e| Error::warehouse(format!("Failed to create {}: {e}", request.table)))?;

    let insert = format!(
        "INSERT INTO {table} ({}) SELECT {} FROM {source}",
        column_names.join(", "),
        projections.join(", ")
    );
    tracing::debug!(sql = %insert, "Loading staged artifacts");

    let rows_loaded = tx
        .execute(&insert, [])
        .map_err(|e| Error::warehouse(format!("Failed to load {}: {e}", request.table)))?;

    tx.commit()
        .map_err(|e| Error::warehouse(format!("Failed to commit load: {e}")))?;

    Ok(LoadStats {
        table: request.table.clone(),
        rows_loaded,
        disposition: request.disposition,
    })
}

/// Column names present across the staged artifacts
fn staged_columns(conn: &Connection, source: &str) -> Result<HashSet<String>> {
    let mut stmt = conn
        .prepare(&format!("DESCRIBE SELECT * FROM {source}"))
        .map_err(|e| Error::warehouse(format!("Failed to read staged artifacts: {e}")))?;

    let columns = stmt
        .query_map([], |row| row.get::<_, String>(0))
        .map_err(|e| Error::warehouse(format!("Failed to read staged artifacts: {e}")))?
        .filter_map(std::result::Result::ok)
        .collect();

    Ok(columns)
}

/// Convert DuckDB Value to JSON Value
pub(crate) fn duckdb_value_to_json(value: duckdb::types::Value) -> Value {
    use duckdb::types::Value as Db;

    match value {
        Db::Null => Value::Null,
        Db::Boolean(b) => Value::Bool(b),
        Db::TinyInt(i) => Value::Number(i.into()),
        Db::SmallInt(i) => Value::Number(i.into()),
        Db::Int(i) => Value::Number(i.into()),
        Db::BigInt(i) => Value::Number(i.into()),
        Db::HugeInt(i) => Value::String(i.to_string()),
        Db::UTinyInt(i) => Value::Number(i.into()),
        Db::USmallInt(i) => Value::Number(i.into()),
        Db::UInt(i) => Value::Number(i.into()),
        Db::UBigInt(i) => Value::Number(i.into()),
        Db::Float(f) => serde_json::Number::from_f64(f64::from(f)).map_or(Value::Null, Value::Number),
        Db::Double(f) => serde_json::Number::from_f64(f).map_or(Value::Null, Value::Number),
        Db::Text(s) => Value::String(s),
        Db::Blob(b) => Value::String(b.iter().map(|byte| format!("{byte:02x}")).collect()),
        Db::Timestamp(_, i) => {
            let secs = i / 1_000_000;
            let nsecs = ((i % 1_000_000) * 1000) as u32;
            chrono::DateTime::from_timestamp(secs, nsecs)
                .map(|dt| Value::String(dt.format("%Y-%m-%dT%H:%M:%S%.6fZ").to_string()))
                .unwrap_or(Value::Number(i.into()))
        }
        Db::Date32(d) => {
            // Days since epoch (719163 is the number of days from 1 CE to 1970-01-01)
            chrono::NaiveDate::from_num_days_from_ce_opt(d + 719_163)
                .map(|date| Value::String(date.format("%Y-%m-%d").to_string()))
                .unwrap_or(Value::Number(d.into()))
        }
        _ => Value::String(format!("{value:?}")),
    }
}
