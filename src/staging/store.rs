//! Staging namespace on an object store (GCS, S3, R2, Azure, local filesystem)

use crate::error::{Error, Result};
use bytes::Bytes;
use futures::TryStreamExt;
use object_store::aws::AmazonS3Builder;
use object_store::azure::MicrosoftAzureBuilder;
use object_store::gcp::GoogleCloudStorageBuilder;
use object_store::local::LocalFileSystem;
use object_store::path::Path as ObjectPath;
use object_store::ObjectStore;
use std::path::Path;
use std::sync::Arc;

/// Shared staging location parsed from a URL
///
/// Keys are relative to the URL's root, so `staging/run/a.parquet` under
/// `gs://bucket/uploads` lives at `gs://bucket/uploads/staging/run/a.parquet`.
#[derive(Debug, Clone)]
pub struct StagingArea {
    /// The object store implementation
    store: Arc<dyn ObjectStore>,
    /// Path prefix within the bucket/container
    root: String,
    /// Bucket/container, or the local directory for `file`
    location: String,
    /// URL scheme (s3, r2, gs, az, file)
    scheme: String,
}

impl StagingArea {
    /// Parse a staging URL and create the matching object store
    ///
    /// Supported formats:
    /// - `gs://bucket/path/` - Google Cloud Storage
    /// - `s3://bucket/path/` - AWS S3
    /// - `r2://bucket/path/` - Cloudflare R2 (S3-compatible)
    /// - `az://container/path/` - Azure Blob Storage
    /// - `/local/path/` or `./path/` - Local filesystem
    ///
    /// `credentials` is a service-account key file, used for GCS.
    pub fn parse(url: &str, credentials: Option<&Path>) -> Result<Self> {
        if let Some(rest) = url.strip_prefix("gs://") {
            let (bucket, root) = split_bucket(rest);
            let mut builder = GoogleCloudStorageBuilder::from_env().with_bucket_name(bucket);
            if let Some(key) = credentials {
                builder = builder.with_service_account_path(key.display().to_string());
            }
            let store = builder
                .build()
                .map_err(|e| Error::auth(format!("Failed to create GCS client: {e}")))?;
            Ok(Self::remote(Arc::new(store), "gs", bucket, root))
        } else if let Some(rest) = url.strip_prefix("s3://") {
            Self::parse_s3(rest, "s3")
        } else if let Some(rest) = url.strip_prefix("r2://") {
            Self::parse_s3(rest, "r2")
        } else if let Some(rest) = url.strip_prefix("az://") {
            let (container, root) = split_bucket(rest);
            let store = MicrosoftAzureBuilder::from_env()
                .with_container_name(container)
                .build()
                .map_err(|e| Error::auth(format!("Failed to create Azure client: {e}")))?;
            Ok(Self::remote(Arc::new(store), "az", container, root))
        } else {
            Self::parse_local(url)
        }
    }

    fn parse_s3(rest: &str, scheme: &str) -> Result<Self> {
        let (bucket, root) = split_bucket(rest);
        let mut builder = AmazonS3Builder::from_env().with_bucket_name(bucket);

        // R2 endpoint: https://<account_id>.r2.cloudflarestorage.com
        if scheme == "r2" {
            if let Ok(endpoint) = std::env::var("R2_ENDPOINT_URL") {
                builder = builder.with_endpoint(endpoint);
            }
        }

        let store = builder
            .build()
            .map_err(|e| Error::auth(format!("Failed to create {scheme} client: {e}")))?;
        Ok(Self::remote(Arc::new(store), scheme, bucket, root))
    }

    fn parse_local(path: &str) -> Result<Self> {
        let path = path.strip_prefix("file://").unwrap_or(path);

        std::fs::create_dir_all(path)
            .map_err(|e| Error::staging(format!("Failed to create directory {path}: {e}")))?;
        let absolute = std::fs::canonicalize(path)
            .map_err(|e| Error::staging(format!("Failed to resolve {path}: {e}")))?;

        let store = LocalFileSystem::new_with_prefix(&absolute)
            .map_err(|e| Error::staging(format!("Failed to create local store: {e}")))?;

        Ok(Self {
            store: Arc::new(store),
            root: String::new(),
            location: absolute.display().to_string(),
            scheme: "file".to_string(),
        })
    }

    fn remote(store: Arc<dyn ObjectStore>, scheme: &str, bucket: &str, root: &str) -> Self {
        Self {
            store,
            root: root.trim_matches('/').to_string(),
            location: bucket.to_string(),
            scheme: scheme.to_string(),
        }
    }

    /// Check if this is a cloud location (not local)
    pub fn is_cloud(&self) -> bool {
        self.scheme != "file"
    }

    /// Get the scheme (s3, r2, gs, az, file)
    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    fn object_path(&self, key: &str) -> ObjectPath {
        let key = key.trim_matches('/');
        if self.root.is_empty() {
            ObjectPath::from(key)
        } else {
            ObjectPath::from(format!("{}/{key}", self.root))
        }
    }

    /// Strip the root from a listed path to get the key back
    fn key_of(&self, path: &ObjectPath) -> String {
        let full = path.as_ref();
        if self.root.is_empty() {
            full.to_string()
        } else {
            full.strip_prefix(&self.root)
                .map(|k| k.trim_start_matches('/').to_string())
                .unwrap_or_else(|| full.to_string())
        }
    }

    /// URI of a key as the warehouse sees it
    pub fn uri(&self, key: &str) -> String {
        let path = self.object_path(key);
        if self.is_cloud() {
            format!("{}://{}/{path}", self.scheme, self.location)
        } else {
            format!("{}/{path}", self.location.trim_end_matches('/'))
        }
    }

    /// Glob matching every Parquet artifact directly under a prefix
    pub fn parquet_glob(&self, prefix: &str) -> String {
        format!("{}/*.parquet", self.uri(prefix))
    }

    /// Write an artifact
    pub async fn put(&self, key: &str, data: Bytes) -> Result<String> {
        let path = self.object_path(key);
        self.store
            .put(&path, data.into())
            .await
            .map_err(|e| Error::staging(format!("Failed to write {path}: {e}")))?;

        Ok(self.uri(key))
    }

    /// Keys of every object under a prefix
    pub async fn list_by_prefix(&self, prefix: &str) -> Result<Vec<String>> {
        let path = self.object_path(prefix);
        let listed = self.store.list(Some(&path)).try_collect::<Vec<_>>().await;

        let objects = match listed {
            Ok(objects) => objects,
            // A prefix nothing was ever written to
            Err(object_store::Error::NotFound { .. }) => Vec::new(),
            Err(e) => {
                return Err(Error::staging(format!("Failed to list {path}: {e}")));
            }
        };

        let mut keys: Vec<String> = objects.iter().map(|meta| self.key_of(&meta.location)).collect();
        keys.sort();
        Ok(keys)
    }

    /// Remove one object
    pub async fn delete(&self, key: &str) -> Result<()> {
        let path = self.object_path(key);
        match self.store.delete(&path).await {
            Ok(()) | Err(object_store::Error::NotFound { .. }) => Ok(()),
            Err(e) => Err(Error::staging(format!("Failed to delete {path}: {e}"))),
        }
    }

    /// Remove every object under a prefix, returning how many were removed
    pub async fn clear_prefix(&self, prefix: &str) -> Result<usize> {
        let keys = self.list_by_prefix(prefix).await?;
        for key in &keys {
            self.delete(key).await?;
        }
        if !keys.is_empty() {
            tracing::debug!(prefix, removed = keys.len(), "Cleared staging prefix");
        }
        Ok(keys.len())
    }

    /// Verify the location is reachable with the configured credentials
    pub async fn check(&self, prefix: &str) -> Result<()> {
        self.list_by_prefix(prefix)
            .await
            .map(|_| ())
            .map_err(|e| Error::auth(format!("Staging location not accessible: {e}")))
    }
}

fn split_bucket(rest: &str) -> (&str, &str) {
    match rest.find('/') {
        Some(idx) => (&rest[..idx], &rest[idx + 1..]),
        None => (rest, ""),
    }
}

/// Staging key for one queue slot
///
/// `{prefix}/{run_id}/{index:05}-{stem}.parquet`; deterministic so a retried
/// file overwrites its earlier artifact.
pub fn artifact_key(prefix: &str, run_id: &str, index: usize, file: &Path) -> String {
    let stem = file
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let sanitized: String = stem
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();
    let sanitized = if sanitized.is_empty() { "file".to_string() } else { sanitized };

    format!(
        "{}/{run_id}/{index:05}-{sanitized}.parquet",
        prefix.trim_matches('/')
    )
}
