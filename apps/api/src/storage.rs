//! Artifact storage for uploaded lesion images and generated reports.
//!
//! Keys are per-user and timestamp-derived:
//! - `uploads/<user_id>/<YYYYmmdd_HHMMSS>.<ext>`
//! - `reports/<user_id>/report_<YYYYmmdd_HHMMSS>.pdf`
//!
//! `AppState` holds an `Arc<dyn ArtifactStore>`: S3 (or MinIO) when configured,
//! otherwise a local directory.

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use aws_sdk_s3::primitives::ByteStream;
use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("artifact not found: {0}")]
    NotFound(String),

    #[error("invalid artifact key: {0}")]
    InvalidKey(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("S3 error: {0}")]
    S3(String),
}

/// Millisecond resolution, so two artifacts written within the same second
/// do not share a key.
const KEY_TIMESTAMP: &str = "%Y%m%d_%H%M%S_%3f";

pub fn upload_key(user_id: Uuid, at: DateTime<Utc>, extension: &str) -> String {
    format!("uploads/{}/{}.{}", user_id, at.format(KEY_TIMESTAMP), extension)
}

pub fn report_key(user_id: Uuid, at: DateTime<Utc>) -> String {
    format!("reports/{}/report_{}.pdf", user_id, at.format(KEY_TIMESTAMP))
}

#[async_trait]
pub trait ArtifactStore: Send + Sync {
    async fn put(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> Result<(), StoreError>;
    async fn get(&self, key: &str) -> Result<Vec<u8>, StoreError>;
}

// ────────────────────────────────────────────────────────────────────────────
// S3
// ────────────────────────────────────────────────────────────────────────────

pub struct S3ArtifactStore {
    client: aws_sdk_s3::Client,
    bucket: String,
}

impl S3ArtifactStore {
    pub fn new(client: aws_sdk_s3::Client, bucket: String) -> Self {
        Self { client, bucket }
    }
}

#[async_trait]
impl ArtifactStore for S3ArtifactStore {
    async fn put(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> Result<(), StoreError> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(bytes))
            .content_type(content_type)
            .send()
            .await
            .map_err(|e| StoreError::S3(format!("upload failed: {e}")))?;

        info!("Uploaded artifact to s3://{}/{}", self.bucket, key);
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Vec<u8>, StoreError> {
        let object = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| {
                let service_error = e.into_service_error();
                if service_error.is_no_such_key() {
                    StoreError::NotFound(key.to_string())
                } else {
                    StoreError::S3(format!("download failed: {service_error}"))
                }
            })?;

        let data = object
            .body
            .collect()
            .await
            .map_err(|e| StoreError::S3(format!("reading body failed: {e}")))?;
        Ok(data.into_bytes().to_vec())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Local filesystem
// ────────────────────────────────────────────────────────────────────────────

pub struct LocalArtifactStore {
    root: PathBuf,
}

impl LocalArtifactStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Resolves `key` under the root, refusing anything that could escape it.
    fn path_for(&self, key: &str) -> Result<PathBuf, StoreError> {
        let relative = Path::new(key);
        let safe = !key.is_empty()
            && relative
                .components()
                .all(|c| matches!(c, Component::Normal(_)));
        if !safe {
            return Err(StoreError::InvalidKey(key.to_string()));
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl ArtifactStore for LocalArtifactStore {
    async fn put(&self, key: &str, bytes: Vec<u8>, _content_type: &str) -> Result<(), StoreError> {
        let path = self.path_for(key)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, bytes).await?;
        info!("Wrote artifact to {}", path.display());
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Vec<u8>, StoreError> {
        let path = self.path_for(key)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StoreError::NotFound(key.to_string()))
            }
            Err(e) => Err(StoreError::Io(e)),
        }
    }
}
