//! Blob store: object storage for uploaded file bytes.
//!
//! `S3BlobStore` is the real backend. When no bucket is configured the server
//! falls back to `LocalBlobStore`, which writes uploads to a scratch
//! directory; in that degraded mode signed URLs and object deletes fail with
//! a configuration error instead of silently doing nothing.

use crate::error::AppError;
use async_trait::async_trait;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use chrono::Utc;
use std::path::PathBuf;
use std::time::Duration;

/// Default lifetime for signed download URLs.
pub const DEFAULT_SIGNED_URL_TTL: Duration = Duration::from_secs(60);

/// Outcome of a successful put: the storage key the object lives under and a
/// resolvable location URL.
#[derive(Debug, Clone)]
pub struct StoredObject {
    pub key: String,
    pub location: String,
}

#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn put_object(
        &self,
        bytes: Vec<u8>,
        suggested_name: &str,
        content_type: Option<&str>,
    ) -> Result<StoredObject, AppError>;

    /// Time-limited URL granting read access to the object.
    async fn signed_get_url(&self, key: &str, ttl: Duration) -> Result<String, AppError>;

    async fn delete_object(&self, key: &str) -> Result<(), AppError>;
}

/// Storage key: millisecond timestamp prefix plus the client's name, so two
/// uploads of the same file never collide.
fn object_key(suggested_name: &str) -> String {
    let name = suggested_name.replace(['/', '\\'], "_");
    format!("{}-{}", Utc::now().timestamp_millis(), name)
}

// -------------------------------------------------------------------------
// S3 backend
// -------------------------------------------------------------------------

pub struct S3BlobStore {
    client: Client,
    bucket: String,
    region: String,
}

impl S3BlobStore {
    pub fn new(client: Client, bucket: String, region: String) -> Self {
        Self {
            client,
            bucket,
            region,
        }
    }

    fn location(&self, key: &str) -> String {
        format!(
            "https://{}.s3.{}.amazonaws.com/{}",
            self.bucket, self.region, key
        )
    }
}

#[async_trait]
impl BlobStore for S3BlobStore {
    async fn put_object(
        &self,
        bytes: Vec<u8>,
        suggested_name: &str,
        content_type: Option<&str>,
    ) -> Result<StoredObject, AppError> {
        let key = object_key(suggested_name);
        let mut req = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .body(ByteStream::from(bytes));
        if let Some(ct) = content_type {
            req = req.content_type(ct);
        }
        req.send()
            .await
            .map_err(|e| AppError::Storage(DisplayErrorContext(&e).to_string()))?;
        tracing::debug!(key = %key, bucket = %self.bucket, "object stored");
        let location = self.location(&key);
        Ok(StoredObject { key, location })
    }

    async fn signed_get_url(&self, key: &str, ttl: Duration) -> Result<String, AppError> {
        let config = PresigningConfig::expires_in(ttl)
            .map_err(|e| AppError::Storage(e.to_string()))?;
        let presigned = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .presigned(config)
            .await
            .map_err(|e| AppError::Storage(DisplayErrorContext(&e).to_string()))?;
        Ok(presigned.uri().to_string())
    }

    async fn delete_object(&self, key: &str) -> Result<(), AppError> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| AppError::Storage(DisplayErrorContext(&e).to_string()))?;
        Ok(())
    }
}

// -------------------------------------------------------------------------
// Degraded local backend
// -------------------------------------------------------------------------

/// Scratch-directory fallback used when object storage is unconfigured.
/// Uploads land on local disk; everything else is a configuration error.
pub struct LocalBlobStore {
    dir: PathBuf,
}

impl LocalBlobStore {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    fn unconfigured() -> AppError {
        AppError::Config("object storage credentials are not set".into())
    }
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    async fn put_object(
        &self,
        bytes: Vec<u8>,
        suggested_name: &str,
        _content_type: Option<&str>,
    ) -> Result<StoredObject, AppError> {
        let key = object_key(suggested_name);
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| AppError::Storage(e.to_string()))?;
        let path = self.dir.join(&key);
        tokio::fs::write(&path, bytes)
            .await
            .map_err(|e| AppError::Storage(e.to_string()))?;
        tracing::debug!(path = %path.display(), "object written to scratch dir");
        Ok(StoredObject {
            key,
            location: path.display().to_string(),
        })
    }

    async fn signed_get_url(&self, _key: &str, _ttl: Duration) -> Result<String, AppError> {
        Err(Self::unconfigured())
    }

    async fn delete_object(&self, _key: &str) -> Result<(), AppError> {
        Err(Self::unconfigured())
    }
}
