//! Environment-driven server configuration.

use crate::error::AppError;
use std::path::PathBuf;

/// Maximum accepted upload body size: 50 MiB.
pub const MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub bucket: String,
    pub region: String,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub database_url: String,
    pub port: u16,
    /// `None` puts the blob store into degraded local-scratch mode.
    pub storage: Option<StorageConfig>,
    /// Scratch directory for uploads when object storage is unconfigured.
    pub upload_dir: PathBuf,
}

impl ServerConfig {
    /// Read configuration from the environment. A missing `DATABASE_URL` is
    /// fatal; everything else has a default or degrades.
    pub fn from_env() -> Result<Self, AppError> {
        let database_url = std::env::var("DATABASE_URL")
            .map_err(|_| AppError::Config("DATABASE_URL is not set".into()))?;
        let port = std::env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(5000);
        let storage = match std::env::var("AWS_BUCKET_NAME") {
            Ok(bucket) if !bucket.is_empty() => Some(StorageConfig {
                bucket,
                region: std::env::var("AWS_REGION").unwrap_or_else(|_| "us-east-1".into()),
            }),
            _ => None,
        };
        let upload_dir = std::env::var("UPLOAD_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| std::env::temp_dir().join("stash-uploads"));
        Ok(Self {
            database_url,
            port,
            storage,
            upload_dir,
        })
    }
}
