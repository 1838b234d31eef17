//! Storage backend selection.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::info;

use crate::error::{StorageError, StorageResult};
use crate::{LocalObjectStorage, ObjectStorage, S3Config, S3ObjectStorage};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageBackend {
    S3(S3Config),
    Local(PathBuf),
}

#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub backend: StorageBackend,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Local(std::env::temp_dir().join("wt-objects")),
        }
    }
}

impl StorageConfig {
    /// Create config from environment variables.
    pub fn from_env() -> StorageResult<Self> {
        let backend = match std::env::var("STORAGE_BACKEND")
            .unwrap_or_else(|_| "local".to_string())
            .to_ascii_lowercase()
            .as_str()
        {
            "s3" => StorageBackend::S3(S3Config::from_env()?),
            "local" => StorageBackend::Local(
                std::env::var("STORAGE_LOCAL_ROOT")
                    .map(PathBuf::from)
                    .unwrap_or_else(|_| std::env::temp_dir().join("wt-objects")),
            ),
            other => {
                return Err(StorageError::config_error(format!(
                    "unknown storage backend: {}",
                    other
                )))
            }
        };
        Ok(Self { backend })
    }
}

/// Build the configured object storage.
pub fn build_storage(config: &StorageConfig) -> Arc<dyn ObjectStorage> {
    match &config.backend {
        StorageBackend::S3(s3) => {
            info!(bucket = %s3.bucket_name, "Using S3 object storage");
            Arc::new(S3ObjectStorage::new(s3.clone()))
        }
        StorageBackend::Local(root) => {
            info!(root = %root.display(), "Using local object storage");
            Arc::new(LocalObjectStorage::new(root.clone()))
        }
    }
}
