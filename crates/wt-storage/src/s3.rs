//! S3-compatible object storage client.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_credential_types::Credentials;
use aws_sdk_s3::config::{Builder, Region};
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use tracing::{debug, info};

use crate::error::{StorageError, StorageResult};
use crate::naming::unique_object_name;
use crate::storage::{Container, ObjectStorage};

/// Configuration for the S3 client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct S3Config {
    /// S3 API endpoint URL
    pub endpoint_url: String,
    pub access_key_id: String,
    pub secret_access_key: String,
    /// Bucket holding every container
    pub bucket_name: String,
    pub region: String,
}

impl S3Config {
    /// Create config from environment variables.
    pub fn from_env() -> StorageResult<Self> {
        Ok(Self {
            endpoint_url: std::env::var("S3_ENDPOINT_URL")
                .map_err(|_| StorageError::config_error("S3_ENDPOINT_URL not set"))?,
            access_key_id: std::env::var("S3_ACCESS_KEY_ID")
                .map_err(|_| StorageError::config_error("S3_ACCESS_KEY_ID not set"))?,
            secret_access_key: std::env::var("S3_SECRET_ACCESS_KEY")
                .map_err(|_| StorageError::config_error("S3_SECRET_ACCESS_KEY not set"))?,
            bucket_name: std::env::var("S3_BUCKET")
                .map_err(|_| StorageError::config_error("S3_BUCKET not set"))?,
            region: std::env::var("S3_REGION").unwrap_or_else(|_| "us-east-1".to_string()),
        })
    }
}

/// Object storage on an S3-compatible service.
///
/// Containers map to key prefixes within one bucket.
#[derive(Clone)]
pub struct S3ObjectStorage {
    client: Client,
    bucket: String,
}

impl S3ObjectStorage {
    pub fn new(config: S3Config) -> Self {
        let credentials = Credentials::new(
            &config.access_key_id,
            &config.secret_access_key,
            None,
            None,
            "wt-storage",
        );

        let sdk_config = Builder::new()
            .behavior_version(BehaviorVersion::latest())
            .endpoint_url(&config.endpoint_url)
            .region(Region::new(config.region))
            .credentials_provider(credentials)
            .force_path_style(true)
            .build();

        Self {
            client: Client::from_conf(sdk_config),
            bucket: config.bucket_name,
        }
    }

    pub fn from_env() -> StorageResult<Self> {
        Ok(Self::new(S3Config::from_env()?))
    }

    fn key(container: Container, name: &str) -> String {
        format!("{}/{}", container.as_str(), name)
    }

    /// Check connectivity with a head bucket request.
    pub async fn check_connectivity(&self) -> StorageResult<()> {
        self.client
            .head_bucket()
            .bucket(&self.bucket)
            .send()
            .await
            .map_err(|e| StorageError::config_error(format!("S3 connectivity check failed: {}", e)))?;
        Ok(())
    }
}

#[async_trait]
impl ObjectStorage for S3ObjectStorage {
    async fn upload(
        &self,
        local_path: &Path,
        desired_name: &str,
        container: Container,
    ) -> StorageResult<String> {
        let name = unique_object_name(desired_name)?;
        let key = Self::key(container, &name);
        debug!("Uploading {} to {}", local_path.display(), key);

        let body = ByteStream::from_path(local_path)
            .await
            .map_err(|e| StorageError::upload_failed(e.to_string()))?;

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .body(body)
            .send()
            .await
            .map_err(|e| StorageError::upload_failed(e.to_string()))?;

        info!("Uploaded {} to {}", local_path.display(), key);
        Ok(name)
    }

    async fn download(&self, name: &str, container: Container, dest: &Path) -> StorageResult<PathBuf> {
        let key = Self::key(container, name);
        debug!("Downloading {} to {}", key, dest.display());

        let response = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(&key)
            .send()
            .await
            .map_err(|e| {
                if e.to_string().contains("NoSuchKey") {
                    StorageError::not_found(&key)
                } else {
                    StorageError::download_failed(e.to_string())
                }
            })?;

        let bytes = response
            .body
            .collect()
            .await
            .map_err(|e| StorageError::download_failed(e.to_string()))?
            .into_bytes();

        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(dest, &bytes).await?;

        info!("Downloaded {} to {}", key, dest.display());
        Ok(dest.to_path_buf())
    }
}
