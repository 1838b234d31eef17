//! Jobs service configuration.

use std::path::PathBuf;

use wt_api::ServerConfig;
use wt_storage::StorageConfig;
use wt_store::StoreConfig;

#[derive(Debug, Clone)]
pub struct JobsConfig {
    pub server: ServerConfig,
    pub store: StoreConfig,
    pub storage: StorageConfig,
    /// Base URL of the manager
    pub manager_url: String,
    /// Scratch directory for fetched URL sources
    pub work_dir: PathBuf,
}

impl JobsConfig {
    /// Create config from environment variables.
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self {
            server: ServerConfig::from_env("JOBS_PORT", 8081),
            store: StoreConfig::from_env("wt:jobs")?,
            storage: StorageConfig::from_env()?,
            manager_url: std::env::var("MANAGER_URL")
                .unwrap_or_else(|_| "http://localhost:8082".to_string()),
            work_dir: std::env::var("JOBS_WORK_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| std::env::temp_dir().join("wt-jobs")),
        })
    }
}
