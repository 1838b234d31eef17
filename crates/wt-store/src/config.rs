//! Store configuration.

use std::sync::Arc;

use tracing::info;

use crate::error::{StoreError, StoreResult};
use crate::{MemoryStore, RedisStore, StateStore};

/// Which backend to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StoreBackend {
    #[default]
    Memory,
    Redis,
}

impl std::str::FromStr for StoreBackend {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "memory" => Ok(Self::Memory),
            "redis" => Ok(Self::Redis),
            other => Err(StoreError::Config(format!("unknown store backend: {}", other))),
        }
    }
}

/// Store configuration.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    /// Redis URL
    pub redis_url: String,
    /// Key prefix, lets several services share one Redis
    pub namespace: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::Memory,
            redis_url: "redis://localhost:6379".to_string(),
            namespace: "wt".to_string(),
        }
    }
}

impl StoreConfig {
    /// Create config from environment variables.
    ///
    /// `default_namespace` applies when `STORE_NAMESPACE` is unset.
    pub fn from_env(default_namespace: &str) -> StoreResult<Self> {
        let backend = match std::env::var("STORE_BACKEND") {
            Ok(value) => value.parse()?,
            Err(_) => StoreBackend::Memory,
        };
        Ok(Self {
            backend,
            redis_url: std::env::var("REDIS_URL")
                .unwrap_or_else(|_| "redis://localhost:6379".to_string()),
            namespace: std::env::var("STORE_NAMESPACE")
                .unwrap_or_else(|_| default_namespace.to_string()),
        })
    }
}

/// Build the configured store.
pub async fn connect(config: &StoreConfig) -> StoreResult<Arc<dyn StateStore>> {
    match config.backend {
        StoreBackend::Memory => {
            info!("Using in-memory state store");
            Ok(Arc::new(MemoryStore::new()))
        }
        StoreBackend::Redis => {
            let store = RedisStore::new(&config.redis_url, config.namespace.clone())?;
            store.ping().await?;
            info!(namespace = %config.namespace, "Connected to Redis state store");
            Ok(Arc::new(store))
        }
    }
}
