//! Manager configuration.

use wt_api::ServerConfig;
use wt_store::{StoreConfig, StoreResult};

#[derive(Debug, Clone)]
pub struct ManagerConfig {
    pub server: ServerConfig,
    pub store: StoreConfig,
    /// Forward cancellation of running tasks to their worker
    pub forward_cancellation: bool,
}

impl ManagerConfig {
    /// Create config from environment variables.
    pub fn from_env() -> StoreResult<Self> {
        Ok(Self {
            server: ServerConfig::from_env("MANAGER_PORT", 8082),
            store: StoreConfig::from_env("wt:manager")?,
            forward_cancellation: std::env::var("MANAGER_FORWARD_CANCELLATION")
                .map(|v| v != "false" && v != "0")
                .unwrap_or(true),
        })
    }
}
