//! Monitor configuration.

use wt_api::ServerConfig;
use wt_store::{StoreConfig, StoreResult};

#[derive(Debug, Clone)]
pub struct MonitorConfig {
    pub server: ServerConfig,
    pub store: StoreConfig,
}

impl MonitorConfig {
    /// Create config from environment variables.
    pub fn from_env() -> StoreResult<Self> {
        Ok(Self {
            server: ServerConfig::from_env("MONITOR_PORT", 8084),
            store: StoreConfig::from_env("wt:monitor")?,
        })
    }
}
