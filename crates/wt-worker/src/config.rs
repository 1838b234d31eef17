//! Worker configuration.

use std::path::PathBuf;
use std::time::Duration;

use wt_api::ServerConfig;
use wt_storage::StorageConfig;

use crate::error::{WorkerError, WorkerResult};

/// Worker configuration.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Address peers use to reach this worker's HTTP server
    pub advertise_addr: String,
    /// Delay between polls when idle or after a failure
    pub poll_interval: Duration,
    /// Work directory for temporary files
    pub work_dir: PathBuf,
    /// FFmpeg binary, looked up on `PATH` when unset
    pub ffmpeg_path: Option<PathBuf>,
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub manager_url: String,
    pub jobs_url: String,
    pub monitor_url: String,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            advertise_addr: "localhost:8083".to_string(),
            poll_interval: Duration::from_secs(15),
            work_dir: std::env::temp_dir().join("wt-worker"),
            ffmpeg_path: None,
            server: ServerConfig::with_port(8083),
            storage: StorageConfig::default(),
            manager_url: "http://localhost:8082".to_string(),
            jobs_url: "http://localhost:8081".to_string(),
            monitor_url: "http://localhost:8084".to_string(),
        }
    }
}

impl WorkerConfig {
    /// Create config from environment variables.
    pub fn from_env() -> WorkerResult<Self> {
        let defaults = Self::default();
        let server = ServerConfig::from_env("WORKER_HTTP_PORT", 8083);
        let advertise_addr = std::env::var("WORKER_ADVERTISE_ADDR")
            .unwrap_or_else(|_| format!("localhost:{}", server.port));
        if advertise_addr.trim().is_empty() {
            return Err(WorkerError::config_error("WORKER_ADVERTISE_ADDR is empty"));
        }

        Ok(Self {
            advertise_addr,
            poll_interval: Duration::from_secs(
                std::env::var("WORKER_POLL_INTERVAL_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(15),
            ),
            work_dir: std::env::var("WORKER_WORK_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.work_dir),
            ffmpeg_path: std::env::var("FFMPEG_PATH").ok().map(PathBuf::from),
            server,
            storage: StorageConfig::from_env()?,
            manager_url: std::env::var("MANAGER_URL").unwrap_or(defaults.manager_url),
            jobs_url: std::env::var("JOBS_URL").unwrap_or(defaults.jobs_url),
            monitor_url: std::env::var("MONITOR_URL").unwrap_or(defaults.monitor_url),
        })
    }
}
