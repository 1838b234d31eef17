//! HTTP server configuration.

use std::time::Duration;

/// Server configuration shared by every service binary.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub cors_origins: Vec<String>,
    /// Max request body size
    pub max_body_size: usize,
    pub metrics_enabled: bool,
    /// Timeout applied to outgoing calls to peer services
    pub http_timeout: Duration,
}

impl ServerConfig {
    pub fn with_port(port: u16) -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port,
            cors_origins: vec!["*".to_string()],
            max_body_size: 1024 * 1024,
            metrics_enabled: true,
            http_timeout: Duration::from_secs(30),
        }
    }

    /// Create config from environment variables.
    ///
    /// `port_var` names the service-specific port variable; `default_port`
    /// applies when it is unset.
    pub fn from_env(port_var: &str, default_port: u16) -> Self {
        Self {
            host: std::env::var("HTTP_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: std::env::var(port_var)
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(default_port),
            cors_origins: std::env::var("CORS_ORIGINS")
                .map(|s| s.split(',').map(|s| s.trim().to_string()).collect())
                .unwrap_or_else(|_| vec!["*".to_string()]),
            max_body_size: std::env::var("MAX_BODY_SIZE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(1024 * 1024),
            metrics_enabled: std::env::var("METRICS_ENABLED")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(true),
            http_timeout: Duration::from_secs(
                std::env::var("HTTP_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(30),
            ),
        }
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
