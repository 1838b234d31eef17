//! Shared HTTP scaffolding for the transcoding services.
//!
//! This crate provides:
//! - [`ApiError`] with stable JSON error codes
//! - Decoding of error bodies on the client side
//! - Health, readiness and metrics routes
//! - Request id, logging and CORS middleware
//! - Tracing initialisation and graceful shutdown

pub mod client;
pub mod config;
pub mod error;
pub mod health;
pub mod metrics;
pub mod middleware;
pub mod server;
pub mod telemetry;

pub use client::{build_http_client, read_error_body, ErrorBody};
pub use health::HealthState;
pub use config::ServerConfig;
pub use error::{codes, ApiError, ApiResult};
pub use server::{install_crypto_provider, serve, shutdown_signal, with_common_routes};
pub use telemetry::init_tracing;
