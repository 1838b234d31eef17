//! Worker registry (monitor) service.
//!
//! Records which workers are online, idle, busy or offline. The registry
//! is purely observational and never takes part in dispatch.

pub mod api;
pub mod client;
pub mod config;
pub mod error;
pub mod registry;
pub mod routes;

pub use api::StatusReporter;
pub use client::MonitorClient;
pub use config::MonitorConfig;
pub use error::{MonitorError, MonitorResult};
pub use registry::WorkerRegistry;
pub use routes::create_router;
