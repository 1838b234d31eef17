//! Transcoding worker.
//!
//! This crate provides:
//! - The poll/execute loop claiming one task at a time from the manager
//! - Worker state guarding the running transcoder handle
//! - Direct cancellation of the running task
//! - Status reporting to the jobs service, the manager and the monitor
//! - Graceful shutdown

pub mod config;
pub mod error;
pub mod executor;
pub mod failures;
pub mod logging;
pub mod routes;
pub mod state;

pub use config::WorkerConfig;
pub use error::{WorkerError, WorkerResult};
pub use executor::{TaskExecutor, WorkerServices};
pub use failures::FailureTracker;
pub use logging::TaskLogger;
pub use routes::create_router;
pub use state::{WorkerState, WorkerStatusView};
