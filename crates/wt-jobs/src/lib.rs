//! Job orchestrator (jobs) service.
//!
//! This crate provides:
//! - [`JobService`]: job submission with fan-out into queued tasks,
//!   status queries, cascade cancellation and task status propagation
//! - The job finalization check deriving job status from its tasks
//! - The [`JobsApi`] trait workers report through, in-process or over HTTP
//! - The jobs HTTP routes

pub mod api;
pub mod client;
pub mod config;
pub mod error;
pub mod finalize;
pub mod routes;
pub mod service;

pub use api::JobsApi;
pub use client::JobsClient;
pub use config::JobsConfig;
pub use error::{JobsError, JobsResult};
pub use finalize::finalize_job;
pub use routes::create_router;
pub use service::JobService;
