//! Task queue (manager) service.
//!
//! This crate provides:
//! - [`TaskQueue`]: enqueue, atomic claim of the oldest queued task,
//!   status counts, status updates and cancellation
//! - The [`TaskQueueApi`] trait, implemented in-process and over HTTP
//! - Forwarding of cancellation requests to the worker holding a task
//! - The manager's HTTP routes

pub mod api;
pub mod client;
pub mod config;
pub mod error;
pub mod forward;
pub mod queue;
pub mod routes;

pub use api::TaskQueueApi;
pub use client::QueueClient;
pub use config::ManagerConfig;
pub use error::{QueueError, QueueResult};
pub use forward::{CancellationForwarder, HttpCancellationForwarder};
pub use queue::TaskQueue;
pub use routes::create_router;
