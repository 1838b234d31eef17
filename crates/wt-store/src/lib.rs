//! State store for the transcoding services.
//!
//! This crate provides:
//! - The [`StateStore`] trait with document-collection semantics
//! - Atomic claim of the oldest queued task
//! - Conditional task status transitions
//! - An in-memory backend for tests and single-node use
//! - A Redis backend for production

pub mod config;
pub mod error;
pub mod memory;
pub mod redis_store;
pub mod store;

pub use config::{connect, StoreBackend, StoreConfig};
pub use error::{StoreError, StoreResult};
pub use memory::MemoryStore;
pub use redis_store::RedisStore;
pub use store::{StateStore, TaskFilter, WORKER_HISTORY_LIMIT};
