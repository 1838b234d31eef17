//! Shared data models for the transcoding services.
//!
//! This crate provides Serde-serializable types for:
//! - Jobs and their transcoding tasks
//! - Closed status enumerations for jobs, tasks and workers
//! - The static transcoding profile table
//! - Request/response shapes exchanged between services

pub mod api;
pub mod error;
pub mod job;
pub mod profile;
pub mod task;
pub mod worker;

// Re-export common types
pub use api::{
    CancelTaskResponse, CountResponse, EnqueueTaskRequest, JobDetail, JobStatusResponse, SubmitJobRequest,
    SubmitJobResponse, TaskStatusReport, WorkerStatusReport,
};
pub use error::{ModelError, ModelResult};
pub use job::{Job, JobId, JobStatus};
pub use profile::{find_profile, Profile, PROFILES};
pub use task::{TaskId, TaskStatus, TranscodingTask};
pub use worker::{WorkerEvent, WorkerRecord, WorkerStatus};
