//! Worker error types.

use thiserror::Error;

use wt_api::ApiError;

pub type WorkerResult<T> = Result<T, WorkerError>;

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("No task running")]
    NoTaskRunning,

    /// Busy, but the transcoder has not been launched yet
    #[error("No process running")]
    NoProcessRunning,

    #[error("Unknown profile: {0}")]
    UnknownProfile(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Storage error: {0}")]
    Storage(#[from] wt_storage::StorageError),

    #[error("Media error: {0}")]
    Media(#[from] wt_media::MediaError),

    #[error("Queue error: {0}")]
    Queue(#[from] wt_queue::QueueError),

    #[error("Jobs error: {0}")]
    Jobs(#[from] wt_jobs::JobsError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl WorkerError {
    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }
}

impl From<WorkerError> for ApiError {
    fn from(e: WorkerError) -> Self {
        match e {
            WorkerError::NoTaskRunning => ApiError::NoTaskRunning,
            WorkerError::NoProcessRunning => ApiError::NoProcessRunning,
            other => ApiError::Internal(other.to_string()),
        }
    }
}
