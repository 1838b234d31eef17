//! Model error types.

use thiserror::Error;

pub type ModelResult<T> = Result<T, ModelError>;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ModelError {
    #[error("Unknown job status: {0}")]
    UnknownJobStatus(String),

    #[error("Unknown task status: {0}")]
    UnknownTaskStatus(String),

    #[error("Unknown worker status: {0}")]
    UnknownWorkerStatus(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

impl ModelError {
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }
}
