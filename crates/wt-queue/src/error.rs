//! Queue error types.

use thiserror::Error;

use wt_api::{codes, ApiError, ErrorBody};
use wt_store::StoreError;

pub type QueueResult<T> = Result<T, QueueError>;

#[derive(Debug, Error)]
pub enum QueueError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Unknown task, or no queued task to claim
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Queue unavailable: {0}")]
    Unavailable(String),

    #[error("Remote error ({code}): {message}")]
    Remote { code: String, message: String },
}

impl QueueError {
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::Unavailable(msg.into())
    }

    pub fn is_not_found(&self) -> bool {
        match self {
            Self::NotFound(_) => true,
            Self::Store(e) => e.is_not_found(),
            _ => false,
        }
    }

    /// Communication failures a caller may retry.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Unavailable(_) => true,
            Self::Store(e) => e.is_transient(),
            Self::Remote { code, .. } => code == codes::UNAVAILABLE,
            _ => false,
        }
    }
}

impl From<ErrorBody> for QueueError {
    fn from(body: ErrorBody) -> Self {
        match body.code.as_str() {
            codes::INVALID_ARGUMENT => Self::InvalidArgument(body.error),
            codes::NOT_FOUND => Self::NotFound(body.error),
            codes::UNAVAILABLE => Self::Unavailable(body.error),
            _ => Self::Remote {
                code: body.code,
                message: body.error,
            },
        }
    }
}

impl From<reqwest::Error> for QueueError {
    fn from(e: reqwest::Error) -> Self {
        Self::Unavailable(e.to_string())
    }
}

impl From<QueueError> for ApiError {
    fn from(e: QueueError) -> Self {
        match e {
            QueueError::InvalidArgument(msg) => ApiError::InvalidArgument(msg),
            QueueError::NotFound(msg) => ApiError::NotFound(msg),
            QueueError::Store(e) if e.is_not_found() => ApiError::NotFound(e.to_string()),
            QueueError::Store(e) if e.is_transient() => ApiError::Unavailable(e.to_string()),
            QueueError::Unavailable(msg) => ApiError::Unavailable(msg),
            other => ApiError::Internal(other.to_string()),
        }
    }
}
