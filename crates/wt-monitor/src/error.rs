//! Monitor error types.

use thiserror::Error;

use wt_api::{codes, ApiError, ErrorBody};
use wt_store::StoreError;

pub type MonitorResult<T> = Result<T, MonitorError>;

#[derive(Debug, Error)]
pub enum MonitorError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Monitor unavailable: {0}")]
    Unavailable(String),

    #[error("Remote error ({code}): {message}")]
    Remote { code: String, message: String },
}

impl MonitorError {
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }
}

impl From<ErrorBody> for MonitorError {
    fn from(body: ErrorBody) -> Self {
        match body.code.as_str() {
            codes::INVALID_ARGUMENT => Self::InvalidArgument(body.error),
            codes::UNAVAILABLE => Self::Unavailable(body.error),
            _ => Self::Remote {
                code: body.code,
                message: body.error,
            },
        }
    }
}

impl From<reqwest::Error> for MonitorError {
    fn from(e: reqwest::Error) -> Self {
        Self::Unavailable(e.to_string())
    }
}

impl From<MonitorError> for ApiError {
    fn from(e: MonitorError) -> Self {
        match e {
            MonitorError::InvalidArgument(msg) => ApiError::InvalidArgument(msg),
            MonitorError::Store(e) if e.is_transient() => ApiError::Unavailable(e.to_string()),
            MonitorError::Store(e) => ApiError::Internal(e.to_string()),
            MonitorError::Unavailable(msg) => ApiError::Unavailable(msg),
            MonitorError::Remote { message, .. } => ApiError::Internal(message),
        }
    }
}
