//! API error types.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

use crate::client::ErrorBody;

pub type ApiResult<T> = Result<T, ApiError>;

/// Stable error codes carried in JSON error bodies.
pub mod codes {
    pub const INVALID_ARGUMENT: &str = "invalid_argument";
    pub const NOT_FOUND: &str = "not_found";
    pub const CANT_CANCEL: &str = "cant_cancel";
    pub const NO_TRANSCODINGS: &str = "no_transcodings";
    pub const NO_TASK_RUNNING: &str = "no_task_running";
    pub const NO_PROCESS_RUNNING: &str = "no_process_running";
    pub const UPLOAD_FAILED: &str = "upload_failed";
    pub const UNAVAILABLE: &str = "unavailable";
    pub const INTERNAL: &str = "internal";
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Can't cancel: {0}")]
    CantCancel(String),

    #[error("No transcodings requested")]
    NoTranscodings,

    #[error("No task running")]
    NoTaskRunning,

    #[error("No process running")]
    NoProcessRunning,

    /// The job was recorded but its source could not be stored
    #[error("Upload failed for job {job_id}: {message}")]
    UploadFailed { job_id: String, message: String },

    #[error("Service unavailable: {0}")]
    Unavailable(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::Unavailable(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::InvalidArgument(_) | ApiError::NoTranscodings => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::CantCancel(_)
            | ApiError::NoTaskRunning
            | ApiError::NoProcessRunning => StatusCode::CONFLICT,
            ApiError::UploadFailed { .. } => StatusCode::BAD_GATEWAY,
            ApiError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ApiError::InvalidArgument(_) => codes::INVALID_ARGUMENT,
            ApiError::NotFound(_) => codes::NOT_FOUND,
            ApiError::CantCancel(_) => codes::CANT_CANCEL,
            ApiError::NoTranscodings => codes::NO_TRANSCODINGS,
            ApiError::NoTaskRunning => codes::NO_TASK_RUNNING,
            ApiError::NoProcessRunning => codes::NO_PROCESS_RUNNING,
            ApiError::UploadFailed { .. } => codes::UPLOAD_FAILED,
            ApiError::Unavailable(_) => codes::UNAVAILABLE,
            ApiError::Internal(_) => codes::INTERNAL,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let job_id = match &self {
            ApiError::UploadFailed { job_id, .. } => Some(job_id.clone()),
            _ => None,
        };
        let body = ErrorBody {
            error: self.to_string(),
            code: self.code().to_string(),
            job_id,
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(ApiError::NoTranscodings.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::not_found("x").status_code(), StatusCode::NOT_FOUND);
        assert_eq!(ApiError::NoTaskRunning.status_code(), StatusCode::CONFLICT);
        assert_eq!(
            ApiError::UploadFailed {
                job_id: "j".into(),
                message: "m".into()
            }
            .status_code(),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn test_codes_are_stable() {
        assert_eq!(ApiError::CantCancel("done".into()).code(), "cant_cancel");
        assert_eq!(ApiError::NoProcessRunning.code(), "no_process_running");
        assert_eq!(ApiError::unavailable("redis").code(), "unavailable");
    }
}
