//! Jobs error types.

use thiserror::Error;

use wt_api::{codes, ApiError, ErrorBody};
use wt_models::JobId;
use wt_queue::QueueError;
use wt_store::StoreError;

pub type JobsResult<T> = Result<T, JobsError>;

#[derive(Debug, Error)]
pub enum JobsError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Can't cancel job {0}: already finished or cancelled")]
    CantCancel(String),

    #[error("No transcodings requested")]
    NoTranscodings,

    /// The job was recorded with status ERROR but none of its tasks can run.
    #[error("Source upload failed for job {job_id}: {reason}")]
    SourceUpload { job_id: JobId, reason: String },

    #[error("Store error: {0}")]
    Store(StoreError),

    #[error("Queue error: {0}")]
    Queue(#[from] QueueError),

    #[error("Jobs service unavailable: {0}")]
    Unavailable(String),

    #[error("Remote error ({code}): {message}")]
    Remote { code: String, message: String },
}

impl JobsError {
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Id of a job that was recorded despite the error.
    pub fn recorded_job_id(&self) -> Option<&JobId> {
        match self {
            Self::SourceUpload { job_id, .. } => Some(job_id),
            _ => None,
        }
    }

    pub fn is_transient(&self) -> bool {
        match self {
            Self::Unavailable(_) => true,
            Self::Store(e) => e.is_transient(),
            Self::Queue(e) => e.is_transient(),
            Self::Remote { code, .. } => code == codes::UNAVAILABLE,
            _ => false,
        }
    }
}

impl From<StoreError> for JobsError {
    fn from(e: StoreError) -> Self {
        if e.is_not_found() {
            Self::NotFound(e.to_string())
        } else {
            Self::Store(e)
        }
    }
}

impl From<ErrorBody> for JobsError {
    fn from(body: ErrorBody) -> Self {
        match body.code.as_str() {
            codes::INVALID_ARGUMENT => Self::InvalidArgument(body.error),
            codes::NOT_FOUND => Self::NotFound(body.error),
            codes::CANT_CANCEL => Self::CantCancel(body.error),
            codes::NO_TRANSCODINGS => Self::NoTranscodings,
            codes::UPLOAD_FAILED => match body.job_id {
                Some(job_id) => Self::SourceUpload {
                    job_id: JobId::from(job_id),
                    reason: body.error,
                },
                None => Self::Remote {
                    code: body.code,
                    message: body.error,
                },
            },
            codes::UNAVAILABLE => Self::Unavailable(body.error),
            _ => Self::Remote {
                code: body.code,
                message: body.error,
            },
        }
    }
}

impl From<reqwest::Error> for JobsError {
    fn from(e: reqwest::Error) -> Self {
        Self::Unavailable(e.to_string())
    }
}

impl From<JobsError> for ApiError {
    fn from(e: JobsError) -> Self {
        match e {
            JobsError::InvalidArgument(msg) => ApiError::InvalidArgument(msg),
            JobsError::NotFound(msg) => ApiError::NotFound(msg),
            JobsError::CantCancel(id) => ApiError::CantCancel(id),
            JobsError::NoTranscodings => ApiError::NoTranscodings,
            JobsError::SourceUpload { job_id, reason } => ApiError::UploadFailed {
                job_id: job_id.to_string(),
                message: reason,
            },
            JobsError::Store(e) if e.is_transient() => ApiError::Unavailable(e.to_string()),
            JobsError::Store(e) => ApiError::Internal(e.to_string()),
            JobsError::Queue(e) => e.into(),
            JobsError::Unavailable(msg) => ApiError::Unavailable(msg),
            JobsError::Remote { message, .. } => ApiError::Internal(message),
        }
    }
}
