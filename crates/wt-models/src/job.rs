//! Job definitions.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::{ModelError, TaskId};

/// Unique identifier for a job.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct JobId(pub String);

impl JobId {
    /// Generate a new random job ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Create from an existing string.
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for JobId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for JobId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Job lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// Submitted, no task has started yet
    #[default]
    Queued,
    /// At least one task has been claimed by a worker
    Running,
    /// No task is pending and at least one finished
    Finished,
    /// Cancelled by the caller
    Cancelled,
    /// Source upload failed or every task failed
    Error,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Queued => "queued",
            JobStatus::Running => "running",
            JobStatus::Finished => "finished",
            JobStatus::Cancelled => "cancelled",
            JobStatus::Error => "error",
        }
    }

    /// Job will not change status again.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobStatus::Finished | JobStatus::Cancelled | JobStatus::Error
        )
    }

    /// Whether the finalization check may still move this job.
    pub fn is_pending(&self) -> bool {
        matches!(self, JobStatus::Queued | JobStatus::Running)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for JobStatus {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "queued" => Ok(JobStatus::Queued),
            "running" => Ok(JobStatus::Running),
            "finished" => Ok(JobStatus::Finished),
            "cancelled" => Ok(JobStatus::Cancelled),
            "error" => Ok(JobStatus::Error),
            other => Err(ModelError::UnknownJobStatus(other.to_string())),
        }
    }
}

/// A transcoding job: one source media file and the tasks derived from it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Job {
    /// Unique job ID
    pub id: JobId,

    /// Source reference as submitted (URL or local path)
    pub source: String,

    /// Human-readable name
    pub display_name: String,

    /// Stored source object name, absent when upload failed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object_name: Option<String>,

    /// Tasks in creation order
    #[serde(default)]
    pub task_ids: Vec<TaskId>,

    #[serde(default)]
    pub status: JobStatus,

    /// Error message when the job could not be made actionable
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,

    pub created_at: DateTime<Utc>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ended_at: Option<DateTime<Utc>>,
}

impl Job {
    /// Create a new queued job with no tasks.
    pub fn new(source: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            id: JobId::new(),
            source: source.into(),
            display_name: display_name.into(),
            object_name: None,
            task_ids: Vec::new(),
            status: JobStatus::Queued,
            error_message: None,
            created_at: Utc::now(),
            started_at: None,
            ended_at: None,
        }
    }

    /// Mark as running. Only the first call stamps `started_at`.
    pub fn start(&mut self) {
        if self.status == JobStatus::Queued {
            self.status = JobStatus::Running;
        }
        if self.started_at.is_none() {
            self.started_at = Some(Utc::now());
        }
    }

    /// Move to a terminal status and stamp `ended_at`.
    pub fn finish_with(&mut self, status: JobStatus) {
        self.status = status;
        self.ended_at = Some(Utc::now());
    }

    /// Mark as failed with an explanatory message.
    pub fn fail(&mut self, error: impl Into<String>) {
        self.error_message = Some(error.into());
        self.finish_with(JobStatus::Error);
    }
}
