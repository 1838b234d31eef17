//! Transcoding task definitions.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::{JobId, ModelError};

/// Unique identifier for a transcoding task.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct TaskId(pub String);

impl TaskId {
    /// Generate a new random task ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Default for TaskId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for TaskId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for TaskId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Task lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Waiting to be claimed
    #[default]
    Queued,
    /// Claimed by a worker
    Running,
    Cancelled,
    /// Transcoded and uploaded
    Finished,
    Error,
    /// Never runnable because the source is missing
    Skipped,
}

impl TaskStatus {
    pub const ALL: [TaskStatus; 6] = [
        TaskStatus::Queued,
        TaskStatus::Running,
        TaskStatus::Cancelled,
        TaskStatus::Finished,
        TaskStatus::Error,
        TaskStatus::Skipped,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Queued => "queued",
            TaskStatus::Running => "running",
            TaskStatus::Cancelled => "cancelled",
            TaskStatus::Finished => "finished",
            TaskStatus::Error => "error",
            TaskStatus::Skipped => "skipped",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !self.is_pending()
    }

    /// Queued or running: the task may still produce a result.
    pub fn is_pending(&self) -> bool {
        matches!(self, TaskStatus::Queued | TaskStatus::Running)
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TaskStatus::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| ModelError::UnknownTaskStatus(s.to_string()))
    }
}

/// One (job, profile) pair: the unit of dispatch to a worker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct TranscodingTask {
    pub id: TaskId,

    /// Owning job
    pub job_id: JobId,

    /// Output profile name
    pub profile: String,

    /// Source object name in the source container
    pub source_object: String,

    /// Result object name, set only on a successful finish
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result_object: Option<String>,

    #[serde(default)]
    pub status: TaskStatus,

    /// Address of the worker currently holding the task
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub claimed_by: Option<String>,

    pub created_at: DateTime<Utc>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ended_at: Option<DateTime<Utc>>,
}

impl TranscodingTask {
    /// Create a queued task for `profile` of `job_id`.
    pub fn new(
        job_id: JobId,
        profile: impl Into<String>,
        source_object: impl Into<String>,
    ) -> Self {
        Self {
            id: TaskId::new(),
            job_id,
            profile: profile.into(),
            source_object: source_object.into(),
            result_object: None,
            status: TaskStatus::Queued,
            claimed_by: None,
            created_at: Utc::now(),
            started_at: None,
            ended_at: None,
        }
    }

    /// Take ownership for `worker`.
    pub fn claim(&mut self, worker: impl Into<String>, now: DateTime<Utc>) {
        self.status = TaskStatus::Running;
        self.claimed_by = Some(worker.into());
        self.started_at = Some(now);
    }

    /// Apply a reported status.
    ///
    /// Terminal statuses stamp `ended_at` and release the claim. Returns
    /// `false` when the status is unchanged.
    pub fn apply_status(&mut self, status: TaskStatus, now: DateTime<Utc>) -> bool {
        if self.status == status {
            return false;
        }
        self.status = status;
        match status {
            TaskStatus::Running => {
                if self.started_at.is_none() {
                    self.started_at = Some(now);
                }
            }
            TaskStatus::Queued => {
                self.claimed_by = None;
            }
            _ => {
                self.ended_at = Some(now);
                self.claimed_by = None;
            }
        }
        true
    }

    /// Record the result object. Empty names never clear a recorded one.
    pub fn set_result(&mut self, name: Option<&str>) {
        if let Some(name) = name.filter(|n| !n.is_empty()) {
            self.result_object = Some(name.to_string());
        }
    }
}
