//! Request and response shapes exchanged between services.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::{Job, JobId, JobStatus, TaskId, TaskStatus, TranscodingTask, WorkerStatus};

/// Submit a new job.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, JsonSchema)]
pub struct SubmitJobRequest {
    /// Source media: `http(s)` URL or local path
    #[validate(length(min = 1, message = "source is required"))]
    pub source: String,

    /// Requested output profiles
    #[serde(default)]
    pub profiles: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SubmitJobResponse {
    pub job_id: JobId,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct JobStatusResponse {
    pub job_id: JobId,
    pub status: JobStatus,
}

/// A job together with its task records.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct JobDetail {
    #[serde(flatten)]
    pub job: Job,
    pub tasks: Vec<TranscodingTask>,
}

/// Register a task with the queue.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, JsonSchema)]
pub struct EnqueueTaskRequest {
    #[validate(length(min = 1, message = "task id is required"))]
    pub id: String,

    pub job_id: JobId,

    #[validate(length(min = 1, message = "profile is required"))]
    pub profile: String,

    #[validate(length(min = 1, message = "source object is required"))]
    pub source_object: String,
}

impl From<&TranscodingTask> for EnqueueTaskRequest {
    fn from(task: &TranscodingTask) -> Self {
        Self {
            id: task.id.to_string(),
            job_id: task.job_id.clone(),
            profile: task.profile.clone(),
            source_object: task.source_object.clone(),
        }
    }
}

/// Task status report from a worker.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct TaskStatusReport {
    pub status: TaskStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result_object: Option<String>,
}

/// Worker status report to the registry.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, JsonSchema)]
pub struct WorkerStatusReport {
    #[validate(length(min = 1, message = "worker address is required"))]
    pub addr: String,
    pub status: WorkerStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CountResponse {
    pub status: TaskStatus,
    pub count: u64,
}

/// Result of cancelling a task in the queue.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct CancelTaskResponse {
    pub task_id: Option<TaskId>,
    /// Worker that held the task, if it was running
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub claimant: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enqueue_validation() {
        let req = EnqueueTaskRequest {
            id: String::new(),
            job_id: JobId::from("j"),
            profile: "baseline".into(),
            source_object: "a.mov".into(),
        };
        let errors = req.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("id"));
    }

    #[test]
    fn test_submit_defaults_profiles() {
        let req: SubmitJobRequest = serde_json::from_str(r#"{"source":"a.mov"}"#).unwrap();
        assert!(req.profiles.is_empty());
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_job_detail_flattens() {
        let job = Job::new("a.mov", "a.mov");
        let detail = JobDetail {
            job: job.clone(),
            tasks: vec![],
        };
        let value = serde_json::to_value(&detail).unwrap();
        assert_eq!(value["id"], job.id.as_str());
        assert_eq!(value["status"], "queued");
    }
}
