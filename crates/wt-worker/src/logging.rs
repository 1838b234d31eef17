//! Structured task logging.

use tracing::{error, info, warn, Span};

use wt_models::TranscodingTask;

/// Logs task lifecycle events with the task, job and profile attached.
#[derive(Debug, Clone)]
pub struct TaskLogger {
    task_id: String,
    job_id: String,
    profile: String,
}

impl TaskLogger {
    pub fn new(task: &TranscodingTask) -> Self {
        Self {
            task_id: task.id.to_string(),
            job_id: task.job_id.to_string(),
            profile: task.profile.clone(),
        }
    }

    pub fn log_start(&self, message: &str) {
        info!(
            task_id = %self.task_id,
            job_id = %self.job_id,
            profile = %self.profile,
            "Task started: {}", message
        );
    }

    pub fn log_progress(&self, message: &str) {
        info!(task_id = %self.task_id, "Task progress: {}", message);
    }

    pub fn log_warning(&self, message: &str) {
        warn!(task_id = %self.task_id, job_id = %self.job_id, "Task warning: {}", message);
    }

    pub fn log_error(&self, message: &str) {
        error!(
            task_id = %self.task_id,
            job_id = %self.job_id,
            profile = %self.profile,
            "Task error: {}", message
        );
    }

    pub fn log_completion(&self, message: &str) {
        info!(
            task_id = %self.task_id,
            job_id = %self.job_id,
            profile = %self.profile,
            "Task completed: {}", message
        );
    }

    pub fn task_id(&self) -> &str {
        &self.task_id
    }

    /// Span covering the task's execution.
    pub fn create_span(&self) -> Span {
        tracing::info_span!("task", task_id = %self.task_id, job_id = %self.job_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wt_models::JobId;

    #[test]
    fn test_task_logger_creation() {
        let task = TranscodingTask::new(JobId::from("job-1"), "iPhone5s", "in.mov");
        let logger = TaskLogger::new(&task);
        assert_eq!(logger.task_id(), task.id.as_str());
        assert_eq!(logger.profile, "iPhone5s");
    }
}
