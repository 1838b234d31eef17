//! The status report hop from workers to the jobs service.

use async_trait::async_trait;

use wt_models::{TaskId, TaskStatus};

use crate::error::JobsResult;

#[async_trait]
pub trait JobsApi: Send + Sync {
    /// Record a task status reported by a worker.
    ///
    /// `result_object` is only kept when `status` is FINISHED.
    async fn report_task_status(
        &self,
        id: &TaskId,
        status: TaskStatus,
        result_object: Option<String>,
    ) -> JobsResult<()>;
}
