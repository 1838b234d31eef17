//! The queue's operations as a trait, so callers work the same in-process
//! or across the network.

use async_trait::async_trait;

use wt_models::{EnqueueTaskRequest, TaskId, TaskStatus, TranscodingTask};

use crate::error::QueueResult;

#[async_trait]
pub trait TaskQueueApi: Send + Sync {
    /// Register a task as queued.
    ///
    /// Fails with `InvalidArgument` if the id, source object or profile is empty.
    async fn enqueue(&self, request: EnqueueTaskRequest) -> QueueResult<TranscodingTask>;

    /// Claim the oldest queued task for `worker_addr`.
    ///
    /// Fails with `NotFound` when nothing is queued. That is the normal
    /// idle answer, not a fault.
    async fn claim_next(&self, worker_addr: &str) -> QueueResult<TranscodingTask>;

    async fn count_by_status(&self, status: TaskStatus) -> QueueResult<u64>;

    /// Record a status reported by a worker.
    async fn update_status(&self, id: &TaskId, status: TaskStatus) -> QueueResult<()>;

    /// Cancel a queued or running task.
    ///
    /// Returns the address of the worker that held it, if it was running.
    /// Cancelling a terminal task is a successful no-op.
    async fn cancel(&self, id: &TaskId) -> QueueResult<Option<String>>;
}
