//! Task queue over the state store.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tracing::{debug, info, warn};
use validator::Validate;

use wt_api::metrics;
use wt_models::{EnqueueTaskRequest, TaskId, TaskStatus, TranscodingTask};
use wt_store::{StateStore, StoreError, TaskFilter};

use crate::api::TaskQueueApi;
use crate::error::{QueueError, QueueResult};
use crate::forward::CancellationForwarder;

const PENDING: [TaskStatus; 2] = [TaskStatus::Queued, TaskStatus::Running];

/// The authoritative queue of transcoding tasks.
///
/// Store errors are returned to the caller, never retried here.
pub struct TaskQueue {
    store: Arc<dyn StateStore>,
    forwarder: Option<Arc<dyn CancellationForwarder>>,
}

impl TaskQueue {
    pub fn new(store: Arc<dyn StateStore>) -> Self {
        Self {
            store,
            forwarder: None,
        }
    }

    /// Forward cancellation of running tasks to their worker.
    pub fn with_forwarder(mut self, forwarder: Arc<dyn CancellationForwarder>) -> Self {
        self.forwarder = Some(forwarder);
        self
    }

    pub fn store(&self) -> &Arc<dyn StateStore> {
        &self.store
    }

    pub async fn list_by_status(&self, status: TaskStatus) -> QueueResult<Vec<TranscodingTask>> {
        Ok(self.store.find_tasks(&TaskFilter::with_status(status)).await?)
    }

    pub async fn get(&self, id: &TaskId) -> QueueResult<TranscodingTask> {
        Ok(self.store.get_task(id).await?)
    }
}

#[async_trait]
impl TaskQueueApi for TaskQueue {
    async fn enqueue(&self, request: EnqueueTaskRequest) -> QueueResult<TranscodingTask> {
        request
            .validate()
            .map_err(|e| QueueError::invalid_argument(e.to_string()))?;

        let task = TranscodingTask {
            id: TaskId::from(request.id),
            job_id: request.job_id,
            profile: request.profile,
            source_object: request.source_object,
            result_object: None,
            status: TaskStatus::Queued,
            claimed_by: None,
            created_at: Utc::now(),
            started_at: None,
            ended_at: None,
        };

        match self.store.insert_task(&task).await {
            Ok(()) => {}
            Err(StoreError::AlreadyExists { id, .. }) => {
                return Err(QueueError::invalid_argument(format!(
                    "task {} is already queued",
                    id
                )))
            }
            Err(e) => return Err(e.into()),
        }

        metrics::record_task_enqueued();
        info!(task_id = %task.id, job_id = %task.job_id, profile = %task.profile, "Enqueued task");
        Ok(task)
    }

    async fn claim_next(&self, worker_addr: &str) -> QueueResult<TranscodingTask> {
        if worker_addr.is_empty() {
            return Err(QueueError::invalid_argument("worker address is required"));
        }
        match self.store.claim_next_queued(worker_addr, Utc::now()).await? {
            Some(task) => {
                metrics::record_task_claimed();
                info!(task_id = %task.id, worker = worker_addr, "Task claimed");
                Ok(task)
            }
            None => {
                debug!(worker = worker_addr, "No queued task to claim");
                Err(QueueError::not_found("no queued task"))
            }
        }
    }

    async fn count_by_status(&self, status: TaskStatus) -> QueueResult<u64> {
        Ok(self.store.count_tasks(status).await?)
    }

    async fn update_status(&self, id: &TaskId, status: TaskStatus) -> QueueResult<()> {
        match self
            .store
            .transition_task(id, &PENDING, status, Utc::now())
            .await?
        {
            Some(prior) => {
                if status.is_terminal() {
                    metrics::record_task_outcome(status.as_str());
                }
                info!(task_id = %id, from = %prior.status, to = %status, "Task status updated");
            }
            None => {
                debug!(task_id = %id, %status, "Task already terminal, status report ignored");
            }
        }
        Ok(())
    }

    async fn cancel(&self, id: &TaskId) -> QueueResult<Option<String>> {
        let prior = self
            .store
            .transition_task(id, &PENDING, TaskStatus::Cancelled, Utc::now())
            .await?;

        let Some(prior) = prior else {
            debug!(task_id = %id, "Cancel of terminal task is a no-op");
            return Ok(None);
        };

        metrics::record_task_cancelled();
        let claimant = match prior.status {
            TaskStatus::Running => prior.claimed_by,
            _ => None,
        };
        info!(task_id = %id, claimant = ?claimant, "Task cancelled");

        if let (Some(worker), Some(forwarder)) = (&claimant, &self.forwarder) {
            if let Err(e) = forwarder.request_cancellation(worker).await {
                warn!(task_id = %id, worker = %worker, "Failed to forward cancellation: {}", e);
            }
        }

        Ok(claimant)
    }
}
