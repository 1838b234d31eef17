//! The state store abstraction.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use wt_models::{Job, JobId, TaskId, TaskStatus, TranscodingTask, WorkerEvent, WorkerRecord};

use crate::error::StoreResult;

/// Events kept per worker; older ones are dropped.
pub const WORKER_HISTORY_LIMIT: usize = 500;

/// Predicate for task queries. Empty fields match everything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskFilter {
    pub job_id: Option<JobId>,
    pub statuses: Vec<TaskStatus>,
    pub claimed_by: Option<String>,
}

impl TaskFilter {
    pub fn for_job(job_id: &JobId) -> Self {
        Self {
            job_id: Some(job_id.clone()),
            ..Default::default()
        }
    }

    pub fn with_status(status: TaskStatus) -> Self {
        Self {
            statuses: vec![status],
            ..Default::default()
        }
    }

    pub fn statuses(mut self, statuses: &[TaskStatus]) -> Self {
        self.statuses = statuses.to_vec();
        self
    }

    pub fn claimed_by(mut self, worker: impl Into<String>) -> Self {
        self.claimed_by = Some(worker.into());
        self
    }

    pub fn matches(&self, task: &TranscodingTask) -> bool {
        if let Some(job_id) = &self.job_id {
            if &task.job_id != job_id {
                return false;
            }
        }
        if !self.statuses.is_empty() && !self.statuses.contains(&task.status) {
            return false;
        }
        if let Some(worker) = &self.claimed_by {
            if task.claimed_by.as_deref() != Some(worker.as_str()) {
                return false;
            }
        }
        true
    }
}

/// Persistence for jobs, tasks and worker records.
///
/// Reads of unknown ids fail with [`StoreError::NotFound`](crate::StoreError::NotFound).
/// Job and task listings are in insertion order.
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Insert a new job. Fails if the id exists.
    async fn insert_job(&self, job: &Job) -> StoreResult<()>;

    async fn get_job(&self, id: &JobId) -> StoreResult<Job>;

    /// Replace an existing job.
    async fn upsert_job(&self, job: &Job) -> StoreResult<()>;

    async fn list_jobs(&self) -> StoreResult<Vec<Job>>;

    /// Insert a new task. Fails if the id exists.
    async fn insert_task(&self, task: &TranscodingTask) -> StoreResult<()>;

    async fn get_task(&self, id: &TaskId) -> StoreResult<TranscodingTask>;

    /// Replace an existing task.
    async fn upsert_task(&self, task: &TranscodingTask) -> StoreResult<()>;

    async fn find_tasks(&self, filter: &TaskFilter) -> StoreResult<Vec<TranscodingTask>>;

    async fn count_tasks(&self, status: TaskStatus) -> StoreResult<u64>;

    /// Atomically claim the oldest queued task for `worker`.
    ///
    /// Ties on `created_at` are broken by insertion order. Two concurrent
    /// callers never receive the same task.
    async fn claim_next_queued(
        &self,
        worker: &str,
        now: DateTime<Utc>,
    ) -> StoreResult<Option<TranscodingTask>>;

    /// Move a task to `to` only if its current status is in `allowed_from`.
    ///
    /// Returns the task as it was before the change, or `None` when the
    /// current status did not allow it.
    async fn transition_task(
        &self,
        id: &TaskId,
        allowed_from: &[TaskStatus],
        to: TaskStatus,
        now: DateTime<Utc>,
    ) -> StoreResult<Option<TranscodingTask>>;

    /// Upsert the worker's record and append the event to its history,
    /// keeping at most [`WORKER_HISTORY_LIMIT`] events per worker.
    async fn record_worker_event(&self, event: &WorkerEvent) -> StoreResult<()>;

    async fn list_workers(&self) -> StoreResult<Vec<WorkerRecord>>;

    /// Oldest first.
    async fn worker_events(&self, addr: &str) -> StoreResult<Vec<WorkerEvent>>;

    /// Check the backend is reachable.
    async fn ping(&self) -> StoreResult<()>;
}
