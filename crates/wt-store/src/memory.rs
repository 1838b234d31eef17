//! In-memory store.
//!
//! Every operation holds one lock for its whole duration, so claims and
//! conditional transitions are atomic with respect to each other.

use std::collections::{HashMap, VecDeque};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use wt_models::{Job, JobId, TaskId, TaskStatus, TranscodingTask, WorkerEvent, WorkerRecord};

use crate::error::{StoreError, StoreResult};
use crate::store::{StateStore, TaskFilter, WORKER_HISTORY_LIMIT};

#[derive(Default)]
struct Inner {
    jobs: HashMap<JobId, Job>,
    job_order: Vec<JobId>,
    tasks: HashMap<TaskId, TranscodingTask>,
    task_order: Vec<TaskId>,
    workers: HashMap<String, WorkerRecord>,
    worker_order: Vec<String>,
    events: HashMap<String, VecDeque<WorkerEvent>>,
}

/// Store backed by process memory.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StateStore for MemoryStore {
    async fn insert_job(&self, job: &Job) -> StoreResult<()> {
        let mut inner = self.inner.write().await;
        if inner.jobs.contains_key(&job.id) {
            return Err(StoreError::already_exists("job", job.id.as_str()));
        }
        inner.job_order.push(job.id.clone());
        inner.jobs.insert(job.id.clone(), job.clone());
        Ok(())
    }

    async fn get_job(&self, id: &JobId) -> StoreResult<Job> {
        let inner = self.inner.read().await;
        inner
            .jobs
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::not_found("job", id.as_str()))
    }

    async fn upsert_job(&self, job: &Job) -> StoreResult<()> {
        let mut inner = self.inner.write().await;
        if inner.jobs.insert(job.id.clone(), job.clone()).is_none() {
            inner.job_order.push(job.id.clone());
        }
        Ok(())
    }

    async fn list_jobs(&self) -> StoreResult<Vec<Job>> {
        let inner = self.inner.read().await;
        Ok(inner
            .job_order
            .iter()
            .filter_map(|id| inner.jobs.get(id).cloned())
            .collect())
    }

    async fn insert_task(&self, task: &TranscodingTask) -> StoreResult<()> {
        let mut inner = self.inner.write().await;
        if inner.tasks.contains_key(&task.id) {
            return Err(StoreError::already_exists("task", task.id.as_str()));
        }
        inner.task_order.push(task.id.clone());
        inner.tasks.insert(task.id.clone(), task.clone());
        Ok(())
    }

    async fn get_task(&self, id: &TaskId) -> StoreResult<TranscodingTask> {
        let inner = self.inner.read().await;
        inner
            .tasks
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::not_found("task", id.as_str()))
    }

    async fn upsert_task(&self, task: &TranscodingTask) -> StoreResult<()> {
        let mut inner = self.inner.write().await;
        if inner.tasks.insert(task.id.clone(), task.clone()).is_none() {
            inner.task_order.push(task.id.clone());
        }
        Ok(())
    }

    async fn find_tasks(&self, filter: &TaskFilter) -> StoreResult<Vec<TranscodingTask>> {
        let inner = self.inner.read().await;
        Ok(inner
            .task_order
            .iter()
            .filter_map(|id| inner.tasks.get(id))
            .filter(|task| filter.matches(task))
            .cloned()
            .collect())
    }

    async fn count_tasks(&self, status: TaskStatus) -> StoreResult<u64> {
        let inner = self.inner.read().await;
        Ok(inner.tasks.values().filter(|t| t.status == status).count() as u64)
    }

    async fn claim_next_queued(
        &self,
        worker: &str,
        now: DateTime<Utc>,
    ) -> StoreResult<Option<TranscodingTask>> {
        let mut inner = self.inner.write().await;

        // min_by_key keeps the first of equal keys, which is insertion order
        let next = inner
            .task_order
            .iter()
            .filter_map(|id| inner.tasks.get(id))
            .filter(|task| task.status == TaskStatus::Queued)
            .min_by_key(|task| task.created_at)
            .map(|task| task.id.clone());

        let Some(id) = next else {
            return Ok(None);
        };
        let task = inner
            .tasks
            .get_mut(&id)
            .ok_or_else(|| StoreError::not_found("task", id.as_str()))?;
        task.claim(worker, now);
        Ok(Some(task.clone()))
    }

    async fn transition_task(
        &self,
        id: &TaskId,
        allowed_from: &[TaskStatus],
        to: TaskStatus,
        now: DateTime<Utc>,
    ) -> StoreResult<Option<TranscodingTask>> {
        let mut inner = self.inner.write().await;
        let task = inner
            .tasks
            .get_mut(id)
            .ok_or_else(|| StoreError::not_found("task", id.as_str()))?;
        if !allowed_from.contains(&task.status) {
            return Ok(None);
        }
        let prior = task.clone();
        task.apply_status(to, now);
        Ok(Some(prior))
    }

    async fn record_worker_event(&self, event: &WorkerEvent) -> StoreResult<()> {
        let mut inner = self.inner.write().await;
        if inner
            .workers
            .insert(event.addr.clone(), event.to_record())
            .is_none()
        {
            inner.worker_order.push(event.addr.clone());
        }
        let history = inner.events.entry(event.addr.clone()).or_default();
        if history.len() == WORKER_HISTORY_LIMIT {
            history.pop_front();
        }
        history.push_back(event.clone());
        Ok(())
    }

    async fn list_workers(&self) -> StoreResult<Vec<WorkerRecord>> {
        let inner = self.inner.read().await;
        Ok(inner
            .worker_order
            .iter()
            .filter_map(|addr| inner.workers.get(addr).cloned())
            .collect())
    }

    async fn worker_events(&self, addr: &str) -> StoreResult<Vec<WorkerEvent>> {
        let inner = self.inner.read().await;
        Ok(inner
            .events
            .get(addr)
            .map(|history| history.iter().cloned().collect())
            .unwrap_or_default())
    }

    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }
}
