//! Job orchestration over the state store and the task queue.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tracing::{debug, info, warn};

use wt_api::metrics;
use wt_models::{
    EnqueueTaskRequest, Job, JobDetail, JobId, JobStatus, TaskId, TaskStatus, TranscodingTask,
};
use wt_queue::TaskQueueApi;
use wt_storage::{fetch_source, source_file_name, Container, ObjectStorage};
use wt_store::{StateStore, TaskFilter};

use crate::api::JobsApi;
use crate::error::{JobsError, JobsResult};
use crate::finalize::finalize_job;

const PENDING: [TaskStatus; 2] = [TaskStatus::Queued, TaskStatus::Running];

/// Job-level operations for external callers.
///
/// Store and queue errors are returned to the caller, never swallowed.
pub struct JobService {
    store: Arc<dyn StateStore>,
    queue: Arc<dyn TaskQueueApi>,
    storage: Arc<dyn ObjectStorage>,
    http: reqwest::Client,
    work_dir: PathBuf,
}

impl JobService {
    pub fn new(
        store: Arc<dyn StateStore>,
        queue: Arc<dyn TaskQueueApi>,
        storage: Arc<dyn ObjectStorage>,
        work_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            store,
            queue,
            storage,
            http: reqwest::Client::new(),
            work_dir: work_dir.into(),
        }
    }

    /// Client used to fetch URL sources.
    pub fn with_http_client(mut self, http: reqwest::Client) -> Self {
        self.http = http;
        self
    }

    pub fn store(&self) -> &Arc<dyn StateStore> {
        &self.store
    }

    /// Submit a job transcoding `source` into each of `profiles`.
    ///
    /// When the source cannot be stored, the job is still recorded with
    /// status ERROR and its tasks as SKIPPED, and the error carries the
    /// job id.
    pub async fn add_new_job(&self, source: &str, profiles: &[String]) -> JobsResult<JobId> {
        if profiles.is_empty() {
            return Err(JobsError::NoTranscodings);
        }
        if source.trim().is_empty() {
            return Err(JobsError::invalid_argument("source is required"));
        }

        let mut job = Job::new(source, source_file_name(source));
        let upload = self.store_source(source).await;
        let now = Utc::now();

        let mut tasks = Vec::with_capacity(profiles.len());
        for profile in profiles {
            let object = upload.as_deref().unwrap_or_default();
            let mut task = TranscodingTask::new(job.id.clone(), profile.as_str(), object);
            if upload.is_err() {
                task.apply_status(TaskStatus::Skipped, now);
            }
            job.task_ids.push(task.id.clone());
            tasks.push(task);
        }

        match &upload {
            Ok(name) => job.object_name = Some(name.clone()),
            Err(reason) => job.fail(format!("source upload failed: {}", reason)),
        }

        for task in &tasks {
            self.store.insert_task(task).await?;
        }
        self.store.insert_job(&job).await?;
        metrics::record_job_submitted();

        if let Err(reason) = upload {
            warn!(job_id = %job.id, "Job recorded without source: {}", reason);
            return Err(JobsError::SourceUpload {
                job_id: job.id,
                reason,
            });
        }

        info!(job_id = %job.id, tasks = tasks.len(), "Job submitted");

        let mut rejected = 0;
        for task in &tasks {
            if let Err(e) = self.queue.enqueue(EnqueueTaskRequest::from(task)).await {
                warn!(job_id = %job.id, task_id = %task.id, "Failed to enqueue task: {}", e);
                self.store
                    .transition_task(&task.id, &[TaskStatus::Queued], TaskStatus::Error, Utc::now())
                    .await?;
                rejected += 1;
            }
        }
        if rejected > 0 {
            finalize_job(self.store.as_ref(), &job.id).await?;
        }

        Ok(job.id)
    }

    /// Fetch the source if needed and upload it to the source container.
    async fn store_source(&self, source: &str) -> Result<String, String> {
        let local = fetch_source(&self.http, source, &self.work_dir)
            .await
            .map_err(|e| e.to_string())?;

        // A fetched copy is removed when `local` drops
        self.storage
            .upload(local.path(), &source_file_name(source), Container::Source)
            .await
            .map_err(|e| e.to_string())
    }

    pub async fn get_job_status(&self, id: &JobId) -> JobsResult<JobStatus> {
        Ok(self.store.get_job(id).await?.status)
    }

    /// A job with its task records.
    pub async fn get_job(&self, id: &JobId) -> JobsResult<JobDetail> {
        let job = self.store.get_job(id).await?;
        let tasks = self.store.find_tasks(&TaskFilter::for_job(id)).await?;
        Ok(JobDetail { job, tasks })
    }

    pub async fn list_jobs(&self) -> JobsResult<Vec<Job>> {
        Ok(self.store.list_jobs().await?)
    }

    /// Cancel every pending task of the job, then the job itself.
    ///
    /// Fails with `CantCancel` for finished or cancelled jobs without
    /// touching anything.
    pub async fn cancel_job(&self, id: &JobId) -> JobsResult<()> {
        let job = self.store.get_job(id).await?;
        if matches!(job.status, JobStatus::Finished | JobStatus::Cancelled) {
            return Err(JobsError::CantCancel(id.to_string()));
        }

        let pending = self
            .store
            .find_tasks(&TaskFilter::for_job(id).statuses(&PENDING))
            .await?;

        for task in pending {
            // Queue first: if that call fails the stored task stays pending.
            match self.queue.cancel(&task.id).await {
                Ok(Some(worker)) => {
                    info!(job_id = %id, task_id = %task.id, worker = %worker, "Cancelled running task")
                }
                Ok(None) => debug!(job_id = %id, task_id = %task.id, "Cancelled task"),
                Err(e) if e.is_not_found() => {
                    warn!(job_id = %id, task_id = %task.id, "Task unknown to the queue")
                }
                Err(e) => return Err(e.into()),
            }
            self.store
                .transition_task(&task.id, &PENDING, TaskStatus::Cancelled, Utc::now())
                .await?;
        }

        // Reports may have touched the job while tasks were cancelled.
        let mut job = self.store.get_job(id).await?;
        job.finish_with(JobStatus::Cancelled);
        self.store.upsert_job(&job).await?;

        metrics::record_job_finalized(JobStatus::Cancelled.as_str());
        info!(job_id = %id, "Job cancelled");
        Ok(())
    }

    /// Apply a worker's report to the task, then run the finalization check.
    ///
    /// Reports for a task that is already terminal are ignored.
    pub async fn update_transcoding_status(
        &self,
        id: &TaskId,
        status: TaskStatus,
        result_object: Option<&str>,
    ) -> JobsResult<()> {
        let mut task = self.store.get_task(id).await?;

        // The first terminal status sticks, as in the manager
        if task.status.is_terminal() {
            debug!(task_id = %id, current = %task.status, reported = %status, "Ignoring report for terminal task");
            return Ok(());
        }

        let changed = task.apply_status(status, Utc::now());
        if status == TaskStatus::Finished {
            task.set_result(result_object);
        }
        self.store.upsert_task(&task).await?;

        if !changed {
            debug!(task_id = %id, status = %status, "Task status unchanged");
        }

        match status {
            TaskStatus::Running => {
                let mut job = self.store.get_job(&task.job_id).await?;
                if job.status == JobStatus::Queued {
                    job.start();
                    self.store.upsert_job(&job).await?;
                    info!(job_id = %job.id, "Job running");
                }
            }
            TaskStatus::Finished | TaskStatus::Error => {
                if changed {
                    metrics::record_task_outcome(status.as_str());
                }
                finalize_job(self.store.as_ref(), &task.job_id).await?;
            }
            _ => {}
        }

        info!(job_id = %task.job_id, task_id = %id, status = %status, "Task status updated");
        Ok(())
    }
}

#[async_trait]
impl JobsApi for JobService {
    async fn report_task_status(
        &self,
        id: &TaskId,
        status: TaskStatus,
        result_object: Option<String>,
    ) -> JobsResult<()> {
        self.update_transcoding_status(id, status, result_object.as_deref())
            .await
    }
}
