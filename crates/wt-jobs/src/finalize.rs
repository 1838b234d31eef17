//! Job finalization: derive a job's terminal status from its tasks.

use tracing::{debug, info};

use wt_api::metrics;
use wt_models::{JobId, JobStatus, TaskStatus};
use wt_store::{StateStore, TaskFilter};

use crate::error::JobsResult;

/// Finish the job once none of its tasks is queued or running.
///
/// The job becomes FINISHED if any task finished, otherwise ERROR. Jobs
/// that are no longer queued or running are left alone, so calling this
/// repeatedly is harmless. Returns the new status when the job moved.
pub async fn finalize_job(store: &dyn StateStore, job_id: &JobId) -> JobsResult<Option<JobStatus>> {
    let pending = store
        .find_tasks(&TaskFilter::for_job(job_id).statuses(&[TaskStatus::Queued, TaskStatus::Running]))
        .await?;
    if !pending.is_empty() {
        debug!(job_id = %job_id, pending = pending.len(), "Job still has pending tasks");
        return Ok(None);
    }

    let mut job = store.get_job(job_id).await?;
    if !job.status.is_pending() {
        return Ok(None);
    }

    let tasks = store.find_tasks(&TaskFilter::for_job(job_id)).await?;
    let status = if tasks.iter().any(|t| t.status == TaskStatus::Finished) {
        JobStatus::Finished
    } else {
        JobStatus::Error
    };

    if status == JobStatus::Error {
        job.fail("no transcoding finished");
    } else {
        job.finish_with(status);
    }
    store.upsert_job(&job).await?;

    metrics::record_job_finalized(status.as_str());
    info!(job_id = %job_id, status = %status, "Job finalized");
    Ok(Some(status))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use wt_models::{Job, TranscodingTask};
    use wt_store::MemoryStore;

    async fn seed(store: &MemoryStore, statuses: &[TaskStatus]) -> JobId {
        let mut job = Job::new("in.mov", "in.mov");
        for status in statuses {
            let mut task = TranscodingTask::new(job.id.clone(), "baseline", "in.mov");
            task.apply_status(*status, Utc::now());
            job.task_ids.push(task.id.clone());
            store.insert_task(&task).await.unwrap();
        }
        store.insert_job(&job).await.unwrap();
        job.id
    }

    #[tokio::test]
    async fn test_pending_task_blocks_finalization() {
        let store = MemoryStore::new();
        let id = seed(&store, &[TaskStatus::Finished, TaskStatus::Running]).await;
        assert_eq!(finalize_job(&store, &id).await.unwrap(), None);
        assert_eq!(store.get_job(&id).await.unwrap().status, JobStatus::Queued);
    }

    #[tokio::test]
    async fn test_finishes_when_any_task_finished() {
        let store = MemoryStore::new();
        let id = seed(&store, &[TaskStatus::Finished, TaskStatus::Error]).await;
        assert_eq!(
            finalize_job(&store, &id).await.unwrap(),
            Some(JobStatus::Finished)
        );
        let job = store.get_job(&id).await.unwrap();
        assert_eq!(job.status, JobStatus::Finished);
        assert!(job.ended_at.is_some());
    }

    #[tokio::test]
    async fn test_all_failed_is_error() {
        let store = MemoryStore::new();
        let id = seed(&store, &[TaskStatus::Error, TaskStatus::Error]).await;
        assert_eq!(finalize_job(&store, &id).await.unwrap(), Some(JobStatus::Error));
        assert!(store.get_job(&id).await.unwrap().error_message.is_some());
    }

    #[tokio::test]
    async fn test_second_run_is_a_no_op() {
        let store = MemoryStore::new();
        let id = seed(&store, &[TaskStatus::Finished]).await;
        finalize_job(&store, &id).await.unwrap();
        let before = store.get_job(&id).await.unwrap();

        assert_eq!(finalize_job(&store, &id).await.unwrap(), None);
        assert_eq!(store.get_job(&id).await.unwrap(), before);
    }
}
