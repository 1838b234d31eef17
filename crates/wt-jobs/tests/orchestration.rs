//! Job orchestration scenarios against in-memory stores and queue.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use wt_jobs::{finalize_job, JobService, JobsError};
use wt_models::{JobId, JobStatus, TaskStatus, TranscodingTask};
use wt_queue::{CancellationForwarder, QueueResult, TaskQueue, TaskQueueApi};
use wt_storage::LocalObjectStorage;
use wt_store::{MemoryStore, StateStore, TaskFilter};

#[derive(Default)]
struct RecordingForwarder {
    workers: Mutex<Vec<String>>,
}

#[async_trait]
impl CancellationForwarder for RecordingForwarder {
    async fn request_cancellation(&self, worker_addr: &str) -> QueueResult<()> {
        self.workers.lock().unwrap().push(worker_addr.to_string());
        Ok(())
    }
}

struct Harness {
    jobs: JobService,
    queue: Arc<TaskQueue>,
    forwarder: Arc<RecordingForwarder>,
    source: String,
    _dir: tempfile::TempDir,
}

impl Harness {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("holiday.mov");
        std::fs::write(&source, b"not really a movie").unwrap();

        let forwarder = Arc::new(RecordingForwarder::default());
        let queue = Arc::new(
            TaskQueue::new(Arc::new(MemoryStore::new())).with_forwarder(forwarder.clone()),
        );
        let jobs = JobService::new(
            Arc::new(MemoryStore::new()),
            queue.clone(),
            Arc::new(LocalObjectStorage::new(dir.path().join("objects"))),
            dir.path().join("work"),
        );

        Self {
            jobs,
            queue,
            forwarder,
            source: source.to_string_lossy().into_owned(),
            _dir: dir,
        }
    }

    async fn submit(&self, profiles: &[&str]) -> JobId {
        let profiles: Vec<String> = profiles.iter().map(|p| p.to_string()).collect();
        self.jobs.add_new_job(&self.source, &profiles).await.unwrap()
    }

    async fn tasks(&self, job_id: &JobId) -> Vec<TranscodingTask> {
        self.jobs
            .store()
            .find_tasks(&TaskFilter::for_job(job_id))
            .await
            .unwrap()
    }

    async fn assert_finished_has_no_pending(&self, job_id: &JobId) {
        let status = self.jobs.get_job_status(job_id).await.unwrap();
        if status == JobStatus::Finished {
            assert!(self.tasks(job_id).await.iter().all(|t| t.status.is_terminal()));
        }
    }
}

#[tokio::test]
async fn test_new_job_is_queued() {
    let h = Harness::new();
    let job_id = h.submit(&["p1", "p2"]).await;

    assert_eq!(h.jobs.get_job_status(&job_id).await.unwrap(), JobStatus::Queued);
    let detail = h.jobs.get_job(&job_id).await.unwrap();
    assert_eq!(detail.tasks.len(), 2);
    assert_eq!(detail.job.task_ids.len(), 2);
    assert!(detail.job.object_name.is_some());
    assert_eq!(h.queue.count_by_status(TaskStatus::Queued).await.unwrap(), 2);
}

#[tokio::test]
async fn test_no_profiles_is_rejected() {
    let h = Harness::new();
    let err = h.jobs.add_new_job(&h.source, &[]).await.unwrap_err();
    assert!(matches!(err, JobsError::NoTranscodings));
    assert!(h.jobs.list_jobs().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_unknown_job_status_is_not_found() {
    let h = Harness::new();
    let err = h.jobs.get_job_status(&JobId::from("nope")).await.unwrap_err();
    assert!(matches!(err, JobsError::NotFound(_)));
}

#[tokio::test]
async fn test_baseline_job_finishes_with_result() {
    let h = Harness::new();
    let job_id = h.submit(&["baseline"]).await;

    let claimed = h.queue.claim_next("10.0.0.7:8083").await.unwrap();
    assert_eq!(claimed.job_id, job_id);

    h.jobs
        .update_transcoding_status(&claimed.id, TaskStatus::Running, None)
        .await
        .unwrap();
    assert_eq!(h.jobs.get_job_status(&job_id).await.unwrap(), JobStatus::Running);

    h.jobs
        .update_transcoding_status(&claimed.id, TaskStatus::Finished, Some("out-123.mp4"))
        .await
        .unwrap();
    h.queue
        .update_status(&claimed.id, TaskStatus::Finished)
        .await
        .unwrap();

    let detail = h.jobs.get_job(&job_id).await.unwrap();
    assert_eq!(detail.job.status, JobStatus::Finished);
    assert!(detail.job.started_at.is_some());
    assert!(detail.job.ended_at.is_some());
    assert_eq!(detail.tasks[0].result_object.as_deref(), Some("out-123.mp4"));
    h.assert_finished_has_no_pending(&job_id).await;
}

#[tokio::test]
async fn test_cancel_before_claim() {
    let h = Harness::new();
    let job_id = h.submit(&["baseline"]).await;

    h.jobs.cancel_job(&job_id).await.unwrap();

    assert_eq!(h.jobs.get_job_status(&job_id).await.unwrap(), JobStatus::Cancelled);
    assert_eq!(h.tasks(&job_id).await[0].status, TaskStatus::Cancelled);
    assert!(h.queue.claim_next("w1").await.unwrap_err().is_not_found());
    assert!(h.forwarder.workers.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_cancel_running_and_queued_tasks() {
    let h = Harness::new();
    let job_id = h.submit(&["baseline", "iPhone5s"]).await;

    let running = h.queue.claim_next("10.0.0.7:8083").await.unwrap();
    h.jobs
        .update_transcoding_status(&running.id, TaskStatus::Running, None)
        .await
        .unwrap();

    h.jobs.cancel_job(&job_id).await.unwrap();

    assert_eq!(h.jobs.get_job_status(&job_id).await.unwrap(), JobStatus::Cancelled);
    let tasks = h.tasks(&job_id).await;
    assert_eq!(tasks.len(), 2);
    assert!(tasks.iter().all(|t| t.status == TaskStatus::Cancelled));
    assert_eq!(h.queue.count_by_status(TaskStatus::Cancelled).await.unwrap(), 2);
    assert_eq!(
        *h.forwarder.workers.lock().unwrap(),
        vec!["10.0.0.7:8083".to_string()]
    );
}

#[tokio::test]
async fn test_cancel_finished_job_changes_nothing() {
    let h = Harness::new();
    let job_id = h.submit(&["baseline"]).await;
    let claimed = h.queue.claim_next("w1").await.unwrap();
    h.jobs
        .update_transcoding_status(&claimed.id, TaskStatus::Finished, Some("out.mp4"))
        .await
        .unwrap();

    let before = h.jobs.get_job(&job_id).await.unwrap();
    let err = h.jobs.cancel_job(&job_id).await.unwrap_err();
    assert!(matches!(err, JobsError::CantCancel(_)));

    let after = h.jobs.get_job(&job_id).await.unwrap();
    assert_eq!(after.job, before.job);
    assert_eq!(after.tasks, before.tasks);
    assert!(h.forwarder.workers.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_finalization_is_idempotent() {
    let h = Harness::new();
    let job_id = h.submit(&["baseline"]).await;
    let claimed = h.queue.claim_next("w1").await.unwrap();
    h.jobs
        .update_transcoding_status(&claimed.id, TaskStatus::Finished, Some("out.mp4"))
        .await
        .unwrap();

    let store: &dyn StateStore = h.jobs.store().as_ref();
    let before = store.get_job(&job_id).await.unwrap();
    assert_eq!(before.status, JobStatus::Finished);

    assert_eq!(finalize_job(store, &job_id).await.unwrap(), None);
    assert_eq!(finalize_job(store, &job_id).await.unwrap(), None);
    assert_eq!(store.get_job(&job_id).await.unwrap(), before);
}

#[tokio::test]
async fn test_job_waits_for_every_task() {
    let h = Harness::new();
    let job_id = h.submit(&["baseline", "iPhone4s"]).await;

    let first = h.queue.claim_next("w1").await.unwrap();
    h.jobs
        .update_transcoding_status(&first.id, TaskStatus::Finished, Some("a.mp4"))
        .await
        .unwrap();
    assert_ne!(h.jobs.get_job_status(&job_id).await.unwrap(), JobStatus::Finished);

    let second = h.queue.claim_next("w2").await.unwrap();
    h.jobs
        .update_transcoding_status(&second.id, TaskStatus::Error, None)
        .await
        .unwrap();
    assert_eq!(h.jobs.get_job_status(&job_id).await.unwrap(), JobStatus::Finished);
    h.assert_finished_has_no_pending(&job_id).await;
}

#[tokio::test]
async fn test_every_task_failed_is_job_error() {
    let h = Harness::new();
    let job_id = h.submit(&["baseline"]).await;
    let claimed = h.queue.claim_next("w1").await.unwrap();
    h.jobs
        .update_transcoding_status(&claimed.id, TaskStatus::Error, None)
        .await
        .unwrap();
    assert_eq!(h.jobs.get_job_status(&job_id).await.unwrap(), JobStatus::Error);
}

#[tokio::test]
async fn test_finished_report_without_name_keeps_result() {
    let h = Harness::new();
    let job_id = h.submit(&["baseline"]).await;
    let claimed = h.queue.claim_next("w1").await.unwrap();
    h.jobs
        .update_transcoding_status(&claimed.id, TaskStatus::Finished, Some("out-123.mp4"))
        .await
        .unwrap();
    h.jobs
        .update_transcoding_status(&claimed.id, TaskStatus::Finished, None)
        .await
        .unwrap();

    assert_eq!(
        h.tasks(&job_id).await[0].result_object.as_deref(),
        Some("out-123.mp4")
    );
}

#[tokio::test]
async fn test_late_running_report_is_ignored() {
    let h = Harness::new();
    let job_id = h.submit(&["baseline"]).await;
    h.jobs.cancel_job(&job_id).await.unwrap();

    let task_id = h.tasks(&job_id).await[0].id.clone();
    h.jobs
        .update_transcoding_status(&task_id, TaskStatus::Running, None)
        .await
        .unwrap();

    assert_eq!(h.tasks(&job_id).await[0].status, TaskStatus::Cancelled);
    assert_eq!(h.jobs.get_job_status(&job_id).await.unwrap(), JobStatus::Cancelled);
}

#[tokio::test]
async fn test_report_after_job_cancel_keeps_task_cancelled() {
    let h = Harness::new();
    let job_id = h.submit(&["baseline"]).await;
    let claimed = h.queue.claim_next("10.0.0.7:8083").await.unwrap();

    // The worker never saw the cancellation and finishes anyway
    h.jobs.cancel_job(&job_id).await.unwrap();
    h.jobs
        .update_transcoding_status(&claimed.id, TaskStatus::Finished, Some("out.mp4"))
        .await
        .unwrap();
    h.queue
        .update_status(&claimed.id, TaskStatus::Finished)
        .await
        .unwrap();

    let detail = h.jobs.get_job(&job_id).await.unwrap();
    assert_eq!(detail.job.status, JobStatus::Cancelled);
    assert_eq!(detail.tasks[0].status, TaskStatus::Cancelled);
    assert!(detail.tasks[0].result_object.is_none());
    assert_eq!(h.queue.count_by_status(TaskStatus::Cancelled).await.unwrap(), 1);
    assert_eq!(h.queue.count_by_status(TaskStatus::Finished).await.unwrap(), 0);
}

#[tokio::test]
async fn test_first_terminal_report_wins() {
    let h = Harness::new();
    let job_id = h.submit(&["baseline"]).await;
    let claimed = h.queue.claim_next("w1").await.unwrap();
    h.jobs
        .update_transcoding_status(&claimed.id, TaskStatus::Error, None)
        .await
        .unwrap();
    h.jobs
        .update_transcoding_status(&claimed.id, TaskStatus::Finished, Some("late.mp4"))
        .await
        .unwrap();

    let detail = h.jobs.get_job(&job_id).await.unwrap();
    assert_eq!(detail.tasks[0].status, TaskStatus::Error);
    assert!(detail.tasks[0].result_object.is_none());
    assert_eq!(detail.job.status, JobStatus::Error);
}

#[tokio::test]
async fn test_source_upload_failure_records_job() {
    let h = Harness::new();
    let err = h
        .jobs
        .add_new_job("/no/such/file.mov", &["baseline".to_string(), "iPadMini4".to_string()])
        .await
        .unwrap_err();

    let job_id = err.recorded_job_id().cloned().unwrap();
    let detail = h.jobs.get_job(&job_id).await.unwrap();
    assert_eq!(detail.job.status, JobStatus::Error);
    assert!(detail.job.error_message.is_some());
    assert!(detail.job.object_name.is_none());
    assert!(detail.tasks.iter().all(|t| t.status == TaskStatus::Skipped));
    assert_eq!(h.queue.count_by_status(TaskStatus::Queued).await.unwrap(), 0);
}
