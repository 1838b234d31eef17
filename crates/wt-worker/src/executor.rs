//! Task executor: the worker's poll/execute loop.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::{watch, Mutex};
use tracing::{debug, info, Instrument};

use wt_api::metrics;
use wt_jobs::JobsApi;
use wt_media::{TranscodeExit, Transcoder};
use wt_models::{find_profile, TaskStatus, TranscodingTask, WorkerStatus};
use wt_monitor::StatusReporter;
use wt_queue::TaskQueueApi;
use wt_storage::{transcoded_file_name, Container, ObjectStorage};

use crate::config::WorkerConfig;
use crate::error::{WorkerError, WorkerResult};
use crate::failures::FailureTracker;
use crate::logging::TaskLogger;
use crate::state::{WorkerState, WorkerStatusView};

/// Peers and collaborators the executor talks to.
pub struct WorkerServices {
    pub queue: Arc<dyn TaskQueueApi>,
    pub jobs: Arc<dyn JobsApi>,
    pub registry: Arc<dyn StatusReporter>,
    pub storage: Arc<dyn ObjectStorage>,
    pub transcoder: Arc<dyn Transcoder>,
}

/// Claims tasks from the manager and runs them one at a time.
pub struct TaskExecutor {
    addr: String,
    poll_interval: Duration,
    work_dir: PathBuf,
    services: WorkerServices,
    state: Mutex<WorkerState>,
    shutdown: watch::Sender<bool>,
}

impl TaskExecutor {
    pub fn new(config: &WorkerConfig, services: WorkerServices) -> Self {
        let (shutdown, _) = watch::channel(false);
        Self {
            addr: config.advertise_addr.clone(),
            poll_interval: config.poll_interval,
            work_dir: config.work_dir.clone(),
            services,
            state: Mutex::new(WorkerState::default()),
            shutdown,
        }
    }

    pub fn addr(&self) -> &str {
        &self.addr
    }

    /// Poll until shutdown is signalled.
    ///
    /// A task in flight is always run to completion before the loop exits.
    pub async fn run(&self) -> WorkerResult<()> {
        info!(
            worker = %self.addr,
            poll_secs = self.poll_interval.as_secs(),
            "Starting task executor"
        );

        let mut shutdown_rx = self.shutdown.subscribe();
        let mut manager = FailureTracker::new("manager", 3);

        self.announce(WorkerStatus::Online).await;
        self.set_status(WorkerStatus::Idle).await;

        while !*shutdown_rx.borrow() {
            let wait = match self.run_once().await {
                Ok(Some(status)) => {
                    manager.success();
                    status == TaskStatus::Error
                }
                Ok(None) => {
                    manager.success();
                    true
                }
                Err(e) => {
                    manager.failure(&e);
                    true
                }
            };

            if wait {
                tokio::select! {
                    _ = shutdown_rx.changed() => {}
                    _ = tokio::time::sleep(self.poll_interval) => {}
                }
            }
        }

        self.set_status(WorkerStatus::Offline).await;
        info!(worker = %self.addr, "Task executor stopped");
        Ok(())
    }

    /// Claim and execute at most one task.
    ///
    /// Returns the task's final status, or `None` when nothing was queued.
    pub async fn run_once(&self) -> WorkerResult<Option<TaskStatus>> {
        match self.services.queue.claim_next(&self.addr).await {
            Ok(task) => Ok(Some(self.execute(task).await)),
            Err(e) if e.is_not_found() => {
                debug!(worker = %self.addr, "No queued task");
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Signal shutdown.
    pub fn shutdown(&self) {
        self.shutdown.send_replace(true);
    }

    pub async fn status(&self) -> WorkerStatusView {
        self.state.lock().await.view(&self.addr)
    }

    /// Ask the running transcoder to stop.
    ///
    /// Returns once the signal is sent. The CANCELLED status is recorded
    /// by the loop when the process exits.
    pub async fn cancel_task(&self) -> WorkerResult<()> {
        let mut state = self.state.lock().await;
        if state.status != WorkerStatus::Busy {
            return Err(WorkerError::NoTaskRunning);
        }
        let handle = state.process.clone().ok_or(WorkerError::NoProcessRunning)?;

        state.cancel_requested = true;
        if let Err(e) = handle.terminate() {
            state.cancel_requested = false;
            return Err(e.into());
        }
        info!(task_id = ?state.current_task, pid = ?handle.pid(), "Cancellation requested");
        Ok(())
    }

    async fn execute(&self, task: TranscodingTask) -> TaskStatus {
        let logger = TaskLogger::new(&task);
        let span = logger.create_span();
        self.execute_claimed(task, logger).instrument(span).await
    }

    async fn execute_claimed(&self, task: TranscodingTask, logger: TaskLogger) -> TaskStatus {
        self.state.lock().await.begin(task.id.clone());
        self.announce(WorkerStatus::Busy).await;
        logger.log_start(&format!("claimed by {}", self.addr));

        if let Err(e) = self
            .services
            .jobs
            .report_task_status(&task.id, TaskStatus::Running, None)
            .await
        {
            logger.log_warning(&format!("failed to report RUNNING: {}", e));
        }

        let started = Instant::now();
        let task_dir = self.work_dir.join(task.id.as_str());
        let (status, result_object) = match self.transcode(&task, &task_dir, &logger).await {
            Ok(outcome) => outcome,
            Err(e) => {
                logger.log_error(&e.to_string());
                (TaskStatus::Error, None)
            }
        };

        self.set_status(WorkerStatus::Idle).await;
        self.report_outcome(&task, status, result_object.clone(), &logger)
            .await;

        if let Err(e) = tokio::fs::remove_dir_all(&task_dir).await {
            debug!("Failed to remove {}: {}", task_dir.display(), e);
        }

        metrics::record_task_outcome(status.as_str());
        if status == TaskStatus::Finished {
            metrics::record_transcode_duration(&task.profile, started.elapsed().as_secs_f64());
            logger.log_completion(result_object.as_deref().unwrap_or_default());
        } else {
            logger.log_progress(&format!("ended {}", status));
        }
        status
    }

    /// Download, transcode and upload. Local failures are returned as errors.
    async fn transcode(
        &self,
        task: &TranscodingTask,
        task_dir: &Path,
        logger: &TaskLogger,
    ) -> WorkerResult<(TaskStatus, Option<String>)> {
        let profile = find_profile(&task.profile)
            .ok_or_else(|| WorkerError::UnknownProfile(task.profile.clone()))?;

        tokio::fs::create_dir_all(task_dir).await?;
        let input = self
            .services
            .storage
            .download(&task.source_object, Container::Source, &task_dir.join(&task.source_object))
            .await?;

        let output_name = transcoded_file_name(&task.source_object, &task.profile);
        let output = task_dir.join(&output_name);

        let running = self
            .services
            .transcoder
            .launch(&input, profile, &output)
            .await?;
        self.state.lock().await.process = Some(running.handle());
        logger.log_progress("transcoder launched");

        let exit = running.wait().await;
        let cancelled = {
            let mut state = self.state.lock().await;
            state.process = None;
            state.cancel_requested
        };

        let status = match exit? {
            TranscodeExit::Success => TaskStatus::Finished,
            TranscodeExit::Failure { .. } if cancelled => TaskStatus::Cancelled,
            TranscodeExit::Failure { code } => {
                logger.log_warning(&format!("transcoder failed with exit code {:?}", code));
                TaskStatus::Error
            }
        };
        if status != TaskStatus::Finished {
            return Ok((status, None));
        }

        match self
            .services
            .storage
            .upload(&output, &output_name, Container::Transcoded)
            .await
        {
            Ok(stored) => Ok((TaskStatus::Finished, Some(stored))),
            Err(e) => {
                logger.log_error(&format!("upload failed: {}", e));
                Ok((TaskStatus::Error, None))
            }
        }
    }

    /// One attempt per hop. A lost report leaves the task RUNNING upstream.
    async fn report_outcome(
        &self,
        task: &TranscodingTask,
        status: TaskStatus,
        result_object: Option<String>,
        logger: &TaskLogger,
    ) {
        if let Err(e) = self.services.queue.update_status(&task.id, status).await {
            logger.log_warning(&format!("failed to report {} to manager: {}", status, e));
        }
        if let Err(e) = self
            .services
            .jobs
            .report_task_status(&task.id, status, result_object)
            .await
        {
            logger.log_warning(&format!("failed to report {} to jobs: {}", status, e));
        }
    }

    /// Leave BUSY for `status`, dropping any task state.
    async fn set_status(&self, status: WorkerStatus) {
        {
            let mut state = self.state.lock().await;
            state.finish();
            state.status = status;
        }
        self.announce(status).await;
    }

    /// Publish a status change. Registry failures are only logged.
    async fn announce(&self, status: WorkerStatus) {
        let all = WorkerStatus::ALL.map(|s| s.as_str());
        metrics::set_worker_status(status.as_str(), &all);
        if let Err(e) = self.services.registry.report_status(&self.addr, status).await {
            debug!(worker = %self.addr, status = %status, "Failed to notify monitor: {}", e);
        }
    }
}
