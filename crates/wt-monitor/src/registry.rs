//! Worker registry over the state store.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use wt_models::{WorkerEvent, WorkerRecord, WorkerStatus};
use wt_store::StateStore;

use crate::api::StatusReporter;
use crate::error::{MonitorError, MonitorResult};

pub struct WorkerRegistry {
    store: Arc<dyn StateStore>,
}

impl WorkerRegistry {
    pub fn new(store: Arc<dyn StateStore>) -> Self {
        Self { store }
    }

    pub async fn register(&self, addr: &str) -> MonitorResult<()> {
        self.report_status(addr, WorkerStatus::Online).await
    }

    pub async fn deregister(&self, addr: &str) -> MonitorResult<()> {
        self.report_status(addr, WorkerStatus::Offline).await
    }

    /// Latest record of every worker that ever reported.
    pub async fn list_workers(&self) -> MonitorResult<Vec<WorkerRecord>> {
        Ok(self.store.list_workers().await?)
    }

    /// Status history of one worker, oldest first.
    pub async fn history(&self, addr: &str) -> MonitorResult<Vec<WorkerEvent>> {
        Ok(self.store.worker_events(addr).await?)
    }
}

#[async_trait]
impl StatusReporter for WorkerRegistry {
    async fn report_status(&self, addr: &str, status: WorkerStatus) -> MonitorResult<()> {
        if addr.trim().is_empty() {
            return Err(MonitorError::invalid_argument("worker address is required"));
        }
        let event = WorkerEvent::new(addr, status);
        self.store.record_worker_event(&event).await?;
        info!(worker = addr, status = %status, "Worker status recorded");
        Ok(())
    }
}
