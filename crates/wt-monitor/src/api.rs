//! Status reporting as a trait, so workers report the same way in-process
//! or across the network.

use async_trait::async_trait;

use wt_models::WorkerStatus;

use crate::error::MonitorResult;

#[async_trait]
pub trait StatusReporter: Send + Sync {
    async fn report_status(&self, addr: &str, status: WorkerStatus) -> MonitorResult<()>;
}
