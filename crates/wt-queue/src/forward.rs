//! Forwarding cancellation to the worker that holds a task.

use async_trait::async_trait;
use tracing::debug;

use wt_api::read_error_body;

use crate::error::QueueResult;

/// Delivers a direct cancellation request to a worker.
#[async_trait]
pub trait CancellationForwarder: Send + Sync {
    async fn request_cancellation(&self, worker_addr: &str) -> QueueResult<()>;
}

/// Sends `DELETE <worker>/tasks`.
#[derive(Clone)]
pub struct HttpCancellationForwarder {
    http: reqwest::Client,
}

impl HttpCancellationForwarder {
    pub fn new(http: reqwest::Client) -> Self {
        Self { http }
    }
}

/// Base URL for a worker address, adding `http://` when no scheme is given.
pub fn worker_base_url(addr: &str) -> String {
    let addr = addr.trim_end_matches('/');
    if addr.starts_with("http://") || addr.starts_with("https://") {
        addr.to_string()
    } else {
        format!("http://{}", addr)
    }
}

#[async_trait]
impl CancellationForwarder for HttpCancellationForwarder {
    async fn request_cancellation(&self, worker_addr: &str) -> QueueResult<()> {
        let url = format!("{}/tasks", worker_base_url(worker_addr));
        debug!(worker = worker_addr, "Forwarding cancellation");
        let response = self.http.delete(&url).send().await?;
        if response.status().is_success() {
            Ok(())
        } else {
            Err(read_error_body(response).await.into())
        }
    }
}
