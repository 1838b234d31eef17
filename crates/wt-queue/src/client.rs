//! HTTP client for the manager.

use async_trait::async_trait;
use reqwest::StatusCode;
use tracing::debug;

use wt_api::read_error_body;
use wt_models::{
    CancelTaskResponse, CountResponse, EnqueueTaskRequest, TaskId, TaskStatus, TaskStatusReport,
    TranscodingTask,
};

use crate::api::TaskQueueApi;
use crate::error::{QueueError, QueueResult};

/// Talks to a remote manager.
#[derive(Clone)]
pub struct QueueClient {
    http: reqwest::Client,
    base_url: String,
}

impl QueueClient {
    pub fn new(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn check(response: reqwest::Response) -> QueueResult<reqwest::Response> {
        if response.status().is_success() {
            Ok(response)
        } else {
            Err(QueueError::from(read_error_body(response).await))
        }
    }
}

#[async_trait]
impl TaskQueueApi for QueueClient {
    async fn enqueue(&self, request: EnqueueTaskRequest) -> QueueResult<TranscodingTask> {
        let response = self.http.post(self.url("/tasks")).json(&request).send().await?;
        Ok(Self::check(response).await?.json().await?)
    }

    async fn claim_next(&self, worker_addr: &str) -> QueueResult<TranscodingTask> {
        let response = self
            .http
            .get(self.url("/tasks"))
            .query(&[("worker", worker_addr)])
            .send()
            .await?;
        if response.status() == StatusCode::NOT_FOUND {
            debug!("Manager has no queued task");
        }
        Ok(Self::check(response).await?.json().await?)
    }

    async fn count_by_status(&self, status: TaskStatus) -> QueueResult<u64> {
        let response = self
            .http
            .get(self.url("/tasks/count"))
            .query(&[("status", status.as_str())])
            .send()
            .await?;
        let count: CountResponse = Self::check(response).await?.json().await?;
        Ok(count.count)
    }

    async fn update_status(&self, id: &TaskId, status: TaskStatus) -> QueueResult<()> {
        let response = self
            .http
            .put(self.url(&format!("/tasks/{}/status", id)))
            .json(&TaskStatusReport {
                status,
                result_object: None,
            })
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    async fn cancel(&self, id: &TaskId) -> QueueResult<Option<String>> {
        let response = self
            .http
            .delete(self.url(&format!("/tasks/{}", id)))
            .send()
            .await?;
        let body: CancelTaskResponse = Self::check(response).await?.json().await?;
        Ok(body.claimant)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};
    use wt_models::JobId;

    #[tokio::test]
    async fn test_claim_not_found_is_typed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/tasks"))
            .and(query_param("worker", "w1:8083"))
            .respond_with(ResponseTemplate::new(404).set_body_json(serde_json::json!({
                "error": "Not found: no queued task",
                "code": "not_found"
            })))
            .mount(&server)
            .await;

        let client = QueueClient::new(reqwest::Client::new(), server.uri());
        let err = client.claim_next("w1:8083").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_claim_returns_task() {
        let server = MockServer::start().await;
        let mut task = TranscodingTask::new(JobId::from("j"), "baseline", "in.mov");
        task.claim("w1", chrono::Utc::now());
        Mock::given(method("GET"))
            .and(path("/tasks"))
            .respond_with(ResponseTemplate::new(200).set_body_json(&task))
            .mount(&server)
            .await;

        let client = QueueClient::new(reqwest::Client::new(), server.uri());
        assert_eq!(client.claim_next("w1").await.unwrap(), task);
    }

    #[tokio::test]
    async fn test_update_status_sends_report() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/tasks/t1/status"))
            .and(body_partial_json(serde_json::json!({"status": "finished"})))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let client = QueueClient::new(reqwest::Client::new(), format!("{}/", server.uri()));
        client
            .update_status(&TaskId::from("t1"), TaskStatus::Finished)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_unreachable_manager_is_transient() {
        let client = QueueClient::new(reqwest::Client::new(), "http://127.0.0.1:9");
        let err = client.count_by_status(TaskStatus::Queued).await.unwrap_err();
        assert!(err.is_transient());
    }
}
