//! HTTP client for the jobs service.

use async_trait::async_trait;

use wt_api::read_error_body;
use wt_models::{JobId, JobStatus, JobStatusResponse, TaskId, TaskStatus, TaskStatusReport};

use crate::api::JobsApi;
use crate::error::{JobsError, JobsResult};

#[derive(Clone)]
pub struct JobsClient {
    http: reqwest::Client,
    base_url: String,
}

impl JobsClient {
    pub fn new(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    async fn check(response: reqwest::Response) -> JobsResult<reqwest::Response> {
        if response.status().is_success() {
            Ok(response)
        } else {
            Err(JobsError::from(read_error_body(response).await))
        }
    }

    pub async fn get_job_status(&self, id: &JobId) -> JobsResult<JobStatus> {
        let response = self
            .http
            .get(format!("{}/v1/jobs/{}/status", self.base_url, id))
            .send()
            .await?;
        let body: JobStatusResponse = Self::check(response).await?.json().await?;
        Ok(body.status)
    }
}

#[async_trait]
impl JobsApi for JobsClient {
    async fn report_task_status(
        &self,
        id: &TaskId,
        status: TaskStatus,
        result_object: Option<String>,
    ) -> JobsResult<()> {
        let response = self
            .http
            .put(format!("{}/v1/transcodings/{}/status", self.base_url, id))
            .json(&TaskStatusReport {
                status,
                result_object,
            })
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_report_carries_result_object() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/v1/transcodings/t1/status"))
            .and(body_json(serde_json::json!({
                "status": "finished",
                "result_object": "out-123.mp4"
            })))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let client = JobsClient::new(reqwest::Client::new(), server.uri());
        client
            .report_task_status(
                &TaskId::from("t1"),
                TaskStatus::Finished,
                Some("out-123.mp4".into()),
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_unknown_job_is_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/jobs/nope/status"))
            .respond_with(ResponseTemplate::new(404).set_body_json(serde_json::json!({
                "error": "Not found: job nope",
                "code": "not_found"
            })))
            .mount(&server)
            .await;

        let client = JobsClient::new(reqwest::Client::new(), server.uri());
        let err = client.get_job_status(&JobId::from("nope")).await.unwrap_err();
        assert!(matches!(err, JobsError::NotFound(_)));
    }
}
