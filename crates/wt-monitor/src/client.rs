//! HTTP client for the monitor.

use async_trait::async_trait;

use wt_api::read_error_body;
use wt_models::{WorkerRecord, WorkerStatus, WorkerStatusReport};

use crate::api::StatusReporter;
use crate::error::{MonitorError, MonitorResult};

#[derive(Clone)]
pub struct MonitorClient {
    http: reqwest::Client,
    base_url: String,
}

impl MonitorClient {
    pub fn new(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub async fn list_workers(&self) -> MonitorResult<Vec<WorkerRecord>> {
        let response = self
            .http
            .get(format!("{}/workers", self.base_url))
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(MonitorError::from(read_error_body(response).await));
        }
        Ok(response.json().await?)
    }
}

#[async_trait]
impl StatusReporter for MonitorClient {
    async fn report_status(&self, addr: &str, status: WorkerStatus) -> MonitorResult<()> {
        let response = self
            .http
            .put(format!("{}/workers/status", self.base_url))
            .json(&WorkerStatusReport {
                addr: addr.to_string(),
                status,
            })
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(MonitorError::from(read_error_body(response).await));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_report_status_sends_report() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/workers/status"))
            .and(body_json(serde_json::json!({"addr": "w1:8083", "status": "busy"})))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let client = MonitorClient::new(reqwest::Client::new(), server.uri());
        client
            .report_status("w1:8083", WorkerStatus::Busy)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_rejected_report_is_typed() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/workers/status"))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "error": "Invalid argument: addr",
                "code": "invalid_argument"
            })))
            .mount(&server)
            .await;

        let client = MonitorClient::new(reqwest::Client::new(), server.uri());
        let err = client
            .report_status("", WorkerStatus::Idle)
            .await
            .unwrap_err();
        assert!(matches!(err, MonitorError::InvalidArgument(_)));
    }
}
