//! Client-side helpers for calling peer services.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::codes;

/// JSON error body returned by every service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    pub code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_id: Option<String>,
}

/// HTTP client with a per-request timeout.
pub fn build_http_client(timeout: Duration) -> reqwest::Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .connect_timeout(Duration::from_secs(5))
        .build()
}

/// Decode the error body of a failed response.
///
/// Bodies that are not in the service format become `internal` or
/// `unavailable` errors carrying the raw text.
pub async fn read_error_body(response: reqwest::Response) -> ErrorBody {
    let status = response.status();
    let text = response.text().await.unwrap_or_default();
    serde_json::from_str(&text).unwrap_or_else(|_| ErrorBody {
        error: if text.is_empty() {
            status.to_string()
        } else {
            text
        },
        code: if status.is_server_error() {
            codes::UNAVAILABLE.to_string()
        } else {
            codes::INTERNAL.to_string()
        },
        job_id: None,
    })
}
