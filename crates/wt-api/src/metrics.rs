//! Prometheus metrics.

use std::time::Instant;

use axum::body::Body;
use axum::http::{Request, Response};
use axum::middleware::Next;
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};

/// Install the Prometheus recorder and return its render handle.
pub fn init_metrics() -> Result<PrometheusHandle, BuildError> {
    PrometheusBuilder::new().install_recorder()
}

/// Metric names as constants for consistency.
pub mod names {
    // HTTP metrics
    pub const HTTP_REQUESTS_TOTAL: &str = "wt_http_requests_total";
    pub const HTTP_REQUEST_DURATION_SECONDS: &str = "wt_http_request_duration_seconds";
    pub const HTTP_REQUESTS_IN_FLIGHT: &str = "wt_http_requests_in_flight";

    // Queue metrics
    pub const TASKS_ENQUEUED_TOTAL: &str = "wt_tasks_enqueued_total";
    pub const TASKS_CLAIMED_TOTAL: &str = "wt_tasks_claimed_total";
    pub const TASKS_CANCELLED_TOTAL: &str = "wt_tasks_cancelled_total";
    pub const TASK_OUTCOMES_TOTAL: &str = "wt_task_outcomes_total";

    // Job metrics
    pub const JOBS_SUBMITTED_TOTAL: &str = "wt_jobs_submitted_total";
    pub const JOBS_FINALIZED_TOTAL: &str = "wt_jobs_finalized_total";

    // Worker metrics
    pub const WORKER_STATUS: &str = "wt_worker_status";
    pub const TRANSCODE_DURATION_SECONDS: &str = "wt_transcode_duration_seconds";
}

pub fn record_http_request(method: &str, path: &str, status: u16, duration_secs: f64) {
    let labels = [
        ("method", method.to_string()),
        ("path", sanitize_path(path)),
        ("status", status.to_string()),
    ];

    counter!(names::HTTP_REQUESTS_TOTAL, &labels).increment(1);
    histogram!(names::HTTP_REQUEST_DURATION_SECONDS, &labels).record(duration_secs);
}

pub fn record_task_enqueued() {
    counter!(names::TASKS_ENQUEUED_TOTAL).increment(1);
}

pub fn record_task_claimed() {
    counter!(names::TASKS_CLAIMED_TOTAL).increment(1);
}

pub fn record_task_cancelled() {
    counter!(names::TASKS_CANCELLED_TOTAL).increment(1);
}

/// Record a terminal task status reported by a worker.
pub fn record_task_outcome(status: &str) {
    let labels = [("status", status.to_string())];
    counter!(names::TASK_OUTCOMES_TOTAL, &labels).increment(1);
}

pub fn record_job_submitted() {
    counter!(names::JOBS_SUBMITTED_TOTAL).increment(1);
}

pub fn record_job_finalized(status: &str) {
    let labels = [("status", status.to_string())];
    counter!(names::JOBS_FINALIZED_TOTAL, &labels).increment(1);
}

/// Set the worker status gauge: 1 for `current`, 0 for every other status.
pub fn set_worker_status(current: &str, all: &[&str]) {
    for status in all {
        let labels = [("status", status.to_string())];
        gauge!(names::WORKER_STATUS, &labels).set(if *status == current { 1.0 } else { 0.0 });
    }
}

pub fn record_transcode_duration(profile: &str, duration_secs: f64) {
    let labels = [("profile", profile.to_string())];
    histogram!(names::TRANSCODE_DURATION_SECONDS, &labels).record(duration_secs);
}

/// Sanitize path for metrics labels.
///
/// Segments that look like generated ids collapse to `:id`.
fn sanitize_path(path: &str) -> String {
    path.split('/')
        .map(|segment| {
            let digits = segment.chars().filter(|c| c.is_ascii_digit()).count();
            if digits > 0 && (segment.len() >= 8 || digits == segment.len()) {
                ":id"
            } else {
                segment
            }
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Metrics middleware for HTTP requests.
pub async fn metrics_middleware(request: Request<Body>, next: Next) -> Response<Body> {
    let method = request.method().to_string();
    let path = request.uri().path().to_string();
    let start = Instant::now();

    gauge!(names::HTTP_REQUESTS_IN_FLIGHT).increment(1.0);

    let response = next.run(request).await;

    gauge!(names::HTTP_REQUESTS_IN_FLIGHT).decrement(1.0);

    let status = response.status().as_u16();
    let duration = start.elapsed().as_secs_f64();

    record_http_request(&method, &path, status, duration);

    response
}
