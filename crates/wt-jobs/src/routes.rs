//! Jobs HTTP routes.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use validator::Validate;

use wt_api::{ApiError, ApiResult};
use wt_models::{
    Job, JobDetail, JobId, JobStatus, JobStatusResponse, SubmitJobRequest, SubmitJobResponse,
    TaskId, TaskStatusReport,
};

use crate::service::JobService;

async fn submit_job(
    State(service): State<Arc<JobService>>,
    Json(request): Json<SubmitJobRequest>,
) -> ApiResult<(StatusCode, Json<SubmitJobResponse>)> {
    request
        .validate()
        .map_err(|e| ApiError::invalid_argument(e.to_string()))?;
    let job_id = service
        .add_new_job(&request.source, &request.profiles)
        .await?;
    Ok((StatusCode::CREATED, Json(SubmitJobResponse { job_id })))
}

async fn list_jobs(State(service): State<Arc<JobService>>) -> ApiResult<Json<Vec<Job>>> {
    Ok(Json(service.list_jobs().await?))
}

async fn get_job(
    State(service): State<Arc<JobService>>,
    Path(id): Path<String>,
) -> ApiResult<Json<JobDetail>> {
    Ok(Json(service.get_job(&JobId::from(id)).await?))
}

async fn get_job_status(
    State(service): State<Arc<JobService>>,
    Path(id): Path<String>,
) -> ApiResult<Json<JobStatusResponse>> {
    let job_id = JobId::from(id);
    let status = service.get_job_status(&job_id).await?;
    Ok(Json(JobStatusResponse { job_id, status }))
}

async fn cancel_job(
    State(service): State<Arc<JobService>>,
    Path(id): Path<String>,
) -> ApiResult<Json<JobStatusResponse>> {
    let job_id = JobId::from(id);
    service.cancel_job(&job_id).await?;
    Ok(Json(JobStatusResponse {
        job_id,
        status: JobStatus::Cancelled,
    }))
}

async fn update_transcoding_status(
    State(service): State<Arc<JobService>>,
    Path(id): Path<String>,
    Json(report): Json<TaskStatusReport>,
) -> ApiResult<StatusCode> {
    service
        .update_transcoding_status(&TaskId::from(id), report.status, report.result_object.as_deref())
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Create the jobs router.
pub fn create_router(service: Arc<JobService>) -> Router {
    Router::new()
        .route("/v1/jobs", post(submit_job).get(list_jobs))
        .route("/v1/jobs/:id", get(get_job))
        .route("/v1/jobs/:id/status", get(get_job_status))
        .route("/v1/jobs/:id/cancel", post(cancel_job))
        .route("/v1/transcodings/:id/status", put(update_transcoding_status))
        .with_state(service)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use tower::ServiceExt;
    use wt_api::ErrorBody;
    use wt_queue::TaskQueue;
    use wt_storage::LocalObjectStorage;
    use wt_store::MemoryStore;

    struct Fixture {
        app: Router,
        source: std::path::PathBuf,
        _dir: tempfile::TempDir,
    }

    fn fixture() -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("clip.mov");
        std::fs::write(&source, b"media").unwrap();
        let service = JobService::new(
            Arc::new(MemoryStore::new()),
            Arc::new(TaskQueue::new(Arc::new(MemoryStore::new()))),
            Arc::new(LocalObjectStorage::new(dir.path().join("objects"))),
            dir.path().join("work"),
        );
        Fixture {
            app: create_router(Arc::new(service)),
            source,
            _dir: dir,
        }
    }

    fn submit(body: serde_json::Value) -> Request<Body> {
        Request::post("/v1/jobs")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_submit_then_status() {
        let f = fixture();
        let response = f
            .app
            .clone()
            .oneshot(submit(serde_json::json!({
                "source": f.source.to_string_lossy(),
                "profiles": ["baseline", "iPhone5s"]
            })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let submitted: SubmitJobResponse = serde_json::from_slice(&body).unwrap();

        let response = f
            .app
            .oneshot(
                Request::get(format!("/v1/jobs/{}/status", submitted.job_id))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let status: JobStatusResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(status.status, JobStatus::Queued);
    }

    #[tokio::test]
    async fn test_submit_without_profiles() {
        let f = fixture();
        let response = f
            .app
            .oneshot(submit(serde_json::json!({
                "source": f.source.to_string_lossy(),
                "profiles": []
            })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let error: ErrorBody = serde_json::from_slice(&body).unwrap();
        assert_eq!(error.code, wt_api::codes::NO_TRANSCODINGS);
    }

    #[tokio::test]
    async fn test_upload_failure_reports_job_id() {
        let f = fixture();
        let response = f
            .app
            .clone()
            .oneshot(submit(serde_json::json!({
                "source": "/does/not/exist.mov",
                "profiles": ["baseline"]
            })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let error: ErrorBody = serde_json::from_slice(&body).unwrap();
        let job_id = error.job_id.unwrap();

        let response = f
            .app
            .oneshot(
                Request::get(format!("/v1/jobs/{}", job_id))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let detail: JobDetail = serde_json::from_slice(&body).unwrap();
        assert_eq!(detail.job.status, JobStatus::Error);
        assert!(detail.job.object_name.is_none());
        assert_eq!(detail.tasks.len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_job_is_404() {
        let response = fixture()
            .app
            .oneshot(Request::get("/v1/jobs/missing/status").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
