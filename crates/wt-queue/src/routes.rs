//! Manager HTTP routes.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde::Deserialize;

use wt_api::{ApiError, ApiResult};
use wt_models::{
    CancelTaskResponse, CountResponse, EnqueueTaskRequest, TaskId, TaskStatus, TaskStatusReport,
    TranscodingTask,
};

use crate::api::TaskQueueApi;
use crate::queue::TaskQueue;

#[derive(Debug, Deserialize)]
pub struct ClaimQuery {
    pub worker: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CountQuery {
    pub status: TaskStatus,
}

async fn enqueue(
    State(queue): State<Arc<TaskQueue>>,
    Json(request): Json<EnqueueTaskRequest>,
) -> ApiResult<(StatusCode, Json<TranscodingTask>)> {
    let task = queue.enqueue(request).await?;
    Ok((StatusCode::CREATED, Json(task)))
}

async fn claim_next(
    State(queue): State<Arc<TaskQueue>>,
    Query(query): Query<ClaimQuery>,
) -> ApiResult<Json<TranscodingTask>> {
    let worker = query
        .worker
        .filter(|w| !w.is_empty())
        .ok_or_else(|| ApiError::invalid_argument("worker query parameter is required"))?;
    Ok(Json(queue.claim_next(&worker).await?))
}

async fn list_queued(State(queue): State<Arc<TaskQueue>>) -> ApiResult<Json<Vec<TranscodingTask>>> {
    Ok(Json(queue.list_by_status(TaskStatus::Queued).await?))
}

async fn list_running(State(queue): State<Arc<TaskQueue>>) -> ApiResult<Json<Vec<TranscodingTask>>> {
    Ok(Json(queue.list_by_status(TaskStatus::Running).await?))
}

async fn count(
    State(queue): State<Arc<TaskQueue>>,
    Query(query): Query<CountQuery>,
) -> ApiResult<Json<CountResponse>> {
    let count = queue.count_by_status(query.status).await?;
    Ok(Json(CountResponse {
        status: query.status,
        count,
    }))
}

async fn update_status(
    State(queue): State<Arc<TaskQueue>>,
    Path(id): Path<String>,
    Json(report): Json<TaskStatusReport>,
) -> ApiResult<StatusCode> {
    queue.update_status(&TaskId::from(id), report.status).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn cancel(
    State(queue): State<Arc<TaskQueue>>,
    Path(id): Path<String>,
) -> ApiResult<Json<CancelTaskResponse>> {
    let id = TaskId::from(id);
    let claimant = queue.cancel(&id).await?;
    Ok(Json(CancelTaskResponse {
        task_id: Some(id),
        claimant,
    }))
}

/// Create the manager router.
pub fn create_router(queue: Arc<TaskQueue>) -> Router {
    Router::new()
        .route("/tasks", post(enqueue).get(claim_next))
        .route("/tasks/queued", get(list_queued))
        .route("/tasks/running", get(list_running))
        .route("/tasks/count", get(count))
        .route("/tasks/:id/status", put(update_status))
        .route("/tasks/:id", axum::routing::delete(cancel))
        .with_state(queue)
}
