//! Worker HTTP routes.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{delete, get};
use axum::{Json, Router};

use wt_api::ApiResult;

use crate::executor::TaskExecutor;
use crate::state::WorkerStatusView;

async fn get_status(State(executor): State<Arc<TaskExecutor>>) -> Json<WorkerStatusView> {
    Json(executor.status().await)
}

async fn cancel_task(State(executor): State<Arc<TaskExecutor>>) -> ApiResult<StatusCode> {
    executor.cancel_task().await?;
    Ok(StatusCode::ACCEPTED)
}

/// Create the worker router.
pub fn create_router(executor: Arc<TaskExecutor>) -> Router {
    Router::new()
        .route("/worker/status", get(get_status))
        .route("/tasks", delete(cancel_task))
        .with_state(executor)
}
