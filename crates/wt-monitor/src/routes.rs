//! Monitor HTTP routes.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::routing::{get, put};
use axum::{Json, Router};
use serde::Deserialize;
use validator::Validate;

use wt_api::{ApiError, ApiResult};
use wt_models::{WorkerRecord, WorkerStatusReport};

use crate::api::StatusReporter;
use crate::registry::WorkerRegistry;

#[derive(Debug, Deserialize)]
pub struct WorkerQuery {
    pub addr: String,
}

async fn register(
    State(registry): State<Arc<WorkerRegistry>>,
    Query(query): Query<WorkerQuery>,
) -> ApiResult<StatusCode> {
    registry.register(&query.addr).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn deregister(
    State(registry): State<Arc<WorkerRegistry>>,
    Query(query): Query<WorkerQuery>,
) -> ApiResult<StatusCode> {
    registry.deregister(&query.addr).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn report_status(
    State(registry): State<Arc<WorkerRegistry>>,
    Json(report): Json<WorkerStatusReport>,
) -> ApiResult<StatusCode> {
    report
        .validate()
        .map_err(|e| ApiError::invalid_argument(e.to_string()))?;
    registry.report_status(&report.addr, report.status).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn list_workers(
    State(registry): State<Arc<WorkerRegistry>>,
) -> ApiResult<Json<Vec<WorkerRecord>>> {
    Ok(Json(registry.list_workers().await?))
}

/// Create the monitor router.
pub fn create_router(registry: Arc<WorkerRegistry>) -> Router {
    Router::new()
        .route(
            "/workers",
            get(list_workers).post(register).delete(deregister),
        )
        .route("/workers/status", put(report_status))
        .with_state(registry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use tower::ServiceExt;
    use wt_models::WorkerStatus;
    use wt_store::MemoryStore;

    fn app() -> Router {
        create_router(Arc::new(WorkerRegistry::new(Arc::new(MemoryStore::new()))))
    }

    #[tokio::test]
    async fn test_register_then_list() {
        let app = app();
        let response = app
            .clone()
            .oneshot(
                Request::post("/workers?addr=w1:8083")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let response = app
            .oneshot(Request::get("/workers").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let workers: Vec<WorkerRecord> = serde_json::from_slice(&body).unwrap();
        assert_eq!(workers.len(), 1);
        assert_eq!(workers[0].addr, "w1:8083");
        assert_eq!(workers[0].status, WorkerStatus::Online);
    }

    #[tokio::test]
    async fn test_report_with_empty_addr_is_bad_request() {
        let response = app()
            .oneshot(
                Request::put("/workers/status")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"addr":"","status":"idle"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
