//! HTTP middleware.

use std::time::{Duration, Instant};

use axum::body::Body;
use axum::http::{HeaderName, HeaderValue, Request, Response};
use axum::middleware::Next;
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, info_span, Instrument};
use uuid::Uuid;

/// Header carrying the id of a request across services.
pub static REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

/// CORS for the service APIs. `*` allows any origin.
pub fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods(Any)
        .allow_headers(Any)
        .max_age(Duration::from_secs(600));
    if origins.iter().any(|o| o == "*") {
        layer.allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> = origins.iter().filter_map(|o| o.parse().ok()).collect();
        layer.allow_origin(origins)
    }
}

/// Run each request inside a `request` span tagged with its id.
///
/// An incoming `x-request-id` is reused, otherwise one is generated; either
/// way it is echoed on the response. Completion is logged except for the
/// health and metrics paths.
pub async fn trace_request(request: Request<Body>, next: Next) -> Response<Body> {
    let request_id = request
        .headers()
        .get(&REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let span = info_span!("request", request_id = %request_id, method = %method, path = %path);

    let quiet = matches!(path.as_str(), "/health" | "/ready" | "/metrics");
    let start = Instant::now();

    let mut response = async move {
        let response = next.run(request).await;
        if !quiet {
            info!(
                status = response.status().as_u16(),
                duration_ms = start.elapsed().as_millis() as u64,
                "Request completed"
            );
        }
        response
    }
    .instrument(span)
    .await;

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(REQUEST_ID.clone(), value);
    }
    response
}
