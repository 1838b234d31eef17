//! Router assembly and serving.

use std::future::Future;

use axum::middleware;
use axum::routing::get;
use axum::Router;
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::limit::RequestBodyLimitLayer;
use tracing::info;

use crate::config::ServerConfig;
use crate::health::{health, ready, HealthState};
use crate::metrics::metrics_middleware;
use crate::middleware::{cors_layer, trace_request};

/// Install the rustls crypto provider (required for rustls 0.23+).
///
/// A provider installed earlier in the process is kept.
pub fn install_crypto_provider() {
    let _ = rustls::crypto::ring::default_provider().install_default();
}

/// Add health, readiness and metrics routes plus the common middleware
/// stack to a service router.
pub fn with_common_routes(
    service: Router,
    health_state: HealthState,
    metrics_handle: Option<PrometheusHandle>,
    config: &ServerConfig,
) -> Router {
    let health_routes = Router::new()
        .route("/health", get(health))
        .route("/ready", get(ready))
        .with_state(health_state);

    let metrics_routes = if let Some(handle) = metrics_handle {
        Router::new().route("/metrics", get(move || async move { handle.render() }))
    } else {
        Router::new()
    };

    service
        .merge(health_routes)
        .merge(metrics_routes)
        .layer(RequestBodyLimitLayer::new(config.max_body_size))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(middleware::from_fn(trace_request))
        .layer(cors_layer(&config.cors_origins))
}

/// Bind and serve until `shutdown` resolves.
pub async fn serve<F>(app: Router, config: &ServerConfig, shutdown: F) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let listener = tokio::net::TcpListener::bind(config.bind_addr()).await?;
    info!("Listening on {}", listener.local_addr()?);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
}

/// Resolves on Ctrl-C or SIGTERM.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("Received shutdown signal");
}
