//! Job orchestrator service binary.

use std::sync::Arc;

use tracing::{error, info};

use wt_api::metrics::init_metrics;
use wt_api::{
    build_http_client, init_tracing, install_crypto_provider, serve, shutdown_signal,
    with_common_routes, HealthState,
};
use wt_jobs::{create_router, JobService, JobsConfig};
use wt_queue::QueueClient;
use wt_storage::build_storage;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    install_crypto_provider();
    init_tracing("wt=info");

    info!("Starting wt-jobs");

    if let Err(e) = run().await {
        error!("Jobs service error: {:#}", e);
        std::process::exit(1);
    }

    info!("Jobs service shutdown complete");
}

async fn run() -> anyhow::Result<()> {
    let config = JobsConfig::from_env()?;
    info!(manager = %config.manager_url, "Jobs config loaded");

    let store = wt_store::connect(&config.store).await?;
    let http = build_http_client(config.server.http_timeout)?;
    let queue = QueueClient::new(http.clone(), config.manager_url.clone());
    let storage = build_storage(&config.storage);

    let service = JobService::new(store.clone(), Arc::new(queue), storage, config.work_dir.clone())
        .with_http_client(http);

    let metrics_handle = if config.server.metrics_enabled {
        info!("Prometheus metrics enabled at /metrics");
        Some(init_metrics()?)
    } else {
        None
    };

    let app = with_common_routes(
        create_router(Arc::new(service)),
        HealthState { store: Some(store) },
        metrics_handle,
        &config.server,
    );

    serve(app, &config.server, shutdown_signal()).await?;
    Ok(())
}
