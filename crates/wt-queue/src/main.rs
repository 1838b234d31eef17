//! Task queue (manager) service binary.

use std::sync::Arc;

use tracing::{error, info};

use wt_api::metrics::init_metrics;
use wt_api::{
    build_http_client, init_tracing, install_crypto_provider, serve, shutdown_signal,
    with_common_routes, HealthState,
};
use wt_queue::{create_router, HttpCancellationForwarder, ManagerConfig, TaskQueue};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    install_crypto_provider();
    init_tracing("wt=info");

    info!("Starting wt-manager");

    if let Err(e) = run().await {
        error!("Manager error: {:#}", e);
        std::process::exit(1);
    }

    info!("Manager shutdown complete");
}

async fn run() -> anyhow::Result<()> {
    let config = ManagerConfig::from_env()?;
    let store = wt_store::connect(&config.store).await?;

    let mut queue = TaskQueue::new(store.clone());
    if config.forward_cancellation {
        let http = build_http_client(config.server.http_timeout)?;
        queue = queue.with_forwarder(Arc::new(HttpCancellationForwarder::new(http)));
    }

    let metrics_handle = if config.server.metrics_enabled {
        info!("Prometheus metrics enabled at /metrics");
        Some(init_metrics()?)
    } else {
        None
    };

    let app = with_common_routes(
        create_router(Arc::new(queue)),
        HealthState { store: Some(store) },
        metrics_handle,
        &config.server,
    );

    serve(app, &config.server, shutdown_signal()).await?;
    Ok(())
}
