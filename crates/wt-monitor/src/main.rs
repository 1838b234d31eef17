//! Worker registry (monitor) service binary.

use std::sync::Arc;

use tracing::{error, info};

use wt_api::metrics::init_metrics;
use wt_api::{init_tracing, install_crypto_provider, serve, shutdown_signal, with_common_routes, HealthState};
use wt_monitor::{create_router, MonitorConfig, WorkerRegistry};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    install_crypto_provider();
    init_tracing("wt=info");

    info!("Starting wt-monitor");

    if let Err(e) = run().await {
        error!("Monitor error: {:#}", e);
        std::process::exit(1);
    }

    info!("Monitor shutdown complete");
}

async fn run() -> anyhow::Result<()> {
    let config = MonitorConfig::from_env()?;
    let store = wt_store::connect(&config.store).await?;

    let metrics_handle = if config.server.metrics_enabled {
        info!("Prometheus metrics enabled at /metrics");
        Some(init_metrics()?)
    } else {
        None
    };

    let app = with_common_routes(
        create_router(Arc::new(WorkerRegistry::new(store.clone()))),
        HealthState { store: Some(store) },
        metrics_handle,
        &config.server,
    );

    serve(app, &config.server, shutdown_signal()).await?;
    Ok(())
}
