//! Transcoding worker binary.

use std::sync::Arc;

use tracing::{error, info};

use wt_api::metrics::init_metrics;
use wt_api::{
    build_http_client, init_tracing, install_crypto_provider, serve, shutdown_signal,
    with_common_routes, HealthState,
};
use wt_jobs::JobsClient;
use wt_media::{check_ffmpeg, FfmpegTranscoder};
use wt_monitor::MonitorClient;
use wt_queue::QueueClient;
use wt_storage::build_storage;
use wt_worker::{create_router, TaskExecutor, WorkerConfig, WorkerServices};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    install_crypto_provider();
    init_tracing("wt=info");

    info!("Starting wt-worker");

    if let Err(e) = run().await {
        error!("Worker error: {:#}", e);
        std::process::exit(1);
    }

    info!("Worker shutdown complete");
}

async fn run() -> anyhow::Result<()> {
    let config = WorkerConfig::from_env()?;
    info!("Worker config: {:?}", config);

    let ffmpeg = check_ffmpeg(config.ffmpeg_path.as_deref())?;
    let http = build_http_client(config.server.http_timeout)?;

    let services = WorkerServices {
        queue: Arc::new(QueueClient::new(http.clone(), &config.manager_url)),
        jobs: Arc::new(JobsClient::new(http.clone(), &config.jobs_url)),
        registry: Arc::new(MonitorClient::new(http, &config.monitor_url)),
        storage: build_storage(&config.storage),
        transcoder: Arc::new(FfmpegTranscoder::new(ffmpeg)),
    };
    let executor = Arc::new(TaskExecutor::new(&config, services));

    let metrics_handle = if config.server.metrics_enabled {
        info!("Prometheus metrics enabled at /metrics");
        Some(init_metrics()?)
    } else {
        None
    };

    let app = with_common_routes(
        create_router(executor.clone()),
        HealthState::default(),
        metrics_handle,
        &config.server,
    );

    let poller = {
        let executor = executor.clone();
        tokio::spawn(async move { executor.run().await })
    };

    let stopper = executor.clone();
    serve(app, &config.server, async move {
        shutdown_signal().await;
        stopper.shutdown();
    })
    .await?;

    poller.await??;
    Ok(())
}
