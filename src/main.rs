use std::sync::Arc;

use simaas_worker::config::WorkerConfig;
use simaas_worker::engine::FmpyEngine;
use simaas_worker::heartbeat;
use simaas_worker::queue::HttpTaskQueue;
use simaas_worker::worker::Worker;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    tracing::info!(code = "INSTANCE_STARTED", "service instance started");

    // Invalid configuration terminates before the loop starts.
    let config = WorkerConfig::from_env().unwrap_or_else(|e| {
        tracing::error!(code = "CONFIG_INVALID", error = %e, "configuration is invalid");
        std::process::exit(1);
    });
    tracing::info!(code = "CONFIG_LOADED", "configuration successfully loaded");

    let queue = Arc::new(HttpTaskQueue::new(
        reqwest::Client::new(),
        config.queue_origin.clone(),
    ));
    let engine = Arc::new(FmpyEngine::new(config.model_base_path.clone()));

    // Two independent indefinite loops: heartbeat and worker. Neither
    // blocks the other; both stop only with the process.
    let _heartbeat = heartbeat::spawn_heartbeat(config.alive_event_wait_time);

    let mut worker = Worker::new(queue, engine, config.wait_time);
    worker.run().await;

    Ok(())
}
