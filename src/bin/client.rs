//! Load generator client
//!
//! Runs a pool of periodic senders until SIGINT/SIGTERM, then drains it.

use clap::Parser;
use loadgen::config::{ClientArgs, ClientConfig};
use loadgen::pool::WorkerPool;
use loadgen::shutdown::shutdown_signal;
use loadgen::telemetry::init_tracing;
use tracing::{error, info};

#[tokio::main]
async fn main() {
    // Load .env before clap reads its env fallbacks
    let _ = dotenvy::dotenv();
    init_tracing("loadgen=info");

    let config = match ClientConfig::try_from(ClientArgs::parse()) {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "Invalid configuration");
            std::process::exit(1);
        }
    };
    info!("Configuration loaded: {:?}", config);

    let pool = match WorkerPool::new(&config) {
        Ok(pool) => pool,
        Err(e) => {
            error!(error = %e, "Failed to create worker pool");
            std::process::exit(1);
        }
    };
    info!(workers = pool.len(), url = %config.url, "Starting workers");

    let running = pool.run();
    shutdown_signal().await;

    info!("Got stop signal, stopping {} workers", running.len());
    let report = running.close().await;
    info!(
        completed = report.completed,
        failed = report.failed,
        requests = report.requests,
        "Stopped {} workers",
        report.workers
    );
}
