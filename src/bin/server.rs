//! Load generator server
//!
//! Acknowledges envelopes on `/<prefix>` until SIGINT/SIGTERM.

use clap::Parser;
use loadgen::config::{ServerArgs, ServerConfig};
use loadgen::server::Server;
use loadgen::shutdown::shutdown_signal;
use loadgen::telemetry::init_tracing;
use tracing::{error, info};

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    init_tracing("loadgen=info,tower_http=info");

    let config = match ServerConfig::try_from(ServerArgs::parse()) {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "Invalid configuration");
            std::process::exit(1);
        }
    };
    info!("Configuration loaded: {:?}", config);

    let mut server = match Server::bind(config).await {
        Ok(server) => server,
        Err(e) => {
            error!(error = %e, "Failed to start server");
            std::process::exit(1);
        }
    };
    server.run();

    shutdown_signal().await;
    info!("Shutting down...");
    let handled = server.close().await;
    info!(success_count = handled, "Server stopped");
}
