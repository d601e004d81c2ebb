//! Fixtures shared by unit tests

use crate::config::{AccessMethod, ClientConfig, FailurePolicy, ServerConfig};
use std::time::Duration;

pub(crate) fn client_config(url: &str, worker_count: usize, interval_ms: u64) -> ClientConfig {
    ClientConfig {
        worker_count,
        interval: Duration::from_millis(interval_ms),
        url: url.to_string(),
        method: AccessMethod::Post,
        request_timeout: Duration::from_secs(2),
        failure_policy: FailurePolicy::Shrink,
    }
}

/// Loopback on an ephemeral port with a short grace period.
pub(crate) fn local_server_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        shutdown_timeout: Duration::from_secs(1),
        ..ServerConfig::default()
    }
}

/// A loopback port nothing listens on.
pub(crate) fn unused_port() -> u16 {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().port()
}
