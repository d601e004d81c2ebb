//! Configuration management
//!
//! Both binaries load `.env` first, then parse CLI arguments with
//! environment fallbacks, then validate the arguments into the config struct
//! handed to the controllers.

use crate::error::ConfigError;
use clap::{Parser, ValueEnum};
use std::time::Duration;

/// HTTP method a worker uses for every request it issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum AccessMethod {
    Get,
    Post,
}

impl AccessMethod {
    pub fn as_method(self) -> reqwest::Method {
        match self {
            AccessMethod::Get => reqwest::Method::GET,
            AccessMethod::Post => reqwest::Method::POST,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FailurePolicyKind {
    /// The failed worker exits and the pool runs one short.
    Shrink,
    /// The failed worker backs off and resumes ticking.
    Restart,
}

/// What a worker does after a transport failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailurePolicy {
    Shrink,
    Restart { initial: Duration, max: Duration },
}

#[derive(Parser, Debug, Clone)]
#[command(
    name = "loadgen-client",
    version,
    about = "Periodically send requests from a pool of workers"
)]
pub struct ClientArgs {
    /// Delay between two requests of the same worker, in milliseconds.
    #[arg(long, env = "LOADGEN_INTERVAL_MS", default_value_t = 100)]
    pub interval_ms: u64,

    /// Target url every worker sends to.
    #[arg(long, env = "LOADGEN_URL", default_value_t = String::from("http://127.0.0.1:8081/request"))]
    pub url: String,

    /// Number of workers in the pool.
    #[arg(long, env = "LOADGEN_COUNT", default_value_t = 1)]
    pub count: usize,

    #[arg(long, env = "LOADGEN_METHOD", value_enum, default_value_t = AccessMethod::Post)]
    pub method: AccessMethod,

    /// Per-request timeout, in milliseconds.
    #[arg(long, env = "LOADGEN_TIMEOUT_MS", default_value_t = 10_000)]
    pub timeout_ms: u64,

    #[arg(long, env = "LOADGEN_FAILURE_POLICY", value_enum, default_value_t = FailurePolicyKind::Shrink)]
    pub failure_policy: FailurePolicyKind,

    /// First backoff after a transport failure (restart policy only).
    #[arg(long, env = "LOADGEN_RESTART_BACKOFF_MS", default_value_t = 500)]
    pub restart_backoff_ms: u64,

    /// Upper bound for the doubling backoff (restart policy only).
    #[arg(long, env = "LOADGEN_MAX_BACKOFF_MS", default_value_t = 10_000)]
    pub max_backoff_ms: u64,
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub worker_count: usize,
    pub interval: Duration,
    pub url: String,
    pub method: AccessMethod,
    pub request_timeout: Duration,
    pub failure_policy: FailurePolicy,
}

impl TryFrom<ClientArgs> for ClientConfig {
    type Error = ConfigError;

    fn try_from(args: ClientArgs) -> Result<Self, Self::Error> {
        if args.interval_ms == 0 {
            return Err(ConfigError::ZeroInterval);
        }
        if args.timeout_ms == 0 {
            return Err(ConfigError::Zero("Request timeout"));
        }

        let parsed = reqwest::Url::parse(&args.url).map_err(|e| ConfigError::InvalidUrl {
            url: args.url.clone(),
            reason: e.to_string(),
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidUrl {
                url: args.url,
                reason: format!("unsupported scheme {}", parsed.scheme()),
            });
        }

        let failure_policy = match args.failure_policy {
            FailurePolicyKind::Shrink => FailurePolicy::Shrink,
            FailurePolicyKind::Restart => {
                if args.restart_backoff_ms == 0 || args.restart_backoff_ms > args.max_backoff_ms {
                    return Err(ConfigError::InvalidBackoff {
                        restart: args.restart_backoff_ms,
                        max: args.max_backoff_ms,
                    });
                }
                FailurePolicy::Restart {
                    initial: Duration::from_millis(args.restart_backoff_ms),
                    max: Duration::from_millis(args.max_backoff_ms),
                }
            }
        };

        Ok(Self {
            worker_count: args.count,
            interval: Duration::from_millis(args.interval_ms),
            url: args.url,
            method: args.method,
            request_timeout: Duration::from_millis(args.timeout_ms),
            failure_policy,
        })
    }
}

#[derive(Parser, Debug, Clone)]
#[command(
    name = "loadgen-server",
    version,
    about = "Acknowledge requests sent by loadgen-client"
)]
pub struct ServerArgs {
    #[arg(long, env = "LOADGEN_HOST", default_value_t = String::from("0.0.0.0"))]
    pub host: String,

    #[arg(long, env = "LOADGEN_PORT", default_value_t = 8081)]
    pub port: u16,

    /// Path segment the request handler is mounted on.
    #[arg(long, env = "LOADGEN_PREFIX", default_value_t = String::from("request"))]
    pub prefix: String,

    /// Upper bound for reading a request and writing its response.
    #[arg(long, env = "LOADGEN_REQUEST_TIMEOUT_SECS", default_value_t = 10)]
    pub request_timeout_secs: u64,

    /// Grace period for in-flight requests once shutdown starts.
    #[arg(long, env = "LOADGEN_SHUTDOWN_TIMEOUT_SECS", default_value_t = 5)]
    pub shutdown_timeout_secs: u64,

    #[arg(long, env = "LOADGEN_MAX_BODY_BYTES", default_value_t = 1024 * 1024)]
    pub max_body_bytes: usize,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Route prefix without its leading slash.
    pub prefix: String,
    pub request_timeout: Duration,
    pub shutdown_timeout: Duration,
    pub max_body_bytes: usize,
}

impl ServerConfig {
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn route(&self) -> String {
        format!("/{}", self.prefix)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8081,
            prefix: "request".to_string(),
            request_timeout: Duration::from_secs(10),
            shutdown_timeout: Duration::from_secs(5),
            max_body_bytes: 1024 * 1024,
        }
    }
}

impl TryFrom<ServerArgs> for ServerConfig {
    type Error = ConfigError;

    fn try_from(args: ServerArgs) -> Result<Self, Self::Error> {
        let prefix = args.prefix.trim_start_matches('/');
        if prefix.is_empty() || prefix.contains('/') {
            return Err(ConfigError::InvalidPrefix(args.prefix));
        }
        if args.request_timeout_secs == 0 {
            return Err(ConfigError::Zero("Request timeout"));
        }
        if args.max_body_bytes == 0 {
            return Err(ConfigError::Zero("Max body size"));
        }

        Ok(Self {
            host: args.host,
            port: args.port,
            prefix: prefix.to_string(),
            request_timeout: Duration::from_secs(args.request_timeout_secs),
            shutdown_timeout: Duration::from_secs(args.shutdown_timeout_secs),
            max_body_bytes: args.max_body_bytes,
        })
    }
}
