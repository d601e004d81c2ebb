//! Load generator harness
//!
//! A client keeps a pool of workers sending JSON envelopes at a fixed
//! interval; a companion server acknowledges them and counts what it
//! handled. Both sides shut down by draining everything they own.

pub mod config;
pub mod error;
pub mod handlers;
pub mod payload;
pub mod pool;
pub mod router;
pub mod server;
pub mod shutdown;
pub mod state;
pub mod system;
pub mod telemetry;
pub mod worker;

#[cfg(test)]
mod testing;

pub use config::{AccessMethod, ClientConfig, FailurePolicy, ServerConfig};
pub use error::{ConfigError, LoadError};
pub use payload::{build_request_payload, Envelope};
pub use pool::{PoolReport, RunningPool, WorkerPool};
pub use server::{Server, ServerState};
pub use system::{describe_system, SystemInfo};
