use crate::config::ServerConfig;
use std::sync::atomic::{AtomicU64, Ordering};

/// Application state shared across handlers
pub struct AppState {
    pub config: ServerConfig,
    success_count: AtomicU64,
}

impl AppState {
    pub fn new(config: ServerConfig) -> Self {
        Self {
            config,
            success_count: AtomicU64::new(0),
        }
    }

    /// Count one handled request and return the new total.
    pub fn record_success(&self) -> u64 {
        self.success_count.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub fn success_count(&self) -> u64 {
        self.success_count.load(Ordering::Relaxed)
    }
}
