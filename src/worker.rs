//! Periodic request sender
//!
//! A worker fires one request-response cycle per tick and checks its private
//! stop channel only between cycles, so a stop never interrupts a request in
//! flight.

use crate::config::{AccessMethod, ClientConfig, FailurePolicy};
use crate::error::LoadError;
use crate::payload::build_request_payload;
use reqwest::header::CONTENT_TYPE;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::time::{interval_at, sleep, Instant, MissedTickBehavior};
use tracing::{error, info, warn};

/// Why a worker loop returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerExit {
    /// Observed its stop signal.
    Stopped,
    /// Hit a transport failure under [`FailurePolicy::Shrink`].
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerSummary {
    pub id: usize,
    /// Requests handed to the transport, successful or not.
    pub requests: u64,
    pub failures: u64,
    pub exit: WorkerExit,
}

pub struct Worker {
    id: usize,
    interval: Duration,
    method: AccessMethod,
    url: String,
    policy: FailurePolicy,
    client: reqwest::Client,
    stop: oneshot::Receiver<()>,
}

impl Worker {
    pub fn new(
        id: usize,
        config: &ClientConfig,
        client: reqwest::Client,
        stop: oneshot::Receiver<()>,
    ) -> Self {
        Self {
            id,
            interval: config.interval,
            method: config.method,
            url: config.url.clone(),
            policy: config.failure_policy,
            client,
            stop,
        }
    }

    pub fn id(&self) -> usize {
        self.id
    }

    /// Tick until stopped, or until a transport failure under the shrink
    /// policy.
    pub async fn run(mut self) -> WorkerSummary {
        info!(worker = self.id, "Worker started");

        // First request goes out one interval after start, not immediately.
        let mut ticker = interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut backoff = Backoff::new(self.policy);
        let mut requests = 0_u64;
        let mut failures = 0_u64;

        let exit = loop {
            tokio::select! {
                biased;
                // A dropped sender counts as a stop as well.
                _ = &mut self.stop => break WorkerExit::Stopped,
                _ = ticker.tick() => {}
            }

            match self.cycle(&mut requests).await {
                Ok(()) => backoff.reset(),
                Err(e) if e.is_transport() => {
                    failures += 1;
                    error!(worker = self.id, error = %e, "Request failed");

                    let Some(delay) = backoff.next_delay() else {
                        break WorkerExit::Failed;
                    };
                    warn!(worker = self.id, delay_ms = delay.as_millis() as u64, "Backing off before resuming");
                    tokio::select! {
                        biased;
                        _ = &mut self.stop => break WorkerExit::Stopped,
                        _ = sleep(delay) => ticker.reset(),
                    }
                }
                Err(e) => {
                    warn!(worker = self.id, error = %e, "Skipping tick");
                }
            }
        };

        info!(worker = self.id, requests, failures, ?exit, "Worker stopped");
        WorkerSummary {
            id: self.id,
            requests,
            failures,
            exit,
        }
    }

    /// One request-response cycle.
    async fn cycle(&self, requests: &mut u64) -> Result<(), LoadError> {
        let body = build_request_payload(self.id)?;

        let request = self
            .client
            .request(self.method.as_method(), &self.url)
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .build()
            .map_err(LoadError::RequestError)?;

        *requests += 1;
        let response = self
            .client
            .execute(request)
            .await
            .map_err(LoadError::TransportError)?;

        let status = response.status();
        let message = response.text().await.map_err(LoadError::BodyError)?;
        info!(worker = self.id, %status, message = %message, "Client got message");

        Ok(())
    }
}

/// Delay schedule applied after transport failures.
#[derive(Debug)]
struct Backoff {
    policy: FailurePolicy,
    current: Option<Duration>,
}

impl Backoff {
    fn new(policy: FailurePolicy) -> Self {
        Self {
            policy,
            current: None,
        }
    }

    /// `None` means the worker should exit.
    fn next_delay(&mut self) -> Option<Duration> {
        match self.policy {
            FailurePolicy::Shrink => None,
            FailurePolicy::Restart { initial, max } => {
                let delay = match self.current {
                    None => initial,
                    Some(prev) => prev.saturating_mul(2).min(max),
                };
                self.current = Some(delay);
                Some(delay)
            }
        }
    }

    fn reset(&mut self) {
        self.current = None;
    }
}
