//! Worker pool for periodic load generation
//!
//! [`WorkerPool`] builds every worker and its private stop channel up front.
//! [`WorkerPool::run`] fans the workers out onto the runtime and hands back a
//! [`RunningPool`], the only thing that can be closed. Closing consumes it, so
//! a pool is closed at most once and never before it ran.

use crate::config::ClientConfig;
use crate::error::LoadError;
use crate::worker::{Worker, WorkerExit, WorkerSummary};
use tokio::sync::oneshot;
use tokio::task::JoinSet;
use tracing::{debug, error, info};

/// Workers built but not yet started.
pub struct WorkerPool {
    workers: Vec<Worker>,
    stops: Vec<oneshot::Sender<()>>,
}

impl WorkerPool {
    /// Create a pool of `config.worker_count` workers sharing one HTTP client.
    pub fn new(config: &ClientConfig) -> Result<Self, LoadError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(LoadError::ClientError)?;

        let (stops, workers): (Vec<_>, Vec<_>) = (0..config.worker_count)
            .map(|id| {
                let (stop_tx, stop_rx) = oneshot::channel();
                (stop_tx, Worker::new(id, config, client.clone(), stop_rx))
            })
            .unzip();

        Ok(Self { workers, stops })
    }

    pub fn len(&self) -> usize {
        self.workers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.workers.is_empty()
    }

    /// Spawn every worker and return immediately.
    pub fn run(self) -> RunningPool {
        let count = self.workers.len();
        let mut tasks = JoinSet::new();
        for worker in self.workers {
            debug!(worker = worker.id(), "Spawning worker");
            tasks.spawn(worker.run());
        }
        info!(workers = count, "Worker pool running");

        RunningPool {
            count,
            stops: self.stops,
            tasks,
        }
    }
}

/// Workers on the runtime; the completion barrier is the [`JoinSet`].
pub struct RunningPool {
    count: usize,
    stops: Vec<oneshot::Sender<()>>,
    tasks: JoinSet<WorkerSummary>,
}

/// Outcome of [`RunningPool::close`].
#[derive(Debug, Clone, Default)]
pub struct PoolReport {
    pub workers: usize,
    pub signals_sent: usize,
    /// Workers that joined, whatever the reason they exited.
    pub completed: usize,
    /// Workers that had already exited on a transport failure.
    pub failed: usize,
    pub panicked: usize,
    pub requests: u64,
    /// Per-worker summaries, ordered by worker id.
    pub summaries: Vec<WorkerSummary>,
}

impl RunningPool {
    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Send one stop signal per worker, then wait for all of them to exit.
    pub async fn close(mut self) -> PoolReport {
        let mut report = PoolReport {
            workers: self.count,
            ..PoolReport::default()
        };

        for (id, stop) in self.stops.drain(..).enumerate() {
            report.signals_sent += 1;
            if stop.send(()).is_err() {
                debug!(worker = id, "Worker already exited before stop");
            }
        }

        while let Some(joined) = self.tasks.join_next().await {
            report.completed += 1;
            match joined {
                Ok(summary) => {
                    report.requests += summary.requests;
                    if summary.exit == WorkerExit::Failed {
                        report.failed += 1;
                    }
                    report.summaries.push(summary);
                }
                Err(e) => {
                    report.panicked += 1;
                    error!(error = %e, "Worker task did not finish cleanly");
                }
            }
        }
        report.summaries.sort_by_key(|summary| summary.id);

        info!(
            workers = report.workers,
            completed = report.completed,
            failed = report.failed,
            requests = report.requests,
            "Stopped worker pool"
        );
        report
    }
}
