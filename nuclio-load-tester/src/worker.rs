use metrics::{decrement_gauge, increment_gauge};
use tokio::task::JoinSet;
use tracing::{debug, error, info};

use crate::invoker::Invoker;
use crate::telemetry::ACTIVE_WORKERS;

/// Issue `requests` invocations back to back. Each outcome is printed by the
/// invoker; nothing is collected here.
pub async fn run_worker(worker_id: usize, invoker: Invoker, requests: usize) {
    debug!(worker_id, requests, "Worker started");
    increment_gauge!(ACTIVE_WORKERS, 1.0);

    for _ in 0..requests {
        invoker.invoke().await;
    }

    decrement_gauge!(ACTIVE_WORKERS, 1.0);
    debug!(worker_id, "Worker finished");
}

/// Fixed-size group of workers, each running the same sequential loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerPool {
    workers: usize,
    requests_per_worker: usize,
}

impl WorkerPool {
    pub fn new(workers: usize, requests_per_worker: usize) -> Self {
        Self {
            workers,
            requests_per_worker,
        }
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Spawn every worker and wait for all of them.
    ///
    /// Returns how many workers ran to completion; a panicked worker is
    /// logged and does not affect the others.
    pub async fn run(&self, invoker: &Invoker) -> usize {
        let mut tasks = JoinSet::new();

        for worker_id in 0..self.workers {
            let invoker = invoker.clone();
            let requests = self.requests_per_worker;
            tasks.spawn(async move { run_worker(worker_id, invoker, requests).await });
        }

        info!(
            workers = self.workers,
            requests_per_worker = self.requests_per_worker,
            "All workers dispatched"
        );

        let mut completed = 0;
        while let Some(result) = tasks.join_next().await {
            match result {
                Ok(()) => completed += 1,
                Err(e) => error!(error = %e, "Worker terminated abnormally"),
            }
        }

        completed
    }
}
