use reqwest::Client;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};

use crate::config::LoadTestConfig;
use crate::error::Result;
use crate::invoker::Invoker;
use crate::output::OutputSink;
use crate::payload::ConversionPayload;
use crate::worker::WorkerPool;

/// What a finished run reports back to its caller
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunReport {
    pub total_requests: usize,
    pub elapsed: Duration,
}

/// A configured load test, ready to run
pub struct LoadTest {
    config: LoadTestConfig,
    invoker: Invoker,
    pool: WorkerPool,
    sink: Arc<dyn OutputSink>,
}

impl LoadTest {
    /// Build the HTTP client and encode the payload. Nothing is sent yet.
    pub fn new(config: LoadTestConfig, sink: Arc<dyn OutputSink>) -> Result<Self> {
        config.validate()?;

        let client = Client::builder()
            .timeout(config.request_timeout())
            .build()?;

        let body = ConversionPayload::default().encode()?;
        let invoker = Invoker::new(
            client,
            &config.url,
            &config.function_name,
            body,
            Arc::clone(&sink),
        )?;
        let pool = WorkerPool::new(config.threads, config.requests_per_thread);

        Ok(Self {
            config,
            invoker,
            pool,
            sink,
        })
    }

    /// Run every worker to completion and print the elapsed time.
    ///
    /// Individual request failures never make this fail.
    pub async fn run(&self) -> RunReport {
        let total_requests = self.config.total_requests();

        self.sink.write_line(&format!(
            "Starting load test with {} threads, {} requests each",
            self.config.threads, self.config.requests_per_thread
        ));
        self.sink
            .write_line(&format!("Target function: {}", self.config.function_name));
        self.sink
            .write_line(&format!("Total requests: {}", total_requests));

        info!(
            url = %self.invoker.url(),
            function_name = %self.config.function_name,
            threads = self.config.threads,
            requests_per_thread = self.config.requests_per_thread,
            timeout_seconds = self.config.request_timeout_seconds,
            "Starting load test"
        );

        let start_time = Instant::now();
        let completed = self.pool.run(&self.invoker).await;
        let elapsed = start_time.elapsed();

        if completed < self.pool.workers() {
            warn!(
                completed,
                workers = self.pool.workers(),
                "Some workers did not complete"
            );
        }

        self.sink.write_line("");
        self.sink.write_line(&format!(
            "Load test completed in {:.2} seconds",
            elapsed.as_secs_f64()
        ));

        info!(elapsed_ms = elapsed.as_millis() as u64, "Load test finished");

        RunReport {
            total_requests,
            elapsed,
        }
    }
}
