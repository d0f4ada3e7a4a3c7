use metrics::{describe_counter, describe_gauge};
use std::net::SocketAddr;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::LoadTestConfig;
use crate::error::{LoadTestError, Result};

pub const INVOCATIONS_TOTAL: &str = "load_test_invocations_total";
pub const RESPONSES_TOTAL: &str = "load_test_responses_total";
pub const ACTIVE_WORKERS: &str = "load_test_active_workers";

/// Initialize structured logging on stderr; stdout is reserved for the report.
///
/// `RUST_LOG` wins over the configured level.
pub fn init_logging(config: &LoadTestConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(true);

    // An already-installed global subscriber is left in place.
    let _ = if config.log_format == "json" {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
}

/// Register metric descriptions with the installed recorder
pub fn initialize_metrics() {
    describe_counter!(
        INVOCATIONS_TOTAL,
        "Total number of invocation attempts, labelled by outcome"
    );
    describe_counter!(
        RESPONSES_TOTAL,
        "Total number of HTTP responses, labelled by status code"
    );
    describe_gauge!(ACTIVE_WORKERS, "Workers currently issuing invocations");
}

/// Install the Prometheus exporter on `listen_addr`
pub fn start_metrics_exporter(listen_addr: SocketAddr) -> Result<()> {
    info!(metrics_addr = %listen_addr, "Starting Prometheus metrics exporter");

    metrics_exporter_prometheus::PrometheusBuilder::new()
        .with_http_listener(listen_addr)
        .install()
        .map_err(|e| LoadTestError::Metrics(format!("Failed to install Prometheus exporter: {}", e)))?;

    info!(metrics_addr = %listen_addr, "Prometheus metrics exporter started");
    Ok(())
}
