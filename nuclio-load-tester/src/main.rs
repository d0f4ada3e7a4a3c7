use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use tracing::info;

use nuclio_load_tester::config::{CliArgs, LoadTestConfig};
use nuclio_load_tester::driver::LoadTest;
use nuclio_load_tester::output::StdoutSink;
use nuclio_load_tester::telemetry::{init_logging, initialize_metrics, start_metrics_exporter};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = CliArgs::parse();

    let config = LoadTestConfig::load(&cli).context("Failed to load configuration")?;

    if cli.dump_config {
        print!("{}", config.to_toml().context("Failed to render configuration")?);
        return Ok(());
    }

    init_logging(&config);

    info!(
        "Starting Nuclio Load Tester v{}",
        env!("CARGO_PKG_VERSION")
    );

    if let Some(metrics_addr) = config.metrics_socket_addr()? {
        start_metrics_exporter(metrics_addr)?;
    }
    initialize_metrics();

    let load_test = LoadTest::new(config, Arc::new(StdoutSink))
        .context("Failed to prepare load test")?;
    load_test.run().await;

    Ok(())
}
