use anyhow::{Context, Result};
use axum::http::StatusCode;
use clap::Parser;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing::info;

use nuclio_load_tester::origin::MockOrigin;

/// Mock Nuclio function endpoint for trying the load tester locally
#[derive(Parser, Debug)]
#[command(name = "test-origin")]
struct Args {
    /// Address to listen on
    #[arg(long, default_value = "127.0.0.1:8080")]
    listen: SocketAddr,

    /// Status code returned for every invocation
    #[arg(long, default_value = "200")]
    status: u16,

    /// Body returned for every invocation
    #[arg(long, default_value = "OK")]
    body: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "nuclio_load_tester=debug".into()),
        )
        .with_target(false)
        .with_thread_ids(true)
        .init();

    let args = Args::parse();
    let status = StatusCode::from_u16(args.status)
        .with_context(|| format!("Invalid status code {}", args.status))?;

    let listener = TcpListener::bind(args.listen)
        .await
        .with_context(|| format!("Failed to bind to {}", args.listen))?;

    let origin = MockOrigin::new(status, args.body);
    info!("Starting test origin, press Ctrl+C to stop");

    origin
        .clone()
        .serve_with_shutdown(listener, async {
            tokio::signal::ctrl_c().await.ok();
        })
        .await?;

    info!(received = origin.received(), "Test origin stopped");
    Ok(())
}
