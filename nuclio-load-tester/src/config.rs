use clap::Parser;
use reqwest::header::HeaderValue;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::time::Duration;
use tracing::debug;

use crate::error::{LoadTestError, Result};

pub const DEFAULT_URL: &str = "http://127.0.0.1:8080/invoke";
pub const DEFAULT_FUNCTION_NAME: &str = "currency-converter";
pub const DEFAULT_THREADS: usize = 10;
pub const DEFAULT_REQUESTS_PER_THREAD: usize = 10;
pub const DEFAULT_REQUEST_TIMEOUT_SECONDS: u64 = 30;

/// Nuclio Function Load Tester
///
/// Every flag is optional. Values given here override the configuration
/// file passed with `--config`.
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "nuclio-load-tester")]
#[command(about = "Send repeated POST invocations to a Nuclio function from concurrent workers")]
pub struct CliArgs {
    /// Function invocation URL [default: http://127.0.0.1:8080/invoke]
    #[arg(long)]
    pub url: Option<String>,

    /// Nuclio function name sent in x-nuclio-function-name [default: currency-converter]
    #[arg(long)]
    pub function_name: Option<String>,

    /// Number of concurrent workers [default: 10]
    #[arg(long)]
    pub threads: Option<usize>,

    /// Sequential requests issued by each worker [default: 10]
    #[arg(long)]
    pub requests_per_thread: Option<usize>,

    /// Per-request timeout in seconds [default: 30]
    #[arg(long)]
    pub timeout_seconds: Option<u64>,

    /// Optional TOML configuration file
    #[arg(long)]
    pub config: Option<String>,

    /// Expose Prometheus metrics on this address while the test runs
    #[arg(long)]
    pub metrics_addr: Option<String>,

    /// Log filter directive, overridden by RUST_LOG [default: nuclio_load_tester=info]
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log format: text or json [default: text]
    #[arg(long)]
    pub log_format: Option<String>,

    /// Print the effective configuration as TOML and exit
    #[arg(long)]
    pub dump_config: bool,
}

/// Effective load test configuration, immutable once the run starts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoadTestConfig {
    /// Target endpoint
    pub url: String,
    /// Value of the x-nuclio-function-name header
    pub function_name: String,
    /// Concurrent worker count
    pub threads: usize,
    /// Sequential requests per worker
    pub requests_per_thread: usize,
    /// Client-side timeout applied to every request
    pub request_timeout_seconds: u64,
    /// Prometheus listener address (disabled when unset)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metrics_addr: Option<String>,
    /// Default tracing filter directive
    pub log_level: String,
    /// Log format (text, json)
    pub log_format: String,
}

impl Default for LoadTestConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_URL.to_string(),
            function_name: DEFAULT_FUNCTION_NAME.to_string(),
            threads: DEFAULT_THREADS,
            requests_per_thread: DEFAULT_REQUESTS_PER_THREAD,
            request_timeout_seconds: DEFAULT_REQUEST_TIMEOUT_SECONDS,
            metrics_addr: None,
            log_level: "nuclio_load_tester=info".to_string(),
            log_format: "text".to_string(),
        }
    }
}

impl LoadTestConfig {
    /// Resolve the configuration: defaults, then the optional file, then
    /// explicit command line flags. The process environment is not read.
    pub fn load(cli: &CliArgs) -> Result<Self> {
        let mut config: LoadTestConfig = match &cli.config {
            Some(path) => {
                debug!(path = %path, "Loading configuration file");
                config::Config::builder()
                    .add_source(config::File::with_name(path))
                    .build()?
                    .try_deserialize()?
            }
            None => LoadTestConfig::default(),
        };
        config.apply_cli_overrides(cli);
        config.validate()?;

        Ok(config)
    }

    /// Overlay flags that were given explicitly on the command line
    pub fn apply_cli_overrides(&mut self, cli: &CliArgs) {
        if let Some(url) = &cli.url {
            self.url = url.clone();
        }
        if let Some(function_name) = &cli.function_name {
            self.function_name = function_name.clone();
        }
        if let Some(threads) = cli.threads {
            self.threads = threads;
        }
        if let Some(requests) = cli.requests_per_thread {
            self.requests_per_thread = requests;
        }
        if let Some(timeout) = cli.timeout_seconds {
            self.request_timeout_seconds = timeout;
        }
        if let Some(addr) = &cli.metrics_addr {
            self.metrics_addr = Some(addr.clone());
        }
        if let Some(level) = &cli.log_level {
            self.log_level = level.clone();
        }
        if let Some(format) = &cli.log_format {
            self.log_format = format.clone();
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.threads == 0 {
            return Err(LoadTestError::Config(
                "threads must be at least 1".to_string(),
            ));
        }

        let url = Url::parse(&self.url)
            .map_err(|e| LoadTestError::Config(format!("Invalid url '{}': {}", self.url, e)))?;
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(LoadTestError::Config(format!(
                "Unsupported url scheme '{}', expected http or https",
                url.scheme()
            )));
        }

        HeaderValue::from_str(&self.function_name).map_err(|_| {
            LoadTestError::Config(format!(
                "Function name '{}' is not a valid header value",
                self.function_name
            ))
        })?;

        if self.request_timeout_seconds == 0 {
            return Err(LoadTestError::Config(
                "request_timeout_seconds must be at least 1".to_string(),
            ));
        }

        if self.log_format != "text" && self.log_format != "json" {
            return Err(LoadTestError::Config(format!(
                "Unknown log format '{}', expected text or json",
                self.log_format
            )));
        }

        if self.threads.checked_mul(self.requests_per_thread).is_none() {
            return Err(LoadTestError::Config(format!(
                "threads × requests_per_thread overflows ({} × {})",
                self.threads, self.requests_per_thread
            )));
        }

        self.metrics_socket_addr()?;

        Ok(())
    }

    /// Total number of invocations the run will attempt.
    ///
    /// `validate` rejects configurations where this product overflows.
    pub fn total_requests(&self) -> usize {
        self.threads.saturating_mul(self.requests_per_thread)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }

    /// Parsed Prometheus listener address, if one is configured
    pub fn metrics_socket_addr(&self) -> Result<Option<SocketAddr>> {
        self.metrics_addr
            .as_deref()
            .map(|addr| {
                addr.parse().map_err(|e| {
                    LoadTestError::Config(format!("Invalid metrics_addr '{}': {}", addr, e))
                })
            })
            .transpose()
    }

    /// Render the configuration as TOML
    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }
}
