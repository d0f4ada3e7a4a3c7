use thiserror::Error;

/// Errors that can occur while configuring or running a load test
#[derive(Error, Debug)]
pub enum LoadTestError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Transport-level HTTP failure (connect, DNS, timeout, body read)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Local I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Metrics exporter error
    #[error("Metrics error: {0}")]
    Metrics(String),
}

/// Result type alias using LoadTestError
pub type Result<T> = std::result::Result<T, LoadTestError>;

impl From<serde_json::Error> for LoadTestError {
    fn from(err: serde_json::Error) -> Self {
        LoadTestError::Serialization(err.to_string())
    }
}

impl From<toml::ser::Error> for LoadTestError {
    fn from(err: toml::ser::Error) -> Self {
        LoadTestError::Serialization(err.to_string())
    }
}

impl From<config::ConfigError> for LoadTestError {
    fn from(err: config::ConfigError) -> Self {
        LoadTestError::Config(err.to_string())
    }
}

/// Render an error together with its source chain, outermost first.
///
/// reqwest keeps the root cause of a transport failure (e.g. "Connection
/// refused") in nested sources.
pub fn describe_error(err: &(dyn std::error::Error + 'static)) -> String {
    let mut description = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if !description.contains(&text) {
            description.push_str(": ");
            description.push_str(&text);
        }
        source = cause.source();
    }
    description
}
