use bytes::Bytes;
use metrics::counter;
use reqwest::header::{HeaderValue, CONTENT_TYPE};
use reqwest::Client;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, trace};

use crate::error::{describe_error, LoadTestError, Result};
use crate::output::OutputSink;
use crate::telemetry::{INVOCATIONS_TOTAL, RESPONSES_TOTAL};

/// Header used by the Nuclio dashboard/gateway to route an invocation
pub const FUNCTION_NAME_HEADER: &str = "x-nuclio-function-name";

/// Result of a single invocation, printed and then dropped
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvocationOutcome {
    /// The server answered; any status code lands here, 4xx/5xx included
    Response { status: u16, body: String },
    /// Transport-level failure: connect, DNS, timeout or body read
    Failed { reason: String },
}

impl fmt::Display for InvocationOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvocationOutcome::Response { status, body } => {
                write!(f, "Response: {} - {}", status, body)
            }
            InvocationOutcome::Failed { reason } => write!(f, "Request failed: {}", reason),
        }
    }
}

/// Performs one POST invocation against the target function.
///
/// Cheap to clone: the client, body and sink are all shared.
#[derive(Clone)]
pub struct Invoker {
    client: Client,
    url: Arc<str>,
    function_name: HeaderValue,
    body: Bytes,
    sink: Arc<dyn OutputSink>,
}

impl Invoker {
    pub fn new(
        client: Client,
        url: &str,
        function_name: &str,
        body: Bytes,
        sink: Arc<dyn OutputSink>,
    ) -> Result<Self> {
        let function_name = HeaderValue::from_str(function_name).map_err(|_| {
            LoadTestError::Config(format!(
                "Function name '{}' is not a valid header value",
                function_name
            ))
        })?;

        Ok(Self {
            client,
            url: Arc::from(url),
            function_name,
            body,
            sink,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Send one invocation and print its outcome. Never fails: transport
    /// errors are folded into [`InvocationOutcome::Failed`].
    pub async fn invoke(&self) -> InvocationOutcome {
        let outcome = match self.send().await {
            Ok((status, body)) => {
                trace!(status, "Invocation answered");
                counter!(INVOCATIONS_TOTAL, 1, "outcome" => "response");
                counter!(RESPONSES_TOTAL, 1, "status" => status.to_string());
                InvocationOutcome::Response { status, body }
            }
            Err(e) => {
                let reason = match &e {
                    LoadTestError::Http(err) => describe_error(err),
                    other => describe_error(other),
                };
                debug!(url = %self.url, error = %reason, "Invocation failed");
                counter!(INVOCATIONS_TOTAL, 1, "outcome" => "failed");
                InvocationOutcome::Failed { reason }
            }
        };

        self.sink.write_line(&outcome.to_string());
        outcome
    }

    async fn send(&self) -> Result<(u16, String)> {
        let response = self
            .client
            .post(&*self.url)
            .header(FUNCTION_NAME_HEADER, self.function_name.clone())
            .header(CONTENT_TYPE, "application/json")
            .body(self.body.clone())
            .send()
            .await?;

        let status = response.status().as_u16();
        let text = response.text().await?;

        Ok((status, text.trim().to_string()))
    }
}
