//! Stand-in for a Nuclio function endpoint.
//!
//! Answers every request with a fixed status and body, and remembers what
//! it was sent so a run can be checked against the invocation contract.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::Router;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;
use tracing::{debug, error, info};

use crate::error::Result;
use crate::invoker::FUNCTION_NAME_HEADER;

/// One request as seen by the mock origin
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceivedInvocation {
    pub method: String,
    pub path: String,
    pub function_name: Option<String>,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

struct OriginState {
    status: StatusCode,
    body: String,
    received: AtomicU64,
    invocations: Mutex<Vec<ReceivedInvocation>>,
}

/// Mock function endpoint counting the invocations it receives
#[derive(Clone)]
pub struct MockOrigin {
    state: Arc<OriginState>,
}

impl MockOrigin {
    pub fn new(status: StatusCode, body: impl Into<String>) -> Self {
        Self {
            state: Arc::new(OriginState {
                status,
                body: body.into(),
                received: AtomicU64::new(0),
                invocations: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Total requests received so far
    pub fn received(&self) -> u64 {
        self.state.received.load(Ordering::Relaxed)
    }

    /// Every request received so far, in arrival order
    pub fn invocations(&self) -> Vec<ReceivedInvocation> {
        self.state
            .invocations
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn router(&self) -> Router {
        Router::new()
            .fallback(handle_invocation)
            .with_state(Arc::clone(&self.state))
    }

    /// Serve on an already bound listener until the future is dropped
    pub async fn serve(self, listener: TcpListener) -> Result<()> {
        let addr = listener.local_addr()?;
        info!(listen_addr = %addr, "Mock origin listening");

        if let Err(e) = axum::serve(listener, self.router()).await {
            error!(error = %e, "Mock origin server failed");
            return Err(e.into());
        }

        Ok(())
    }

    /// Serve until `shutdown` resolves
    pub async fn serve_with_shutdown<F>(self, listener: TcpListener, shutdown: F) -> Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let addr = listener.local_addr()?;
        info!(listen_addr = %addr, "Mock origin listening");

        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown)
            .await?;

        Ok(())
    }
}

async fn handle_invocation(
    State(state): State<Arc<OriginState>>,
    method: axum::http::Method,
    uri: axum::http::Uri,
    headers: HeaderMap,
    body: Bytes,
) -> (StatusCode, String) {
    let header_text = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };

    let invocation = ReceivedInvocation {
        method: method.to_string(),
        path: uri.path().to_string(),
        function_name: header_text(FUNCTION_NAME_HEADER),
        content_type: header_text("content-type"),
        body: body.to_vec(),
    };

    let count = state.received.fetch_add(1, Ordering::Relaxed) + 1;
    debug!(
        count,
        method = %invocation.method,
        path = %invocation.path,
        function_name = ?invocation.function_name,
        "Mock origin received invocation"
    );

    state
        .invocations
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
        .push(invocation);

    (state.status, state.body.clone())
}
