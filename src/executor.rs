//! Request executor: exactly one generation call under a hard deadline.
//!
//! The call and the deadline race via [`tokio::time::timeout`]; whichever
//! resolves first wins. When the call settles the timer future is dropped,
//! so no timer ever outlives the request, and when the deadline fires the
//! in-flight request future is dropped, which aborts the underlying
//! connection. There is no retry on timeout, rate-limit, or transient
//! network failure.

use std::time::{Duration, Instant};

use reqwest::Client;
use tracing::debug;

use crate::backend::{Backend, LlmRequest, LlmResponse};
use crate::error::{RelayError, Result};

/// Issue one generation request against `backend`, bounded by `timeout`.
pub async fn execute(
    backend: &dyn Backend,
    client: &Client,
    base_url: &str,
    request: &LlmRequest,
    timeout: Duration,
) -> Result<LlmResponse> {
    debug!(
        backend = backend.name(),
        model = %request.model,
        base_url,
        timeout_ms = timeout.as_millis() as u64,
        "dispatching generation request"
    );

    let started = Instant::now();
    let response = tokio::time::timeout(timeout, backend.complete(client, base_url, request))
        .await
        .map_err(|_| RelayError::Timeout(timeout))??;

    debug!(
        backend = backend.name(),
        status = response.status,
        latency_ms = started.elapsed().as_millis() as u64,
        "generation request settled"
    );
    if let Some(ref metadata) = response.metadata {
        debug!(%metadata, "provider metadata");
    }

    Ok(response)
}
