//! Mock backend for testing without a live LLM.
//!
//! [`MockBackend`] returns a canned response, optionally after an
//! artificial delay, allowing deterministic tests of the executor's
//! timeout behavior and the downstream interpreter.
//!
//! # Example
//!
//! ```
//! use llm_relay::backend::MockBackend;
//!
//! let mock = MockBackend::fixed("Hello, world!");
//! ```

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use super::{Backend, LlmRequest, LlmResponse};
use crate::error::Result;

/// A test backend that returns a canned response.
#[derive(Debug, Clone)]
pub struct MockBackend {
    response: String,
    delay: Option<Duration>,
}

impl MockBackend {
    /// Create a mock that returns `response` immediately.
    pub fn fixed(response: impl Into<String>) -> Self {
        Self {
            response: response.into(),
            delay: None,
        }
    }

    /// Sleep for `delay` before responding. Used to exercise timeouts.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

#[async_trait]
impl Backend for MockBackend {
    async fn complete(
        &self,
        _client: &Client,
        _base_url: &str,
        _request: &LlmRequest,
    ) -> Result<LlmResponse> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        Ok(LlmResponse {
            text: self.response.clone(),
            status: 200,
            metadata: None,
        })
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}
