//! Backend trait and normalized request/response types.
//!
//! The [`Backend`] trait abstracts over LLM providers, translating between
//! the normalized [`LlmRequest`]/[`LlmResponse`] pair and provider-specific
//! HTTP APIs. One request in, one response out — streaming and retry belong
//! to the callers that need them, not this adapter.
//!
//! ```text
//! executor ──► LlmRequest ──► Backend::complete() ──► LlmResponse
//!                                     │
//!            ┌──────────────┬─────────┴────────┬──────────────┐
//!      OpenAiBackend  AnthropicBackend   GeminiBackend  OllamaBackend
//!      /v1/chat/...    /v1/messages      :generateContent  /api/chat
//! ```

pub mod anthropic;
pub mod gemini;
pub mod mock;
pub mod ollama;
pub mod openai;

pub use anthropic::AnthropicBackend;
pub use gemini::GeminiBackend;
pub use mock::MockBackend;
pub use ollama::OllamaBackend;
pub use openai::OpenAiBackend;

use async_trait::async_trait;
use reqwest::Client;

use crate::error::Result;

/// A normalized LLM request — provider-agnostic.
///
/// Built once from the normalized job parameters; the [`Backend`] translates
/// it into the provider-specific HTTP request.
#[derive(Debug, Clone)]
pub struct LlmRequest {
    /// Model identifier as the provider expects it (e.g. `"gpt-4o"`,
    /// `"claude-sonnet-4-5"`, `"llama3.2:3b"`).
    pub model: String,

    /// Optional system prompt. Backends that use a dedicated field
    /// (Anthropic, Gemini) route it there; chat-style backends prepend a
    /// `system` message.
    pub system_prompt: Option<String>,

    /// The user prompt text.
    pub prompt: String,

    /// Sampling controls. Unset fields are omitted from the wire request
    /// entirely — the provider's own defaults apply.
    pub sampling: SamplingConfig,
}

/// Optional sampling controls for a generation request.
///
/// Every field defaults to unset. Backends must not serialize unset fields;
/// in particular an unset stop-sequence list must not become `[]`.
#[derive(Debug, Clone, Default)]
pub struct SamplingConfig {
    /// Sampling temperature.
    pub temperature: Option<f64>,
    /// Nucleus sampling cutoff.
    pub top_p: Option<f64>,
    /// Generation token cap.
    pub max_tokens: Option<u32>,
    /// Stop sequences; `None` means unset.
    pub stop_sequences: Option<Vec<String>>,
}

/// A normalized LLM response.
#[derive(Debug)]
pub struct LlmResponse {
    /// The generated text content (empty string if the provider response
    /// lacked a text field).
    pub text: String,

    /// HTTP status code (for diagnostics/logging).
    pub status: u16,

    /// Provider-specific metadata (token counts, timing, model info).
    /// Stored as raw JSON — each provider returns different fields.
    pub metadata: Option<serde_json::Value>,
}

/// Abstraction over LLM providers.
///
/// Implementors translate between the normalized [`LlmRequest`]/[`LlmResponse`]
/// and the provider's HTTP API.
///
/// # Object Safety
///
/// This trait is object-safe and designed to be used as `Box<dyn Backend>`.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Execute a single non-streaming generation call.
    async fn complete(
        &self,
        client: &Client,
        base_url: &str,
        request: &LlmRequest,
    ) -> Result<LlmResponse>;

    /// Human-readable name for logging and diagnostics.
    fn name(&self) -> &'static str;
}

/// Send a JSON request and decode a JSON response, mapping non-success
/// statuses to [`RelayError::Http`] with the response body attached.
pub(crate) async fn send_json(
    builder: reqwest::RequestBuilder,
) -> Result<(serde_json::Value, u16)> {
    let resp = builder.send().await?;
    let status = resp.status().as_u16();

    if !resp.status().is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(crate::error::RelayError::Http { status, body });
    }

    let json_resp = resp.json().await?;
    Ok((json_resp, status))
}

/// Redact an API key for `Debug` output: keep a short identifying prefix,
/// mask the rest.
pub(crate) fn redact_key(key: &Option<String>) -> Option<String> {
    key.as_ref().map(|k| {
        if k.len() > 6 {
            format!("{}***", &k[..6])
        } else {
            "***".to_string()
        }
    })
}
