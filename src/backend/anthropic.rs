//! Backend for the Anthropic Messages API.
//!
//! Endpoint: `/v1/messages`. Auth is `x-api-key` plus a pinned
//! `anthropic-version` header. Unlike the OpenAI schema, `max_tokens` is
//! mandatory and the system prompt is a top-level field, not a message.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

use super::{send_json, Backend, LlmRequest, LlmResponse};
use crate::error::Result;

/// API version header value pinned by the Messages API.
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Fallback generation cap when the caller did not set `max_tokens`.
/// The Messages API rejects requests without one.
const DEFAULT_MAX_TOKENS: u32 = 4096;

/// Backend for Anthropic's `/v1/messages` endpoint.
#[derive(Clone, Default)]
pub struct AnthropicBackend {
    api_key: Option<String>,
}

impl std::fmt::Debug for AnthropicBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnthropicBackend")
            .field("api_key", &super::redact_key(&self.api_key))
            .finish()
    }
}

impl AnthropicBackend {
    /// Create a new backend without authentication.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the API key, sent as `x-api-key`.
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Build the request body for `/v1/messages`.
    fn build_body(request: &LlmRequest) -> Value {
        let sampling = &request.sampling;

        let mut body = json!({
            "model": request.model,
            "max_tokens": sampling.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
            "messages": [{"role": "user", "content": request.prompt}],
        });

        if let Some(ref sys) = request.system_prompt {
            body["system"] = json!(sys);
        }
        if let Some(t) = sampling.temperature {
            body["temperature"] = json!(t);
        }
        if let Some(p) = sampling.top_p {
            body["top_p"] = json!(p);
        }
        if let Some(ref stop) = sampling.stop_sequences {
            body["stop_sequences"] = json!(stop);
        }

        body
    }

    /// Build the reqwest request with Anthropic auth headers.
    fn build_http_request(&self, client: &Client, url: &str, body: &Value) -> reqwest::RequestBuilder {
        let mut req = client
            .post(url)
            .json(body)
            .header("anthropic-version", ANTHROPIC_VERSION);
        if let Some(ref key) = self.api_key {
            req = req.header("x-api-key", key.as_str());
        }
        req
    }

    /// Concatenate the text blocks of a Messages API response.
    fn extract_text(json_resp: &Value) -> String {
        json_resp
            .get("content")
            .and_then(|c| c.as_array())
            .map(|blocks| {
                blocks
                    .iter()
                    .filter(|b| b.get("type").and_then(|t| t.as_str()) == Some("text"))
                    .filter_map(|b| b.get("text").and_then(|t| t.as_str()))
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default()
    }

    fn extract_metadata(json_resp: &Value) -> Option<Value> {
        let mut meta = serde_json::Map::new();
        for field in ["usage", "model", "id", "stop_reason"] {
            if let Some(v) = json_resp.get(field) {
                meta.insert(field.into(), v.clone());
            }
        }
        if meta.is_empty() {
            None
        } else {
            Some(Value::Object(meta))
        }
    }
}

#[async_trait]
impl Backend for AnthropicBackend {
    async fn complete(
        &self,
        client: &Client,
        base_url: &str,
        request: &LlmRequest,
    ) -> Result<LlmResponse> {
        let url = format!("{}/v1/messages", base_url.trim_end_matches('/'));
        let body = Self::build_body(request);

        let (json_resp, status) = send_json(self.build_http_request(client, &url, &body)).await?;

        Ok(LlmResponse {
            text: Self::extract_text(&json_resp),
            status,
            metadata: Self::extract_metadata(&json_resp),
        })
    }

    fn name(&self) -> &'static str {
        "anthropic"
    }
}
