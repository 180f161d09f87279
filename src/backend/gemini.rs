//! Backend for the Google Gemini API.
//!
//! Endpoint: `/v1beta/models/{model}:generateContent`, authenticated with an
//! `x-goog-api-key` header. Sampling controls nest under `generationConfig`,
//! the system prompt under `systemInstruction`, and the assistant role is
//! named `model` rather than `assistant`.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

use super::{send_json, Backend, LlmRequest, LlmResponse};
use crate::error::Result;

/// Backend for Gemini's `generateContent` endpoint.
#[derive(Clone, Default)]
pub struct GeminiBackend {
    api_key: Option<String>,
}

impl std::fmt::Debug for GeminiBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiBackend")
            .field("api_key", &super::redact_key(&self.api_key))
            .finish()
    }
}

impl GeminiBackend {
    /// Create a new backend without authentication.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the API key, sent as `x-goog-api-key`.
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Build the request body for `:generateContent`.
    fn build_body(request: &LlmRequest) -> Value {
        let mut body = json!({
            "contents": [{"role": "user", "parts": [{"text": request.prompt}]}],
        });

        if let Some(ref sys) = request.system_prompt {
            body["systemInstruction"] = json!({"parts": [{"text": sys}]});
        }

        let sampling = &request.sampling;
        let mut config = serde_json::Map::new();
        if let Some(t) = sampling.temperature {
            config.insert("temperature".into(), json!(t));
        }
        if let Some(p) = sampling.top_p {
            config.insert("topP".into(), json!(p));
        }
        if let Some(m) = sampling.max_tokens {
            config.insert("maxOutputTokens".into(), json!(m));
        }
        if let Some(ref stop) = sampling.stop_sequences {
            config.insert("stopSequences".into(), json!(stop));
        }
        if !config.is_empty() {
            body["generationConfig"] = Value::Object(config);
        }

        body
    }

    /// Build the reqwest request with Gemini auth headers.
    fn build_http_request(&self, client: &Client, url: &str, body: &Value) -> reqwest::RequestBuilder {
        let mut req = client.post(url).json(body);
        if let Some(ref key) = self.api_key {
            req = req.header("x-goog-api-key", key.as_str());
        }
        req
    }

    /// Concatenate the text parts of the first candidate.
    fn extract_text(json_resp: &Value) -> String {
        json_resp
            .get("candidates")
            .and_then(|c| c.get(0))
            .and_then(|c| c.get("content"))
            .and_then(|c| c.get("parts"))
            .and_then(|p| p.as_array())
            .map(|parts| {
                parts
                    .iter()
                    .filter_map(|p| p.get("text").and_then(|t| t.as_str()))
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default()
    }

    fn extract_metadata(json_resp: &Value) -> Option<Value> {
        let mut meta = serde_json::Map::new();
        for field in ["usageMetadata", "modelVersion"] {
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
impl Backend for GeminiBackend {
    async fn complete(
        &self,
        client: &Client,
        base_url: &str,
        request: &LlmRequest,
    ) -> Result<LlmResponse> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            base_url.trim_end_matches('/'),
            request.model
        );
        let body = Self::build_body(request);

        let (json_resp, status) = send_json(self.build_http_request(client, &url, &body)).await?;

        Ok(LlmResponse {
            text: Self::extract_text(&json_resp),
            status,
            metadata: Self::extract_metadata(&json_resp),
        })
    }

    fn name(&self) -> &'static str {
        "gemini"
    }
}
