//! Backend for OpenAI-compatible chat APIs.
//!
//! [`OpenAiBackend`] covers OpenAI itself plus the wide family of hosted and
//! local servers that speak the same schema: Groq, Mistral, OpenRouter,
//! DeepSeek, xAI, vLLM, llama.cpp server, LM Studio, and Ollama's `/v1/`
//! endpoint. Endpoint: `/v1/chat/completions`.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

use super::{send_json, Backend, LlmRequest, LlmResponse};
use crate::error::Result;

/// Backend for any OpenAI-compatible chat API.
///
/// # Example
///
/// ```
/// use llm_relay::backend::OpenAiBackend;
///
/// let keyless = OpenAiBackend::new();
/// let hosted = OpenAiBackend::new().with_api_key("sk-...");
/// ```
#[derive(Clone, Default)]
pub struct OpenAiBackend {
    /// Optional API key. If set, sent as `Authorization: Bearer {key}`.
    /// Local endpoints are commonly keyless.
    api_key: Option<String>,
}

impl std::fmt::Debug for OpenAiBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiBackend")
            .field("api_key", &super::redact_key(&self.api_key))
            .finish()
    }
}

impl OpenAiBackend {
    /// Create a new OpenAI-compatible backend without authentication.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the API key for bearer authentication.
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Build the request body for `/v1/chat/completions`.
    ///
    /// Unset sampling fields are left out so the server's defaults apply.
    fn build_body(request: &LlmRequest) -> Value {
        let mut messages = Vec::new();
        if let Some(ref sys) = request.system_prompt {
            messages.push(json!({"role": "system", "content": sys}));
        }
        messages.push(json!({"role": "user", "content": request.prompt}));

        let mut body = json!({
            "model": request.model,
            "messages": messages,
            "stream": false,
        });

        let sampling = &request.sampling;
        if let Some(t) = sampling.temperature {
            body["temperature"] = json!(t);
        }
        if let Some(p) = sampling.top_p {
            body["top_p"] = json!(p);
        }
        if let Some(m) = sampling.max_tokens {
            body["max_tokens"] = json!(m);
        }
        if let Some(ref stop) = sampling.stop_sequences {
            body["stop"] = json!(stop);
        }

        body
    }

    /// Build the reqwest request with bearer auth when a key is configured.
    fn build_http_request(&self, client: &Client, url: &str, body: &Value) -> reqwest::RequestBuilder {
        let mut req = client.post(url).json(body);
        if let Some(ref key) = self.api_key {
            req = req.header("Authorization", format!("Bearer {}", key));
        }
        req
    }

    /// Extract metadata worth logging from an OpenAI-style response.
    fn extract_metadata(json_resp: &Value) -> Option<Value> {
        let mut meta = serde_json::Map::new();
        for field in ["usage", "model", "id"] {
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
impl Backend for OpenAiBackend {
    async fn complete(
        &self,
        client: &Client,
        base_url: &str,
        request: &LlmRequest,
    ) -> Result<LlmResponse> {
        let url = format!("{}/v1/chat/completions", base_url.trim_end_matches('/'));
        let body = Self::build_body(request);

        let (json_resp, status) = send_json(self.build_http_request(client, &url, &body)).await?;

        let text = json_resp
            .get("choices")
            .and_then(|c| c.get(0))
            .and_then(|c| c.get("message"))
            .and_then(|m| m.get("content"))
            .and_then(|v| v.as_str())
            .unwrap_or("")
            .to_string();

        Ok(LlmResponse {
            text,
            status,
            metadata: Self::extract_metadata(&json_resp),
        })
    }

    fn name(&self) -> &'static str {
        "openai"
    }
}
