//! Backend for Ollama's native API.
//!
//! [`OllamaBackend`] translates normalized [`LlmRequest`]s into Ollama's
//! `/api/chat` endpoint. Ollama is typically keyless and local; sampling
//! controls nest under `options` with Ollama's own field names
//! (`num_predict` for the token cap, `stop` for stop sequences).

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

use super::{send_json, Backend, LlmRequest, LlmResponse};
use crate::error::Result;

/// Backend for Ollama's native `/api/chat` endpoint.
#[derive(Debug, Clone, Default)]
pub struct OllamaBackend;

impl OllamaBackend {
    /// Build the Ollama `options` object from the sampling config.
    ///
    /// Returns `None` when every control is unset so the field is omitted.
    fn build_options(request: &LlmRequest) -> Option<Value> {
        let sampling = &request.sampling;
        let mut opts = serde_json::Map::new();
        if let Some(t) = sampling.temperature {
            opts.insert("temperature".into(), json!(t));
        }
        if let Some(p) = sampling.top_p {
            opts.insert("top_p".into(), json!(p));
        }
        if let Some(m) = sampling.max_tokens {
            opts.insert("num_predict".into(), json!(m));
        }
        if let Some(ref stop) = sampling.stop_sequences {
            opts.insert("stop".into(), json!(stop));
        }
        if opts.is_empty() {
            None
        } else {
            Some(Value::Object(opts))
        }
    }

    /// Build the JSON body for `/api/chat`.
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
        if let Some(opts) = Self::build_options(request) {
            body["options"] = opts;
        }
        body
    }

    /// Extract metadata fields from an Ollama response.
    fn extract_metadata(json_resp: &Value) -> Option<Value> {
        let mut meta = serde_json::Map::new();
        for field in [
            "total_duration",
            "eval_count",
            "eval_duration",
            "prompt_eval_count",
            "model",
        ] {
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
impl Backend for OllamaBackend {
    async fn complete(
        &self,
        client: &Client,
        base_url: &str,
        request: &LlmRequest,
    ) -> Result<LlmResponse> {
        let url = format!("{}/api/chat", base_url.trim_end_matches('/'));
        let body = Self::build_body(request);

        let (json_resp, status) = send_json(client.post(&url).json(&body)).await?;

        let text = json_resp
            .get("message")
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
        "ollama"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::test_util::{bare_request, full_request};

    #[test]
    fn test_body_nests_options() {
        let body = OllamaBackend::build_body(&full_request());
        let opts = &body["options"];
        assert_eq!(opts["temperature"], 0.2);
        assert_eq!(opts["top_p"], 0.9);
        assert_eq!(opts["num_predict"], 256);
        assert_eq!(opts["stop"], json!(["END"]));
        assert_eq!(body["stream"], false);
    }

    #[test]
    fn test_body_omits_options_when_all_unset() {
        let body = OllamaBackend::build_body(&bare_request());
        assert!(body.get("options").is_none());
    }

    #[test]
    fn test_body_messages() {
        let body = OllamaBackend::build_body(&full_request());
        let messages = body["messages"].as_array().expect("messages");
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0]["role"], "system");
        assert_eq!(messages[1]["role"], "user");

        let body = OllamaBackend::build_body(&bare_request());
        let messages = body["messages"].as_array().expect("messages");
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0]["role"], "user");
    }

    #[test]
    fn test_metadata_extraction() {
        let resp = json!({
            "model": "llama3.2:3b",
            "eval_count": 57,
            "message": {"role": "assistant", "content": "hi"},
        });
        let meta = OllamaBackend::extract_metadata(&resp).expect("metadata");
        assert_eq!(meta["eval_count"], 57);
        assert_eq!(meta["model"], "llama3.2:3b");
    }
}
