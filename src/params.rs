//! Parameter normalization: raw job params → typed request parameters.
//!
//! Coercion is deliberately forgiving about representation (numbers may
//! arrive as strings, stop sequences as a list or a delimited string) and
//! strict about presence: a missing or blank prompt is a hard `params`
//! failure, and "unset" is kept distinct from "explicitly empty".

use std::time::Duration;

use serde_json::Value;

use crate::error::{RelayError, Result};
use crate::job::Job;

/// Default wall-clock budget for the generation request.
pub const DEFAULT_TIMEOUT_MS: u64 = 60_000;

/// Normalized view of the job's `params` object. Derived once, never mutated.
#[derive(Debug, Clone)]
pub struct RequestParameters {
    /// User prompt (required, non-blank).
    pub prompt: String,
    /// Raw model identifier — `provider/model`, or a bare model name when
    /// `base_url` targets a local endpoint.
    pub model: String,
    /// Explicit endpoint override. Presence forces the `local` provider.
    pub base_url: Option<String>,
    /// Optional system prompt.
    pub system_prompt: Option<String>,
    /// Sampling temperature, forwarded only when set.
    pub temperature: Option<f64>,
    /// Nucleus sampling cutoff, forwarded only when set.
    pub top_p: Option<f64>,
    /// Generation token cap, forwarded only when set.
    pub max_tokens: Option<u32>,
    /// Stop sequences. `None` means unset — backends omit the field
    /// entirely rather than sending an empty list.
    pub stop_sequences: Option<Vec<String>>,
    /// Caller demands JSON in the response.
    pub expect_json: bool,
    /// Wall-clock budget for the single generation request.
    pub timeout: Duration,
}

impl RequestParameters {
    /// Extract and type-coerce every supported parameter from a parsed job.
    pub fn from_job(job: &Job) -> Result<Self> {
        let params = &job.params;

        let prompt = non_blank_string(params.get("prompt"))
            .ok_or_else(|| RelayError::Params("Missing required parameter: prompt".into()))?;
        let model = non_blank_string(params.get("model"))
            .ok_or_else(|| RelayError::Params("Missing required parameter: model".into()))?;

        let timeout_ms = coerce_number(params.get("timeout_ms"))
            .map(|v| v as u64)
            .unwrap_or(DEFAULT_TIMEOUT_MS);

        Ok(Self {
            prompt,
            model,
            base_url: non_blank_string(params.get("base_url")),
            system_prompt: non_blank_string(params.get("system_prompt")),
            temperature: coerce_number(params.get("temperature")),
            top_p: coerce_number(params.get("top_p")),
            max_tokens: coerce_number(params.get("max_tokens")).map(|v| v as u32),
            stop_sequences: coerce_stop_sequences(params.get("stop_sequences")),
            expect_json: coerce_expect_json(params.get("expect_json")),
            timeout: Duration::from_millis(timeout_ms),
        })
    }
}

/// A present, non-blank string value, trimmed of surrounding whitespace.
fn non_blank_string(value: Option<&Value>) -> Option<String> {
    let s = value?.as_str()?.trim();
    if s.is_empty() {
        None
    } else {
        Some(s.to_string())
    }
}

/// Numeric coercion: absent, empty, or non-finite values yield `None`.
///
/// Accepts JSON numbers and numeric strings (`"0.7"`).
pub fn coerce_number(value: Option<&Value>) -> Option<f64> {
    let n = match value? {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => {
            let s = s.trim();
            if s.is_empty() {
                return None;
            }
            s.parse::<f64>().ok()?
        }
        _ => return None,
    };
    n.is_finite().then_some(n)
}

/// Stop-sequence coercion.
///
/// A list is coerced element-wise to strings with empty entries dropped; a
/// single string is split on newline or comma, trimmed, empties dropped.
/// Absent or fully-empty input yields `None` (unset), never `Some(vec![])`.
pub fn coerce_stop_sequences(value: Option<&Value>) -> Option<Vec<String>> {
    let seqs: Vec<String> = match value? {
        Value::Array(items) => items
            .iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s.clone()),
                Value::Number(n) => Some(n.to_string()),
                Value::Bool(b) => Some(b.to_string()),
                _ => None,
            })
            .filter(|s| !s.is_empty())
            .collect(),
        Value::String(s) => s
            .split(['\n', ','])
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect(),
        _ => return None,
    };
    if seqs.is_empty() {
        None
    } else {
        Some(seqs)
    }
}

/// The JSON-expectation flag is satisfied only by boolean `true` or the
/// string `"true"` (case-insensitive). Other truthy values (`1`, `"yes"`)
/// do not count.
pub fn coerce_expect_json(value: Option<&Value>) -> bool {
    match value {
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => s.eq_ignore_ascii_case("true"),
        _ => false,
    }
}

/// Split a `provider/model` identifier on the first `/`.
///
/// The provider segment is lower-cased; the model segment is the remainder,
/// so model names may themselves contain slashes
/// (`openrouter/meta-llama/llama-3-70b`).
pub fn split_model(identifier: &str) -> Result<(String, String)> {
    match identifier.split_once('/') {
        Some((provider, model)) if !provider.is_empty() && !model.is_empty() => {
            Ok((provider.to_ascii_lowercase(), model.to_string()))
        }
        _ => Err(RelayError::Params(format!(
            "Invalid model identifier '{}': expected '<provider>/<model>'",
            identifier
        ))),
    }
}

/// Strip one leading `local/` prefix (case-insensitive) from a model name.
///
/// Used when a base URL forces the local provider and the caller wrote the
/// model as `local/foo` out of habit.
pub fn strip_local_prefix(model: &str) -> &str {
    match model.get(..6) {
        Some(prefix) if prefix.eq_ignore_ascii_case("local/") => &model[6..],
        _ => model,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn job(params: Value) -> Job {
        serde_json::from_value(json!({ "params": params })).unwrap()
    }

    // ── from_job ──

    #[test]
    fn test_minimal_job() {
        let p = RequestParameters::from_job(&job(json!({
            "model": "openai/gpt-4o",
            "prompt": "hello",
        })))
        .unwrap();
        assert_eq!(p.prompt, "hello");
        assert_eq!(p.model, "openai/gpt-4o");
        assert!(p.base_url.is_none());
        assert!(p.temperature.is_none());
        assert!(p.top_p.is_none());
        assert!(p.max_tokens.is_none());
        assert!(p.stop_sequences.is_none());
        assert!(!p.expect_json);
        assert_eq!(p.timeout, Duration::from_millis(DEFAULT_TIMEOUT_MS));
    }

    #[test]
    fn test_missing_prompt_is_params_error() {
        let err = RequestParameters::from_job(&job(json!({"model": "openai/gpt-4o"}))).unwrap_err();
        assert_eq!(err.kind(), "params");
        assert!(err.to_string().contains("prompt"));
    }

    #[test]
    fn test_blank_prompt_is_params_error() {
        let err = RequestParameters::from_job(&job(json!({
            "model": "openai/gpt-4o",
            "prompt": "   \n ",
        })))
        .unwrap_err();
        assert_eq!(err.kind(), "params");
    }

    #[test]
    fn test_missing_model_is_params_error() {
        let err = RequestParameters::from_job(&job(json!({"prompt": "hi"}))).unwrap_err();
        assert_eq!(err.kind(), "params");
        assert!(err.to_string().contains("model"));
    }

    #[test]
    fn test_full_job() {
        let p = RequestParameters::from_job(&job(json!({
            "model": "anthropic/claude-sonnet-4-5",
            "prompt": "hello",
            "system_prompt": "be terse",
            "temperature": 0.2,
            "top_p": "0.9",
            "max_tokens": 512,
            "stop_sequences": "END",
            "expect_json": true,
            "timeout_ms": 5000,
        })))
        .unwrap();
        assert_eq!(p.system_prompt.as_deref(), Some("be terse"));
        assert_eq!(p.temperature, Some(0.2));
        assert_eq!(p.top_p, Some(0.9));
        assert_eq!(p.max_tokens, Some(512));
        assert_eq!(p.stop_sequences, Some(vec!["END".to_string()]));
        assert!(p.expect_json);
        assert_eq!(p.timeout, Duration::from_millis(5000));
    }

    #[test]
    fn test_empty_base_url_is_unset() {
        let p = RequestParameters::from_job(&job(json!({
            "model": "openai/gpt-4o",
            "prompt": "hi",
            "base_url": "  ",
        })))
        .unwrap();
        assert!(p.base_url.is_none());
    }

    // ── coerce_number ──

    #[test]
    fn test_coerce_number_absent() {
        assert_eq!(coerce_number(None), None);
        assert_eq!(coerce_number(Some(&Value::Null)), None);
    }

    #[test]
    fn test_coerce_number_from_number() {
        assert_eq!(coerce_number(Some(&json!(0.7))), Some(0.7));
        assert_eq!(coerce_number(Some(&json!(42))), Some(42.0));
    }

    #[test]
    fn test_coerce_number_from_string() {
        assert_eq!(coerce_number(Some(&json!("0.7"))), Some(0.7));
        assert_eq!(coerce_number(Some(&json!(" 1024 "))), Some(1024.0));
    }

    #[test]
    fn test_coerce_number_empty_string() {
        assert_eq!(coerce_number(Some(&json!(""))), None);
        assert_eq!(coerce_number(Some(&json!("  "))), None);
    }

    #[test]
    fn test_coerce_number_garbage() {
        assert_eq!(coerce_number(Some(&json!("warm"))), None);
        assert_eq!(coerce_number(Some(&json!(true))), None);
        assert_eq!(coerce_number(Some(&json!({"n": 1}))), None);
    }

    #[test]
    fn test_coerce_number_non_finite_string() {
        assert_eq!(coerce_number(Some(&json!("NaN"))), None);
        assert_eq!(coerce_number(Some(&json!("inf"))), None);
    }

    // ── coerce_stop_sequences ──

    #[test]
    fn test_stop_sequences_from_delimited_string() {
        assert_eq!(
            coerce_stop_sequences(Some(&json!("a, b\nc"))),
            Some(vec!["a".to_string(), "b".to_string(), "c".to_string()])
        );
    }

    #[test]
    fn test_stop_sequences_from_array() {
        assert_eq!(
            coerce_stop_sequences(Some(&json!(["END", "", "STOP"]))),
            Some(vec!["END".to_string(), "STOP".to_string()])
        );
    }

    #[test]
    fn test_stop_sequences_array_coerces_non_strings() {
        assert_eq!(
            coerce_stop_sequences(Some(&json!([42, true]))),
            Some(vec!["42".to_string(), "true".to_string()])
        );
    }

    #[test]
    fn test_stop_sequences_absent_or_empty_is_unset() {
        assert_eq!(coerce_stop_sequences(None), None);
        assert_eq!(coerce_stop_sequences(Some(&json!(""))), None);
        assert_eq!(coerce_stop_sequences(Some(&json!(" , "))), None);
        assert_eq!(coerce_stop_sequences(Some(&json!([]))), None);
        assert_eq!(coerce_stop_sequences(Some(&json!(["", ""]))), None);
    }

    // ── coerce_expect_json ──

    #[test]
    fn test_expect_json_boolean_true() {
        assert!(coerce_expect_json(Some(&json!(true))));
        assert!(!coerce_expect_json(Some(&json!(false))));
    }

    #[test]
    fn test_expect_json_string_true_case_insensitive() {
        assert!(coerce_expect_json(Some(&json!("true"))));
        assert!(coerce_expect_json(Some(&json!("TRUE"))));
        assert!(coerce_expect_json(Some(&json!("True"))));
    }

    #[test]
    fn test_expect_json_rejects_other_truthy_values() {
        assert!(!coerce_expect_json(Some(&json!(1))));
        assert!(!coerce_expect_json(Some(&json!("yes"))));
        assert!(!coerce_expect_json(Some(&json!("1"))));
        assert!(!coerce_expect_json(None));
    }

    // ── split_model ──

    #[test]
    fn test_split_model_basic() {
        let (provider, model) = split_model("openai/gpt-4o").unwrap();
        assert_eq!(provider, "openai");
        assert_eq!(model, "gpt-4o");
    }

    #[test]
    fn test_split_model_lowercases_provider() {
        let (provider, model) = split_model("OpenAI/GPT-4o").unwrap();
        assert_eq!(provider, "openai");
        assert_eq!(model, "GPT-4o");
    }

    #[test]
    fn test_split_model_keeps_slashes_in_model() {
        let (provider, model) = split_model("openrouter/meta-llama/llama-3-70b").unwrap();
        assert_eq!(provider, "openrouter");
        assert_eq!(model, "meta-llama/llama-3-70b");
    }

    #[test]
    fn test_split_model_no_slash_is_params_error() {
        let err = split_model("gpt-4o").unwrap_err();
        assert_eq!(err.kind(), "params");
        assert!(err.to_string().contains("gpt-4o"));
    }

    #[test]
    fn test_split_model_empty_segments_rejected() {
        assert!(split_model("/gpt-4o").is_err());
        assert!(split_model("openai/").is_err());
    }

    // ── strip_local_prefix ──

    #[test]
    fn test_strip_local_prefix() {
        assert_eq!(strip_local_prefix("local/foo"), "foo");
        assert_eq!(strip_local_prefix("LOCAL/foo"), "foo");
        assert_eq!(strip_local_prefix("Local/foo"), "foo");
    }

    #[test]
    fn test_strip_local_prefix_only_once() {
        assert_eq!(strip_local_prefix("local/local/foo"), "local/foo");
    }

    #[test]
    fn test_strip_local_prefix_no_prefix() {
        assert_eq!(strip_local_prefix("foo"), "foo");
        assert_eq!(strip_local_prefix("localhost-model"), "localhost-model");
        assert_eq!(strip_local_prefix("local"), "local");
    }
}
