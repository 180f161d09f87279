//! Job reader: one JSON object consumed from standard input.
//!
//! A job is the complete description of one relay invocation. It is read
//! once, parsed once, and never mutated.

use std::io::Read;

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::{RelayError, Result};

/// The single input object for one invocation.
///
/// ```json
/// { "params": { "model": "openai/gpt-4o", "prompt": "..." } }
/// ```
#[derive(Debug, Deserialize)]
pub struct Job {
    /// Named request parameters. Missing field parses as an empty map,
    /// which then fails parameter validation downstream.
    #[serde(default)]
    pub params: Map<String, Value>,
}

/// Drain `reader` to completion, trim, and parse the result as a [`Job`].
///
/// Empty (or whitespace-only) input and unparsable input both fail with the
/// `input` kind; the process emits the failure envelope and still exits 0.
pub fn read_job(reader: &mut dyn Read) -> Result<Job> {
    let mut buf = String::new();
    reader
        .read_to_string(&mut buf)
        .map_err(|e| RelayError::Other(format!("failed to read standard input: {}", e)))?;

    let trimmed = buf.trim();
    if trimmed.is_empty() {
        return Err(RelayError::Input("No JSON input received".into()));
    }

    serde_json::from_str(trimmed)
        .map_err(|e| RelayError::Input(format!("Invalid JSON input: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read(input: &str) -> Result<Job> {
        read_job(&mut input.as_bytes())
    }

    #[test]
    fn test_empty_input_is_input_error() {
        let err = read("").unwrap_err();
        assert_eq!(err.kind(), "input");
        assert_eq!(err.to_string(), "No JSON input received");
    }

    #[test]
    fn test_whitespace_only_input_is_input_error() {
        let err = read("   \n\t  ").unwrap_err();
        assert_eq!(err.kind(), "input");
        assert_eq!(err.to_string(), "No JSON input received");
    }

    #[test]
    fn test_malformed_json_is_input_error() {
        let err = read("{not json").unwrap_err();
        assert_eq!(err.kind(), "input");
        assert!(err.to_string().starts_with("Invalid JSON input:"));
    }

    #[test]
    fn test_non_object_params_is_input_error() {
        let err = read(r#"{"params": "nope"}"#).unwrap_err();
        assert_eq!(err.kind(), "input");
    }

    #[test]
    fn test_valid_job_parses() {
        let job = read(r#"{"params": {"model": "openai/gpt-4o", "prompt": "hi"}}"#).unwrap();
        assert_eq!(job.params["model"], "openai/gpt-4o");
        assert_eq!(job.params["prompt"], "hi");
    }

    #[test]
    fn test_missing_params_field_yields_empty_map() {
        let job = read("{}").unwrap();
        assert!(job.params.is_empty());
    }

    #[test]
    fn test_surrounding_whitespace_tolerated() {
        let job = read("  \n {\"params\": {}} \n ").unwrap();
        assert!(job.params.is_empty());
    }
}
