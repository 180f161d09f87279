//! Output envelope: the single JSON line this process ever writes.
//!
//! Success and failure share one fixed shape, distinguished by `code`:
//! numeric `0` with a `data` payload on success, a kind string with a
//! `description` on failure. The process exit code is always 0 — callers
//! detect failure by inspecting the envelope, not the OS status.

use std::io::Write;

use serde_json::{json, Value};

use crate::error::RelayError;

/// The sole output object of one invocation.
#[derive(Debug, Clone, PartialEq)]
pub enum Envelope {
    /// `{"xy":1,"code":0,"data":...}`
    Success {
        /// Parsed JSON value, or `{"text": ...}` for plain responses.
        data: Value,
    },
    /// `{"xy":1,"code":"<kind>","description":"..."}`
    Failure {
        /// One of `input`, `params`, `env`, `json`, `error`.
        code: &'static str,
        /// Human-readable message.
        description: String,
    },
}

impl Envelope {
    /// Wrap a successful payload.
    pub fn success(data: Value) -> Self {
        Envelope::Success { data }
    }

    /// Build the failure envelope for a pipeline error.
    pub fn failure(err: &RelayError) -> Self {
        Envelope::Failure {
            code: err.kind(),
            description: err.to_string(),
        }
    }

    /// The envelope as a JSON value.
    pub fn to_value(&self) -> Value {
        match self {
            Envelope::Success { data } => json!({"xy": 1, "code": 0, "data": data}),
            Envelope::Failure { code, description } => {
                json!({"xy": 1, "code": code, "description": description})
            }
        }
    }

    /// Serialize as exactly one newline-terminated line.
    pub fn write(&self, writer: &mut dyn Write) -> std::io::Result<()> {
        serde_json::to_writer(&mut *writer, &self.to_value())?;
        writer.write_all(b"\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rendered(envelope: &Envelope) -> String {
        let mut buf = Vec::new();
        envelope.write(&mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_success_code_is_numeric_zero() {
        let value = Envelope::success(json!({"a": 1})).to_value();
        assert_eq!(value["xy"], 1);
        assert_eq!(value["code"], 0);
        assert!(value["code"].is_number());
        assert_eq!(value["data"], json!({"a": 1}));
        assert!(value.get("description").is_none());
    }

    #[test]
    fn test_failure_code_is_kind_string() {
        let err = RelayError::Env("No API key found for provider 'openai'".into());
        let value = Envelope::failure(&err).to_value();
        assert_eq!(value["xy"], 1);
        assert_eq!(value["code"], "env");
        assert_eq!(value["description"], "No API key found for provider 'openai'");
        assert!(value.get("data").is_none());
    }

    #[test]
    fn test_write_emits_one_line() {
        let out = rendered(&Envelope::success(json!({"text": "hi"})));
        assert!(out.ends_with('\n'));
        assert_eq!(out.matches('\n').count(), 1);
        let parsed: Value = serde_json::from_str(out.trim()).unwrap();
        assert_eq!(parsed["data"]["text"], "hi");
    }

    #[test]
    fn test_write_failure_round_trips() {
        let err = RelayError::Input("No JSON input received".into());
        let out = rendered(&Envelope::failure(&err));
        let parsed: Value = serde_json::from_str(out.trim()).unwrap();
        assert_eq!(parsed["code"], "input");
        assert_eq!(parsed["description"], "No JSON input received");
    }
}
