//! Response interpreter: best-effort JSON extraction from model output.
//!
//! Models asked for JSON rarely return it bare — it usually arrives inside
//! a markdown fence, surrounded by prose, or not at all. The interpreter
//! finds the single best candidate (first fenced block, else the whole
//! trimmed text), parses it opportunistically, and decides between
//! structured data, plain text, and a `json`-kind failure when the caller
//! demanded JSON.

use serde_json::{json, Value};

use crate::error::{RelayError, Result};

/// Outcome of candidate extraction, kept distinct so `expect_json` failures
/// can say whether JSON was malformed or absent.
#[derive(Debug, PartialEq)]
enum Extraction {
    /// A candidate parsed cleanly.
    Parsed(Value),
    /// A candidate looked like JSON but did not parse; the trimmed
    /// candidate text is retained for diagnostics.
    Malformed(String),
    /// Nothing resembling JSON was found.
    Absent,
}

/// Interpret raw model output under the caller's JSON expectation.
///
/// Returns the parsed JSON value when one is found; otherwise wraps the
/// raw text as `{"text": ...}`. With `expect_json` set, a missing or
/// malformed candidate is a `json`-kind failure instead.
pub fn interpret(raw: &str, expect_json: bool) -> Result<Value> {
    match extract(raw) {
        Extraction::Parsed(value) => Ok(value),
        Extraction::Malformed(candidate) if expect_json => Err(RelayError::Json(format!(
            "Invalid JSON returned by model: {}",
            truncate(&candidate, 200)
        ))),
        Extraction::Absent if expect_json => {
            Err(RelayError::Json("No JSON returned by model".into()))
        }
        Extraction::Malformed(_) | Extraction::Absent => Ok(json!({ "text": raw })),
    }
}

/// Find and classify the JSON candidate in `raw`.
fn extract(raw: &str) -> Extraction {
    let trimmed = raw.trim();
    let candidate = extract_fenced(trimmed).unwrap_or(trimmed).trim();

    if !looks_like_json(candidate) {
        return Extraction::Absent;
    }
    match serde_json::from_str(candidate) {
        Ok(value) => Extraction::Parsed(value),
        Err(_) => Extraction::Malformed(candidate.to_string()),
    }
}

/// Extract the innermost content of the first triple-backtick fenced block.
///
/// Handles bare fences and language-tagged ones (` ```json `). Returns
/// `None` when no complete block exists.
fn extract_fenced(text: &str) -> Option<&str> {
    let fence_start = text.find("```")?;
    let after_backticks = fence_start + 3;

    // Language hint line: everything between ``` and the next newline
    let line_end = text[after_backticks..].find('\n')?;
    let content_start = after_backticks + line_end + 1;

    let close_offset = text[content_start..].find("```")?;
    Some(text[content_start..content_start + close_offset].trim())
}

/// A candidate qualifies only when its outer characters are a matching
/// `{...}` or `[...]` pair. Anything else is "no JSON", not a parse error.
fn looks_like_json(candidate: &str) -> bool {
    (candidate.starts_with('{') && candidate.ends_with('}'))
        || (candidate.starts_with('[') && candidate.ends_with(']'))
}

/// Truncate a string to at most `max_len` bytes on a char boundary,
/// appending "..." if truncated.
fn truncate(s: &str, max_len: usize) -> String {
    if s.len() <= max_len {
        return s.to_string();
    }
    let mut end = max_len;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &s[..end])
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── extract_fenced ──

    #[test]
    fn test_fenced_json_block() {
        let input = "Here:\n```json\n{\"a\": 1}\n```";
        assert_eq!(extract_fenced(input), Some("{\"a\": 1}"));
    }

    #[test]
    fn test_fenced_bare_block() {
        let input = "```\n[1, 2]\n```\ntrailing prose";
        assert_eq!(extract_fenced(input), Some("[1, 2]"));
    }

    #[test]
    fn test_fenced_first_block_wins() {
        let input = "```json\n{\"first\": true}\n```\n```json\n{\"second\": true}\n```";
        assert_eq!(extract_fenced(input), Some("{\"first\": true}"));
    }

    #[test]
    fn test_fenced_unclosed_block() {
        assert_eq!(extract_fenced("```json\n{\"a\": 1}"), None);
    }

    #[test]
    fn test_fenced_no_block() {
        assert_eq!(extract_fenced("no fences here"), None);
    }

    // ── interpret: plain text ──

    #[test]
    fn test_plain_text_wrapped() {
        let out = interpret("The sky is blue because of Rayleigh scattering.", false).unwrap();
        assert_eq!(
            out,
            json!({"text": "The sky is blue because of Rayleigh scattering."})
        );
    }

    #[test]
    fn test_plain_text_with_expect_json_fails() {
        let err = interpret("just prose", true).unwrap_err();
        assert_eq!(err.kind(), "json");
        assert!(err.to_string().contains("No JSON returned"));
    }

    // ── interpret: structured ──

    #[test]
    fn test_bare_json_object() {
        let out = interpret(r#"{"a": 1}"#, false).unwrap();
        assert_eq!(out, json!({"a": 1}));
    }

    #[test]
    fn test_bare_json_array() {
        let out = interpret("[1, 2, 3]", true).unwrap();
        assert_eq!(out, json!([1, 2, 3]));
    }

    #[test]
    fn test_fenced_json_parsed_not_raw() {
        let out = interpret("```json\n{\"a\":1}\n```", false).unwrap();
        assert_eq!(out, json!({"a": 1}));
    }

    #[test]
    fn test_fenced_bare_json_parsed() {
        let out = interpret("```\n{\"a\":1}\n```", true).unwrap();
        assert_eq!(out, json!({"a": 1}));
    }

    #[test]
    fn test_whitespace_around_json_tolerated() {
        let out = interpret("  \n {\"a\": 1} \n ", false).unwrap();
        assert_eq!(out, json!({"a": 1}));
    }

    // ── interpret: malformed vs absent ──

    #[test]
    fn test_malformed_json_with_expect_json() {
        let err = interpret(r#"{"a": }"#, true).unwrap_err();
        assert_eq!(err.kind(), "json");
        assert!(err.to_string().contains("Invalid JSON returned"));
    }

    #[test]
    fn test_malformed_json_without_expect_json_is_text() {
        let raw = r#"{"a": }"#;
        let out = interpret(raw, false).unwrap();
        assert_eq!(out, json!({"text": raw}));
    }

    #[test]
    fn test_prose_around_braces_is_absent_not_malformed() {
        // Outer characters are not a bracket pair — no parse is attempted
        let err = interpret(r#"The result is {"a": 1} as shown."#, true).unwrap_err();
        assert!(err.to_string().contains("No JSON returned"));
    }

    #[test]
    fn test_mismatched_brackets_absent() {
        let err = interpret(r#"{"a": 1]"#, true).unwrap_err();
        assert!(err.to_string().contains("No JSON returned"));
    }

    #[test]
    fn test_fenced_non_json_content_absent() {
        let err = interpret("```python\nprint('hi')\n```", true).unwrap_err();
        assert!(err.to_string().contains("No JSON returned"));
    }

    #[test]
    fn test_empty_response_is_text_when_json_not_expected() {
        let out = interpret("", false).unwrap();
        assert_eq!(out, json!({"text": ""}));
    }

    #[test]
    fn test_empty_response_with_expect_json_fails() {
        let err = interpret("", true).unwrap_err();
        assert_eq!(err.kind(), "json");
    }

    // ── truncate ──

    #[test]
    fn test_truncate_short_string_untouched() {
        assert_eq!(truncate("abc", 5), "abc");
    }

    #[test]
    fn test_truncate_long_string() {
        assert_eq!(truncate("abcdefgh", 4), "abcd...");
    }

    #[test]
    fn test_truncate_respects_char_boundary() {
        let s = "αβγδ"; // 2 bytes per char
        let out = truncate(s, 3);
        assert!(out.starts_with('α'));
        assert!(out.ends_with("..."));
    }
}
