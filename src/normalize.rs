//! Best-effort recovery of JSON from free-text model replies.
//!
//! Models are asked to answer with `{"response": ...}` but frequently wrap
//! the object in a code fence or embed raw control characters in string
//! literals. [`normalize_reply`] tolerates both and falls back to wrapping
//! the text when nothing parses; it never fails.

use serde_json::{json, Value};
use tracing::{info, warn};

const FENCE_OPEN: &str = "```json\n";
const FENCE_CLOSE: &str = "\n```";

/// Strip a literal leading "```json\n" and trailing "\n```", each if present.
pub fn strip_code_fence(raw: &str) -> &str {
    let s = raw.strip_prefix(FENCE_OPEN).unwrap_or(raw);
    s.strip_suffix(FENCE_CLOSE).unwrap_or(s)
}

/// Remove U+0000..=U+001F and U+007F.
pub fn strip_control_chars(s: &str) -> String {
    s.chars()
        .filter(|c| !matches!(*c, '\u{00}'..='\u{1f}' | '\u{7f}'))
        .collect()
}

/// Convert a raw model reply into a JSON value.
///
/// Order: fence strip, parse, control-character strip, parse, and finally
/// `{"response": <stripped text>}`.
pub fn normalize_reply(raw: &str) -> Value {
    let data = strip_code_fence(raw);

    match serde_json::from_str::<Value>(data) {
        Ok(value) => return value,
        Err(e) => warn!(error = %e, "Failed to parse model reply as JSON"),
    }

    let cleaned = strip_control_chars(data);
    match serde_json::from_str::<Value>(&cleaned) {
        Ok(value) => {
            info!("Parsed model reply after removing control characters");
            value
        }
        Err(_) => {
            warn!("Model reply is still not JSON, returning raw text");
            json!({ "response": cleaned })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_is_wrapped() {
        assert_eq!(normalize_reply("hello"), json!({"response": "hello"}));
    }

    #[test]
    fn test_fenced_json() {
        assert_eq!(normalize_reply("```json\n{\"a\":1}\n```"), json!({"a": 1}));
    }

    #[test]
    fn test_valid_json_is_verbatim() {
        let raw = r###"{"response": "## 诊断\n肝郁气滞", "extra": [1, 2]}"###;
        assert_eq!(
            normalize_reply(raw),
            json!({"response": "## 诊断\n肝郁气滞", "extra": [1, 2]})
        );
    }

    #[test]
    fn test_non_object_json_is_returned() {
        assert_eq!(normalize_reply("[1,2,3]"), json!([1, 2, 3]));
        assert_eq!(normalize_reply("true"), json!(true));
    }

    #[test]
    fn test_control_characters_removed() {
        let raw = "{\"response\": \"line one\nline two\ttabbed\u{7f}\"}";
        assert_eq!(
            normalize_reply(raw),
            json!({"response": "line oneline twotabbed"})
        );
    }

    #[test]
    fn test_fallback_uses_stripped_text() {
        let raw = "not\u{0}json\r\n";
        assert_eq!(normalize_reply(raw), json!({"response": "notjson"}));
    }

    #[test]
    fn test_fence_stripping_is_literal() {
        assert_eq!(strip_code_fence("```json\n{}\n```"), "{}");
        assert_eq!(strip_code_fence("```json\n{}"), "{}");
        assert_eq!(strip_code_fence("{}\n```"), "{}");
        // Only the exact markers are removed.
        assert_eq!(strip_code_fence("```\n{}\n```"), "```\n{}");
        assert_eq!(strip_code_fence("json{}"), "json{}");
    }

    #[test]
    fn test_empty_reply() {
        assert_eq!(normalize_reply(""), json!({"response": ""}));
    }

    #[test]
    fn test_strip_keeps_unicode() {
        assert_eq!(strip_control_chars("气虚\u{1b}质\u{85}"), "气虚质\u{85}");
    }
}
