//! Payload extraction from completion text
//!
//! Models often fence their JSON or leave trailing commas. Repairs are pure
//! `text -> text` steps tried in order, each on the output of the previous
//! one, until a parse succeeds.

use crate::LlmResult;
use lazy_static::lazy_static;
use regex::Regex;
use serde_json::Value;
use wfsync_utils::truncate_chars;

const FENCE: &str = "```";
const PREVIEW_CHARS: usize = 500;
const ERROR_CONTEXT_CHARS: usize = 200;

lazy_static! {
    static ref TRAILING_COMMA: Regex =
        Regex::new(r",(\s*[}\]])").expect("trailing comma pattern is valid");
}

/// A syntactic repair; `None` when it does not apply
pub type Repair = fn(&str) -> Option<String>;

/// Repairs in the order they are attempted
pub const REPAIRS: [(&str, Repair); 2] = [
    ("removing trailing commas", remove_trailing_commas),
    ("extracting the first object", extract_first_object),
];

/// Drop a leading fence line and a trailing fence line, if present
pub fn strip_fences(text: &str) -> String {
    let trimmed = text.trim();
    if !trimmed.starts_with(FENCE) {
        return trimmed.to_string();
    }

    let mut lines: Vec<&str> = trimmed.lines().skip(1).collect();
    if lines.last().is_some_and(|line| line.trim_start().starts_with(FENCE)) {
        lines.pop();
    }
    tracing::debug!("Removed markdown code fences from response");
    lines.join("\n")
}

/// `,}` and `,]` (with optional whitespace) lose the comma
pub fn remove_trailing_commas(text: &str) -> Option<String> {
    let cleaned = TRAILING_COMMA.replace_all(text, "$1");
    (cleaned != text).then(|| cleaned.into_owned())
}

/// The first balanced `{...}` in `text`, skipping braces inside strings
pub fn extract_first_object(text: &str) -> Option<String> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in text[start..].char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    let end = start + offset + ch.len_utf8();
                    let object = &text[start..end];
                    return (object.len() != text.len()).then(|| object.to_string());
                }
            }
            _ => {}
        }
    }
    None
}

/// Parse completion text into JSON, repairing when needed.
///
/// When every repair fails the error of the first parse is returned.
pub fn parse_payload(text: &str) -> LlmResult<Value> {
    tracing::debug!(
        "Raw LLM response content (first {PREVIEW_CHARS} chars):\n{}",
        truncate_chars(text, PREVIEW_CHARS)
    );
    let body = strip_fences(text);

    let original = match serde_json::from_str::<Value>(&body) {
        Ok(value) => return Ok(value),
        Err(e) => e,
    };
    tracing::warn!("Failed to parse LLM response as JSON: {original}");
    tracing::debug!("JSON error near:\n...{}...", error_context(&body, &original));

    let mut candidate = body;
    for (name, repair) in REPAIRS {
        let Some(repaired) = repair(&candidate) else {
            continue;
        };
        match serde_json::from_str::<Value>(&repaired) {
            Ok(value) => {
                tracing::warn!("JSON parsed after {name}");
                return Ok(value);
            }
            Err(e) => tracing::debug!("Still invalid after {name}: {e}"),
        }
        candidate = repaired;
    }

    tracing::error!("Response content (full): {text}");
    Err(original.into())
}

/// Text around the reported error position
fn error_context(body: &str, error: &serde_json::Error) -> String {
    let Some(line) = body.lines().nth(error.line().saturating_sub(1)) else {
        return String::new();
    };
    let column = error.column().saturating_sub(1);
    let chars: Vec<char> = line.chars().collect();
    let from = column.saturating_sub(ERROR_CONTEXT_CHARS).min(chars.len());
    let to = (column + ERROR_CONTEXT_CHARS).min(chars.len());
    chars[from..to].iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::LlmError;
    use serde_json::json;

    #[test]
    fn test_plain_json() {
        assert_eq!(parse_payload(r#"{"a": 1}"#).unwrap(), json!({"a": 1}));
    }

    #[test]
    fn test_fenced_json() {
        assert_eq!(parse_payload("```json\n{\"a\":1}\n```").unwrap(), json!({"a": 1}));
        assert_eq!(parse_payload("```\n{\"a\":1}\n```\n").unwrap(), json!({"a": 1}));
    }

    #[test]
    fn test_fence_without_closing_line() {
        assert_eq!(strip_fences("```json\n{\"a\":1}"), "{\"a\":1}");
    }

    #[test]
    fn test_trailing_comma_repair() {
        assert_eq!(parse_payload(r#"{"a": 1,}"#).unwrap(), json!({"a": 1}));
        assert_eq!(
            parse_payload("{\"list\": [1, 2,\n ],\n}").unwrap(),
            json!({"list": [1, 2]})
        );
    }

    #[test]
    fn test_object_extraction_repair() {
        let text = "Here is the analysis:\n{\"a\": {\"b\": \"}\"}}\nLet me know!";
        assert_eq!(parse_payload(text).unwrap(), json!({"a": {"b": "}"}}));
    }

    #[test]
    fn test_repairs_are_cumulative() {
        let text = "Sure! {\"items\": [1, 2,],} Hope this helps";
        assert_eq!(parse_payload(text).unwrap(), json!({"items": [1, 2]}));
    }

    #[test]
    fn test_unrepairable_returns_original_error() {
        let err = parse_payload("not json at all").unwrap_err();
        assert!(matches!(err, LlmError::Json(_)));
    }

    #[test]
    fn test_extract_handles_escaped_quotes() {
        let text = r#"x {"a": "quote \" and { brace"} y"#;
        assert_eq!(
            extract_first_object(text).unwrap(),
            r#"{"a": "quote \" and { brace"}"#
        );
        assert_eq!(extract_first_object("{unbalanced"), None);
        assert_eq!(extract_first_object("no braces"), None);
    }

    #[test]
    fn test_remove_trailing_commas_noop() {
        assert_eq!(remove_trailing_commas(r#"{"a": 1}"#), None);
    }

    #[test]
    fn test_trailing_comma_pattern_reused() {
        lazy_static::initialize(&TRAILING_COMMA);
        assert_eq!(remove_trailing_commas("[1,]").as_deref(), Some("[1]"));
        assert_eq!(remove_trailing_commas("{\"a\": [2 ,\n],\n}").as_deref(), Some("{\"a\": [2 \n]\n}"));
    }
}
