//! Output parser for model responses
//!
//! Models are asked for JSON but routinely wrap it in prose or code
//! fences. Extraction runs in order: whole-text strict parse, fenced
//! ```json block, first balanced top-level object span. Callers always
//! supply an explicit fallback on [`ParseFailure`].

use regex::Regex;
use serde::de::DeserializeOwned;
use std::sync::OnceLock;
use thiserror::Error;
use tracing::debug;

/// Failure to extract a typed payload from model output
#[derive(Debug, Error)]
pub enum ParseFailure {
    #[error("No JSON payload found in model output")]
    NoJson,

    #[error("JSON decode failed: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Model returned empty output")]
    Empty,
}

fn fence_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)```(?:json)?\s*(\{.*?\})\s*```").expect("fence regex"))
}

/// Parse a typed value out of raw model output
pub fn parse_json<T: DeserializeOwned>(raw: &str) -> Result<T, ParseFailure> {
    debug!(len = raw.len(), "parse_json: called");
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ParseFailure::Empty);
    }

    // Whole text is valid JSON
    if let Ok(value) = serde_json::from_str::<T>(trimmed) {
        debug!("parse_json: strict parse succeeded");
        return Ok(value);
    }

    // Fenced code block
    if let Some(caps) = fence_regex().captures(trimmed)
        && let Some(block) = caps.get(1)
    {
        match serde_json::from_str::<T>(block.as_str()) {
            Ok(value) => {
                debug!("parse_json: fenced block parse succeeded");
                return Ok(value);
            }
            Err(e) => {
                debug!(error = %e, "parse_json: fenced block found but did not decode");
            }
        }
    }

    // First balanced top-level object span
    if let Some(span) = first_object_span(trimmed) {
        debug!(span_len = span.len(), "parse_json: trying object span");
        return serde_json::from_str::<T>(span).map_err(ParseFailure::Decode);
    }

    Err(ParseFailure::NoJson)
}

/// Find the first balanced `{...}` span, respecting string literals
fn first_object_span(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in text[start..].char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + offset + ch.len_utf8()]);
                }
            }
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Judgment {
        sufficient: bool,
        #[serde(default)]
        gaps: Vec<String>,
    }

    #[test]
    fn test_strict_parse() {
        let raw = r#"{"sufficient": true, "gaps": []}"#;
        let parsed: Judgment = parse_json(raw).unwrap();
        assert!(parsed.sufficient);
    }

    #[test]
    fn test_fenced_block() {
        let raw = "Here is my assessment:\n```json\n{\"sufficient\": false, \"gaps\": [\"pricing\"]}\n```\nDone.";
        let parsed: Judgment = parse_json(raw).unwrap();
        assert!(!parsed.sufficient);
        assert_eq!(parsed.gaps, vec!["pricing"]);
    }

    #[test]
    fn test_bare_fence_without_language_tag() {
        let raw = "```\n{\"sufficient\": true}\n```";
        let parsed: Judgment = parse_json(raw).unwrap();
        assert!(parsed.sufficient);
    }

    #[test]
    fn test_embedded_object_span() {
        let raw = "I think the answer is {\"sufficient\": true, \"gaps\": []} based on the docs.";
        let parsed: Judgment = parse_json(raw).unwrap();
        assert!(parsed.sufficient);
    }

    #[test]
    fn test_nested_braces_in_span() {
        #[derive(Deserialize)]
        struct Outer {
            inner: serde_json::Value,
        }
        let raw = "prefix {\"inner\": {\"a\": {\"b\": 1}}} suffix";
        let parsed: Outer = parse_json(raw).unwrap();
        assert_eq!(parsed.inner["a"]["b"], 1);
    }

    #[test]
    fn test_braces_inside_strings_ignored() {
        #[derive(Deserialize)]
        struct Wrapped {
            text: String,
        }
        let raw = r#"note: {"text": "use {curly} braces \" carefully"} end"#;
        let parsed: Wrapped = parse_json(raw).unwrap();
        assert!(parsed.text.contains("{curly}"));
    }

    #[test]
    fn test_no_json_fails() {
        let result: Result<Judgment, _> = parse_json("I could not find enough information.");
        assert!(matches!(result, Err(ParseFailure::NoJson)));
    }

    #[test]
    fn test_empty_input_fails() {
        let result: Result<Judgment, _> = parse_json("   ");
        assert!(matches!(result, Err(ParseFailure::Empty)));
    }

    #[test]
    fn test_malformed_span_fails_with_decode() {
        let result: Result<Judgment, _> = parse_json("{\"sufficient\": maybe}");
        assert!(matches!(result, Err(ParseFailure::Decode(_))));
    }
}
