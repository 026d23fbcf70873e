//! Decoding of model message content into JSON.

use crate::error::truncate;
use crate::{Error, ErrorContext, Result};
use regex::Regex;
use serde_json::Value;

const FENCED_JSON: &str = r"^```(?:json)?\s*([\s\S]*?)\s*```$";

/// Parse model content as JSON.
///
/// The content must be a JSON document, optionally wrapped in a single
/// Markdown code fence. Anything else (prose, truncated documents, trailing
/// text) is a parse failure; no partial extraction is attempted.
pub fn parse_json_content(content: &str) -> Result<Value> {
    let trimmed = content.trim();
    match serde_json::from_str::<Value>(trimmed) {
        Ok(v) => Ok(v),
        Err(direct_err) => {
            if let Ok(re) = Regex::new(FENCED_JSON) {
                if let Some(inner) = re.captures(trimmed).and_then(|c| c.get(1)) {
                    return serde_json::from_str::<Value>(inner.as_str()).map_err(|e| {
                        parse_error(format!("fenced content is not valid JSON: {}", e), trimmed)
                    });
                }
            }
            Err(parse_error(
                format!("content is not valid JSON: {}", direct_err),
                trimmed,
            ))
        }
    }
}

fn parse_error(message: String, content: &str) -> Error {
    Error::parse_with_context(
        message,
        ErrorContext::new().with_details(truncate(content, 120)),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;

    #[test]
    fn test_plain_json() {
        let v = parse_json_content(r#" {"location": "Paris"} "#).unwrap();
        assert_eq!(v["location"], "Paris");
    }

    #[test]
    fn test_fenced_json() {
        let v = parse_json_content("```json\n{\"ok\": true}\n```").unwrap();
        assert_eq!(v["ok"], true);
        let v = parse_json_content("```\n[1, 2]\n```").unwrap();
        assert_eq!(v[1], 2);
    }

    #[test]
    fn test_malformed_is_parse_failure() {
        let err = parse_json_content(r#"{"location": "Paris", "temperature":}"#).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Parse);
    }

    #[test]
    fn test_prose_is_parse_failure() {
        let err = parse_json_content("This is not JSON").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Parse);
        assert!(err.to_string().contains("This is not JSON"));
    }
}
