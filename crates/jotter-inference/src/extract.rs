//! JSON extraction from free-form completion text.
//!
//! Language models wrap JSON in prose, markdown fences, or trailing
//! commentary. The parsing policy is fixed for testability: take the first
//! *balanced* `{...}` span from the completion and attempt a strict decode.
//! Any decode error, missing required key, or absent span means the caller
//! applies its documented fallback — extraction failures never become
//! errors.

use serde::de::DeserializeOwned;

/// Return the first balanced `{...}` span in `text`, if any.
///
/// The scanner is aware of string literals and escape sequences, so braces
/// inside JSON strings do not affect nesting depth. Unterminated spans
/// return `None`.
pub fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let bytes = text.as_bytes();
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, &b) in bytes[start..].iter().enumerate() {
        if escaped {
            escaped = false;
            continue;
        }
        match b {
            b'\\' if in_string => escaped = true,
            b'"' => in_string = !in_string,
            b'{' if !in_string => depth += 1,
            b'}' if !in_string => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + offset + 1]);
                }
            }
            _ => {}
        }
    }
    None
}

/// Extract and strictly decode the first JSON object in `text`.
///
/// Returns `None` on absent span or any decode error; the caller falls back.
pub fn parse_first_json<T: DeserializeOwned>(text: &str) -> Option<T> {
    let span = extract_json_object(text)?;
    serde_json::from_str(span).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Pair {
        a: String,
        b: i32,
    }

    #[test]
    fn test_extract_plain_object() {
        assert_eq!(extract_json_object(r#"{"a":1}"#), Some(r#"{"a":1}"#));
    }

    #[test]
    fn test_extract_ignores_surrounding_prose() {
        let text = "Sure! Here is the JSON you asked for:\n{\"a\": 1}\nLet me know.";
        assert_eq!(extract_json_object(text), Some("{\"a\": 1}"));
    }

    #[test]
    fn test_extract_inside_markdown_fence() {
        let text = "```json\n{\"a\": \"x\"}\n```";
        assert_eq!(extract_json_object(text), Some("{\"a\": \"x\"}"));
    }

    #[test]
    fn test_extract_nested_objects() {
        let text = r#"prefix {"outer": {"inner": 2}} suffix"#;
        assert_eq!(
            extract_json_object(text),
            Some(r#"{"outer": {"inner": 2}}"#)
        );
    }

    #[test]
    fn test_braces_inside_strings_do_not_close_the_span() {
        let text = r#"{"a": "closing } brace", "b": 1}"#;
        assert_eq!(extract_json_object(text), Some(text));
    }

    #[test]
    fn test_escaped_quote_inside_string() {
        let text = r#"{"a": "quote \" then } brace", "b": 1}"#;
        assert_eq!(extract_json_object(text), Some(text));
    }

    #[test]
    fn test_no_object_returns_none() {
        assert_eq!(extract_json_object("no json here"), None);
        assert_eq!(extract_json_object(""), None);
    }

    #[test]
    fn test_unbalanced_returns_none() {
        assert_eq!(extract_json_object(r#"{"a": 1"#), None);
    }

    #[test]
    fn test_first_of_multiple_objects_wins() {
        let text = r#"{"a": 1} and later {"b": 2}"#;
        assert_eq!(extract_json_object(text), Some(r#"{"a": 1}"#));
    }

    #[test]
    fn test_parse_first_json_decodes() {
        let text = r#"Model says: {"a": "hi", "b": 3}"#;
        let pair: Pair = parse_first_json(text).unwrap();
        assert_eq!(
            pair,
            Pair {
                a: "hi".to_string(),
                b: 3
            }
        );
    }

    #[test]
    fn test_parse_first_json_missing_key_is_none() {
        let text = r#"{"a": "hi"}"#;
        assert_eq!(parse_first_json::<Pair>(text), None);
    }

    #[test]
    fn test_parse_first_json_wrong_type_is_none() {
        let text = r#"{"a": "hi", "b": "not a number"}"#;
        assert_eq!(parse_first_json::<Pair>(text), None);
    }
}
