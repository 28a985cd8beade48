//! Permissive parsing of oracle responses.
//!
//! Oracle output arrives wrapped in markdown fences, prose, or almost-JSON
//! with the wrong quote style. These helpers strip the wrappers, locate the
//! outermost balanced bracket pair, and repair quoting before handing the
//! payload to serde, so that one malformed token does not cost a retry.

use crate::error::{FormFillError, FormFillResult};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

/// Removes a surrounding markdown code fence, if present.
pub fn strip_code_fences(raw: &str) -> String {
    static OPEN: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"^```(?:json)?\s*").expect("Valid regex"));
    static CLOSE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s*```$").expect("Valid regex"));

    let trimmed = raw.trim();
    let without_open = OPEN.replace(trimmed, "");
    CLOSE.replace(&without_open, "").into_owned()
}

/// Extracts the outermost balanced `[` ... `]` slice.
///
/// Bracket counting rather than first/last indexing, so nested arrays
/// inside the payload do not truncate it. Falls back to the first
/// non-greedy bracket span when the brackets never balance.
pub fn extract_balanced_array(text: &str) -> Option<String> {
    let bytes = text.as_bytes();
    let start = bytes.iter().position(|&b| b == b'[')?;

    let mut depth = 0usize;
    for (offset, &b) in bytes[start..].iter().enumerate() {
        match b {
            b'[' => depth += 1,
            b']' => {
                depth -= 1;
                if depth == 0 {
                    return Some(text[start..start + offset + 1].to_string());
                }
            }
            _ => {}
        }
    }

    static FALLBACK: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"(?s)\[.*?\]").expect("Valid regex"));
    FALLBACK.find(text).map(|m| m.as_str().to_string())
}

/// Rewrites single-quoted tokens to double quotes so serde can parse them.
pub fn repair_single_quotes(text: &str) -> String {
    static QUOTED: Lazy<Regex> = Lazy::new(|| Regex::new(r"'([^']*)'").expect("Valid regex"));
    QUOTED.replace_all(text, "\"$1\"").into_owned()
}

/// Parses a JSON array out of a raw oracle response.
///
/// Applies fence stripping, balanced extraction, and, when the first parse
/// fails, the single-quote repair pass.
pub fn parse_json_array(raw: &str) -> FormFillResult<Vec<Value>> {
    let clean = strip_code_fences(raw);
    let payload = extract_balanced_array(&clean).ok_or_else(|| FormFillError::OracleProtocol {
        detail: format!("no JSON array in response: '{}'", truncate(raw, 120)),
    })?;

    if let Ok(Value::Array(items)) = serde_json::from_str::<Value>(&payload) {
        return Ok(items);
    }

    let repaired = repair_single_quotes(&payload);
    match serde_json::from_str::<Value>(&repaired) {
        Ok(Value::Array(items)) => Ok(items),
        _ => Err(FormFillError::OracleProtocol {
            detail: format!("unparseable array: '{}'", truncate(&payload, 120)),
        }),
    }
}

/// Parses a key-assignment response into per-slot options.
///
/// `null` values and the literal string `"null"` become `None`. Non-string
/// scalars are kept as their text form so the caller's legal-set validation
/// can reject them like any other out-of-vocabulary name.
pub fn parse_key_slots(raw: &str) -> FormFillResult<Vec<Option<String>>> {
    let items = parse_json_array(raw)?;
    Ok(items
        .into_iter()
        .map(|item| match item {
            Value::Null => None,
            Value::String(s) if s == "null" => None,
            Value::String(s) => Some(s),
            other => Some(other.to_string()),
        })
        .collect())
}

/// Parses a checkbox-selection response into integer indices.
pub fn parse_index_list(raw: &str) -> FormFillResult<Vec<i64>> {
    let items = parse_json_array(raw)?;
    items
        .into_iter()
        .map(|item| {
            item.as_i64().ok_or_else(|| FormFillError::OracleProtocol {
                detail: format!("not a list of integers: {}", item),
            })
        })
        .collect()
}

/// Parses a placeholder-literal response into strings.
pub fn parse_string_list(raw: &str) -> FormFillResult<Vec<String>> {
    let items = parse_json_array(raw)?;
    items
        .into_iter()
        .map(|item| match item {
            Value::String(s) => Ok(s),
            other => Err(FormFillError::OracleProtocol {
                detail: format!("not a list of strings: {}", other),
            }),
        })
        .collect()
}

/// Strips fences, backticks, and surrounding quotes off a scalar response.
pub fn clean_scalar(raw: &str) -> String {
    strip_code_fences(raw)
        .trim()
        .trim_matches('`')
        .trim_matches('"')
        .trim_matches('\'')
        .trim()
        .to_string()
}

/// The oracle's "no value found" convention: empty or the token `null`.
pub fn is_null_token(value: &str) -> bool {
    value.is_empty() || value.eq_ignore_ascii_case("null")
}

fn truncate(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_code_fences() {
        assert_eq!(strip_code_fences("```json\n[1]\n```"), "[1]");
        assert_eq!(strip_code_fences("```\n[1]\n```"), "[1]");
        assert_eq!(strip_code_fences("[1]"), "[1]");
    }

    #[test]
    fn test_balanced_extraction_handles_nesting() {
        let text = "result: [[1, 2], [3]] trailing";
        assert_eq!(extract_balanced_array(text).unwrap(), "[[1, 2], [3]]");
    }

    #[test]
    fn test_unbalanced_falls_back_to_non_greedy() {
        let text = "broken [1, 2 and later [3]";
        // The balanced scan never closes, so the non-greedy span wins.
        assert_eq!(extract_balanced_array(text).unwrap(), "[1, 2 and later [3]");
    }

    #[test]
    fn test_single_quote_repair() {
        let parsed = parse_json_array("['full_name', 'null', null]").unwrap();
        assert_eq!(parsed.len(), 3);
    }

    #[test]
    fn test_key_slots_null_conventions() {
        let slots = parse_key_slots(r#"["full_name", "null", null]"#).unwrap();
        assert_eq!(
            slots,
            vec![Some("full_name".to_string()), None, None]
        );
    }

    #[test]
    fn test_key_slots_non_strings_survive_for_validation() {
        let slots = parse_key_slots("[42, \"email\"]").unwrap();
        assert_eq!(slots, vec![Some("42".to_string()), Some("email".to_string())]);
    }

    #[test]
    fn test_index_list_rejects_non_integers() {
        assert!(parse_index_list("[0, 1]").is_ok());
        assert!(parse_index_list(r#"[0, "one"]"#).is_err());
    }

    #[test]
    fn test_prose_without_array_is_protocol_error() {
        assert!(parse_json_array("not json").is_err());
    }

    #[test]
    fn test_clean_scalar() {
        assert_eq!(clean_scalar("`\"gender\"`"), "gender");
        assert_eq!(clean_scalar("```\nphone_number\n```"), "phone_number");
    }

    #[test]
    fn test_null_token() {
        assert!(is_null_token(""));
        assert!(is_null_token("null"));
        assert!(is_null_token("NULL"));
        assert!(!is_null_token("Null Island"));
    }
}
