//! The fill-entry resolution protocol.
//!
//! For each entry: obtain one field key per placeholder spot from the
//! oracle (validated, padded, retried), fall back to keyword heuristics,
//! infer and mine keys for spots nothing matched, then substitute the
//! stored values into the entry's lines.

use crate::context::ContextStore;
use crate::detect::{FillEntry, PlaceholderPattern};
use crate::error::FormFillResult;
use crate::oracle::{parse, prompts, OracleClient};
use crate::resolve::keywords;

/// Attempts per entry before degrading to unresolved.
const MAX_PROTOCOL_TRIES: usize = 3;

/// Resolves every entry in place.
///
/// Transport exhaustion on the stage's first oracle call propagates as a
/// hard failure; later transport failures degrade the affected entry to
/// unresolved and the pipeline continues.
pub fn resolve_fill_entries(
    entries: &mut [FillEntry],
    oracle: &OracleClient,
    store: &mut ContextStore,
    legal_keys: &[String],
    pattern: &PlaceholderPattern,
) -> FormFillResult<()> {
    let mut first_call = true;

    for entry in entries.iter_mut() {
        assign_field_keys(entry, oracle, legal_keys, &mut first_call)?;
        keywords::apply_keyword_heuristics(
            &mut entry.field_keys,
            &entry.lines,
            legal_keys,
            pattern,
        );
        infer_and_mine_missing(entry, oracle, store, pattern);

        // Rewrite the profile after every entry; an interruption then loses
        // at most one entry's extraction.
        store.save()?;

        substitute_values(entry, store, pattern);
    }

    Ok(())
}

/// Runs the bounded-retry key-assignment protocol for one entry.
///
/// Postcondition: `entry.field_keys.len() == entry.spot_count` and every
/// `Some` key is in the legal set.
fn assign_field_keys(
    entry: &mut FillEntry,
    oracle: &OracleClient,
    legal_keys: &[String],
    first_call: &mut bool,
) -> FormFillResult<()> {
    let text = entry.text_block();
    let spots = entry.spot_count;
    let mut assigned: Option<Vec<Option<String>>> = None;

    for attempt in 0..MAX_PROTOCOL_TRIES {
        let prompt = if attempt == 0 {
            prompts::fill_entry_match(legal_keys, &text, spots)
        } else {
            prompts::fill_entry_retry(legal_keys, &text, spots)
        };

        let response = match oracle.generate(&prompt) {
            Ok(r) => r,
            Err(e) if *first_call => return Err(e),
            Err(e) => {
                log::error!("oracle call failed, degrading entry to unresolved: {}", e);
                assigned = Some(vec![None; spots]);
                break;
            }
        };
        *first_call = false;

        let mut slots = match parse::parse_key_slots(&response) {
            Ok(s) => s,
            Err(e) => {
                log::warn!(
                    "attempt {}/{} failed to parse field keys: {}",
                    attempt + 1,
                    MAX_PROTOCOL_TRIES,
                    e
                );
                if attempt + 1 == MAX_PROTOCOL_TRIES {
                    log::error!("all attempts failed to parse field keys, using fallback");
                    assigned = Some(vec![None; spots]);
                }
                continue;
            }
        };

        if slots.len() != spots {
            log::warn!(
                "expected {} field keys but got {}, padding/truncating",
                spots,
                slots.len()
            );
            slots.resize(spots, None);
        }

        let has_invalid = slots
            .iter()
            .flatten()
            .any(|k| !legal_keys.iter().any(|l| l == k));
        if has_invalid {
            if attempt + 1 < MAX_PROTOCOL_TRIES {
                log::warn!("response contained unknown field names, retrying with stricter prompt");
                continue;
            }
            // Last attempt: drop just the offending slots.
            for slot in slots.iter_mut() {
                if let Some(k) = slot {
                    if !legal_keys.iter().any(|l| l == k) {
                        *slot = None;
                    }
                }
            }
        }

        assigned = Some(slots);
        break;
    }

    entry.field_keys = assigned.unwrap_or_else(|| vec![None; spots]);
    Ok(())
}

/// Infers key names for unresolved spots and mines values for every spot
/// whose key has no stored value yet.
fn infer_and_mine_missing(
    entry: &mut FillEntry,
    oracle: &OracleClient,
    store: &mut ContextStore,
    pattern: &PlaceholderPattern,
) {
    let text = entry.text_block();
    for idx in 0..entry.field_keys.len() {
        match entry.field_keys[idx].clone() {
            Some(key) => {
                // Known key without a stored value: mine the corpus for it.
                if store.get_or_mine(&key, oracle).is_none() {
                    log::info!("no value available for field '{}'", key);
                }
            }
            None => {
                let context_line = keywords::line_of_placeholder(&entry.lines, pattern, idx)
                    .unwrap_or("")
                    .to_string();
                let prompt = prompts::missing_key_inference(
                    &text,
                    &context_line,
                    idx,
                    pattern.regex().as_str(),
                );
                let response = match oracle.generate(&prompt) {
                    Ok(r) => r,
                    Err(e) => {
                        log::error!("key inference failed for spot {}: {}", idx + 1, e);
                        continue;
                    }
                };
                let new_key = parse::clean_scalar(&response);
                if parse::is_null_token(&new_key) {
                    continue;
                }
                if store.get_or_mine(&new_key, oracle).is_some() {
                    entry.field_keys[idx] = Some(new_key);
                } else {
                    log::info!("no value found for inferred key '{}'", new_key);
                }
            }
        }
    }
}

/// Builds `resolved_lines` by replacing the k-th placeholder match with the
/// value of the k-th field key. Spots without a value keep their
/// placeholder text so the blank stays visibly blank.
fn substitute_values(entry: &mut FillEntry, store: &ContextStore, pattern: &PlaceholderPattern) {
    let values: Vec<Option<String>> = entry
        .field_keys
        .iter()
        .map(|key| {
            key.as_deref()
                .and_then(|k| store.get(k))
                .map(|v| v.to_string())
        })
        .collect();

    let mut spot = 0usize;
    let mut resolved = Vec::with_capacity(entry.lines.len());
    for line in &entry.lines {
        let mut output = String::with_capacity(line.len());
        let mut cursor = 0usize;
        for m in pattern.regex().find_iter(line) {
            output.push_str(&line[cursor..m.start()]);
            match values.get(spot).and_then(|v| v.as_deref()) {
                Some(value) => output.push_str(value),
                None => output.push_str(m.as_str()),
            }
            cursor = m.end();
            spot += 1;
        }
        output.push_str(&line[cursor..]);
        resolved.push(output);
    }
    entry.resolved_lines = resolved;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::detect_fill_entries;
    use crate::error::FormFillResult;
    use crate::oracle::{OracleClient, TextGenerator};
    use std::sync::Mutex;
    use tempfile::TempDir;

    /// Oracle returning canned responses in order, then repeating the last.
    struct ScriptedOracle {
        responses: Mutex<Vec<String>>,
    }

    impl ScriptedOracle {
        fn client(responses: &[&str]) -> OracleClient {
            let backend = Self {
                responses: Mutex::new(responses.iter().rev().map(|s| s.to_string()).collect()),
            };
            OracleClient::new(Box::new(backend))
                .with_min_interval(std::time::Duration::from_millis(0))
        }
    }

    impl TextGenerator for ScriptedOracle {
        fn generate(&self, _prompt: &str) -> FormFillResult<String> {
            let mut responses = self.responses.lock().unwrap();
            if responses.len() > 1 {
                Ok(responses.pop().unwrap())
            } else {
                Ok(responses.last().cloned().unwrap_or_default())
            }
        }

        fn name(&self) -> &str {
            "scripted"
        }
    }

    fn store_with(dir: &TempDir, pairs: &[(&str, &str)]) -> ContextStore {
        let mut store = ContextStore::load(dir.path()).unwrap();
        for (k, v) in pairs {
            store.set(k, v);
        }
        store
    }

    fn keys(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_two_slot_scenario_resolves_both() {
        let pattern = PlaceholderPattern::default_underscores();
        let lines = vec!["Name: ____".to_string(), "Date: ____".to_string()];
        let mut entries = detect_fill_entries(&lines, &pattern);
        assert_eq!(entries.len(), 1);

        let dir = TempDir::new().unwrap();
        let mut store = store_with(&dir, &[("full_name", "Jane Smith"), ("current_date", "2026-08-04")]);
        let oracle = ScriptedOracle::client(&[r#"["full_name", "current_date"]"#]);
        let legal = keys(&["full_name", "current_date"]);

        resolve_fill_entries(&mut entries, &oracle, &mut store, &legal, &pattern).unwrap();
        assert_eq!(
            entries[0].field_keys,
            vec![Some("full_name".to_string()), Some("current_date".to_string())]
        );
        assert_eq!(
            entries[0].resolved_lines,
            vec!["Name: Jane Smith".to_string(), "Date: 2026-08-04".to_string()]
        );
    }

    #[test]
    fn test_malformed_responses_degrade_to_unresolved() {
        let pattern = PlaceholderPattern::default_underscores();
        let lines = vec!["A: ____ B: ____".to_string()];
        let mut entries = detect_fill_entries(&lines, &pattern);

        let dir = TempDir::new().unwrap();
        let mut store = store_with(&dir, &[]);
        // Three unparseable key responses, then "null" for the two
        // key-inference calls.
        let oracle = ScriptedOracle::client(&["not json", "not json", "not json", "null", "null"]);
        let legal = keys(&["full_name"]);

        resolve_fill_entries(&mut entries, &oracle, &mut store, &legal, &pattern).unwrap();
        assert_eq!(entries[0].field_keys, vec![None, None]);
        // Placeholders survive; the pipeline continued.
        assert_eq!(entries[0].resolved_lines, vec!["A: ____ B: ____".to_string()]);
    }

    #[test]
    fn test_overlong_response_is_truncated() {
        let pattern = PlaceholderPattern::default_underscores();
        let lines = vec!["Name: ____".to_string()];
        let mut entries = detect_fill_entries(&lines, &pattern);

        let dir = TempDir::new().unwrap();
        let mut store = store_with(&dir, &[("full_name", "Jane")]);
        let oracle = ScriptedOracle::client(&[r#"["full_name", "email", "extra"]"#]);
        let legal = keys(&["full_name", "email"]);

        resolve_fill_entries(&mut entries, &oracle, &mut store, &legal, &pattern).unwrap();
        assert_eq!(entries[0].field_keys.len(), entries[0].spot_count);
        assert_eq!(entries[0].field_keys, vec![Some("full_name".to_string())]);
    }

    #[test]
    fn test_unknown_keys_never_survive() {
        let pattern = PlaceholderPattern::default_underscores();
        let lines = vec!["X: ____".to_string()];
        let mut entries = detect_fill_entries(&lines, &pattern);

        let dir = TempDir::new().unwrap();
        let mut store = store_with(&dir, &[]);
        // The oracle keeps hallucinating the same unknown key; after the
        // retry budget it must be dropped, and inference then returns null.
        let oracle = ScriptedOracle::client(&[
            r#"["made_up_key"]"#,
            r#"["made_up_key"]"#,
            r#"["made_up_key"]"#,
            "null",
        ]);
        let legal = keys(&["full_name"]);

        resolve_fill_entries(&mut entries, &oracle, &mut store, &legal, &pattern).unwrap();
        assert_eq!(entries[0].field_keys, vec![None]);
    }

    #[test]
    fn test_single_quoted_response_is_repaired() {
        let pattern = PlaceholderPattern::default_underscores();
        let lines = vec!["Email: ____".to_string()];
        let mut entries = detect_fill_entries(&lines, &pattern);

        let dir = TempDir::new().unwrap();
        let mut store = store_with(&dir, &[("email", "jane@example.com")]);
        let oracle = ScriptedOracle::client(&["['email']"]);
        let legal = keys(&["email"]);

        resolve_fill_entries(&mut entries, &oracle, &mut store, &legal, &pattern).unwrap();
        assert_eq!(entries[0].resolved_lines, vec!["Email: jane@example.com".to_string()]);
    }

    #[test]
    fn test_resolution_is_idempotent_with_deterministic_oracle() {
        let pattern = PlaceholderPattern::default_underscores();
        let lines = vec!["Name: ____".to_string()];

        let dir = TempDir::new().unwrap();
        let mut store = store_with(&dir, &[("full_name", "Jane")]);
        let legal = keys(&["full_name"]);

        let mut first = detect_fill_entries(&lines, &pattern);
        let oracle = ScriptedOracle::client(&[r#"["full_name"]"#]);
        resolve_fill_entries(&mut first, &oracle, &mut store, &legal, &pattern).unwrap();

        let mut second = detect_fill_entries(&lines, &pattern);
        let oracle = ScriptedOracle::client(&[r#"["full_name"]"#]);
        resolve_fill_entries(&mut second, &oracle, &mut store, &legal, &pattern).unwrap();

        assert_eq!(first[0].resolved_lines, second[0].resolved_lines);
    }

    #[test]
    fn test_keyword_fallback_fills_null_slots() {
        let pattern = PlaceholderPattern::default_underscores();
        let lines = vec!["Phone: ____".to_string()];
        let mut entries = detect_fill_entries(&lines, &pattern);

        let dir = TempDir::new().unwrap();
        let mut store = store_with(&dir, &[("phone_number", "555-234-5678")]);
        let oracle = ScriptedOracle::client(&["[null]"]);
        let legal = keys(&["phone_number"]);

        resolve_fill_entries(&mut entries, &oracle, &mut store, &legal, &pattern).unwrap();
        assert_eq!(entries[0].field_keys, vec![Some("phone_number".to_string())]);
        assert_eq!(entries[0].resolved_lines, vec!["Phone: 555-234-5678".to_string()]);
    }

    #[test]
    fn test_inferred_key_used_when_value_exists() {
        let pattern = PlaceholderPattern::default_underscores();
        let lines = vec!["Passport: ____".to_string()];
        let mut entries = detect_fill_entries(&lines, &pattern);

        let dir = TempDir::new().unwrap();
        let mut store = store_with(&dir, &[("passport_number", "X123")]);
        // Key matching yields null; inference suggests passport_number.
        let oracle = ScriptedOracle::client(&["[null]", "passport_number"]);
        let legal = keys(&["full_name"]);

        resolve_fill_entries(&mut entries, &oracle, &mut store, &legal, &pattern).unwrap();
        assert_eq!(entries[0].field_keys, vec![Some("passport_number".to_string())]);
        assert_eq!(entries[0].resolved_lines, vec!["Passport: X123".to_string()]);
    }
}
