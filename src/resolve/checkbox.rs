//! The checkbox resolution protocol.
//!
//! Three prompts per group: match the group to an existing profile key,
//! otherwise invent a new key and mine a value for it, then choose which
//! option indices to mark. A group with no obtainable value is dropped
//! (left permanently unresolved), which is distinct from "resolved, checked
//! nothing".

use crate::context::ContextStore;
use crate::detect::CheckboxEntry;
use crate::error::FormFillResult;
use crate::oracle::{parse, prompts, OracleClient};

/// Attempts for the selection prompt before degrading to an empty
/// selection.
const MAX_SELECTION_TRIES: usize = 3;

/// Resolves every checkbox entry in place.
///
/// Transport exhaustion on the stage's first oracle call propagates;
/// later failures drop or degrade only the entry they hit.
pub fn resolve_checkbox_entries(
    entries: &mut [CheckboxEntry],
    oracle: &OracleClient,
    store: &mut ContextStore,
    legal_keys: &[String],
) -> FormFillResult<()> {
    let mut first_call = true;

    for entry in entries.iter_mut() {
        log::debug!(
            "resolving checkbox group: {:?} options {:?}",
            entry.lines.first(),
            entry.option_labels
        );

        let text = entry.text_block();
        let prompt = prompts::checkbox_context_key(legal_keys, &text, &entry.option_labels);
        let response = match oracle.generate(&prompt) {
            Ok(r) => r,
            Err(e) if first_call => return Err(e),
            Err(e) => {
                log::error!("checkbox key matching failed, dropping group: {}", e);
                continue;
            }
        };
        first_call = false;
        let matched = parse::clean_scalar(&response).to_lowercase();

        let key = if matched == "none" || !legal_keys.iter().any(|k| k == &matched) {
            // Second prompt: invent a descriptive key for this group.
            let infer_prompt = prompts::checkbox_infer_key(&text, &entry.option_labels);
            let inferred = match oracle.generate(&infer_prompt) {
                Ok(r) => parse::clean_scalar(&r).to_lowercase(),
                Err(e) => {
                    log::error!("checkbox key inference failed, dropping group: {}", e);
                    continue;
                }
            };
            if parse::is_null_token(&inferred) {
                log::info!("no usable key inferred for checkbox group, skipping");
                continue;
            }
            inferred
        } else {
            matched
        };

        let value = match store.get_or_mine(&key, oracle) {
            Some(v) => v,
            None => {
                log::info!(
                    "no value found for checkbox group '{}', skipping",
                    key
                );
                continue;
            }
        };
        entry.field_key = Some(key.clone());
        store.save()?;

        entry.selected = Some(select_indices(
            oracle,
            &key,
            &value,
            &entry.option_labels,
        ));
        log::info!(
            "checkbox selections for key '{}': {:?}",
            key,
            entry.selected
        );
    }

    Ok(())
}

/// Runs the bounded-retry selection prompt and validates the indices.
///
/// Out-of-range indices are filtered, never propagated. Exhausting the
/// retries (or a transport failure) yields an empty selection: the group is
/// resolved with nothing checked.
fn select_indices(
    oracle: &OracleClient,
    key: &str,
    value: &str,
    labels: &[String],
) -> Vec<usize> {
    for attempt in 0..MAX_SELECTION_TRIES {
        let prompt = if attempt == 0 {
            prompts::checkbox_selection(key, value, labels)
        } else {
            prompts::checkbox_selection_retry(key, value, labels)
        };

        let response = match oracle.generate(&prompt) {
            Ok(r) => r,
            Err(e) => {
                log::error!("checkbox selection call failed: {}", e);
                return Vec::new();
            }
        };

        match parse::parse_index_list(&response) {
            Ok(indices) => {
                return indices
                    .into_iter()
                    .filter(|&i| i >= 0 && (i as usize) < labels.len())
                    .map(|i| i as usize)
                    .collect();
            }
            Err(e) => {
                log::warn!(
                    "attempt {}/{} failed to parse checkbox indices: {}",
                    attempt + 1,
                    MAX_SELECTION_TRIES,
                    e
                );
            }
        }
    }

    log::error!("all selection attempts failed, checking nothing");
    Vec::new()
}
