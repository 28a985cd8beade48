//! Keyword-heuristic fallback for placeholders the oracle left unresolved.
//!
//! The table stays small and generic on purpose: a wrong heuristic match is
//! worse than an unresolved slot.

use crate::detect::PlaceholderPattern;

/// Keyword substrings mapped to candidate profile keys, most specific
/// first. The first candidate present in the legal key set wins.
const KEYWORD_TABLE: &[(&str, &[&str])] = &[
    ("first name", &["first_name"]),
    ("last name", &["last_name"]),
    (
        "name",
        &["full_name", "first_name", "last_name", "name"],
    ),
    ("phone", &["phone_number", "phone"]),
    ("telephone", &["phone_number", "phone"]),
    ("mobile", &["phone_number", "phone"]),
    ("email", &["email", "email_address"]),
    ("e-mail", &["email", "email_address"]),
    ("address", &["address", "home_address", "postal_address"]),
    (
        "birth",
        &[
            "date_of_birth (MM-DD-YYYY)",
            "date_of_birth (DD-MM-YYYY)",
            "date_of_birth (MM/DD/YYYY)",
            "date_of_birth (DD/MM/YYYY)",
            "date_of_birth (YYYY/MM/DD)",
            "date_of_birth (YYYY-MM-DD)",
            "birth_date",
        ],
    ),
    (
        "dob",
        &[
            "date_of_birth (MM-DD-YYYY)",
            "date_of_birth (DD-MM-YYYY)",
            "date_of_birth (MM/DD/YYYY)",
            "date_of_birth (DD/MM/YYYY)",
            "date_of_birth (YYYY/MM/DD)",
            "date_of_birth (YYYY-MM-DD)",
            "birth_date",
        ],
    ),
    ("date", &["current_date", "date"]),
];

/// Finds the line holding the `target`-th placeholder (0-based) of the
/// group, counting matches line by line.
pub fn line_of_placeholder<'a>(
    lines: &'a [String],
    pattern: &PlaceholderPattern,
    target: usize,
) -> Option<&'a str> {
    let mut seen = 0usize;
    for line in lines {
        let matches = pattern.count_matches(line);
        if matches == 0 {
            continue;
        }
        if seen + matches > target {
            return Some(line);
        }
        seen += matches;
    }
    None
}

/// Fills still-unresolved slots from the keyword table, in place.
///
/// For each `None` slot, the line containing that placeholder is scanned
/// for a keyword substring; the first candidate key present in the legal
/// set is taken.
pub fn apply_keyword_heuristics(
    field_keys: &mut [Option<String>],
    lines: &[String],
    legal_keys: &[String],
    pattern: &PlaceholderPattern,
) {
    for (idx, slot) in field_keys.iter_mut().enumerate() {
        if slot.is_some() {
            continue;
        }
        let target_line = match line_of_placeholder(lines, pattern, idx) {
            Some(line) => line.to_lowercase(),
            None => continue,
        };

        for (keyword, candidates) in KEYWORD_TABLE {
            if !target_line.contains(keyword) {
                continue;
            }
            if let Some(chosen) = candidates
                .iter()
                .find(|c| legal_keys.iter().any(|k| k == *c))
            {
                log::debug!(
                    "heuristic mapping: placeholder #{} in line '{}' -> {}",
                    idx + 1,
                    target_line.trim(),
                    chosen
                );
                *slot = Some(chosen.to_string());
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(texts: &[&str]) -> Vec<String> {
        texts.iter().map(|s| s.to_string()).collect()
    }

    fn legal(keys: &[&str]) -> Vec<String> {
        keys.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_phone_keyword_maps_to_phone_number() {
        let pattern = PlaceholderPattern::default_underscores();
        let doc = lines(&["Phone: ____"]);
        let mut slots = vec![None];
        apply_keyword_heuristics(&mut slots, &doc, &legal(&["phone_number"]), &pattern);
        assert_eq!(slots, vec![Some("phone_number".to_string())]);
    }

    #[test]
    fn test_candidate_must_be_in_legal_set() {
        let pattern = PlaceholderPattern::default_underscores();
        let doc = lines(&["Phone: ____"]);
        let mut slots = vec![None];
        apply_keyword_heuristics(&mut slots, &doc, &legal(&["full_name"]), &pattern);
        assert_eq!(slots, vec![None]);
    }

    #[test]
    fn test_resolved_slots_are_untouched() {
        let pattern = PlaceholderPattern::default_underscores();
        let doc = lines(&["Name: ____"]);
        let mut slots = vec![Some("email".to_string())];
        apply_keyword_heuristics(
            &mut slots,
            &doc,
            &legal(&["full_name", "email"]),
            &pattern,
        );
        assert_eq!(slots, vec![Some("email".to_string())]);
    }

    #[test]
    fn test_specific_keyword_wins_over_generic() {
        let pattern = PlaceholderPattern::default_underscores();
        let doc = lines(&["First Name: ____"]);
        let mut slots = vec![None];
        apply_keyword_heuristics(
            &mut slots,
            &doc,
            &legal(&["full_name", "first_name"]),
            &pattern,
        );
        assert_eq!(slots, vec![Some("first_name".to_string())]);
    }

    #[test]
    fn test_slot_index_selects_its_own_line() {
        let pattern = PlaceholderPattern::default_underscores();
        let doc = lines(&["Name: ____", "Email: ____"]);
        let mut slots = vec![None, None];
        apply_keyword_heuristics(
            &mut slots,
            &doc,
            &legal(&["full_name", "email"]),
            &pattern,
        );
        assert_eq!(
            slots,
            vec![Some("full_name".to_string()), Some("email".to_string())]
        );
    }

    #[test]
    fn test_line_of_placeholder_counts_across_lines() {
        let pattern = PlaceholderPattern::default_underscores();
        let doc = lines(&["a: __ b: __", "c: __"]);
        assert_eq!(line_of_placeholder(&doc, &pattern, 0), Some("a: __ b: __"));
        assert_eq!(line_of_placeholder(&doc, &pattern, 1), Some("a: __ b: __"));
        assert_eq!(line_of_placeholder(&doc, &pattern, 2), Some("c: __"));
        assert_eq!(line_of_placeholder(&doc, &pattern, 3), None);
    }
}
