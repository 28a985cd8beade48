//! Placeholder and checkbox detection over a flattened line view.
//!
//! This module contains the locator half of the pipeline: given the
//! document's text reduced to an ordered list of lines, it finds placeholder
//! runs and checkbox glyphs and groups adjacent occurrences into entries.
//! Detection is purely derivational; nothing here touches the oracle or the
//! document structure.

pub mod checkbox;
pub mod fill;

pub use checkbox::{detect_checkbox_entries, CheckboxEntry};
pub use fill::{detect_fill_entries, FillEntry};

use crate::error::{FormFillError, FormFillResult};
use once_cell::sync::Lazy;
use regex::Regex;

/// Checkbox glyphs: bracket pairs, parenthesis pairs, and the Unicode
/// box/circle families.
pub fn checkbox_pattern() -> &'static Regex {
    static PATTERN: Lazy<Regex> = Lazy::new(|| {
        Regex::new(r"[\[\(][ Xx]?[\]\)]|[\u{2610}\u{2611}\u{2612}\u{25A1}\u{25A0}\u{25CB}\u{25EF}\u{25CF}]")
            .expect("Valid checkbox regex")
    });
    &PATTERN
}

/// Compiled placeholder pattern for one document.
///
/// Placeholder markers vary per form (underscore runs, dot leaders,
/// bracketed blanks), so the pattern is assembled from the literal strings
/// an upstream detection step found in the document. Longer literals are
/// combined before shorter ones so multi-character variants win over their
/// own prefixes. When no literals are available the default underscore-run
/// pattern is used.
#[derive(Debug, Clone)]
pub struct PlaceholderPattern {
    regex: Regex,
}

impl PlaceholderPattern {
    /// Default pattern matching runs of underscores.
    pub fn default_underscores() -> Self {
        static PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"_+").expect("Valid regex"));
        Self {
            regex: PATTERN.clone(),
        }
    }

    /// Builds a pattern from literal placeholder strings.
    ///
    /// Empty and whitespace-only literals are discarded; the rest are
    /// regex-escaped and sorted by descending length before being joined
    /// into a single alternation. Returns the underscore default when no
    /// usable literal remains.
    pub fn from_literals<S: AsRef<str>>(literals: &[S]) -> FormFillResult<Self> {
        let mut escaped: Vec<String> = literals
            .iter()
            .map(|s| s.as_ref().trim())
            .filter(|s| !s.is_empty())
            .map(regex::escape)
            .collect();

        if escaped.is_empty() {
            return Ok(Self::default_underscores());
        }

        escaped.sort_by_key(|p| std::cmp::Reverse(p.len()));
        escaped.dedup();

        let combined = escaped
            .iter()
            .map(|p| format!("({})", p))
            .collect::<Vec<_>>()
            .join("|");

        let regex = Regex::new(&combined).map_err(|e| FormFillError::PatternError {
            pattern: combined.clone(),
            reason: e.to_string(),
        })?;
        Ok(Self { regex })
    }

    /// The underlying regex.
    pub fn regex(&self) -> &Regex {
        &self.regex
    }

    /// Number of placeholder matches in `text`.
    pub fn count_matches(&self, text: &str) -> usize {
        self.regex.find_iter(text).count()
    }

    /// Byte offset of the first match in `line`, if any.
    pub fn first_match_start(&self, line: &str) -> Option<usize> {
        self.regex.find(line).map(|m| m.start())
    }
}

impl Default for PlaceholderPattern {
    fn default() -> Self {
        Self::default_underscores()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_pattern_matches_underscore_runs() {
        let pattern = PlaceholderPattern::default_underscores();
        assert_eq!(pattern.count_matches("Name: ____ Date: __"), 2);
        assert_eq!(pattern.count_matches("no blanks here"), 0);
    }

    #[test]
    fn test_literal_pattern_prefers_longest() {
        let pattern = PlaceholderPattern::from_literals(&["___", "________"]).unwrap();
        // The eight-underscore variant must match as one placeholder, not
        // as two three-underscore prefixes.
        assert_eq!(pattern.count_matches("Name: ________"), 1);
    }

    #[test]
    fn test_empty_literals_fall_back_to_default() {
        let pattern = PlaceholderPattern::from_literals(&["", "   "]).unwrap();
        assert_eq!(pattern.count_matches("x: ____"), 1);
    }

    #[test]
    fn test_literals_are_escaped() {
        let pattern = PlaceholderPattern::from_literals(&["[...]", "....."]).unwrap();
        assert_eq!(pattern.count_matches("Sign here [...]"), 1);
        assert_eq!(pattern.count_matches("Date ....."), 1);
    }

    #[test]
    fn test_checkbox_pattern_families() {
        let re = checkbox_pattern();
        for glyph in ["[ ]", "[]", "[X]", "[x]", "( )", "()", "(X)", "☐", "☑", "☒", "□", "■", "○", "◯", "●"] {
            assert!(re.is_match(glyph), "expected match for {:?}", glyph);
        }
        assert!(!re.is_match("plain text"));
    }
}
