//! Fill-entry detection: grouping placeholder matches into entries.

use super::PlaceholderPattern;

/// One group of adjacent placeholders, resolved together.
///
/// `field_keys` always has exactly `spot_count` elements; `None` marks a
/// placeholder the resolution protocol could not map to a profile field.
/// `resolved_lines` stays empty until resolution completes and then mirrors
/// `lines` with every mapped placeholder substituted.
#[derive(Debug, Clone, PartialEq)]
pub struct FillEntry {
    /// Raw lines forming the group, in document order
    pub lines: Vec<String>,

    /// Flattened-line index of the first line, captured at detection time
    pub start_line: usize,

    /// Number of placeholder occurrences inside the group text
    pub spot_count: usize,

    /// One field key (or None for unresolved) per placeholder spot
    pub field_keys: Vec<Option<String>>,

    /// The group lines with placeholders substituted; empty until resolved
    pub resolved_lines: Vec<String>,
}

impl FillEntry {
    /// The group text joined with newlines, as shown to the oracle.
    pub fn text_block(&self) -> String {
        self.lines.join("\n")
    }

    /// True once resolution produced output lines.
    pub fn is_resolved(&self) -> bool {
        !self.resolved_lines.is_empty()
    }
}

/// Detects fill entries in the flattened document lines.
///
/// Every line index matching the placeholder pattern contributes a
/// `[i-1, i+1]` window (clamped to the document). A window disjoint from the
/// current group starts a new group, except that a match starting at column
/// zero never opens a group of its own: a bare placeholder line belongs to
/// the preceding label's group, so its window extends the previous group
/// instead.
pub fn detect_fill_entries(lines: &[String], pattern: &PlaceholderPattern) -> Vec<FillEntry> {
    if lines.is_empty() {
        return Vec::new();
    }

    let indices: Vec<usize> = (0..lines.len())
        .filter(|&i| pattern.regex().is_match(&lines[i]))
        .collect();

    // Each group is an inclusive line range.
    let mut groups: Vec<(usize, usize)> = Vec::new();
    for &i in &indices {
        let start = i.saturating_sub(1);
        let end = (i + 1).min(lines.len() - 1);
        let starts_at_col_zero = pattern.first_match_start(&lines[i]) == Some(0);

        let disjoint = groups.last().map_or(true, |&(_, last_end)| last_end < start);
        if disjoint && !starts_at_col_zero {
            groups.push((start, end));
        } else if let Some(last) = groups.last_mut() {
            if last.1 < end {
                last.1 = end;
            }
        }
    }

    groups
        .into_iter()
        .map(|(start, end)| {
            let group_lines: Vec<String> = lines[start..=end].to_vec();
            let spot_count = pattern.count_matches(&group_lines.join("\n"));
            FillEntry {
                lines: group_lines,
                start_line: start,
                spot_count,
                field_keys: vec![None; spot_count],
                resolved_lines: Vec::new(),
            }
        })
        .collect()
}
