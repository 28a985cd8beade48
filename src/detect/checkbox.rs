//! Checkbox-entry detection: grouping checkbox glyphs and capturing their
//! option labels.

use super::checkbox_pattern;

/// Maximum number of glyph-bearing lines merged into one group.
const MAX_GROUP_LINES: usize = 5;

/// Lines of surrounding context added on each side of a group.
const CONTEXT_LINES: usize = 3;

/// One group of checkboxes resolved together.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckboxEntry {
    /// Contextual lines surrounding the checkboxes
    pub lines: Vec<String>,

    /// Flattened-line index of the first context line
    pub start_line: usize,

    /// (relative line, byte offset) of each checkbox glyph within `lines`
    pub positions: Vec<(usize, usize)>,

    /// Text immediately following each glyph, one label per position
    pub option_labels: Vec<String>,

    /// Resolved context field, if any
    pub field_key: Option<String>,

    /// Indices to mark checked. `Some(vec![])` means "resolved, nothing
    /// checked"; `None` means the group was never resolved.
    pub selected: Option<Vec<usize>>,
}

impl CheckboxEntry {
    /// The context text joined with newlines, as shown to the oracle.
    pub fn text_block(&self) -> String {
        self.lines.join("\n")
    }
}

/// Detects checkbox entries in the flattened document lines.
///
/// Glyph-bearing lines are grouped while the index gap is at most one and
/// the group holds fewer than five lines; each group's context window then
/// expands three lines on each side, clamped to the document.
pub fn detect_checkbox_entries(lines: &[String]) -> Vec<CheckboxEntry> {
    let pattern = checkbox_pattern();

    let glyph_lines: Vec<usize> = (0..lines.len())
        .filter(|&i| pattern.is_match(&lines[i]))
        .collect();
    if glyph_lines.is_empty() {
        return Vec::new();
    }

    let mut groups: Vec<Vec<usize>> = Vec::new();
    let mut current = vec![glyph_lines[0]];
    for &idx in &glyph_lines[1..] {
        if idx - current[current.len() - 1] <= 1 && current.len() < MAX_GROUP_LINES {
            current.push(idx);
        } else {
            groups.push(std::mem::replace(&mut current, vec![idx]));
        }
    }
    groups.push(current);

    let mut entries = Vec::new();
    for group in groups {
        let start = group[0].saturating_sub(CONTEXT_LINES);
        let end = (group[group.len() - 1] + CONTEXT_LINES).min(lines.len());
        let context: Vec<String> = lines[start..end].to_vec();

        let mut positions = Vec::new();
        let mut option_labels = Vec::new();
        for &line_idx in &group {
            let line = &lines[line_idx];
            let relative_line = line_idx - start;
            for m in pattern.find_iter(line) {
                positions.push((relative_line, m.start()));

                // Label: text after the glyph up to the next glyph or the
                // end of the line.
                let remaining = line[m.end()..].trim_start();
                let label = match pattern.find(remaining) {
                    Some(next) => remaining[..next.start()].trim(),
                    None => remaining.trim(),
                };
                option_labels.push(label.to_string());
            }
        }

        if !positions.is_empty() {
            entries.push(CheckboxEntry {
                lines: context,
                start_line: start,
                positions,
                option_labels,
                field_key: None,
                selected: None,
            });
        }
    }

    entries
}
