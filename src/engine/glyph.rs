//! Checkbox glyph table.
//!
//! Each checkbox style family is a closed pair of glyphs; updating a
//! checkbox means detecting the style at a text offset and looking up the
//! counterpart for the target state.

/// Checkbox style families.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckboxStyle {
    /// `[ ]` / `[X]`
    Bracket,
    /// `( )` / `(X)`
    Paren,
    /// `☐` / `☑`
    Ballot,
    /// `□` / `■`
    Square,
    /// `○` / `●`
    Circle,
}

/// Target state of a checkbox glyph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckState {
    Checked,
    Unchecked,
}

/// A glyph recognized at some offset: its style, current state, and length
/// in bytes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GlyphMatch {
    pub style: CheckboxStyle,
    pub state: CheckState,
    pub len: usize,
}

/// Known glyph spellings, longest first so `[X]` wins over `[]`.
const GLYPHS: &[(&str, CheckboxStyle, CheckState)] = &[
    ("[ ]", CheckboxStyle::Bracket, CheckState::Unchecked),
    ("[X]", CheckboxStyle::Bracket, CheckState::Checked),
    ("[x]", CheckboxStyle::Bracket, CheckState::Checked),
    ("( )", CheckboxStyle::Paren, CheckState::Unchecked),
    ("(X)", CheckboxStyle::Paren, CheckState::Checked),
    ("(x)", CheckboxStyle::Paren, CheckState::Checked),
    ("[]", CheckboxStyle::Bracket, CheckState::Unchecked),
    ("()", CheckboxStyle::Paren, CheckState::Unchecked),
    ("\u{2610}", CheckboxStyle::Ballot, CheckState::Unchecked),
    ("\u{2611}", CheckboxStyle::Ballot, CheckState::Checked),
    ("\u{2612}", CheckboxStyle::Ballot, CheckState::Checked),
    ("\u{25A1}", CheckboxStyle::Square, CheckState::Unchecked),
    ("\u{25A0}", CheckboxStyle::Square, CheckState::Checked),
    ("\u{25CB}", CheckboxStyle::Circle, CheckState::Unchecked),
    ("\u{25EF}", CheckboxStyle::Circle, CheckState::Unchecked),
    ("\u{25CF}", CheckboxStyle::Circle, CheckState::Checked),
];

/// Canonical glyph for a (style, state) pair.
pub fn glyph_for(style: CheckboxStyle, state: CheckState) -> &'static str {
    match (style, state) {
        (CheckboxStyle::Bracket, CheckState::Unchecked) => "[ ]",
        (CheckboxStyle::Bracket, CheckState::Checked) => "[X]",
        (CheckboxStyle::Paren, CheckState::Unchecked) => "( )",
        (CheckboxStyle::Paren, CheckState::Checked) => "(X)",
        (CheckboxStyle::Ballot, CheckState::Unchecked) => "\u{2610}",
        (CheckboxStyle::Ballot, CheckState::Checked) => "\u{2611}",
        (CheckboxStyle::Square, CheckState::Unchecked) => "\u{25A1}",
        (CheckboxStyle::Square, CheckState::Checked) => "\u{25A0}",
        (CheckboxStyle::Circle, CheckState::Unchecked) => "\u{25CB}",
        (CheckboxStyle::Circle, CheckState::Checked) => "\u{25CF}",
    }
}

/// Detects a checkbox glyph starting exactly at byte offset `at`.
pub fn detect_at(text: &str, at: usize) -> Option<GlyphMatch> {
    if at > text.len() || !text.is_char_boundary(at) {
        return None;
    }
    let slice = &text[at..];
    GLYPHS
        .iter()
        .find(|(glyph, _, _)| slice.starts_with(glyph))
        .map(|&(glyph, style, state)| GlyphMatch {
            style,
            state,
            len: glyph.len(),
        })
}

/// Detects a glyph at `at`, then within a +/- 2 byte window around it.
///
/// Run boundaries can shift recorded offsets slightly; the secondary search
/// recovers those before giving up.
pub fn detect_near(text: &str, at: usize) -> Option<(usize, GlyphMatch)> {
    if let Some(m) = detect_at(text, at) {
        return Some((at, m));
    }
    for delta in 1..=2usize {
        if let Some(pos) = at.checked_sub(delta) {
            if let Some(m) = detect_at(text, pos) {
                return Some((pos, m));
            }
        }
        if let Some(m) = detect_at(text, at + delta) {
            return Some((at + delta, m));
        }
    }
    None
}

/// Rewrites the glyph at (or near) `at` to the target state. Returns the
/// updated string, or None when no glyph is found in the window.
pub fn set_state(text: &str, at: usize, target: CheckState) -> Option<String> {
    let (pos, found) = detect_near(text, at)?;
    let replacement = glyph_for(found.style, target);
    let mut updated = String::with_capacity(text.len());
    updated.push_str(&text[..pos]);
    updated.push_str(replacement);
    updated.push_str(&text[pos + found.len..]);
    Some(updated)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_at_exact_offset() {
        let m = detect_at("pick [ ] one", 5).unwrap();
        assert_eq!(m.style, CheckboxStyle::Bracket);
        assert_eq!(m.state, CheckState::Unchecked);
        assert_eq!(m.len, 3);
    }

    #[test]
    fn test_longest_spelling_wins() {
        // "[ ]" must match as three bytes, not fail on the "[]" spelling.
        let m = detect_at("[ ]", 0).unwrap();
        assert_eq!(m.len, 3);
        let m = detect_at("[]", 0).unwrap();
        assert_eq!(m.len, 2);
    }

    #[test]
    fn test_check_bracket() {
        assert_eq!(set_state("[ ] Male", 0, CheckState::Checked).unwrap(), "[X] Male");
    }

    #[test]
    fn test_uncheck_bracket() {
        assert_eq!(set_state("[x] Male", 0, CheckState::Unchecked).unwrap(), "[ ] Male");
    }

    #[test]
    fn test_unicode_families_round_trip() {
        assert_eq!(set_state("☐ yes", 0, CheckState::Checked).unwrap(), "☑ yes");
        assert_eq!(set_state("□ yes", 0, CheckState::Checked).unwrap(), "■ yes");
        assert_eq!(set_state("○ yes", 0, CheckState::Checked).unwrap(), "● yes");
        assert_eq!(set_state("●", 0, CheckState::Unchecked).unwrap(), "○");
    }

    #[test]
    fn test_already_checked_stays_checked() {
        assert_eq!(set_state("(X)", 0, CheckState::Checked).unwrap(), "(X)");
    }

    #[test]
    fn test_nearby_window_recovers_offset_drift() {
        // Glyph actually starts two bytes after the recorded offset.
        assert_eq!(set_state("ab[ ] opt", 0, CheckState::Checked).unwrap(), "ab[X] opt");
        // And two bytes before.
        assert_eq!(set_state("[ ] opt", 2, CheckState::Checked).unwrap(), "[X] opt");
    }

    #[test]
    fn test_no_glyph_in_window_gives_none() {
        assert!(set_state("plain text", 0, CheckState::Checked).is_none());
    }
}
