//! Document mutation engine.
//!
//! Re-applies resolved entries onto the structured document: paragraph/run
//! replacement with font restoration for DOCX, redaction plus baseline
//! overlay for flat PDFs, and AcroForm value injection for interactive
//! PDFs. Entries are relocated through the flattened line list; the index
//! recorded at detection is tried first, then a first-match content scan.

pub mod acroform;
pub mod docx;
pub mod glyph;
pub mod pdf;

pub use docx::DocxForm;
pub use pdf::PdfForm;

/// Locates an entry's line window inside the live line list.
///
/// The exact window at `hint` wins when it still matches; otherwise the
/// first matching contiguous window is taken. Matching stops at the first
/// hit so repeated boilerplate is never touched twice.
pub(crate) fn locate_window(lines: &[String], group: &[String], hint: usize) -> Option<usize> {
    let n = group.len();
    if n == 0 || lines.len() < n {
        return None;
    }
    if let Some(end) = hint.checked_add(n) {
        if end <= lines.len() && lines[hint..end] == group[..] {
            return Some(hint);
        }
    }
    (0..=lines.len() - n).find(|&i| lines[i..i + n] == group[..])
}

/// Replaces characters that routinely fail to render in PDF base fonts
/// with ASCII equivalents.
pub fn sanitize_for_pdf(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '\u{201c}' | '\u{201d}' => out.push('"'),
            '\u{2018}' | '\u{2019}' => out.push('\''),
            '\u{2014}' => out.push_str("--"),
            '\u{2013}' => out.push('-'),
            '\u{2026}' => out.push_str("..."),
            '\u{00a0}' => out.push(' '),
            other => out.push(other),
        }
    }
    out
}
