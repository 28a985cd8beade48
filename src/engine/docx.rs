//! DOCX mutation: paragraph text replacement with font restoration and
//! in-place checkbox glyph updates.
//!
//! The flattened line list is the body paragraphs in order followed by the
//! table-cell paragraphs, matching how entries were detected. Each line's
//! binding captures the first run's properties so replacements keep the
//! original face, size, and emphasis.

use super::glyph::{self, CheckState};
use super::locate_window;
use crate::detect::{CheckboxEntry, FillEntry};
use crate::error::{FormFillError, FormFillResult};
use crate::fonts::FontResolver;
use docx_rs::{
    Docx, DocumentChild, Paragraph, ParagraphChild, Run, RunChild, RunFonts, RunProperty, Table,
    TableCellContent, TableChild, TableRowChild,
};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// A loaded DOCX form.
pub struct DocxForm {
    docx: Docx,
}

/// One mutation against a flattened line.
enum ParagraphOp {
    Replace {
        text: String,
        property: Option<RunProperty>,
        font_override: Option<String>,
    },
    Checkbox {
        char_idx: usize,
        state: CheckState,
    },
}

impl DocxForm {
    /// Loads a DOCX file.
    pub fn load(path: &Path) -> FormFillResult<Self> {
        let buf = fs::read(path).map_err(|e| FormFillError::io(path, e))?;
        Self::from_bytes(&buf)
    }

    /// Parses a DOCX from memory.
    pub fn from_bytes(buf: &[u8]) -> FormFillResult<Self> {
        let docx = docx_rs::read_docx(buf).map_err(|e| FormFillError::DocxProcessing {
            message: format!("failed to read document: {:?}", e),
        })?;
        Ok(Self { docx })
    }

    /// The flattened line list: body paragraphs, then table-cell
    /// paragraphs.
    pub fn lines(&self) -> Vec<String> {
        paragraph_texts(&self.docx)
    }

    /// Run properties captured per flattened line (first run that carries
    /// any formatting).
    fn line_properties(&self) -> Vec<Option<RunProperty>> {
        collect_paragraphs(&self.docx)
            .into_iter()
            .map(first_run_property)
            .collect()
    }

    /// Applies resolved fill and checkbox entries in place.
    ///
    /// Entries whose window no longer matches the live line list are
    /// skipped silently; the rest of the document must still be produced.
    pub fn apply(
        &mut self,
        fills: &[FillEntry],
        checkboxes: &[CheckboxEntry],
        fonts: &mut FontResolver,
    ) {
        let lines = self.lines();
        let properties = self.line_properties();
        let mut ops: BTreeMap<usize, Vec<ParagraphOp>> = BTreeMap::new();

        for entry in fills {
            if entry.resolved_lines.is_empty() {
                continue;
            }
            let start = match locate_window(&lines, &entry.lines, entry.start_line) {
                Some(i) => i,
                None => {
                    log::debug!("fill entry window not found, skipping: {:?}", entry.lines.first());
                    continue;
                }
            };
            for (j, resolved) in entry.resolved_lines.iter().enumerate() {
                let property = properties.get(start + j).cloned().flatten();
                let font_override = property.as_ref().and_then(|p| {
                    let name = font_name_of(p)?;
                    let resolved_font = fonts.resolve(&name);
                    if resolved_font.builtin {
                        None
                    } else {
                        Some(resolved_font.name)
                    }
                });
                ops.entry(start + j).or_default().push(ParagraphOp::Replace {
                    text: resolved.clone(),
                    property,
                    font_override,
                });
            }
        }

        for entry in checkboxes {
            let selected = match &entry.selected {
                Some(s) => s,
                None => continue,
            };
            let start = match locate_window(&lines, &entry.lines, entry.start_line) {
                Some(i) => i,
                None => {
                    log::debug!(
                        "checkbox entry window not found, skipping: {:?}",
                        entry.lines.first()
                    );
                    continue;
                }
            };
            for (k, &(rel_line, char_idx)) in entry.positions.iter().enumerate() {
                let state = if selected.contains(&k) {
                    CheckState::Checked
                } else {
                    CheckState::Unchecked
                };
                ops.entry(start + rel_line)
                    .or_default()
                    .push(ParagraphOp::Checkbox { char_idx, state });
            }
        }

        if ops.is_empty() {
            return;
        }
        self.execute(&ops);
    }

    /// Walks paragraphs in flattened order, executing the ops bound to each
    /// index.
    fn execute(&mut self, ops: &BTreeMap<usize, Vec<ParagraphOp>>) {
        let mut index = 0usize;
        for child in self.docx.document.children.iter_mut() {
            if let DocumentChild::Paragraph(p) = child {
                if let Some(para_ops) = ops.get(&index) {
                    run_paragraph_ops(p, para_ops);
                }
                index += 1;
            }
        }
        for child in self.docx.document.children.iter_mut() {
            if let DocumentChild::Table(t) = child {
                for_each_table_paragraph(t, &mut |p| {
                    if let Some(para_ops) = ops.get(&index) {
                        run_paragraph_ops(p, para_ops);
                    }
                    index += 1;
                });
            }
        }
    }

    /// Writes the document to `path`.
    pub fn save(mut self, path: &Path) -> FormFillResult<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| FormFillError::io(parent, e))?;
            }
        }
        let file = fs::File::create(path).map_err(|e| FormFillError::io(path, e))?;
        self.docx
            .build()
            .pack(file)
            .map_err(|e| FormFillError::DocxProcessing {
                message: format!("failed to write document: {}", e),
            })
    }
}

fn run_paragraph_ops(paragraph: &mut Paragraph, ops: &[ParagraphOp]) {
    for op in ops {
        match op {
            ParagraphOp::Replace {
                text,
                property,
                font_override,
            } => set_paragraph_text(paragraph, text, property.as_ref(), font_override.as_deref()),
            ParagraphOp::Checkbox { char_idx, state } => {
                update_checkbox(paragraph, *char_idx, *state)
            }
        }
    }
}

/// Replaces the paragraph's runs with a single run carrying `text`,
/// restoring the captured run properties and, when the resolver produced a
/// usable family, the font name.
fn set_paragraph_text(
    paragraph: &mut Paragraph,
    text: &str,
    property: Option<&RunProperty>,
    font_override: Option<&str>,
) {
    let mut run = Run::new().add_text(text);
    if let Some(prop) = property {
        run.run_property = prop.clone();
    }
    if let Some(name) = font_override {
        run.run_property.fonts = Some(RunFonts::new().ascii(name));
    }
    paragraph.children.clear();
    paragraph.children.push(ParagraphChild::Run(Box::new(run)));
}

/// Flips the checkbox glyph at `char_idx` within the paragraph.
///
/// The run whose text offset range contains the index is located first;
/// the glyph search inside it tolerates a +/- 2 byte drift for offsets that
/// land on a run boundary.
fn update_checkbox(paragraph: &mut Paragraph, char_idx: usize, state: CheckState) {
    let mut position = 0usize;
    for child in paragraph.children.iter_mut() {
        let run = match child {
            ParagraphChild::Run(r) => r,
            _ => continue,
        };
        let text = run_text(run);
        if position <= char_idx && char_idx < position + text.len() {
            let relative = char_idx - position;
            match glyph::set_state(&text, relative, state) {
                Some(updated) => set_run_text(run, &updated),
                None => log::warn!(
                    "no checkbox glyph at offset {} in run '{}'",
                    relative,
                    text
                ),
            }
            return;
        }
        position += text.len();
    }
    log::warn!("no run covers checkbox offset {}", char_idx);
}

fn run_text(run: &Run) -> String {
    run.children
        .iter()
        .filter_map(|child| match child {
            RunChild::Text(t) => Some(t.text.clone()),
            _ => None,
        })
        .collect()
}

fn set_run_text(run: &mut Run, text: &str) {
    run.children.retain(|c| !matches!(c, RunChild::Text(_)));
    run.children.push(RunChild::Text(docx_rs::Text::new(text)));
}

fn paragraph_text(paragraph: &Paragraph) -> String {
    paragraph
        .children
        .iter()
        .filter_map(|child| match child {
            ParagraphChild::Run(run) => Some(run_text(run)),
            _ => None,
        })
        .collect()
}

/// All paragraph texts in flattened order (body, then table cells).
pub fn paragraph_texts(docx: &Docx) -> Vec<String> {
    collect_paragraphs(docx)
        .into_iter()
        .map(paragraph_text)
        .collect()
}

fn collect_paragraphs(docx: &Docx) -> Vec<&Paragraph> {
    let mut paragraphs = Vec::new();
    for child in &docx.document.children {
        if let DocumentChild::Paragraph(p) = child {
            paragraphs.push(p.as_ref());
        }
    }
    for child in &docx.document.children {
        if let DocumentChild::Table(t) = child {
            collect_table_paragraphs(t, &mut paragraphs);
        }
    }
    paragraphs
}

fn collect_table_paragraphs<'a>(table: &'a Table, out: &mut Vec<&'a Paragraph>) {
    for row in &table.rows {
        let TableChild::TableRow(row) = row;
        for cell in &row.cells {
            let TableRowChild::TableCell(cell) = cell;
            for content in &cell.children {
                if let TableCellContent::Paragraph(p) = content {
                    out.push(p);
                }
            }
        }
    }
}

fn for_each_table_paragraph(table: &mut Table, f: &mut impl FnMut(&mut Paragraph)) {
    for row in table.rows.iter_mut() {
        let TableChild::TableRow(row) = row;
        for cell in row.cells.iter_mut() {
            let TableRowChild::TableCell(cell) = cell;
            for content in cell.children.iter_mut() {
                if let TableCellContent::Paragraph(p) = content {
                    f(p);
                }
            }
        }
    }
}

/// First run carrying any explicit properties, cloned as the line's font
/// binding.
fn first_run_property(paragraph: &Paragraph) -> Option<RunProperty> {
    for child in &paragraph.children {
        if let ParagraphChild::Run(run) = child {
            if font_name_of(&run.run_property).is_some()
                || run.run_property != RunProperty::default()
            {
                return Some(run.run_property.clone());
            }
        }
    }
    None
}

/// Reads the ascii font family off a run property.
///
/// docx-rs exposes `RunFonts` only through builders, so the captured name
/// is read back through the serde representation.
fn font_name_of(property: &RunProperty) -> Option<String> {
    let value = serde_json::to_value(property).ok()?;
    value
        .get("fonts")?
        .get("ascii")?
        .as_str()
        .map(|s| s.to_string())
}
