//! Flat-PDF mutation: positioned line extraction, redaction, and baseline
//! overlay.
//!
//! Lines are rebuilt per page by interpreting the content stream's text
//! operators with text-matrix tracking. Applying entries rewrites each
//! affected page in three steps: text-show operators on affected baselines
//! are removed, white rectangles are painted over the original line boxes,
//! and the replacement text is drawn at the original span baselines. All
//! redaction rectangles for a page are emitted before any new text.
//!
//! Span widths are approximated from the glyph count; exact metrics would
//! require parsing the embedded font programs. The CTM is not tracked, so
//! rotated or scaled page content is out of scope for overlay.

use super::{locate_window, sanitize_for_pdf};
use crate::detect::FillEntry;
use crate::error::{FormFillError, FormFillResult};
use crate::fonts::{strip_subset_prefix, FontResolver, ResolvedFont};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;

/// Baseline tolerance when grouping spans into lines, in points.
const LINE_TOLERANCE: f32 = 2.0;

/// Average glyph width as a fraction of the font size.
const GLYPH_WIDTH_FACTOR: f32 = 0.5;

/// One positioned run of text.
#[derive(Debug, Clone)]
pub struct PdfSpan {
    pub text: String,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub font_size: f32,
    pub font_name: String,
}

/// One baseline-grouped line of text spans.
#[derive(Debug, Clone)]
pub struct PdfLine {
    pub text: String,
    pub spans: Vec<PdfSpan>,
}

impl PdfLine {
    /// Baseline of the line.
    pub fn baseline(&self) -> f32 {
        self.spans.first().map(|s| s.y).unwrap_or(0.0)
    }

    /// Largest font size on the line.
    pub fn font_size(&self) -> f32 {
        self.spans
            .iter()
            .map(|s| s.font_size)
            .fold(0.0f32, f32::max)
    }

    /// Bounding box `(x0, y0, x1, y1)` around the line's spans.
    pub fn bbox(&self) -> (f32, f32, f32, f32) {
        let x0 = self.spans.iter().map(|s| s.x).fold(f32::MAX, f32::min);
        let x1 = self
            .spans
            .iter()
            .map(|s| s.x + s.width)
            .fold(f32::MIN, f32::max);
        let size = self.font_size();
        let y = self.baseline();
        (x0, y - 0.25 * size, x1, y + size)
    }
}

/// A loaded PDF form.
pub struct PdfForm {
    doc: Document,
}

impl PdfForm {
    /// Loads a PDF file.
    pub fn load(path: &Path) -> FormFillResult<Self> {
        let doc = Document::load(path).map_err(|e| FormFillError::PdfProcessing {
            message: format!("failed to open {}: {}", path.display(), e),
            page: None,
        })?;
        Ok(Self { doc })
    }

    /// Wraps an already-parsed document.
    pub fn from_document(doc: Document) -> Self {
        Self { doc }
    }

    /// Access to the underlying document (AcroForm injection).
    pub fn document_mut(&mut self) -> &mut Document {
        &mut self.doc
    }

    /// Positioned lines per page, in page order.
    pub fn page_lines(&self) -> FormFillResult<Vec<Vec<PdfLine>>> {
        let mut pages = Vec::new();
        for (page_no, page_id) in self.doc.get_pages() {
            let spans = extract_page_spans(&self.doc, page_id, page_no as usize)?;
            pages.push(group_spans(spans));
        }
        Ok(pages)
    }

    /// The flattened line list over all pages.
    pub fn flattened_lines(&self) -> FormFillResult<Vec<String>> {
        Ok(self
            .page_lines()?
            .into_iter()
            .flatten()
            .map(|l| l.text)
            .collect())
    }

    /// Applies resolved fill entries onto the document.
    ///
    /// Each entry mutates at most one window (the first page position that
    /// matches); entries whose window is found nowhere are skipped
    /// silently.
    pub fn apply_fill_entries(
        &mut self,
        entries: &[FillEntry],
        fonts: &mut FontResolver,
    ) -> FormFillResult<()> {
        let pages: Vec<(u32, ObjectId)> = self.doc.get_pages().into_iter().collect();
        let page_lines = self.page_lines()?;
        let mut offsets = Vec::with_capacity(page_lines.len());
        let mut total = 0usize;
        for lines in &page_lines {
            offsets.push(total);
            total += lines.len();
        }

        let mut applied: HashSet<usize> = HashSet::new();
        for (page_idx, (page_no, page_id)) in pages.iter().enumerate() {
            let lines = &page_lines[page_idx];
            let texts: Vec<String> = lines.iter().map(|l| l.text.clone()).collect();

            // Replacement text per affected line index on this page.
            let mut modified: BTreeMap<usize, String> = BTreeMap::new();
            for (entry_idx, entry) in entries.iter().enumerate() {
                if entry.resolved_lines.is_empty() || applied.contains(&entry_idx) {
                    continue;
                }
                let hint = entry
                    .start_line
                    .checked_sub(offsets[page_idx])
                    .unwrap_or(usize::MAX);
                let start = match locate_window(&texts, &entry.lines, hint) {
                    Some(i) => i,
                    None => continue,
                };
                applied.insert(entry_idx);
                for (j, resolved) in entry.resolved_lines.iter().enumerate() {
                    modified.insert(start + j, resolved.clone());
                }
            }

            if modified.is_empty() {
                continue;
            }
            self.overlay_page(*page_id, *page_no as usize, lines, &modified, fonts)?;
        }
        Ok(())
    }

    /// Rewrites one page: removes the affected text, paints the redaction
    /// rectangles, then draws the replacement lines.
    fn overlay_page(
        &mut self,
        page_id: ObjectId,
        page_no: usize,
        lines: &[PdfLine],
        modified: &BTreeMap<usize, String>,
        fonts: &mut FontResolver,
    ) -> FormFillResult<()> {
        let data = self
            .doc
            .get_page_content(page_id)
            .map_err(|e| FormFillError::PdfProcessing {
                message: format!("failed to read page content: {}", e),
                page: Some(page_no),
            })?;
        let content = Content::decode(&data).map_err(|e| FormFillError::PdfProcessing {
            message: format!("failed to decode page content: {}", e),
            page: Some(page_no),
        })?;

        let baselines: Vec<f32> = modified.keys().map(|&i| lines[i].baseline()).collect();
        let mut operations = strip_text_on_baselines(&content, &baselines);

        // Redaction pass: every affected line box goes white before any
        // replacement text is drawn.
        for &idx in modified.keys() {
            let (x0, y0, x1, y1) = lines[idx].bbox();
            operations.push(Operation::new("q", vec![]));
            operations.push(Operation::new(
                "rg",
                vec![Object::Real(1.0), Object::Real(1.0), Object::Real(1.0)],
            ));
            operations.push(Operation::new(
                "re",
                vec![
                    Object::Real((x0 - 1.0).into()),
                    Object::Real(y0.into()),
                    Object::Real((x1 - x0 + 2.0).into()),
                    Object::Real((y1 - y0).into()),
                ],
            ));
            operations.push(Operation::new("f", vec![]));
            operations.push(Operation::new("Q", vec![]));
        }

        // Overlay pass: draw each replacement at its original baseline.
        let mut page_fonts: HashMap<String, String> = HashMap::new();
        for (&idx, replacement) in modified {
            let line = &lines[idx];
            let span0 = match line.spans.first() {
                Some(s) => s,
                None => continue,
            };
            let resolved = fonts.resolve(&span0.font_name);
            let res_name =
                self.ensure_page_font(page_id, page_no, &resolved, &mut page_fonts)?;
            let text = sanitize_for_pdf(replacement);

            operations.push(Operation::new("BT", vec![]));
            operations.push(Operation::new(
                "Tf",
                vec![
                    Object::Name(res_name.clone().into_bytes()),
                    Object::Real(span0.font_size.into()),
                ],
            ));
            operations.push(Operation::new(
                "rg",
                vec![Object::Real(0.0), Object::Real(0.0), Object::Real(0.0)],
            ));
            operations.push(Operation::new(
                "Tm",
                vec![
                    Object::Real(1.0),
                    Object::Real(0.0),
                    Object::Real(0.0),
                    Object::Real(1.0),
                    Object::Real(span0.x.into()),
                    Object::Real(span0.y.into()),
                ],
            ));
            operations.push(Operation::new("Tj", vec![Object::string_literal(text)]));
            operations.push(Operation::new("ET", vec![]));
        }

        let encoded = Content { operations }
            .encode()
            .map_err(|e| FormFillError::PdfProcessing {
                message: format!("failed to encode page content: {}", e),
                page: Some(page_no),
            })?;
        self.doc
            .change_page_content(page_id, encoded)
            .map_err(|e| FormFillError::PdfProcessing {
                message: format!("failed to replace page content: {}", e),
                page: Some(page_no),
            })
    }

    /// Registers a font resource on the page for the resolved face,
    /// memoized per page, and returns its resource name.
    fn ensure_page_font(
        &mut self,
        page_id: ObjectId,
        page_no: usize,
        resolved: &ResolvedFont,
        page_fonts: &mut HashMap<String, String>,
    ) -> FormFillResult<String> {
        let choice = select_font_object(resolved);
        let cache_key = choice.cache_key();
        if let Some(existing) = page_fonts.get(&cache_key) {
            return Ok(existing.clone());
        }

        let font_dict = choice.build(&mut self.doc);
        let font_id = self.doc.add_object(font_dict);
        let res_name = format!("FF{}", page_fonts.len());
        add_font_resource(&mut self.doc, page_id, &res_name, font_id).map_err(|e| {
            FormFillError::PdfProcessing {
                message: format!("failed to register font resource: {}", e),
                page: Some(page_no),
            }
        })?;
        page_fonts.insert(cache_key, res_name.clone());
        Ok(res_name)
    }

    /// Writes the document to `path`.
    pub fn save(&mut self, path: &Path) -> FormFillResult<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| FormFillError::io(parent, e))?;
            }
        }
        self.doc
            .save(path)
            .map_err(|e| FormFillError::PdfProcessing {
                message: format!("failed to save {}: {}", path.display(), e),
                page: None,
            })?;
        Ok(())
    }
}

/// The font actually written into the page resources, in fallback order:
/// an embedded font program, a named (viewer-substituted) family, the
/// generic sans-serif, or the engine default.
enum FontObjectChoice {
    Embedded { family: String, data: Vec<u8> },
    Named(String),
    SansSerif,
    Builtin,
}

impl FontObjectChoice {
    fn cache_key(&self) -> String {
        match self {
            Self::Embedded { family, .. } => format!("emb:{}", family),
            Self::Named(name) => format!("named:{}", name),
            Self::SansSerif => "sans".to_string(),
            Self::Builtin => "builtin".to_string(),
        }
    }

    fn build(&self, doc: &mut Document) -> Dictionary {
        match self {
            Self::Embedded { family, data } => {
                let file_id = doc.add_object(Object::Stream(Stream::new(
                    dictionary! { "Length1" => Object::Integer(data.len() as i64) },
                    data.clone(),
                )));
                let base = pdf_base_name(family);
                let descriptor = doc.add_object(dictionary! {
                    "Type" => "FontDescriptor",
                    "FontName" => Object::Name(base.clone().into_bytes()),
                    "Flags" => Object::Integer(32),
                    "FontBBox" => Object::Array(vec![
                        Object::Integer(0),
                        Object::Integer(-200),
                        Object::Integer(1000),
                        Object::Integer(900),
                    ]),
                    "ItalicAngle" => Object::Integer(0),
                    "Ascent" => Object::Integer(800),
                    "Descent" => Object::Integer(-200),
                    "CapHeight" => Object::Integer(700),
                    "StemV" => Object::Integer(80),
                    "FontFile2" => Object::Reference(file_id),
                });
                truetype_dict(&base, Some(descriptor))
            }
            Self::Named(name) => {
                let base = pdf_base_name(name);
                truetype_dict(&base, None)
            }
            Self::SansSerif => dictionary! {
                "Type" => "Font",
                "Subtype" => "Type1",
                "BaseFont" => "Arial",
            },
            Self::Builtin => dictionary! {
                "Type" => "Font",
                "Subtype" => "Type1",
                "BaseFont" => "Helvetica",
            },
        }
    }
}

/// Walks the fallback chain for a resolved font. The first usable step
/// wins; only the transition into the engine default for a font that *was*
/// requested is worth an error-level log, and even then text is drawn.
fn select_font_object(resolved: &ResolvedFont) -> FontObjectChoice {
    if let Some(path) = &resolved.file {
        let is_ttf = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.eq_ignore_ascii_case("ttf"))
            .unwrap_or(false);
        if is_ttf {
            match std::fs::read(path) {
                Ok(data) if !data.is_empty() => {
                    return FontObjectChoice::Embedded {
                        family: resolved.name.clone(),
                        data,
                    };
                }
                Ok(_) => log::debug!("font file {} is empty", path.display()),
                Err(e) => log::debug!("cannot read font file {}: {}", path.display(), e),
            }
        } else {
            log::debug!(
                "font file {} is not embeddable, falling back to the family name",
                path.display()
            );
        }
    }
    if !resolved.name.is_empty() {
        return FontObjectChoice::Named(resolved.name.clone());
    }
    if !resolved.builtin {
        log::error!("font fallbacks exhausted, drawing with the engine default");
        return FontObjectChoice::SansSerif;
    }
    FontObjectChoice::Builtin
}

fn truetype_dict(base: &str, descriptor: Option<ObjectId>) -> Dictionary {
    let mut dict = dictionary! {
        "Type" => "Font",
        "Subtype" => "TrueType",
        "BaseFont" => Object::Name(base.as_bytes().to_vec()),
        "Encoding" => "WinAnsiEncoding",
        "FirstChar" => Object::Integer(32),
        "LastChar" => Object::Integer(255),
        "Widths" => Object::Array(vec![Object::Integer(500); 224]),
    };
    if let Some(id) = descriptor {
        dict.set("FontDescriptor", Object::Reference(id));
    }
    dict
}

/// PDF name objects take no whitespace; collapse the family name.
fn pdf_base_name(family: &str) -> String {
    family.split_whitespace().collect::<Vec<_>>().join("")
}

/// Inserts `font_id` under the page's `Resources/Font` dictionary.
///
/// Inherited or referenced resources are resolved to an owned copy and
/// written back inline on the page, so the new font lands next to the
/// fonts the page already uses.
fn add_font_resource(
    doc: &mut Document,
    page_id: ObjectId,
    res_name: &str,
    font_id: ObjectId,
) -> FormFillResult<()> {
    let mut resources: Dictionary = {
        let (inline, resource_ids) = doc.get_page_resources(page_id);
        if let Some(dict) = inline {
            dict.clone()
        } else if let Some(&id) = resource_ids.first() {
            doc.get_object(id)?.as_dict()?.clone()
        } else {
            Dictionary::new()
        }
    };

    let mut font_dict: Dictionary = match resources.get(b"Font") {
        Ok(Object::Dictionary(d)) => d.clone(),
        Ok(Object::Reference(id)) => doc.get_object(*id)?.as_dict()?.clone(),
        _ => Dictionary::new(),
    };
    font_dict.set(res_name, Object::Reference(font_id));
    resources.set("Font", Object::Dictionary(font_dict));

    let page = doc.get_object_mut(page_id)?.as_dict_mut()?;
    page.set("Resources", Object::Dictionary(resources));
    Ok(())
}

// --- content-stream interpretation ---------------------------------------

#[derive(Clone, Copy)]
struct Matrix {
    a: f32,
    b: f32,
    c: f32,
    d: f32,
    e: f32,
    f: f32,
}

impl Matrix {
    fn identity() -> Self {
        Self {
            a: 1.0,
            b: 0.0,
            c: 0.0,
            d: 1.0,
            e: 0.0,
            f: 0.0,
        }
    }

    fn translate(tx: f32, ty: f32) -> Self {
        Self {
            e: tx,
            f: ty,
            ..Self::identity()
        }
    }

    fn multiply(self, m: Matrix) -> Matrix {
        Matrix {
            a: m.a * self.a + m.b * self.c,
            b: m.a * self.b + m.b * self.d,
            c: m.c * self.a + m.d * self.c,
            d: m.c * self.b + m.d * self.d,
            e: m.e * self.a + m.f * self.c + self.e,
            f: m.e * self.b + m.f * self.d + self.f,
        }
    }

    fn origin(&self) -> (f32, f32) {
        (self.e, self.f)
    }
}

fn num(obj: &Object) -> f32 {
    match obj {
        Object::Integer(i) => *i as f32,
        Object::Real(r) => *r as f32,
        _ => 0.0,
    }
}

/// Latin-1 view of a PDF string; good enough for the simple fonts found in
/// fillable forms.
fn decode_pdf_string(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| b as char).collect()
}

/// One text emission from a content stream.
struct TextShow {
    op_index: usize,
    x: f32,
    y: f32,
    size: f32,
    font_res: String,
    text: String,
}

/// Walks the text operators, emitting every shown string with its pen
/// position. Shared by extraction and the redaction rewriter.
fn scan_text_ops(content: &Content, mut emit: impl FnMut(TextShow)) {
    let mut tm = Matrix::identity();
    let mut lm = Matrix::identity();
    let mut leading = 0.0f32;
    let mut size = 0.0f32;
    let mut font_res = String::new();

    for (op_index, op) in content.operations.iter().enumerate() {
        let operands = &op.operands;
        match op.operator.as_str() {
            "BT" => {
                tm = Matrix::identity();
                lm = Matrix::identity();
            }
            "Tf" => {
                if let Some(Object::Name(name)) = operands.first() {
                    font_res = String::from_utf8_lossy(name).into_owned();
                }
                if let Some(obj) = operands.get(1) {
                    size = num(obj);
                }
            }
            "Tm" => {
                if operands.len() == 6 {
                    tm = Matrix {
                        a: num(&operands[0]),
                        b: num(&operands[1]),
                        c: num(&operands[2]),
                        d: num(&operands[3]),
                        e: num(&operands[4]),
                        f: num(&operands[5]),
                    };
                    lm = tm;
                }
            }
            "Td" => {
                if operands.len() == 2 {
                    lm = lm.multiply(Matrix::translate(num(&operands[0]), num(&operands[1])));
                    tm = lm;
                }
            }
            "TD" => {
                if operands.len() == 2 {
                    leading = -num(&operands[1]);
                    lm = lm.multiply(Matrix::translate(num(&operands[0]), num(&operands[1])));
                    tm = lm;
                }
            }
            "TL" => {
                if let Some(obj) = operands.first() {
                    leading = num(obj);
                }
            }
            "T*" => {
                lm = lm.multiply(Matrix::translate(0.0, -leading));
                tm = lm;
            }
            "Tj" => {
                if let Some(Object::String(bytes, _)) = operands.first() {
                    let text = decode_pdf_string(bytes);
                    let (x, y) = tm.origin();
                    let advance = text.chars().count() as f32 * GLYPH_WIDTH_FACTOR * size;
                    emit(TextShow {
                        op_index,
                        x,
                        y,
                        size,
                        font_res: font_res.clone(),
                        text,
                    });
                    tm = tm.multiply(Matrix::translate(advance, 0.0));
                }
            }
            "'" | "\"" => {
                lm = lm.multiply(Matrix::translate(0.0, -leading));
                tm = lm;
                let string_operand = if op.operator == "'" {
                    operands.first()
                } else {
                    operands.get(2)
                };
                if let Some(Object::String(bytes, _)) = string_operand {
                    let text = decode_pdf_string(bytes);
                    let (x, y) = tm.origin();
                    let advance = text.chars().count() as f32 * GLYPH_WIDTH_FACTOR * size;
                    emit(TextShow {
                        op_index,
                        x,
                        y,
                        size,
                        font_res: font_res.clone(),
                        text,
                    });
                    tm = tm.multiply(Matrix::translate(advance, 0.0));
                }
            }
            "TJ" => {
                if let Some(Object::Array(items)) = operands.first() {
                    for item in items {
                        match item {
                            Object::String(bytes, _) => {
                                let text = decode_pdf_string(bytes);
                                let (x, y) = tm.origin();
                                let advance =
                                    text.chars().count() as f32 * GLYPH_WIDTH_FACTOR * size;
                                emit(TextShow {
                                    op_index,
                                    x,
                                    y,
                                    size,
                                    font_res: font_res.clone(),
                                    text,
                                });
                                tm = tm.multiply(Matrix::translate(advance, 0.0));
                            }
                            Object::Integer(_) | Object::Real(_) => {
                                let adjust = -num(item) / 1000.0 * size;
                                tm = tm.multiply(Matrix::translate(adjust, 0.0));
                            }
                            _ => {}
                        }
                    }
                }
            }
            _ => {}
        }
    }
}

/// Maps a page's font resource names to cleaned base-font family names.
fn page_font_names(doc: &Document, page_id: ObjectId) -> HashMap<String, String> {
    let mut names = HashMap::new();
    let (resources, resource_ids) = doc.get_page_resources(page_id);

    let mut dicts: Vec<&Dictionary> = Vec::new();
    if let Some(dict) = resources {
        dicts.push(dict);
    }
    for id in resource_ids {
        if let Ok(dict) = doc.get_object(id).and_then(Object::as_dict) {
            dicts.push(dict);
        }
    }

    for dict in dicts {
        let fonts = match dict.get(b"Font") {
            Ok(Object::Dictionary(d)) => d.clone(),
            Ok(Object::Reference(id)) => match doc.get_object(*id).and_then(Object::as_dict) {
                Ok(d) => d.clone(),
                Err(_) => continue,
            },
            _ => continue,
        };
        for (res_name, font_obj) in fonts.iter() {
            let font_dict = match font_obj {
                Object::Reference(id) => match doc.get_object(*id).and_then(Object::as_dict) {
                    Ok(d) => d,
                    Err(_) => continue,
                },
                Object::Dictionary(d) => d,
                _ => continue,
            };
            if let Ok(Object::Name(base)) = font_dict.get(b"BaseFont") {
                let raw = String::from_utf8_lossy(base).into_owned();
                names.insert(
                    String::from_utf8_lossy(res_name).into_owned(),
                    strip_subset_prefix(&raw).to_string(),
                );
            }
        }
    }
    names
}

/// Extracts positioned spans for one page.
fn extract_page_spans(
    doc: &Document,
    page_id: ObjectId,
    page_no: usize,
) -> FormFillResult<Vec<PdfSpan>> {
    let data = doc
        .get_page_content(page_id)
        .map_err(|e| FormFillError::PdfProcessing {
            message: format!("failed to read page content: {}", e),
            page: Some(page_no),
        })?;
    let content = Content::decode(&data).map_err(|e| FormFillError::PdfProcessing {
        message: format!("failed to decode page content: {}", e),
        page: Some(page_no),
    })?;
    let fonts = page_font_names(doc, page_id);

    let mut spans = Vec::new();
    scan_text_ops(&content, |show| {
        let text = show.text.replace(['\n', '\r'], " ");
        if text.trim().is_empty() {
            return;
        }
        let width = text.chars().count() as f32 * GLYPH_WIDTH_FACTOR * show.size;
        spans.push(PdfSpan {
            text,
            x: show.x,
            y: show.y,
            width,
            font_size: show.size,
            font_name: fonts.get(&show.font_res).cloned().unwrap_or_default(),
        });
    });
    Ok(spans)
}

/// Groups spans into baseline lines, top of the page first.
fn group_spans(mut spans: Vec<PdfSpan>) -> Vec<PdfLine> {
    spans.sort_by(|a, b| {
        b.y.partial_cmp(&a.y)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.x.partial_cmp(&b.x).unwrap_or(std::cmp::Ordering::Equal))
    });

    let mut lines: Vec<PdfLine> = Vec::new();
    for span in spans {
        match lines.last_mut() {
            Some(line) if (line.baseline() - span.y).abs() <= LINE_TOLERANCE => {
                line.text.push_str(&span.text);
                line.spans.push(span);
            }
            _ => lines.push(PdfLine {
                text: span.text.clone(),
                spans: vec![span],
            }),
        }
    }
    lines
}

/// Removes text-show operators whose pen position sits on one of the
/// affected baselines. `'` and `"` keep their line advance (they become
/// `T*`) so the layout of the surviving text is unchanged.
fn strip_text_on_baselines(content: &Content, baselines: &[f32]) -> Vec<Operation> {
    let mut drop: HashSet<usize> = HashSet::new();
    scan_text_ops(content, |show| {
        if baselines
            .iter()
            .any(|&b| (b - show.y).abs() <= LINE_TOLERANCE)
        {
            drop.insert(show.op_index);
        }
    });

    let mut out = Vec::with_capacity(content.operations.len());
    for (idx, op) in content.operations.iter().enumerate() {
        if !drop.contains(&idx) {
            out.push(op.clone());
            continue;
        }
        match op.operator.as_str() {
            // Preserve the line advance these operators carry.
            "'" => out.push(Operation::new("T*", vec![])),
            "\"" => {
                if op.operands.len() >= 2 {
                    out.push(Operation::new("Tw", vec![op.operands[0].clone()]));
                    out.push(Operation::new("Tc", vec![op.operands[1].clone()]));
                }
                out.push(Operation::new("T*", vec![]));
            }
            _ => {}
        }
    }
    out
}
