//! Fixture builders and a scripted oracle for integration tests.

use docx_rs::{Docx, Paragraph, Run};
use formfill::error::FormFillResult;
use formfill::{FontResolver, OracleClient, TextGenerator};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object};
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

/// Oracle backend replaying canned responses in order; the last response
/// repeats once the script runs out.
pub struct ScriptedOracle {
    responses: Mutex<Vec<String>>,
}

impl ScriptedOracle {
    pub fn client(responses: &[&str]) -> OracleClient {
        let backend = Self {
            responses: Mutex::new(responses.iter().rev().map(|s| s.to_string()).collect()),
        };
        OracleClient::new(Box::new(backend)).with_min_interval(Duration::from_millis(0))
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

/// A font resolver that never touches the network.
pub fn offline_fonts(dir: &Path) -> FontResolver {
    FontResolver::offline(dir.join("fonts"))
}

/// Writes a DOCX whose body is one paragraph per line.
pub fn build_docx(path: &PathBuf, lines: &[&str]) {
    let mut docx = Docx::new();
    for line in lines {
        docx = docx.add_paragraph(Paragraph::new().add_run(Run::new().add_text(*line)));
    }
    let file = File::create(path).expect("create docx fixture");
    docx.build().pack(file).expect("write docx fixture");
}

/// Writes a single-page flat PDF with one text run per line, positioned at
/// the given baselines.
pub fn build_flat_pdf(path: &PathBuf, lines: &[(&str, f32, f32)]) {
    let mut doc = Document::with_version("1.5");

    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });

    let mut operations = vec![
        Operation::new("BT", vec![]),
        Operation::new(
            "Tf",
            vec![Object::Name(b"F1".to_vec()), Object::Real(12.0)],
        ),
    ];
    for (text, x, y) in lines {
        operations.push(Operation::new(
            "Tm",
            vec![
                Object::Real(1.0),
                Object::Real(0.0),
                Object::Real(0.0),
                Object::Real(1.0),
                Object::Real((*x).into()),
                Object::Real((*y).into()),
            ],
        ));
        operations.push(Operation::new("Tj", vec![Object::string_literal(*text)]));
    }
    operations.push(Operation::new("ET", vec![]));

    let content = Content { operations };
    let content_id = doc.add_object(Object::Stream(lopdf::Stream::new(
        dictionary! {},
        content.encode().expect("encode fixture content"),
    )));

    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "MediaBox" => Object::Array(vec![
            Object::Integer(0),
            Object::Integer(0),
            Object::Integer(612),
            Object::Integer(792),
        ]),
        "Contents" => Object::Reference(content_id),
        "Resources" => Object::Dictionary(dictionary! {
            "Font" => Object::Dictionary(dictionary! {
                "F1" => Object::Reference(font_id),
            }),
        }),
    });

    let pages_id = doc.add_object(dictionary! {
        "Type" => "Pages",
        "Count" => Object::Integer(1),
        "Kids" => Object::Array(vec![Object::Reference(page_id)]),
    });
    // Kids entries need their Parent back-reference.
    if let Ok(page) = doc.get_object_mut(page_id).and_then(Object::as_dict_mut) {
        page.set("Parent", Object::Reference(pages_id));
    }

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => Object::Reference(pages_id),
    });
    doc.trailer.set("Root", Object::Reference(catalog_id));

    doc.save(path).expect("write pdf fixture");
}

/// Writes a PDF carrying an AcroForm with one text field per name, plus an
/// empty page so the document stays loadable.
pub fn build_acroform_pdf(path: &PathBuf, field_names: &[&str]) {
    let mut doc = Document::with_version("1.5");

    let mut field_refs = Vec::new();
    for name in field_names {
        let id = doc.add_object(dictionary! {
            "FT" => "Tx",
            "T" => Object::string_literal(*name),
        });
        field_refs.push(Object::Reference(id));
    }
    let acroform_id = doc.add_object(dictionary! {
        "Fields" => Object::Array(field_refs),
    });

    let content_id = doc.add_object(Object::Stream(lopdf::Stream::new(
        dictionary! {},
        Vec::new(),
    )));
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "MediaBox" => Object::Array(vec![
            Object::Integer(0),
            Object::Integer(0),
            Object::Integer(612),
            Object::Integer(792),
        ]),
        "Contents" => Object::Reference(content_id),
    });
    let pages_id = doc.add_object(dictionary! {
        "Type" => "Pages",
        "Count" => Object::Integer(1),
        "Kids" => Object::Array(vec![Object::Reference(page_id)]),
    });
    if let Ok(page) = doc.get_object_mut(page_id).and_then(Object::as_dict_mut) {
        page.set("Parent", Object::Reference(pages_id));
    }
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => Object::Reference(pages_id),
        "AcroForm" => Object::Reference(acroform_id),
    });
    doc.trailer.set("Root", Object::Reference(catalog_id));

    doc.save(path).expect("write acroform fixture");
}

/// Writes a realistic multi-line PDF through printpdf (exercises the
/// plain-text extraction path rather than the span extractor).
pub fn build_printpdf(path: &PathBuf, text: &str) {
    use printpdf::{BuiltinFont, Mm, PdfDocument};
    use std::io::BufWriter;

    let (doc, page1, layer1) = PdfDocument::new("Fixture", Mm(210.0), Mm(297.0), "Layer 1");
    let layer = doc.get_page(page1).get_layer(layer1);
    let font = doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .expect("builtin font");
    layer.use_text(text, 12.0, Mm(20.0), Mm(270.0), &font);
    doc.save(&mut BufWriter::new(File::create(path).expect("create pdf")))
        .expect("write printpdf fixture");
}

/// Writes a profile folder with a context_data.json holding the pairs.
pub fn build_profile(dir: &Path, pairs: &[(&str, &str)]) {
    let map: std::collections::BTreeMap<&str, &str> = pairs.iter().copied().collect();
    std::fs::write(
        dir.join("context_data.json"),
        serde_json::to_string_pretty(&map).unwrap(),
    )
    .expect("write profile fixture");
}
