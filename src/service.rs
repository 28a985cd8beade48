//! High-level fill service coordinating the pipeline.
//!
//! One service call runs the whole flow for a document: oracle-driven
//! placeholder detection, entry detection, resolution, and mutation, with
//! the extension deciding between the DOCX and PDF engines.

use crate::context::ContextStore;
use crate::detect::{detect_checkbox_entries, detect_fill_entries, PlaceholderPattern};
use crate::engine::{acroform, DocxForm, PdfForm};
use crate::error::{FormFillError, FormFillResult};
use crate::fonts::FontResolver;
use crate::oracle::{parse, prompts, OracleClient};
use crate::resolve::{resolve_checkbox_entries, resolve_fill_entries};
use std::path::{Path, PathBuf};

/// Attempts for the placeholder-detection prompt before falling back to
/// the default underscore pattern.
const MAX_DETECTION_TRIES: usize = 3;

/// Coordinates detection, resolution, and mutation for one document at a
/// time.
pub struct FillService {
    oracle: OracleClient,
    fonts: FontResolver,
}

impl FillService {
    /// Creates a service around an oracle client, with the default font
    /// resolver.
    pub fn new(oracle: OracleClient) -> Self {
        Self {
            oracle,
            fonts: FontResolver::new(),
        }
    }

    /// Swaps in a custom font resolver (tests run offline).
    pub fn with_font_resolver(mut self, fonts: FontResolver) -> Self {
        self.fonts = fonts;
        self
    }

    /// Fills a form against the profile folder and writes the result.
    ///
    /// Returns the output path (defaulting to `<stem>_filled.<ext>` next
    /// to the input). The filled document is always produced; unresolved
    /// fields stay blank.
    pub fn fill_form(
        &mut self,
        form_path: &Path,
        profile_dir: &Path,
        output: Option<&Path>,
    ) -> FormFillResult<PathBuf> {
        let ext = extension_of(form_path)?;
        let mut store = ContextStore::load(profile_dir)?;
        // Persist the refreshed date fields before the run starts.
        store.save()?;
        let keys = store.keys();

        let out = match output {
            Some(p) => p.to_path_buf(),
            None => default_output(form_path, &ext),
        };

        match ext.as_str() {
            "docx" => {
                let mut form = DocxForm::load(form_path)?;
                let lines = form.lines();
                let pattern = self.detect_placeholders(&lines.join("\n"))?;
                let mut fills = detect_fill_entries(&lines, &pattern);
                let mut checkboxes = detect_checkbox_entries(&lines);
                log::info!(
                    "detected {} fill entries and {} checkbox groups",
                    fills.len(),
                    checkboxes.len()
                );

                resolve_fill_entries(&mut fills, &self.oracle, &mut store, &keys, &pattern)?;
                resolve_checkbox_entries(&mut checkboxes, &self.oracle, &mut store, &keys)?;

                form.apply(&fills, &checkboxes, &mut self.fonts);
                form.save(&out)?;
            }
            "pdf" => {
                let mut form = PdfForm::load(form_path)?;
                let lines = form.flattened_lines()?;
                let pattern = self.detect_placeholders(&lines.join("\n"))?;

                // Interactive path first; any failure falls back to the
                // flat overlay for the whole document.
                match acroform::fill_form_fields(form.document_mut(), store.entries()) {
                    Ok(filled) => {
                        log::info!("filled {} interactive form fields", filled);
                        form.save(&out)?;
                        return Ok(out);
                    }
                    Err(e) => {
                        log::info!("no interactive fill ({}), using flat overlay", e);
                    }
                }

                let mut fills = detect_fill_entries(&lines, &pattern);
                log::info!("detected {} fill entries", fills.len());
                // Checkbox groups are not supported on the PDF mutation
                // path; they are left untouched.

                resolve_fill_entries(&mut fills, &self.oracle, &mut store, &keys, &pattern)?;
                form.apply_fill_entries(&fills, &mut self.fonts)?;
                form.save(&out)?;
            }
            other => {
                return Err(FormFillError::InvalidInput {
                    parameter: "form".to_string(),
                    reason: format!("unsupported form format: .{}", other),
                })
            }
        }

        Ok(out)
    }

    /// Asks the oracle for the literal placeholder strings in the form
    /// text and compiles them into a pattern.
    ///
    /// Protocol failures degrade to the default underscore pattern after
    /// the retry budget; transport failures on this first, mandatory call
    /// propagate.
    pub fn detect_placeholders(&self, form_text: &str) -> FormFillResult<PlaceholderPattern> {
        let prompt = prompts::placeholder_detection(form_text);
        for attempt in 0..MAX_DETECTION_TRIES {
            let response = self.oracle.generate(&prompt)?;
            match parse::parse_string_list(&response) {
                Ok(literals) => {
                    log::info!("detected {} placeholder literals", literals.len());
                    return PlaceholderPattern::from_literals(&literals);
                }
                Err(e) => {
                    log::warn!(
                        "attempt {}/{} failed to parse placeholder literals: {}",
                        attempt + 1,
                        MAX_DETECTION_TRIES,
                        e
                    );
                }
            }
        }
        log::warn!("placeholder detection failed, using the default underscore pattern");
        Ok(PlaceholderPattern::default_underscores())
    }

    /// Extracts a document's text for inspection or pattern detection.
    pub fn extract_text(&self, path: &Path) -> FormFillResult<String> {
        extract_document_text(path)
    }
}

/// Extracts a document's text without needing an oracle: the DOCX
/// paragraph tree, or plain PDF text extraction.
pub fn extract_document_text(path: &Path) -> FormFillResult<String> {
    match extension_of(path)?.as_str() {
        "docx" => Ok(DocxForm::load(path)?.lines().join("\n")),
        "pdf" => {
            let bytes = std::fs::read(path).map_err(|e| FormFillError::io(path, e))?;
            pdf_extract::extract_text_from_mem(&bytes).map_err(|e| {
                FormFillError::PdfProcessing {
                    message: format!("text extraction failed: {}", e),
                    page: None,
                }
            })
        }
        other => Err(FormFillError::InvalidInput {
            parameter: "form".to_string(),
            reason: format!("unsupported form format: .{}", other),
        }),
    }
}

fn extension_of(path: &Path) -> FormFillResult<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .ok_or_else(|| FormFillError::InvalidInput {
            parameter: "form".to_string(),
            reason: format!("cannot determine format of {}", path.display()),
        })
}

fn default_output(form_path: &Path, ext: &str) -> PathBuf {
    let stem = form_path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("form");
    form_path.with_file_name(format!("{}_filled.{}", stem, ext))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_output_naming() {
        let out = default_output(Path::new("/tmp/visa.pdf"), "pdf");
        assert_eq!(out, PathBuf::from("/tmp/visa_filled.pdf"));
    }

    #[test]
    fn test_extension_detection() {
        assert_eq!(extension_of(Path::new("a/b.DOCX")).unwrap(), "docx");
        assert!(extension_of(Path::new("noext")).is_err());
    }
}
