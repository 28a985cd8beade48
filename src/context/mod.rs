//! Context store adapter: the durable field-to-value profile and the lazy
//! document corpus used to mine missing values.
//!
//! The profile lives as a flat JSON object at
//! `<profile_dir>/context_data.json`. It is rewritten after every processed
//! entry so an interrupted run loses at most one entry's extraction.

use crate::error::{FormFillError, FormFillResult};
use crate::oracle::{parse, prompts, OracleClient};
use chrono::Local;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// File name of the durable profile inside the profile folder.
pub const CONTEXT_FILE: &str = "context_data.json";

/// Durable field-to-value mapping plus the lazily built mining corpus.
pub struct ContextStore {
    profile_dir: PathBuf,
    values: BTreeMap<String, String>,
    /// Aggregated text of every supported profile document; built once per
    /// run, on first use.
    corpus: Option<String>,
}

impl ContextStore {
    /// Loads the profile from `profile_dir`, creating an empty mapping when
    /// no file exists yet, and refreshes the current-date fields.
    pub fn load(profile_dir: &Path) -> FormFillResult<Self> {
        let path = profile_dir.join(CONTEXT_FILE);
        let values = if path.exists() {
            let data =
                fs::read_to_string(&path).map_err(|e| FormFillError::io(path.clone(), e))?;
            serde_json::from_str(&data).map_err(|e| FormFillError::InvalidInput {
                parameter: path.display().to_string(),
                reason: format!("invalid context file: {}", e),
            })?
        } else {
            BTreeMap::new()
        };

        let mut store = Self {
            profile_dir: profile_dir.to_path_buf(),
            values,
            corpus: None,
        };
        store.refresh_date_fields();
        Ok(store)
    }

    /// Injects today's date under the standard key spellings so date
    /// placeholders resolve without mining.
    fn refresh_date_fields(&mut self) {
        let today = Local::now();
        let formats = [
            ("current_day", "%d"),
            ("current_month", "%m"),
            ("current_year", "%Y"),
            ("current_date (MM/DD/YYYY)", "%m/%d/%Y"),
            ("current_date (DD/MM/YYYY)", "%d/%m/%Y"),
            ("current_date (MM-DD-YYYY)", "%m-%d-%Y"),
            ("current_date (DD-MM-YYYY)", "%d-%m-%Y"),
            ("current_date (YYYY/MM/DD)", "%Y/%m/%d"),
            ("current_date (YYYY-MM-DD)", "%Y-%m-%d"),
        ];
        for (key, fmt) in formats {
            self.values
                .insert(key.to_string(), today.format(fmt).to_string());
        }
    }

    /// Persists the mapping to disk, pretty-printed.
    pub fn save(&self) -> FormFillResult<()> {
        let path = self.profile_dir.join(CONTEXT_FILE);
        let data = serde_json::to_string_pretty(&self.values).map_err(|e| {
            FormFillError::InvalidInput {
                parameter: CONTEXT_FILE.to_string(),
                reason: e.to_string(),
            }
        })?;
        fs::write(&path, data).map_err(|e| FormFillError::io(path, e))
    }

    /// Non-empty value for `key`, if stored.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values
            .get(key)
            .map(|v| v.as_str())
            .filter(|v| !v.is_empty())
    }

    /// Inserts or replaces a value.
    pub fn set(&mut self, key: &str, value: &str) {
        self.values.insert(key.to_string(), value.to_string());
    }

    /// Removes a key entirely.
    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.values.remove(key)
    }

    /// All known field names, in stable order.
    pub fn keys(&self) -> Vec<String> {
        self.values.keys().cloned().collect()
    }

    /// The full mapping (AcroForm injection works off field names).
    pub fn entries(&self) -> &BTreeMap<String, String> {
        &self.values
    }

    /// The profile folder backing this store.
    pub fn profile_dir(&self) -> &Path {
        &self.profile_dir
    }

    /// Looks up `key`, mining the document corpus through the oracle when
    /// the store has no value.
    ///
    /// A mined non-empty value is written into the mapping and persisted
    /// immediately so later entries in the same run can reuse it. Returns
    /// `None` when neither the store nor the corpus yields a value; a
    /// corpus answer of `null` or an empty string counts as "not found".
    pub fn get_or_mine(&mut self, key: &str, oracle: &OracleClient) -> Option<String> {
        if let Some(value) = self.get(key) {
            return Some(value.to_string());
        }

        let corpus = self.aggregated_corpus();
        if corpus.is_empty() {
            return None;
        }

        let prompt = prompts::context_value_search(key, &corpus);
        let response = match oracle.generate(&prompt) {
            Ok(r) => r,
            Err(e) => {
                log::error!("corpus mining for '{}' failed: {}", key, e);
                return None;
            }
        };

        let value = parse::clean_scalar(&response);
        if parse::is_null_token(&value) {
            log::info!("no value found in corpus for key '{}'", key);
            return None;
        }

        log::info!("mined new context value for '{}' from corpus", key);
        self.set(key, &value);
        if let Err(e) = self.save() {
            log::error!("failed to persist mined value for '{}': {}", key, e);
        }
        Some(value)
    }

    /// The aggregated profile-corpus text, built on first use.
    pub fn aggregated_corpus(&mut self) -> String {
        if self.corpus.is_none() {
            self.corpus = Some(build_corpus(&self.profile_dir));
        }
        self.corpus.clone().unwrap_or_default()
    }
}

/// Collects the text of every supported document under `dir`.
///
/// DOCX files are read through the paragraph tree, PDFs through plain text
/// extraction, `.txt` files verbatim. Files that fail to parse contribute
/// nothing; mining should degrade, not abort.
fn build_corpus(dir: &Path) -> String {
    let mut pieces = Vec::new();
    for path in scan_profile_dir(dir) {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .unwrap_or_default();
        log::info!("extracting text from {}", path.display());
        let text = match ext.as_str() {
            "docx" => extract_docx_text(&path),
            "pdf" => extract_pdf_text(&path),
            "txt" => fs::read_to_string(&path).unwrap_or_default(),
            _ => String::new(),
        };
        if !text.trim().is_empty() {
            pieces.push(text);
        }
    }
    pieces.join("\n")
}

/// Recursively collects supported files from the profile folder.
fn scan_profile_dir(dir: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();
    let mut stack = vec![dir.to_path_buf()];
    while let Some(current) = stack.pop() {
        let entries = match fs::read_dir(&current) {
            Ok(e) => e,
            Err(_) => continue,
        };
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                stack.push(path);
            } else if matches!(
                path.extension().and_then(|e| e.to_str()),
                Some("docx") | Some("pdf") | Some("txt")
            ) {
                files.push(path);
            }
        }
    }
    files.sort();
    files
}

fn extract_docx_text(path: &Path) -> String {
    match fs::read(path) {
        Ok(buf) => match docx_rs::read_docx(&buf) {
            Ok(docx) => crate::engine::docx::paragraph_texts(&docx).join("\n"),
            Err(e) => {
                log::error!("failed to read DOCX {}: {:?}", path.display(), e);
                String::new()
            }
        },
        Err(e) => {
            log::error!("failed to open {}: {}", path.display(), e);
            String::new()
        }
    }
}

fn extract_pdf_text(path: &Path) -> String {
    match fs::read(path) {
        Ok(bytes) => match pdf_extract::extract_text_from_mem(&bytes) {
            Ok(text) => text,
            Err(e) => {
                log::error!("failed to extract PDF {}: {}", path.display(), e);
                String::new()
            }
        },
        Err(e) => {
            log::error!("failed to open {}: {}", path.display(), e);
            String::new()
        }
    }
}
