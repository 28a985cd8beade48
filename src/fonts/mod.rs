//! Font resolution with a download cache and fallback chain.
//!
//! Replacement text should render in the font the form used. The resolver
//! normalizes common family aliases, checks an on-disk cache, and attempts
//! a Google Fonts download before letting the mutation engine fall back to
//! a generic face. Resolution results are memoized per run; the hot path is
//! single-threaded per document.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Outcome of resolving a requested font family.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedFont {
    /// Usable family name (normalized); empty only for the builtin default
    pub name: String,

    /// Local font file, when cached or freshly downloaded
    pub file: Option<PathBuf>,

    /// True when resolution fell all the way through to the engine default
    pub builtin: bool,
}

impl ResolvedFont {
    /// The engine-builtin default face.
    pub fn builtin() -> Self {
        Self {
            name: String::new(),
            file: None,
            builtin: true,
        }
    }
}

/// Resolves font names to usable families and optional local files.
pub struct FontResolver {
    cache_dir: PathBuf,
    memo: HashMap<String, ResolvedFont>,
    downloads_enabled: bool,
    http: Option<reqwest::blocking::Client>,
}

impl FontResolver {
    /// Creates a resolver with the default cache directory and downloads
    /// enabled.
    pub fn new() -> Self {
        Self::with_cache_dir(default_cache_dir())
    }

    /// Creates a resolver caching under `cache_dir`.
    pub fn with_cache_dir(cache_dir: PathBuf) -> Self {
        let _ = std::fs::create_dir_all(&cache_dir);
        Self {
            cache_dir,
            memo: HashMap::new(),
            downloads_enabled: true,
            http: None,
        }
    }

    /// Creates a resolver that never touches the network.
    pub fn offline(cache_dir: PathBuf) -> Self {
        let mut resolver = Self::with_cache_dir(cache_dir);
        resolver.downloads_enabled = false;
        resolver
    }

    /// Resolves `original` through the fallback chain:
    /// cached file for the original or normalized name, then a fresh
    /// download, then the bare normalized family name (no file), and for an
    /// empty request the builtin default.
    pub fn resolve(&mut self, original: &str) -> ResolvedFont {
        let original = strip_subset_prefix(original.trim());
        if original.is_empty() {
            return ResolvedFont::builtin();
        }
        if let Some(hit) = self.memo.get(original) {
            return hit.clone();
        }

        let normalized = normalize_font_name(original);
        let mut candidates = vec![original.to_string()];
        if normalized != original {
            candidates.push(normalized.clone());
        }

        let mut resolved = None;
        for candidate in &candidates {
            if let Some(path) = self.cached_font(candidate) {
                log::debug!("found cached font: {}", path.display());
                resolved = Some(ResolvedFont {
                    name: candidate.clone(),
                    file: Some(path),
                    builtin: false,
                });
                break;
            }
        }

        if resolved.is_none() && self.downloads_enabled {
            for candidate in &candidates {
                if let Some(path) = self.download_font(candidate) {
                    resolved = Some(ResolvedFont {
                        name: candidate.clone(),
                        file: Some(path),
                        builtin: false,
                    });
                    break;
                }
            }
        }

        // No file anywhere: keep the family name so the engine can still
        // reference it and decide its own generic fallback.
        let resolved = resolved.unwrap_or(ResolvedFont {
            name: normalized,
            file: None,
            builtin: false,
        });

        self.memo.insert(original.to_string(), resolved.clone());
        resolved
    }

    fn cached_font(&self, name: &str) -> Option<PathBuf> {
        let safe = safe_file_name(name);
        for ext in [".ttf", ".woff", ".woff2"] {
            let path = self.cache_dir.join(format!("{}{}", safe, ext));
            if path.exists() {
                return Some(path);
            }
        }
        None
    }

    /// Attempts to fetch a font file through the Google Fonts CSS endpoint.
    fn download_font(&mut self, name: &str) -> Option<PathBuf> {
        static FONT_URL: Lazy<Regex> = Lazy::new(|| {
            Regex::new(r"url\((https://fonts\.gstatic\.com/[^)]+\.(?:woff2|woff|ttf))\)")
                .expect("Valid regex")
        });

        if self.http.is_none() {
            self.http = reqwest::blocking::Client::builder()
                .timeout(Duration::from_secs(30))
                .build()
                .ok();
        }
        let http = self.http.as_ref()?;

        let css_url = format!(
            "https://fonts.googleapis.com/css2?family={}",
            name.replace(' ', "+")
        );
        let css = http
            .get(&css_url)
            .send()
            .ok()
            .filter(|r| r.status().is_success())?
            .text()
            .ok()?;

        let font_url = FONT_URL.captures(&css)?.get(1)?.as_str().to_string();
        let bytes = http
            .get(&font_url)
            .send()
            .ok()
            .filter(|r| r.status().is_success())?
            .bytes()
            .ok()?;

        let ext = if font_url.ends_with(".woff2") {
            ".woff2"
        } else if font_url.ends_with(".woff") {
            ".woff"
        } else {
            ".ttf"
        };
        let path = self
            .cache_dir
            .join(format!("{}{}", safe_file_name(name), ext));
        match std::fs::write(&path, &bytes) {
            Ok(()) => {
                log::info!("downloaded font: {} -> {}", name, path.display());
                Some(path)
            }
            Err(e) => {
                log::debug!("could not cache font {}: {}", name, e);
                None
            }
        }
    }

    /// The cache directory this resolver writes into.
    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }
}

impl Default for FontResolver {
    fn default() -> Self {
        Self::new()
    }
}

fn default_cache_dir() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".formfill")
        .join("fonts")
}

/// Normalizes common family aliases to their canonical spellings.
pub fn normalize_font_name(name: &str) -> String {
    match name.to_lowercase().as_str() {
        "times new roman" | "times" => "Times New Roman".to_string(),
        // Arial is metrically close enough to stand in for Helvetica
        "arial" | "helvetica" => "Arial".to_string(),
        "calibri" => "Calibri".to_string(),
        "georgia" => "Georgia".to_string(),
        "verdana" => "Verdana".to_string(),
        "tahoma" => "Tahoma".to_string(),
        "courier new" | "courier" => "Courier New".to_string(),
        _ => name.to_string(),
    }
}

/// Removes the six-letter subset prefix PDF producers prepend
/// (e.g. `ABCDEF+Garamond`).
pub fn strip_subset_prefix(name: &str) -> &str {
    static PREFIX: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"^[A-Z]{6}\+").expect("Valid regex"));
    match PREFIX.find(name) {
        Some(m) => &name[m.end()..],
        None => name,
    }
}

fn safe_file_name(name: &str) -> String {
    static UNSAFE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\w\s-]").expect("Valid regex"));
    UNSAFE
        .replace_all(name, "")
        .trim()
        .replace(' ', "_")
}
