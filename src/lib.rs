//! Form-filling library: placeholder detection, oracle-driven key
//! resolution, and in-place document mutation.
//!
//! Given a blank form (DOCX or PDF) and a folder of personal documents,
//! this library locates fillable blanks and checkbox groups, maps each to
//! a semantic field from the user's profile through an external
//! text-generation oracle, and writes the resolved values back into the
//! document while preserving font, size, style, and position.
//!
//! # Features
//!
//! - **Placeholder Detection**: Per-document placeholder literals combined
//!   into a longest-first pattern, with an underscore-run default
//! - **Fault-Tolerant Resolution**: Bounded retries, response repair, and
//!   a keyword-heuristic fallback around an unreliable oracle
//! - **Context Mining**: Missing profile values are mined on demand from
//!   the user's aggregated document corpus and persisted immediately
//! - **DOCX Mutation**: Paragraph replacement with run-level font
//!   restoration and in-place checkbox glyph updates
//! - **PDF Mutation**: White-fill redaction plus baseline-accurate text
//!   overlay with a font fallback chain; AcroForm value injection for
//!   interactive forms
//!
//! # Architecture
//!
//! - [`detect`]: locating placeholder and checkbox groups in the
//!   flattened line view
//! - [`oracle`]: the text-generation capability, rate limiting, and
//!   permissive response parsing
//! - [`resolve`]: the fill and checkbox resolution protocols
//! - [`context`]: the durable profile store and mining corpus
//! - [`engine`]: the DOCX/PDF mutation engines
//! - [`fonts`]: font normalization, caching, and downloads
//! - [`error`]: comprehensive error handling
//!
//! # Quick Start
//!
//! ```no_run
//! use formfill::{FillService, OracleConfig, Provider};
//! use std::path::Path;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let oracle = OracleConfig::from_env(Provider::OpenAi).build()?;
//! let mut service = FillService::new(oracle);
//!
//! let filled = service.fill_form(
//!     Path::new("application.docx"),
//!     Path::new("profile/"),
//!     None,
//! )?;
//! println!("filled form written to {}", filled.display());
//! # Ok(())
//! # }
//! ```
//!
//! # Detection Without an Oracle
//!
//! ```
//! use formfill::detect::{detect_fill_entries, PlaceholderPattern};
//!
//! let lines = vec!["Name: ____".to_string(), "Date: ____".to_string()];
//! let pattern = PlaceholderPattern::default_underscores();
//! let entries = detect_fill_entries(&lines, &pattern);
//! assert_eq!(entries.len(), 1);
//! assert_eq!(entries[0].spot_count, 2);
//! ```

// Public API
pub mod context;
pub mod detect;
pub mod engine;
pub mod error;
pub mod fonts;
pub mod oracle;
pub mod resolve;
pub mod service;

// Re-exports for convenient access
pub use context::ContextStore;
pub use detect::{
    detect_checkbox_entries, detect_fill_entries, CheckboxEntry, FillEntry, PlaceholderPattern,
};
pub use engine::{DocxForm, PdfForm};
pub use error::{FormFillError, FormFillResult};
pub use fonts::{FontResolver, ResolvedFont};
pub use oracle::{OracleClient, OracleConfig, Provider, TextGenerator};
pub use resolve::{resolve_checkbox_entries, resolve_fill_entries};
pub use service::FillService;
