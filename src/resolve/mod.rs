//! Resolution protocols: turning detected entries into filled entries.
//!
//! The fill protocol maps each placeholder spot to a profile field through
//! the oracle (with validation, bounded retries, and a keyword fallback)
//! and substitutes values locally. The checkbox protocol runs the
//! three-prompt match/invent/select flow.

pub mod checkbox;
pub mod fill;
pub mod keywords;

pub use checkbox::resolve_checkbox_entries;
pub use fill::resolve_fill_entries;
