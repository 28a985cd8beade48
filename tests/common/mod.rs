//! Common test utilities and helpers.
//!
//! This module provides shared functionality for all tests, including:
//! - A scripted oracle backend
//! - DOCX and PDF fixture builders
//! - An offline font resolver

pub mod fixtures;

pub use fixtures::*;
