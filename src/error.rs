//! Error types for the form-filling library.
//!
//! This module provides a comprehensive error handling strategy with proper
//! error categorization and context preservation.

use std::fmt;
use std::io;
use std::path::PathBuf;

/// Result type alias for form-filling operations.
pub type FormFillResult<T> = Result<T, FormFillError>;

/// Comprehensive error type for all form-filling operations.
///
/// This enum categorizes errors by their source and provides rich context
/// for debugging and error recovery.
#[derive(Debug)]
pub enum FormFillError {
    /// Error occurred while reading or writing files
    Io { path: PathBuf, source: io::Error },

    /// Oracle request failed at the transport level (network, rate limits)
    OracleTransport {
        provider: String,
        message: String,
        rate_limited: bool,
    },

    /// Oracle returned a response the protocol could not use.
    ///
    /// These errors are recovered locally (retry, then degrade to
    /// unresolved); they are never fatal to the pipeline.
    OracleProtocol { detail: String },

    /// Error occurred during DOCX processing
    DocxProcessing { message: String },

    /// Error occurred during PDF processing
    PdfProcessing {
        message: String,
        page: Option<usize>,
    },

    /// Font resolution exhausted every fallback
    FontResolution { font: String, reason: String },

    /// Pattern compilation or matching error
    PatternError { pattern: String, reason: String },

    /// Invalid configuration or parameters
    InvalidInput { parameter: String, reason: String },
}

impl fmt::Display for FormFillError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "IO error for path '{}': {}", path.display(), source)
            }
            Self::OracleTransport {
                provider,
                message,
                rate_limited,
            } => {
                if *rate_limited {
                    write!(f, "{} rate limit: {}", provider, message)
                } else {
                    write!(f, "{} transport error: {}", provider, message)
                }
            }
            Self::OracleProtocol { detail } => {
                write!(f, "Unusable oracle response: {}", detail)
            }
            Self::DocxProcessing { message } => {
                write!(f, "DOCX processing error: {}", message)
            }
            Self::PdfProcessing { message, page } => {
                if let Some(p) = page {
                    write!(f, "PDF processing error on page {}: {}", p, message)
                } else {
                    write!(f, "PDF processing error: {}", message)
                }
            }
            Self::FontResolution { font, reason } => {
                write!(f, "Font resolution failed for '{}': {}", font, reason)
            }
            Self::PatternError { pattern, reason } => {
                write!(f, "Pattern error for '{}': {}", pattern, reason)
            }
            Self::InvalidInput { parameter, reason } => {
                write!(f, "Invalid input for '{}': {}", parameter, reason)
            }
        }
    }
}

impl std::error::Error for FormFillError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl FormFillError {
    /// Attaches a file path to a bare IO error.
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Returns true for transport errors worth retrying with backoff.
    pub fn is_rate_limited(&self) -> bool {
        matches!(
            self,
            Self::OracleTransport {
                rate_limited: true,
                ..
            }
        )
    }
}

// Conversion implementations for common error types
impl From<io::Error> for FormFillError {
    fn from(err: io::Error) -> Self {
        Self::Io {
            path: PathBuf::from("<unknown>"),
            source: err,
        }
    }
}

impl From<regex::Error> for FormFillError {
    fn from(err: regex::Error) -> Self {
        Self::PatternError {
            pattern: "<unknown>".to_string(),
            reason: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for FormFillError {
    fn from(err: serde_json::Error) -> Self {
        Self::OracleProtocol {
            detail: err.to_string(),
        }
    }
}

impl From<lopdf::Error> for FormFillError {
    fn from(err: lopdf::Error) -> Self {
        Self::PdfProcessing {
            message: err.to_string(),
            page: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = FormFillError::OracleProtocol {
            detail: "not json".to_string(),
        };
        assert_eq!(err.to_string(), "Unusable oracle response: not json");
    }

    #[test]
    fn test_rate_limit_classification() {
        let err = FormFillError::OracleTransport {
            provider: "openai".to_string(),
            message: "429".to_string(),
            rate_limited: true,
        };
        assert!(err.is_rate_limited());

        let err = FormFillError::OracleProtocol {
            detail: "x".to_string(),
        };
        assert!(!err.is_rate_limited());
    }

    #[test]
    fn test_page_context_in_display() {
        let err = FormFillError::PdfProcessing {
            message: "bad content stream".to_string(),
            page: Some(3),
        };
        assert_eq!(
            err.to_string(),
            "PDF processing error on page 3: bad content stream"
        );
    }
}
