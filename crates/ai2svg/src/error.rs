//! Error types for ai2svg.
//!
//! This module defines all error types used throughout the library. Every
//! fallible operation returns `Ai2SvgError`:
//!
//! - `thiserror` provides the `Error` implementation
//! - error chains are preserved with `#[source]` attributes
//! - messages carry context (paths, limits, converter diagnostics)
//!
//! # Error Classification
//!
//! **Client errors** are rejected before any converter is invoked:
//! - `NoFileUploaded`, `InvalidFileType`, `FileTooLarge`
//!
//! **Integrity errors** should never happen under correct upstream validation:
//! - `InvalidPath` - a request-derived path escaped the temp root
//!
//! **Environment errors**:
//! - `ConverterUnavailable` - the external converter cannot be executed
//!
//! **Conversion errors** carry the converter's own diagnostic output:
//! - `ConversionFailed`, `Timeout`
//!
//! # Example
//!
//! ```rust
//! use ai2svg::{Ai2SvgError, Result};
//!
//! fn require_svg(content: &str) -> Result<&str> {
//!     if !content.contains("<svg") {
//!         return Err(Ai2SvgError::validation("Output is not an SVG document"));
//!     }
//!     Ok(content)
//! }
//! ```
use std::path::PathBuf;

use thiserror::Error;

/// Result type alias using `Ai2SvgError`.
pub type Result<T> = std::result::Result<T, Ai2SvgError>;

/// Main error type for all ai2svg operations.
#[derive(Debug, Error)]
pub enum Ai2SvgError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("No file uploaded")]
    NoFileUploaded,

    #[error("Invalid file type: {0}")]
    InvalidFileType(String),

    #[error("File too large. Maximum size is {limit_mb}MB")]
    FileTooLarge { limit_mb: usize },

    #[error("Invalid file path: {}", path.display())]
    InvalidPath { path: PathBuf },

    #[error("Converter unavailable: {0}")]
    ConverterUnavailable(String),

    #[error("Conversion failed: {message}")]
    ConversionFailed {
        message: String,
        diagnostic: Option<String>,
    },

    #[error("{operation} timed out after {seconds} seconds")]
    Timeout { operation: String, seconds: u64 },

    #[error("Validation error: {message}")]
    Validation {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Serialization error: {message}")]
    Serialization {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("{0}")]
    Other(String),
}

impl From<serde_json::Error> for Ai2SvgError {
    fn from(err: serde_json::Error) -> Self {
        Ai2SvgError::Serialization {
            message: err.to_string(),
            source: Some(Box::new(err)),
        }
    }
}

macro_rules! error_constructor {
    ($name:ident, $variant:ident) => {
        pastey::paste! {
            #[doc = "Create a " $variant " error"]
            pub fn $name<S: Into<String>>(message: S) -> Self {
                Self::$variant {
                    message: message.into(),
                    source: None,
                }
            }

            #[doc = "Create a " $variant " error with source"]
            pub fn [<$name _with_source>]<S: Into<String>, E: std::error::Error + Send + Sync + 'static>(
                message: S,
                source: E,
            ) -> Self {
                Self::$variant {
                    message: message.into(),
                    source: Some(Box::new(source)),
                }
            }
        }
    };
}

impl Ai2SvgError {
    error_constructor!(validation, Validation);
    error_constructor!(serialization, Serialization);

    /// Create a `ConversionFailed` error with optional converter diagnostics.
    ///
    /// Blank diagnostics are dropped so callers can pass captured stderr as-is.
    pub fn conversion_failed<S: Into<String>>(message: S, diagnostic: Option<String>) -> Self {
        Self::ConversionFailed {
            message: message.into(),
            diagnostic: diagnostic.filter(|d| !d.trim().is_empty()),
        }
    }

    /// Diagnostic text captured from the external converter, if any.
    pub fn diagnostic(&self) -> Option<&str> {
        match self {
            Self::ConversionFailed { diagnostic, .. } => diagnostic.as_deref(),
            _ => None,
        }
    }

    /// Whether this error was caused by the client's request rather than the server.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::NoFileUploaded | Self::InvalidFileType(_) | Self::FileTooLarge { .. }
        )
    }
}
