//! External converter abstraction.
//!
//! The service never renders anything itself; it drives an external program through
//! the [`Converter`] trait. [`InkscapeConverter`] is the production implementation.
//! Tests and embedders can supply their own implementation to simulate converter
//! presence, absence, or arbitrary page layouts.
//!
//! # Example
//!
//! ```rust,no_run
//! use ai2svg::converter::{Converter, InkscapeConverter};
//! use ai2svg::core::config::ConverterConfig;
//!
//! # async fn example() {
//! let converter = InkscapeConverter::from_config(&ConverterConfig::default());
//! let status = converter.status().await;
//! println!("available={} ({})", status.available, status.message);
//! # }
//! ```

pub mod inkscape;
pub mod version;

use crate::core::SafePath;
use crate::{Ai2SvgError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub use inkscape::InkscapeConverter;
pub use version::Version;

/// Which part of the document an export invocation should produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportTarget {
    /// The converter's default page selection
    FirstPage,
    /// An explicit page, 1-based as the converter counts them
    Page(usize),
    /// The whole document as one SVG, no page selection
    WholeDocument,
}

impl ExportTarget {
    /// Target for a 0-based page index in the conversion loop.
    pub fn for_page_index(index: usize) -> Self {
        if index == 0 {
            ExportTarget::FirstPage
        } else {
            ExportTarget::Page(index + 1)
        }
    }
}

/// Result of one export invocation that ran to completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportOutcome {
    /// The converter exited successfully; the output file may still be empty or missing
    Completed,
    /// The converter could not be started or exited with a failure status
    Failed { diagnostic: String },
}

/// Result of the availability check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConverterStatus {
    pub available: bool,
    pub message: String,
    pub version: Option<String>,
}

impl ConverterStatus {
    pub fn available(message: impl Into<String>, version: Option<String>) -> Self {
        Self {
            available: true,
            message: message.into(),
            version,
        }
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self {
            available: false,
            message: message.into(),
            version: None,
        }
    }
}

/// Best-effort structural query of an input document.
///
/// Never trusted as ground truth; the page loop only logs it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeReport {
    pub succeeded: bool,
    /// Number of objects the converter reported, when it answered at all
    pub object_count: Option<usize>,
    pub detail: String,
}

/// Installation hints shown when the converter is missing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallGuidance {
    pub macos: String,
    pub linux: String,
    pub windows: String,
    pub docker: String,
}

/// An external program that turns a vector document into SVG files.
///
/// Implementations must be `Send + Sync`; one instance serves all concurrent
/// requests, and every method is expected to be free of cross-request state.
#[async_trait]
pub trait Converter: Send + Sync {
    /// Short identifier used in logs and messages.
    fn name(&self) -> &str;

    /// How to install the converter.
    fn install_guidance(&self) -> InstallGuidance;

    /// Probe whether the converter can be executed right now.
    async fn status(&self) -> ConverterStatus;

    /// Query structural metadata of `input`. Errors are informational only.
    async fn probe(&self, input: &SafePath) -> Result<ProbeReport>;

    /// Export `target` of `input` as SVG into `output`.
    ///
    /// A converter that fails to start or exits unsuccessfully yields
    /// `Ok(ExportOutcome::Failed)`; `Err` is reserved for timeouts and I/O failures
    /// that must abort the whole conversion.
    async fn export(&self, input: &SafePath, output: &Path, target: ExportTarget) -> Result<ExportOutcome>;

    async fn is_available(&self) -> bool {
        self.status().await.available
    }
}

/// Run the availability check, turning an unavailable converter into an error.
pub async fn ensure_available(converter: &dyn Converter) -> Result<ConverterStatus> {
    let status = converter.status().await;
    if status.available {
        Ok(status)
    } else {
        tracing::warn!("{} unavailable: {}", converter.name(), status.message);
        Err(Ai2SvgError::ConverterUnavailable(status.message))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_export_target_for_page_index() {
        assert_eq!(ExportTarget::for_page_index(0), ExportTarget::FirstPage);
        assert_eq!(ExportTarget::for_page_index(1), ExportTarget::Page(2));
        assert_eq!(ExportTarget::for_page_index(99), ExportTarget::Page(100));
    }

    struct Absent;

    #[async_trait]
    impl Converter for Absent {
        fn name(&self) -> &str {
            "absent"
        }

        fn install_guidance(&self) -> InstallGuidance {
            InstallGuidance {
                macos: String::new(),
                linux: String::new(),
                windows: String::new(),
                docker: String::new(),
            }
        }

        async fn status(&self) -> ConverterStatus {
            ConverterStatus::unavailable("absent is not installed")
        }

        async fn probe(&self, _input: &SafePath) -> Result<ProbeReport> {
            Err(Ai2SvgError::Other("not installed".to_string()))
        }

        async fn export(&self, _input: &SafePath, _output: &Path, _target: ExportTarget) -> Result<ExportOutcome> {
            Ok(ExportOutcome::Failed {
                diagnostic: "not installed".to_string(),
            })
        }
    }

    #[tokio::test]
    async fn test_ensure_available_maps_to_error() {
        let converter = Absent;
        assert!(!converter.is_available().await);

        let err = ensure_available(&converter).await.unwrap_err();
        match err {
            Ai2SvgError::ConverterUnavailable(msg) => assert!(msg.contains("not installed")),
            other => panic!("Expected ConverterUnavailable, got {other:?}"),
        }
    }
}
