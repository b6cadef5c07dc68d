//! Multi-page conversion loop.
//!
//! [`PageConverter::convert`] exports pages one at a time until the converter fails
//! or produces nothing, then falls back to a single whole-document export when no
//! page came out at all. Declared page counts are never trusted; the converter's own
//! behaviour marks the end of the document. See [`state`] for the transition table.
//!
//! Each call owns a fresh [`Workspace`] that is removed on every exit path.

pub mod state;

use crate::converter::{Converter, ExportOutcome, ExportTarget};
use crate::core::{SafePath, ServiceConfig, Workspace};
use crate::{Ai2SvgError, Result};
use serde::Serialize;
use state::{FailureStage, LoopState, PageSignal};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;

/// Output file used by the whole-document fallback.
pub const FALLBACK_FILE_NAME: &str = "document.svg";

/// Default hard bound on extracted pages.
pub const DEFAULT_MAX_PAGES: usize = 100;

/// Workspace file name for a 0-based page index.
pub fn page_file_name(index: usize) -> String {
    format!("page-{}.svg", index)
}

/// How the pages of a [`ConversionResult`] were obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    PerPage,
    WholeDocument,
}

/// Ordered SVG documents, one per page, never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionResult {
    pub pages: Vec<String>,
    pub strategy: Strategy,
}

impl ConversionResult {
    pub fn count(&self) -> usize {
        self.pages.len()
    }
}

/// Drives a [`Converter`] over an unknown, bounded number of pages.
#[derive(Clone)]
pub struct PageConverter {
    converter: Arc<dyn Converter>,
    temp_root: PathBuf,
    max_pages: usize,
}

impl PageConverter {
    pub fn new(converter: Arc<dyn Converter>, temp_root: impl Into<PathBuf>, max_pages: usize) -> Self {
        Self {
            converter,
            temp_root: temp_root.into(),
            max_pages: max_pages.max(1),
        }
    }

    pub fn from_config(converter: Arc<dyn Converter>, config: &ServiceConfig) -> Self {
        Self::new(converter, config.temp_dir.clone(), config.converter.max_pages)
    }

    pub fn max_pages(&self) -> usize {
        self.max_pages
    }

    /// Convert `input` into one SVG document per page.
    ///
    /// # Errors
    ///
    /// - `Ai2SvgError::ConversionFailed` when the first page fails, or when both the
    ///   per-page strategy and the whole-document fallback produce nothing
    /// - `Ai2SvgError::Timeout` when a converter invocation exceeds its timeout
    /// - `Ai2SvgError::Io` for workspace or output-file I/O failures
    #[tracing::instrument(skip(self, input), fields(input = %input.as_path().display()))]
    pub async fn convert(&self, input: &SafePath) -> Result<ConversionResult> {
        let workspace = Workspace::create(&self.temp_root).await?;
        let outcome = self.run(&workspace, input).await;
        workspace.destroy().await;
        outcome
    }

    async fn run(&self, workspace: &Workspace, input: &SafePath) -> Result<ConversionResult> {
        self.probe(input).await;

        let mut pages = Vec::new();
        let mut strategy = Strategy::PerPage;
        let mut state = LoopState::start();

        loop {
            let signal = match &state {
                LoopState::ProbingPage(index) => {
                    let output = workspace.file(&page_file_name(*index))?;
                    self.attempt(input, &output, ExportTarget::for_page_index(*index)).await?
                }
                LoopState::FallbackAttempt => {
                    tracing::info!("Per-page export produced no output, attempting whole-document conversion");
                    strategy = Strategy::WholeDocument;
                    let output = workspace.file(FALLBACK_FILE_NAME)?;
                    self.attempt(input, &output, ExportTarget::WholeDocument).await?
                }
                LoopState::Succeeded => {
                    tracing::info!(pages = pages.len(), ?strategy, "Conversion finished");
                    return Ok(ConversionResult { pages, strategy });
                }
                LoopState::Failed { stage, diagnostic } => {
                    return Err(conversion_failure(*stage, diagnostic.clone()));
                }
            };

            let next = state.next(&signal, pages.len(), self.max_pages);
            if let LoopState::ProbingPage(index) = state {
                log_page_result(index, &signal, &next, self.max_pages);
            }
            if let PageSignal::Exported(svg) = signal {
                pages.push(svg);
            }
            state = next;
        }
    }

    async fn probe(&self, input: &SafePath) {
        match self.converter.probe(input).await {
            Ok(report) if report.succeeded => {
                tracing::debug!(objects = ?report.object_count, "Probe: {}", report.detail);
            }
            Ok(report) => tracing::debug!("Probe failed, continuing: {}", report.detail),
            Err(e) => tracing::debug!("Probe error, continuing: {}", e),
        }
    }

    async fn attempt(&self, input: &SafePath, output: &Path, target: ExportTarget) -> Result<PageSignal> {
        match self.converter.export(input, output, target).await? {
            ExportOutcome::Failed { diagnostic } => Ok(PageSignal::Failed { diagnostic }),
            ExportOutcome::Completed => Ok(match read_output(output).await? {
                Some(svg) => PageSignal::Exported(svg),
                None => PageSignal::Empty,
            }),
        }
    }
}

fn log_page_result(index: usize, signal: &PageSignal, next: &LoopState, max_pages: usize) {
    match (signal, next) {
        (PageSignal::Exported(svg), LoopState::Succeeded) => {
            tracing::warn!(
                "Stopped after page {} ({} bytes): reached the {}-page safety bound",
                index,
                svg.len(),
                max_pages
            );
        }
        (PageSignal::Exported(svg), _) => tracing::debug!("Exported page {} ({} bytes)", index, svg.len()),
        (PageSignal::Empty, _) => tracing::debug!("Page {} produced no output, no more pages", index),
        (PageSignal::Failed { diagnostic }, LoopState::Failed { .. }) => {
            tracing::warn!("First page export failed: {}", diagnostic);
        }
        (PageSignal::Failed { diagnostic }, _) => {
            tracing::debug!("Page {} export failed, no more pages: {}", index, diagnostic);
        }
    }
}

fn conversion_failure(stage: FailureStage, diagnostic: Option<String>) -> Ai2SvgError {
    match stage {
        FailureStage::FirstPage => {
            Ai2SvgError::conversion_failed("The converter could not read the first page of the document", diagnostic)
        }
        FailureStage::Fallback => Ai2SvgError::conversion_failed(
            "Could not convert file. The file may be corrupted or in an unsupported format",
            diagnostic,
        ),
    }
}

/// Read a converter output file; missing and zero-length files both mean "nothing".
async fn read_output(path: &Path) -> Result<Option<String>> {
    match fs::metadata(path).await {
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
        Ok(meta) if meta.len() == 0 => return Ok(None),
        Ok(_) => {}
    }

    let bytes = fs::read(path).await?;
    Ok(Some(String::from_utf8(bytes).unwrap_or_else(|e| {
        tracing::warn!("Converter output {} is not valid UTF-8, decoding lossily", path.display());
        String::from_utf8_lossy(e.as_bytes()).into_owned()
    })))
}
