//! ai2svg - Adobe Illustrator to SVG conversion service
//!
//! ai2svg accepts Adobe Illustrator (`.ai`) documents and returns one SVG document per
//! page. It renders nothing itself: every page is produced by an external converter
//! (Inkscape), driven safely over an unknown, bounded number of pages.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use ai2svg::{InkscapeConverter, PageConverter, ServiceConfig, validate_path};
//!
//! # async fn example() -> ai2svg::Result<()> {
//! let config = ServiceConfig::load(None)?;
//! let converter = Arc::new(InkscapeConverter::from_config(&config.converter));
//! let pages = PageConverter::from_config(converter, &config);
//!
//! let input = validate_path(config.uploads_dir().join("artwork.ai"), &config.temp_dir).await?;
//! let result = pages.convert(&input).await?;
//! println!("{} page(s)", result.count());
//! # Ok(())
//! # }
//! ```
//!
//! # Architecture
//!
//! - **Core Module** (`core`): configuration, path safety, upload storage, workspaces
//! - **Converter** (`converter`): the external converter trait and its Inkscape implementation
//! - **Conversion** (`conversion`): the multi-page conversion loop and its state machine
//! - **API** (`api`, feature `api`): Axum HTTP server

#![deny(unsafe_code)]

pub mod conversion;
pub mod converter;
pub mod core;
pub mod error;

#[cfg(feature = "api")]
pub mod api;

pub use error::{Ai2SvgError, Result};

pub use crate::conversion::{ConversionResult, PageConverter, Strategy};
pub use crate::converter::{Converter, ConverterStatus, ExportOutcome, ExportTarget, InkscapeConverter, ensure_available};
pub use crate::core::{ServiceConfig, SafePath, StoredUpload, Workspace, validate_path};
