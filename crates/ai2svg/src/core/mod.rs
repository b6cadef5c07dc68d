//! Core service plumbing.
//!
//! - **Configuration** (`config`): file discovery and environment overrides
//! - **Path safety** (`path_safety`): containment checks for request-derived paths
//! - **Workspaces** (`workspace`): per-conversion scratch directories
//! - **Uploads** (`upload`): on-disk storage and cleanup of uploaded files

pub mod config;
pub mod path_safety;
pub mod upload;
pub mod workspace;

pub use config::{ConverterConfig, Environment, RateLimitConfig, ServiceConfig};
pub use path_safety::{SafePath, validate_path};
pub use upload::StoredUpload;
pub use workspace::Workspace;
