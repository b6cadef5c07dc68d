//! Path containment checks for request-derived paths.
//!
//! Uploaded file paths are influenced by the client, so every one of them is
//! canonicalized and checked against the temp root before it reaches the converter
//! or any filesystem call. [`SafePath`] can only be obtained through
//! [`validate_path`], which lets the conversion code demand a checked path in its
//! signatures.

use crate::{Ai2SvgError, Result};
use std::ffi::OsStr;
use std::path::{Component, Path, PathBuf};
use tokio::fs;

/// A canonical path proven to live strictly inside the temp root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SafePath(PathBuf);

impl SafePath {
    pub fn as_path(&self) -> &Path {
        &self.0
    }

    pub fn into_path_buf(self) -> PathBuf {
        self.0
    }
}

impl AsRef<Path> for SafePath {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

impl AsRef<OsStr> for SafePath {
    fn as_ref(&self) -> &OsStr {
        self.0.as_os_str()
    }
}

/// Resolve `path` and ensure it lies inside `root`.
///
/// Both paths are canonicalized, so `..` segments and symlinks are resolved before
/// the containment check. A path that cannot be resolved at all is rejected the same
/// way as one that escapes.
///
/// # Errors
///
/// - `Ai2SvgError::Io` if `root` itself cannot be resolved
/// - `Ai2SvgError::InvalidPath` if `path` is missing, equals `root`, or escapes it
pub async fn validate_path(path: impl AsRef<Path>, root: impl AsRef<Path>) -> Result<SafePath> {
    let path = path.as_ref();
    let root = fs::canonicalize(root.as_ref()).await?;

    let resolved = match fs::canonicalize(path).await {
        Ok(resolved) => resolved,
        Err(e) => {
            tracing::error!("Rejected unresolvable path {}: {}", path.display(), e);
            return Err(Ai2SvgError::InvalidPath {
                path: path.to_path_buf(),
            });
        }
    };

    ensure_contained(&resolved, &root)?;
    Ok(SafePath(resolved))
}

/// Check that an already-resolved path lies strictly inside `root`.
pub fn ensure_contained(resolved: &Path, root: &Path) -> Result<()> {
    if resolved != root && resolved.starts_with(root) {
        return Ok(());
    }

    tracing::error!(
        "Path escape detected: {} is outside temp root {}",
        resolved.display(),
        root.display()
    );
    Err(Ai2SvgError::InvalidPath {
        path: resolved.to_path_buf(),
    })
}

/// Join a single file name onto `base`, refusing anything but one plain component.
///
/// Used for converter output names inside a workspace; rejects separators, `..`,
/// absolute paths and empty names without touching the filesystem.
pub fn join_within(base: &Path, name: &str) -> Result<PathBuf> {
    let mut components = Path::new(name).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) => Ok(base.join(name)),
        _ => Err(Ai2SvgError::InvalidPath {
            path: base.join(name),
        }),
    }
}
