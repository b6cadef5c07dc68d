//! Request-scoped scratch directories.
//!
//! Every conversion gets its own `svg-output-<uuid>` directory under the temp root.
//! Callers release it with [`Workspace::destroy`]; if the guard is dropped instead
//! (request deadline, panic) the destructor removes the directory synchronously.
//! Removal failures are logged and never propagated.

use crate::Result;
use crate::core::path_safety::join_within;
use std::path::{Path, PathBuf};
use tokio::fs;
use uuid::Uuid;

/// Prefix shared by all workspace directory names.
pub const WORKSPACE_PREFIX: &str = "svg-output-";

/// RAII guard for a uniquely named conversion directory.
#[derive(Debug)]
pub struct Workspace {
    path: PathBuf,
    armed: bool,
}

impl Workspace {
    /// Create `<temp_root>/svg-output-<uuid>`, including missing parents.
    pub async fn create(temp_root: impl AsRef<Path>) -> Result<Self> {
        let path = temp_root
            .as_ref()
            .join(format!("{}{}", WORKSPACE_PREFIX, Uuid::new_v4()));
        fs::create_dir_all(&path).await?;
        tracing::debug!("Created workspace {}", path.display());
        Ok(Self { path, armed: true })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Path for an output file inside the workspace.
    pub fn file(&self, name: &str) -> Result<PathBuf> {
        join_within(&self.path, name)
    }

    /// Recursively remove the workspace.
    pub async fn destroy(mut self) {
        self.armed = false;
        match fs::remove_dir_all(&self.path).await {
            Ok(()) => tracing::debug!("Removed workspace {}", self.path.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!("Failed to remove workspace {}: {}", self.path.display(), e),
        }
    }
}

impl Drop for Workspace {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        // Drop can't be async; removal must finish before the guard is gone
        if let Err(e) = std::fs::remove_dir_all(&self.path)
            && e.kind() != std::io::ErrorKind::NotFound
        {
            tracing::warn!("Failed to remove workspace {} on drop: {}", self.path.display(), e);
        }
    }
}
