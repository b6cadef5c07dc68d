//! Storage for uploaded input files.
//!
//! Uploads are written to `<temp_root>/uploads/<uuid>.ai`; the client-supplied file
//! name only decides whether the upload is accepted, it never becomes part of a path.
//! The file's lifetime is tracked independently of the conversion workspace so that a
//! failure to delete one never affects the other.

use crate::{Ai2SvgError, Result};
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

/// Extension accepted for uploads (compared case-insensitively).
pub const ACCEPTED_EXTENSION: &str = "ai";

/// Reject client file names that do not carry the `.ai` extension.
pub fn validate_upload_name(file_name: Option<&str>) -> Result<()> {
    let accepted = file_name
        .and_then(|name| Path::new(name).extension())
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(ACCEPTED_EXTENSION));

    if accepted {
        Ok(())
    } else {
        Err(Ai2SvgError::InvalidFileType(
            "Only Adobe Illustrator (.ai) files are allowed".to_string(),
        ))
    }
}

/// RAII guard for an uploaded file on disk.
#[derive(Debug)]
pub struct StoredUpload {
    path: PathBuf,
    size: usize,
    armed: bool,
}

impl StoredUpload {
    /// Create an empty upload file in `uploads_dir`.
    pub async fn create(uploads_dir: impl AsRef<Path>) -> Result<(Self, fs::File)> {
        let uploads_dir = uploads_dir.as_ref();
        fs::create_dir_all(uploads_dir).await?;

        let path = uploads_dir.join(format!("{}.{}", Uuid::new_v4(), ACCEPTED_EXTENSION));
        let file = fs::File::create(&path).await?;

        Ok((
            Self {
                path,
                size: 0,
                armed: true,
            },
            file,
        ))
    }

    /// Copy an existing local file into `uploads_dir`, enforcing `max_bytes`.
    pub async fn copy_from(source: impl AsRef<Path>, uploads_dir: impl AsRef<Path>, max_bytes: usize) -> Result<Self> {
        let source = source.as_ref();
        let size = fs::metadata(source).await?.len();
        if size > max_bytes as u64 {
            return Err(Ai2SvgError::FileTooLarge {
                limit_mb: max_bytes / (1024 * 1024),
            });
        }

        let (mut upload, file) = Self::create(uploads_dir).await?;
        drop(file);
        fs::copy(source, &upload.path).await?;
        upload.size = size as usize;
        Ok(upload)
    }

    /// Append one chunk, failing once the running total exceeds `max_bytes`.
    pub async fn append(&mut self, file: &mut fs::File, chunk: &[u8], max_bytes: usize) -> Result<()> {
        self.size += chunk.len();
        if self.size > max_bytes {
            return Err(Ai2SvgError::FileTooLarge {
                limit_mb: max_bytes / (1024 * 1024),
            });
        }
        file.write_all(chunk).await?;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Bytes written so far.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Delete the uploaded file.
    pub async fn discard(mut self) {
        self.armed = false;
        match fs::remove_file(&self.path).await {
            Ok(()) => tracing::debug!("Deleted upload {}", self.path.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!("Failed to delete upload {}: {}", self.path.display(), e),
        }
    }
}

impl Drop for StoredUpload {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        if let Err(e) = std::fs::remove_file(&self.path)
            && e.kind() != std::io::ErrorKind::NotFound
        {
            tracing::warn!("Failed to delete upload {} on drop: {}", self.path.display(), e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_validate_upload_name() {
        assert!(validate_upload_name(Some("logo.ai")).is_ok());
        assert!(validate_upload_name(Some("LOGO.AI")).is_ok());
        assert!(validate_upload_name(Some("../../etc/logo.ai")).is_ok());
        assert!(matches!(
            validate_upload_name(Some("logo.pdf")),
            Err(Ai2SvgError::InvalidFileType(_))
        ));
        assert!(validate_upload_name(Some("ai")).is_err());
        assert!(validate_upload_name(None).is_err());
    }

    #[tokio::test]
    async fn test_append_and_discard() {
        let dir = tempdir().unwrap();
        let (mut upload, mut file) = StoredUpload::create(dir.path().join("uploads")).await.unwrap();
        upload.append(&mut file, b"%!PS-Adobe-3.0", 1024).await.unwrap();
        file.flush().await.unwrap();
        drop(file);

        let path = upload.path().to_path_buf();
        assert_eq!(upload.size(), 14);
        assert_eq!(std::fs::read(&path).unwrap(), b"%!PS-Adobe-3.0");
        assert_eq!(path.extension().and_then(|e| e.to_str()), Some("ai"));

        upload.discard().await;
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_append_enforces_limit() {
        let dir = tempdir().unwrap();
        let (mut upload, mut file) = StoredUpload::create(dir.path()).await.unwrap();
        upload.append(&mut file, &[0u8; 8], 10).await.unwrap();

        let result = upload.append(&mut file, &[0u8; 8], 10).await;
        assert!(matches!(result, Err(Ai2SvgError::FileTooLarge { .. })));
        upload.discard().await;
    }

    #[tokio::test]
    async fn test_drop_deletes_file() {
        let dir = tempdir().unwrap();
        let path = {
            let (upload, _file) = StoredUpload::create(dir.path()).await.unwrap();
            upload.path().to_path_buf()
        };
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_copy_from() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("source.ai");
        std::fs::write(&source, b"artwork").unwrap();

        let upload = StoredUpload::copy_from(&source, dir.path().join("uploads"), 1024)
            .await
            .unwrap();
        assert_eq!(std::fs::read(upload.path()).unwrap(), b"artwork");
        assert!(source.exists());
        upload.discard().await;
        assert!(source.exists());
    }

    #[tokio::test]
    async fn test_copy_from_rejects_oversize() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("big.ai");
        std::fs::write(&source, vec![0u8; 64]).unwrap();

        let result = StoredUpload::copy_from(&source, dir.path().join("uploads"), 32).await;
        assert!(matches!(result, Err(Ai2SvgError::FileTooLarge { .. })));
    }
}
