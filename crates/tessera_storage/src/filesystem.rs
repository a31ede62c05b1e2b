//! Filesystem-based artifact persistence.
//!
//! Artifacts are written atomically: content goes to a hidden scratch file in the
//! destination directory and is renamed into place, so a reader never sees a
//! partially written artifact at its final path.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tessera_core::ArtifactContent;
use tessera_error::{StorageError, StorageErrorKind, TesseraResult};
use tessera_interface::ArtifactStore;
use uuid::Uuid;

/// Filesystem artifact store.
///
/// Relative paths are resolved against the configured base directory.
#[derive(Debug, Clone)]
pub struct FileSystemArtifactStore {
    base_path: PathBuf,
}

impl FileSystemArtifactStore {
    /// Create a store rooted at `base_path`.
    ///
    /// The directory is created lazily on the first write.
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    /// Root directory of the store.
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_path.join(path)
        }
    }

    async fn ensure_parent(path: &Path) -> TesseraResult<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                StorageError::new(StorageErrorKind::DirectoryCreation(format!(
                    "{}: {}",
                    parent.display(),
                    e
                )))
            })?;
        }
        Ok(())
    }

    fn scratch_path(target: &Path) -> TesseraResult<PathBuf> {
        let file_name = target.file_name().ok_or_else(|| {
            StorageError::new(StorageErrorKind::InvalidPath(format!(
                "{} has no file name",
                target.display()
            )))
        })?;
        let scratch = format!(".{}.{}.tmp", file_name.to_string_lossy(), Uuid::new_v4());
        Ok(target.with_file_name(scratch))
    }

    async fn write_atomic(target: &Path, bytes: &[u8]) -> TesseraResult<()> {
        let scratch = Self::scratch_path(target)?;

        if let Err(e) = tokio::fs::write(&scratch, bytes).await {
            let _ = tokio::fs::remove_file(&scratch).await;
            return Err(StorageError::new(StorageErrorKind::FileWrite(format!(
                "{}: {}",
                scratch.display(),
                e
            )))
            .into());
        }

        if let Err(e) = tokio::fs::rename(&scratch, target).await {
            let _ = tokio::fs::remove_file(&scratch).await;
            return Err(StorageError::new(StorageErrorKind::FileWrite(format!(
                "{}: {}",
                target.display(),
                e
            )))
            .into());
        }

        Ok(())
    }
}

#[async_trait]
impl ArtifactStore for FileSystemArtifactStore {
    #[tracing::instrument(skip(self, content), fields(path = %path.display(), size = content.as_bytes().len()))]
    async fn save(&self, content: &ArtifactContent, path: &Path) -> TesseraResult<()> {
        let target = self.resolve(path);
        Self::ensure_parent(&target).await?;
        Self::write_atomic(&target, content.as_bytes()).await?;
        tracing::debug!(target = %target.display(), "Artifact saved");
        Ok(())
    }

    #[tracing::instrument(skip(self), fields(from = %from.display(), to = %to.display()))]
    async fn copy(&self, from: &Path, to: &Path) -> TesseraResult<()> {
        let source = self.resolve(from);
        let target = self.resolve(to);

        let bytes = tokio::fs::read(&source).await.map_err(|e| {
            StorageError::new(StorageErrorKind::FileRead(format!(
                "{}: {}",
                source.display(),
                e
            )))
        })?;

        Self::ensure_parent(&target).await?;
        Self::write_atomic(&target, &bytes).await.map_err(|e| {
            tracing::error!(error = %e, "Artifact copy failed");
            e
        })?;

        tracing::debug!(
            source = %source.display(),
            target = %target.display(),
            "Artifact copied"
        );
        Ok(())
    }
}
