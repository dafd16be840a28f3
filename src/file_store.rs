//! Managed directory holding the recording blobs
//!
//! Blobs are named `<id>.<ext>`; the directory is created lazily.

use std::io;
use std::path::{Path, PathBuf};

use crate::constants::RECORDING_EXTENSION;

#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Deterministic blob location for a recording ID
    pub fn path_for(&self, id: &str) -> PathBuf {
        self.dir.join(format!("{}.{}", id, RECORDING_EXTENSION))
    }

    /// Create the managed directory if absent
    pub async fn ensure_ready(&self) -> io::Result<()> {
        tokio::fs::create_dir_all(&self.dir).await
    }

    /// Copy a finished temporary file into the managed directory
    ///
    /// The copy lands under a partial name and is renamed into place, so a
    /// failed copy never leaves a blob that looks complete.
    /// Returns the blob path and its size in bytes.
    pub async fn copy_in(&self, source: &Path, id: &str) -> io::Result<(PathBuf, u64)> {
        self.ensure_ready().await?;

        let target = self.path_for(id);
        let partial = target.with_extension(format!("{}.partial", RECORDING_EXTENSION));

        let bytes = match tokio::fs::copy(source, &partial).await {
            Ok(bytes) => bytes,
            Err(e) => {
                let _ = tokio::fs::remove_file(&partial).await;
                return Err(e);
            }
        };

        if let Err(e) = tokio::fs::rename(&partial, &target).await {
            let _ = tokio::fs::remove_file(&partial).await;
            return Err(e);
        }

        log::debug!(
            "Copied {} into archive as {} ({} bytes)",
            source.display(),
            target.display(),
            bytes
        );
        Ok((target, bytes))
    }

    /// Remove a blob; an already-absent file is not an error
    pub async fn delete(&self, file_uri: &Path) -> io::Result<()> {
        match tokio::fs::remove_file(file_uri).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e),
        }
    }

    /// Whether anything is present at `file_uri`; lookup errors count as absent
    pub async fn exists(&self, file_uri: &Path) -> bool {
        tokio::fs::try_exists(file_uri).await.unwrap_or(false)
    }

    /// Every complete blob currently in the managed directory
    pub async fn list_files(&self) -> io::Result<Vec<PathBuf>> {
        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e),
        };

        let mut files = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            let is_blob = path
                .extension()
                .map(|ext| ext == RECORDING_EXTENSION)
                .unwrap_or(false);
            if is_blob && entry.file_type().await?.is_file() {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }
}
