//! File selection: the items of a batch and directory scanning.
//!
//! Recursively walks a chosen directory and produces items whose raw paths
//! look the way a folder picker reports them, with the selected folder's
//! own name as the leading segment. Normalization then reduces them to
//! repository-relative destinations.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::UploadError;
use crate::paths;

/// Where an item's bytes come from.
///
/// Disk-backed items defer reading until just before their request, so only
/// one file's content is in memory at a time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemSource {
    Memory(Vec<u8>),
    Disk(PathBuf),
}

/// One file to transfer: raw picker path, normalized destination, content.
///
/// Read-only after construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedItem {
    raw_path: String,
    normalized_path: String,
    source: ItemSource,
}

impl SelectedItem {
    /// Creates an item from captured bytes.
    ///
    /// Fails with [`UploadError::InvalidPath`] when the raw path normalizes
    /// to nothing; such items must be flagged, not uploaded to the root.
    pub fn from_bytes(raw_path: impl Into<String>, content: Vec<u8>) -> Result<Self, UploadError> {
        Self::build(raw_path.into(), ItemSource::Memory(content))
    }

    /// Creates an item whose bytes are read from disk at upload time.
    pub fn from_disk(
        raw_path: impl Into<String>,
        path: impl Into<PathBuf>,
    ) -> Result<Self, UploadError> {
        Self::build(raw_path.into(), ItemSource::Disk(path.into()))
    }

    fn build(raw_path: String, source: ItemSource) -> Result<Self, UploadError> {
        let normalized_path = paths::normalize(&raw_path);
        if normalized_path.is_empty() {
            return Err(UploadError::InvalidPath(raw_path));
        }
        Ok(Self {
            raw_path,
            normalized_path,
            source,
        })
    }

    /// Path as originally reported by the file source.
    pub fn raw_path(&self) -> &str {
        &self.raw_path
    }

    /// Canonical forward-slash repository-relative path.
    pub fn normalized_path(&self) -> &str {
        &self.normalized_path
    }

    /// Final file-name component, used for commit messages.
    pub fn file_name(&self) -> &str {
        self.normalized_path
            .rsplit('/')
            .next()
            .unwrap_or(&self.normalized_path)
    }

    /// Reads the item's bytes. Disk sources go through `spawn_blocking`.
    pub async fn read_content(&self) -> Result<Vec<u8>, std::io::Error> {
        match &self.source {
            ItemSource::Memory(bytes) => Ok(bytes.clone()),
            ItemSource::Disk(path) => {
                let path = path.clone();
                tokio::task::spawn_blocking(move || std::fs::read(path))
                    .await
                    .map_err(std::io::Error::other)?
            }
        }
    }
}

/// Selects every file under `root` for upload.
///
/// Raw paths keep the selected folder's own name as their leading segment,
/// matching how folder pickers report paths; normalization drops that
/// wrapping segment again. File contents are read lazily at upload time.
/// An item whose path normalizes to nothing fails the whole selection so
/// the caller can warn instead of uploading it to the repository root.
pub fn select_directory(root: &Path) -> Result<Vec<SelectedItem>, UploadError> {
    let folder = root
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let mut items = Vec::new();
    walk_dir(root, root, &folder, &mut items)?;

    debug!(files = items.len(), root = %root.display(), "selection complete");
    Ok(items)
}

fn walk_dir(
    root: &Path,
    current: &Path,
    folder: &str,
    items: &mut Vec<SelectedItem>,
) -> Result<(), UploadError> {
    let entries = std::fs::read_dir(current)?;

    for entry in entries {
        let entry = entry?;
        let path = entry.path();
        let metadata = entry.metadata()?;

        if metadata.is_dir() {
            walk_dir(root, &path, folder, items)?;
        } else if metadata.is_file() {
            let rel = path.strip_prefix(root).map_err(std::io::Error::other)?;

            // Normalize to forward slashes.
            let rel = rel.to_string_lossy().replace('\\', "/");
            let raw = if folder.is_empty() {
                rel
            } else {
                format!("{folder}/{rel}")
            };
            items.push(SelectedItem::from_disk(raw, &path)?);
        }
    }

    Ok(())
}
