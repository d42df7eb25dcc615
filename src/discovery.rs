//! # Media File Discovery
//!
//! Resolves the command-line input path into the list of media files to
//! transcribe. A single file is checked against the extension set; a
//! directory is walked recursively.
//!
//! Symlinked directories are not descended, which keeps traversal bounded
//! even when links form cycles. Results are canonicalized, deduplicated and
//! sorted so that progress numbering is stable for a given filesystem state.

use crate::error::{BatchError, BatchResult};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// A media file selected for transcription.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MediaFile {
    /// Absolute, canonical path
    pub path: PathBuf,
    /// Lowercase extension including the leading dot
    pub extension: String,
}

impl MediaFile {
    /// File name for progress messages.
    pub fn name(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }
}

/// Lowercase `.ext` form of a path's extension, if it has one.
pub fn normalized_extension(path: &Path) -> Option<String> {
    path.extension()
        .map(|ext| format!(".{}", ext.to_string_lossy().to_lowercase()))
}

/// Find every file under `root` whose extension is in `extensions`.
///
/// ## Returns:
/// - **Ok(files)**: matching files in path order (possibly empty)
/// - **Err(InputNotFound)**: `root` does not exist
pub fn discover(root: &Path, extensions: &BTreeSet<String>) -> BatchResult<Vec<MediaFile>> {
    if !root.exists() {
        return Err(BatchError::InputNotFound(root.to_path_buf()));
    }

    let candidates: Vec<PathBuf> = if root.is_file() {
        vec![root.to_path_buf()]
    } else {
        WalkDir::new(root)
            .follow_links(false)
            .into_iter()
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(e) => {
                    warn!("Skipping unreadable entry during scan: {}", e);
                    None
                }
            })
            // `Path::is_file` follows links, so symlinked files still count
            .filter(|entry| entry.path().is_file())
            .map(|entry| entry.into_path())
            .collect()
    };

    // Keyed by canonical path: deduplicates and orders in one pass
    let mut found = BTreeMap::new();
    for path in candidates {
        let Some(extension) = normalized_extension(&path) else {
            continue;
        };
        if !extensions.contains(&extension) {
            continue;
        }
        match path.canonicalize() {
            Ok(resolved) => {
                found.entry(resolved.clone()).or_insert(MediaFile {
                    path: resolved,
                    extension,
                });
            }
            Err(e) => warn!("Could not resolve {}: {}", path.display(), e),
        }
    }

    debug!("Discovered {} media file(s) under {}", found.len(), root.display());
    Ok(found.into_values().collect())
}
