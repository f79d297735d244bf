//! Input directory scanning

use crate::error::{MulticodeError, Result};
use crate::types::FileList;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Snapshot every regular file under `root`
///
/// The root is made absolute first, keeping symlinks as named. Files whose name begins with `.` are
/// skipped; hidden directories are still descended. Unreadable entries are
/// logged and left out.
pub fn scan(root: &Path) -> Result<FileList> {
    if !root.is_dir() {
        return Err(MulticodeError::NotADirectory(root.to_path_buf()));
    }
    let root = absolute_root(root)?;

    let mut files = Vec::new();
    for entry in WalkDir::new(&root).follow_links(true) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Skipping unreadable entry under {}: {}", root.display(), e);
                continue;
            }
        };

        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        if is_hidden(path) {
            debug!("Skipping hidden file {}", path.display());
            continue;
        }
        files.push(path.to_path_buf());
    }

    info!("Found {} files in {}", files.len(), root.display());
    Ok(FileList::new(root, files))
}

/// `path` made absolute, with `.` and `..` resolved lexically
///
/// Symlinks are not followed, so a linked root keeps the name it was given.
pub fn absolute_root(path: &Path) -> Result<PathBuf> {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()?.join(path)
    };

    let mut normalized = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other),
        }
    }
    Ok(normalized)
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .map(|name| name.to_string_lossy().starts_with('.'))
        .unwrap_or(false)
}
