//! Timestamped copies of the descriptor, taken before it is overwritten.
//!
//! Layout: `<workspace>/<backup_dir>/<timestamp>/<mets_basename>`.

use crate::{Error, Result};
use ocrd_fs::{AtomicWriteOptions, atomic_copy};
use std::path::{Path, PathBuf};
use tracing::debug;

const STAMP_FORMAT: &str = "%Y%m%d-%H%M%S-%6f";

/// Copy `mets_path` into a new backup directory below `root`.
///
/// Returns `None` when there is no descriptor to back up yet.
pub fn create(root: &Path, mets_path: &Path) -> Result<Option<PathBuf>> {
    if !mets_path.exists() {
        return Ok(None);
    }
    let basename = mets_path.file_name().ok_or_else(|| {
        Error::Argument(format!("descriptor path '{}' has no file name", mets_path.display()))
    })?;

    let stamp = chrono::Local::now().format(STAMP_FORMAT).to_string();
    let mut dir = root.join(&stamp);
    let mut attempt = 1;
    while dir.exists() {
        dir = root.join(format!("{stamp}-{attempt}"));
        attempt += 1;
    }

    let target = dir.join(basename);
    atomic_copy(mets_path, &target, AtomicWriteOptions::new().create_parents(true))?;
    debug!(backup = %target.display(), "backed up descriptor");
    Ok(Some(target))
}

/// Backups of `basename` below `root`, oldest first.
pub fn list(root: &Path, basename: &str) -> Result<Vec<PathBuf>> {
    if !root.is_dir() {
        return Ok(Vec::new());
    }
    let entries = std::fs::read_dir(root).map_err(|e| Error::Io {
        path: root.to_path_buf(),
        source: e,
    })?;

    let mut backups = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| Error::Io {
            path: root.to_path_buf(),
            source: e,
        })?;
        let candidate = entry.path().join(basename);
        if candidate.is_file() {
            backups.push(candidate);
        }
    }
    backups.sort();
    Ok(backups)
}

/// Put the newest backup back in place of `mets_path` and drop it.
pub fn restore_latest(root: &Path, mets_path: &Path, basename: &str) -> Result<PathBuf> {
    let latest = list(root, basename)?.pop().ok_or_else(|| Error::NotFound {
        url: root.display().to_string(),
    })?;

    atomic_copy(&latest, mets_path, AtomicWriteOptions::new())?;
    if let Some(dir) = latest.parent() {
        std::fs::remove_dir_all(dir).map_err(|e| Error::Io {
            path: dir.to_path_buf(),
            source: e,
        })?;
    }
    debug!(backup = %latest.display(), "restored descriptor");
    Ok(latest)
}
