#![deny(missing_docs)]

//! # File Operations
//!
//! Directory discovery and write-back of rewritten files.

use crate::engine::RunOptions;
use crate::error::{AppError, AppResult};
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use walkdir::WalkDir;

/// Lists the files directly inside `directory` whose extension is one of
/// `extensions`, sorted by file name.
///
/// Subdirectories are not descended into. Symlinks are kept unless they point
/// at a directory; a dangling link is kept so that reading it fails visibly.
/// Extensions are given without the leading dot and compared
/// case-insensitively.
pub fn discover_files(directory: &Path, extensions: &[String]) -> AppResult<Vec<PathBuf>> {
    if !directory.is_dir() {
        return Err(AppError::DirectoryMissing(directory.to_path_buf()));
    }

    let walker = WalkDir::new(directory)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name();

    let mut files = Vec::new();
    for entry in walker {
        let entry = entry.map_err(|e| {
            AppError::General(format!("Failed to list {}: {}", directory.display(), e))
        })?;

        let is_file = entry.file_type().is_file()
            || (entry.path_is_symlink() && !entry.path().is_dir());
        if !is_file {
            continue;
        }

        let path = entry.path();
        if has_extension(path, extensions) {
            files.push(path.to_path_buf());
        } else {
            debug!(path = %path.display(), "extension filtered out");
        }
    }

    Ok(files)
}

fn has_extension(path: &Path, extensions: &[String]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            extensions
                .iter()
                .any(|wanted| wanted.trim_start_matches('.').eq_ignore_ascii_case(ext))
        })
}

/// Path of the backup written next to `path`.
pub fn backup_path(path: &Path, suffix: &str) -> PathBuf {
    let mut name: OsString = path.as_os_str().to_owned();
    name.push(suffix);
    PathBuf::from(name)
}

/// Writes `new_text` to `path` if it differs from `original`.
///
/// When `options.keep_backup` is set the original text is saved to a sibling
/// file first. Nothing is written in dry-run mode. Returns true if the file
/// was (or, in dry-run mode, would have been) rewritten.
pub fn persist(
    path: &Path,
    original: &str,
    new_text: &str,
    options: &RunOptions,
) -> AppResult<bool> {
    if new_text == original {
        return Ok(false);
    }

    if options.dry_run {
        debug!(path = %path.display(), "dry run, not writing");
        return Ok(true);
    }

    if options.keep_backup {
        let backup = backup_path(path, &options.backup_suffix);
        fs::write(&backup, original)?;
        debug!(backup = %backup.display(), "backup written");
    }

    fs::write(path, new_text)?;
    info!(path = %path.display(), "rewrote file");
    Ok(true)
}
