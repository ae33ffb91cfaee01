#![deny(missing_docs)]

//! # Run Report
//!
//! Per-file outcomes plus the totals printed at the end of a run. The
//! `Display` impl is the text report; `Serialize` backs the JSON one.

use crate::state::{FileState, FileStatus};
use serde::Serialize;
use std::fmt::Display;
use std::path::{Path, PathBuf};

/// Outcome for one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileReport {
    /// File name (without directory).
    pub name: String,
    /// Full path.
    pub path: PathBuf,
    /// Terminal state.
    pub status: FileStatus,
    /// Descriptions of the rules that matched.
    pub changes: Vec<String>,
    /// Rules skipped with a warning.
    pub warnings: Vec<String>,
    /// Set when the file could not be processed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl FileReport {
    /// Summarises a processed file.
    pub fn from_state(state: &FileState) -> Self {
        FileReport {
            name: file_name(state.path()),
            path: state.path().to_path_buf(),
            status: state.status(),
            changes: state.log().changes.clone(),
            warnings: state.log().warnings.clone(),
            error: None,
        }
    }

    /// Records a file that could not be read or written.
    pub fn failed(path: &Path, error: impl Into<String>) -> Self {
        FileReport {
            name: file_name(path),
            path: path.to_path_buf(),
            status: FileStatus::Failed,
            changes: Vec::new(),
            warnings: Vec::new(),
            error: Some(error.into()),
        }
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

/// Summary of a whole run.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    policy: String,
    directory: PathBuf,
    dry_run: bool,
    files_scanned: usize,
    files_modified: usize,
    files: Vec<FileReport>,
}

impl Report {
    /// Starts an empty report.
    pub fn new(policy: impl Into<String>, directory: impl Into<PathBuf>, dry_run: bool) -> Self {
        Report {
            policy: policy.into(),
            directory: directory.into(),
            dry_run,
            files_scanned: 0,
            files_modified: 0,
            files: Vec::new(),
        }
    }

    /// Adds a file outcome and updates the totals.
    pub fn push(&mut self, file: FileReport) {
        self.files_scanned += 1;
        if file.status == FileStatus::Modified {
            self.files_modified += 1;
        }
        self.files.push(file);
    }

    /// Number of files looked at.
    pub fn files_scanned(&self) -> usize {
        self.files_scanned
    }

    /// Number of files rewritten (or that would be, in dry-run mode).
    pub fn files_modified(&self) -> usize {
        self.files_modified
    }

    /// Number of files that could not be processed.
    pub fn files_failed(&self) -> usize {
        self.files
            .iter()
            .filter(|f| f.status == FileStatus::Failed)
            .count()
    }

    /// Per-file outcomes, in processing order.
    pub fn files(&self) -> &[FileReport] {
        &self.files
    }

    /// Name of the policy that ran.
    pub fn policy(&self) -> &str {
        &self.policy
    }
}

impl Display for Report {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(
            f,
            "Scanned {} workflow file(s) in {} (policy: {}{})",
            self.files_scanned,
            self.directory.display(),
            self.policy,
            if self.dry_run { ", dry run" } else { "" }
        )?;
        writeln!(f)?;

        for file in &self.files {
            match file.status {
                FileStatus::Modified => writeln!(f, "✓ {}", file.name)?,
                FileStatus::Unchanged if !file.warnings.is_empty() => {
                    writeln!(f, "⚠ {}", file.name)?
                }
                FileStatus::Unchanged => writeln!(f, "• {} - no changes needed", file.name)?,
                FileStatus::Skipped => {
                    writeln!(f, "• {} - no changes needed (precondition not met)", file.name)?
                }
                FileStatus::Failed => writeln!(
                    f,
                    "✗ {} - {}",
                    file.name,
                    file.error.as_deref().unwrap_or("failed")
                )?,
            }
            for change in &file.changes {
                writeln!(f, "  - {}", change)?;
            }
            for warning in &file.warnings {
                writeln!(f, "  ! {}", warning)?;
            }
        }

        writeln!(f)?;
        let verb = if self.dry_run { "Would modify" } else { "Modified" };
        write!(
            f,
            "{} {} of {} file(s)",
            verb, self.files_modified, self.files_scanned
        )?;
        let failed = self.files_failed();
        if failed > 0 {
            write!(f, ", {} failed", failed)?;
        }
        Ok(())
    }
}
