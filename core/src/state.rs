#![deny(missing_docs)]

//! # File State
//!
//! In-memory view of one file while a rule set runs over it.

use crate::error::AppResult;
use crate::rules::{apply_rules, RuleSet};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Human-readable record of what the rules did. Reporting only.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ChangeLog {
    /// One entry per rule that matched, in rule order.
    pub changes: Vec<String>,
    /// Rules that could not run (e.g. anchor not found).
    pub warnings: Vec<String>,
}

impl ChangeLog {
    /// Appends another log.
    pub fn extend(&mut self, other: ChangeLog) {
        self.changes.extend(other.changes);
        self.warnings.extend(other.warnings);
    }
}

/// Terminal state of a file after a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FileStatus {
    /// At least one rule changed the text.
    Modified,
    /// No rule changed the text.
    Unchanged,
    /// The rule set's gate rejected the file.
    Skipped,
    /// The file could not be read or written.
    Failed,
}

/// A file's original and current text.
///
/// The original text is kept untouched so the final comparison and the
/// backup always see what was on disk.
#[derive(Debug, Clone)]
pub struct FileState {
    path: PathBuf,
    original: String,
    current: String,
    log: ChangeLog,
    gated_out: bool,
}

impl FileState {
    /// Reads `path` from disk.
    pub fn load(path: &Path) -> AppResult<Self> {
        let text = fs::read_to_string(path)?;
        Ok(Self::from_text(path, text))
    }

    /// Builds a state from text already in memory.
    pub fn from_text(path: impl Into<PathBuf>, text: impl Into<String>) -> Self {
        let original = text.into();
        FileState {
            path: path.into(),
            current: original.clone(),
            original,
            log: ChangeLog::default(),
            gated_out: false,
        }
    }

    /// Runs `rules` over the current text.
    pub fn apply(&mut self, rules: &RuleSet) {
        let application = apply_rules(&self.current, rules);
        self.current = application.text;
        self.gated_out |= application.gated_out;
        self.log.extend(application.log);
    }

    /// Status derived from the texts and the gate.
    pub fn status(&self) -> FileStatus {
        if self.gated_out {
            FileStatus::Skipped
        } else if self.is_modified() {
            FileStatus::Modified
        } else {
            FileStatus::Unchanged
        }
    }

    /// True if the current text differs from what was loaded.
    pub fn is_modified(&self) -> bool {
        self.current != self.original
    }

    /// Path the state was loaded from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Text as loaded.
    pub fn original(&self) -> &str {
        &self.original
    }

    /// Text after the rules ran.
    pub fn current(&self) -> &str {
        &self.current
    }

    /// Changes and warnings so far.
    pub fn log(&self) -> &ChangeLog {
        &self.log
    }
}
