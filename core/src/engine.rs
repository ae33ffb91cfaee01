#![deny(missing_docs)]

//! # Engine
//!
//! Orchestrates a run: discover files, apply the rule set to each file in
//! sorted order, write back what changed, and collect a [`Report`].
//!
//! Everything the run depends on comes in through [`RunConfig`]; there is no
//! process-wide state.

use crate::error::AppResult;
use crate::files::{discover_files, persist};
use crate::report::{FileReport, Report};
use crate::rules::RuleSet;
use crate::state::FileState;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// How results are written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOptions {
    /// Save the original text next to each rewritten file.
    pub keep_backup: bool,
    /// Appended to the file name to form the backup path.
    pub backup_suffix: String,
    /// Compute outcomes without writing anything.
    pub dry_run: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        RunOptions {
            keep_backup: false,
            backup_suffix: ".bak".to_string(),
            dry_run: false,
        }
    }
}

/// Everything a run needs.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Directory to scan (non-recursive).
    pub directory: PathBuf,
    /// Extensions to keep, without the dot.
    pub extensions: Vec<String>,
    /// Policy to apply.
    pub rule_set: RuleSet,
    /// Write-back behaviour.
    pub options: RunOptions,
}

impl RunConfig {
    /// Config for `*.yml` files in `directory`, with default options.
    pub fn new(directory: impl Into<PathBuf>, rule_set: RuleSet) -> Self {
        RunConfig {
            directory: directory.into(),
            extensions: vec!["yml".to_string()],
            rule_set,
            options: RunOptions::default(),
        }
    }
}

/// Runs the configured policy over the directory.
///
/// Fails only if the directory cannot be listed. A file that cannot be read
/// or written is reported as failed and the run moves on.
pub fn run(config: &RunConfig) -> AppResult<Report> {
    let files = discover_files(&config.directory, &config.extensions)?;
    info!(
        policy = %config.rule_set.name,
        directory = %config.directory.display(),
        count = files.len(),
        "scanning workflow files"
    );

    let mut report = Report::new(
        config.rule_set.name.clone(),
        config.directory.clone(),
        config.options.dry_run,
    );

    for path in files {
        let entry = match process_file(&path, config) {
            Ok(entry) => entry,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to process file");
                FileReport::failed(&path, e.to_string())
            }
        };
        report.push(entry);
    }

    Ok(report)
}

fn process_file(path: &Path, config: &RunConfig) -> AppResult<FileReport> {
    let mut state = FileState::load(path)?;
    state.apply(&config.rule_set);
    persist(
        state.path(),
        state.original(),
        state.current(),
        &config.options,
    )?;
    Ok(FileReport::from_state(&state))
}
