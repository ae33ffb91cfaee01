#![deny(missing_docs)]

//! # wfpatch Core
//!
//! Rule engine for idempotent text rewrites of CI workflow files.
//!
//! A run scans one directory, applies an ordered [`RuleSet`] to every
//! matching file, writes back only what changed and returns a [`Report`].

/// Shared error types.
pub mod error;

/// Literal and regex matchers.
pub mod pattern;

/// Rule kinds and the rule-set applicator.
pub mod rules;

/// Per-file in-memory state.
pub mod state;

/// Discovery and write-back.
pub mod files;

/// Run summaries.
pub mod report;

/// Run orchestration.
pub mod engine;

/// Built-in policies and policy files.
pub mod policies;

pub use engine::{run, RunConfig, RunOptions};
pub use error::{AppError, AppResult};
pub use files::{backup_path, discover_files, persist};
pub use pattern::Pattern;
pub use policies::PolicyCatalog;
pub use report::{FileReport, Report};
pub use rules::{
    apply_rules, Application, ContextualRule, Gate, InsertionRule, LiteralRule, Rule, RuleOutcome,
    RuleSet,
};
pub use state::{ChangeLog, FileState, FileStatus};
