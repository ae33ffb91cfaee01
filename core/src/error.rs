#![deny(missing_docs)]

//! # Error Handling
//!
//! Provides the unified `AppError` enum used across the workspace.

use derive_more::{Display, From};
use std::path::PathBuf;

/// The Global Error Enum.
///
/// Only conditions that abort a run (or a policy load) live here.
/// A missing insertion anchor is a per-file warning, not an error.
#[derive(Debug, Display, From)]
pub enum AppError {
    /// Wrapper for standard IO errors.
    #[display("IO Error: {_0}")]
    Io(std::io::Error),

    /// The directory to scan does not exist.
    #[from(ignore)]
    #[display("Workflow directory not found: {}", _0.display())]
    DirectoryMissing(PathBuf),

    /// A rule pattern failed to compile.
    #[display("Invalid pattern: {_0}")]
    Pattern(regex::Error),

    /// A policy file could not be parsed.
    #[display("Policy Error: {_0}")]
    Policy(serde_yaml::Error),

    /// A policy name that is neither built in nor loaded from a file.
    #[from(ignore)]
    #[display("Unknown policy '{_0}'")]
    UnknownPolicy(String),

    /// Generic errors.
    #[display("General Error: {_0}")]
    General(String),
}

/// Manual implementation of the standard Error trait.
impl std::error::Error for AppError {}

/// Helper type alias for Result using AppError.
pub type AppResult<T> = Result<T, AppError>;
