#![deny(missing_docs)]

//! # Patterns
//!
//! Anchors are either plain substrings or regular expressions. In a policy
//! file a bare string is a literal and `{ regex: "..." }` is a regex.

use crate::error::{AppError, AppResult};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::ops::Range;

/// A compiled matcher.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "PatternSpec", into = "PatternSpec")]
pub enum Pattern {
    /// Exact substring.
    Literal(String),
    /// Regular expression, compiled once at construction.
    Regex(Regex),
}

/// Serialized form of a [`Pattern`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum PatternSpec {
    Literal(String),
    Regex { regex: String },
}

impl Pattern {
    /// Builds a literal pattern.
    pub fn literal(text: impl Into<String>) -> AppResult<Self> {
        let text = text.into();
        if text.is_empty() {
            return Err(AppError::General("Literal pattern must not be empty".into()));
        }
        Ok(Pattern::Literal(text))
    }

    /// Compiles a regex pattern.
    pub fn regex(source: &str) -> AppResult<Self> {
        Ok(Pattern::Regex(Regex::new(source)?))
    }

    /// Returns true if the pattern occurs anywhere in `text`.
    pub fn is_match(&self, text: &str) -> bool {
        match self {
            Pattern::Literal(s) => text.contains(s.as_str()),
            Pattern::Regex(re) => re.is_match(text),
        }
    }

    /// Byte ranges of all non-overlapping matches, in order.
    pub fn find_all(&self, text: &str) -> Vec<Range<usize>> {
        match self {
            Pattern::Literal(s) => text
                .match_indices(s.as_str())
                .map(|(start, m)| start..start + m.len())
                .collect(),
            Pattern::Regex(re) => re.find_iter(text).map(|m| m.range()).collect(),
        }
    }

    /// Byte range of the first match.
    pub fn find_first(&self, text: &str) -> Option<Range<usize>> {
        match self {
            Pattern::Literal(s) => text.find(s.as_str()).map(|start| start..start + s.len()),
            Pattern::Regex(re) => re.find(text).map(|m| m.range()),
        }
    }
}

impl Display for Pattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Pattern::Literal(s) => write!(f, "`{}`", s),
            Pattern::Regex(re) => write!(f, "/{}/", re.as_str()),
        }
    }
}

impl TryFrom<PatternSpec> for Pattern {
    type Error = AppError;

    fn try_from(spec: PatternSpec) -> AppResult<Self> {
        match spec {
            PatternSpec::Literal(text) => Pattern::literal(text),
            PatternSpec::Regex { regex } => Pattern::regex(&regex),
        }
    }
}

impl From<Pattern> for PatternSpec {
    fn from(pattern: Pattern) -> Self {
        match pattern {
            Pattern::Literal(text) => PatternSpec::Literal(text),
            Pattern::Regex(re) => PatternSpec::Regex {
                regex: re.as_str().to_string(),
            },
        }
    }
}
