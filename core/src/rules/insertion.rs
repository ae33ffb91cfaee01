use super::RuleOutcome;
use crate::error::{AppError, AppResult};
use crate::pattern::Pattern;
use serde::{Deserialize, Serialize};

/// Inserts `block` at the start of the line where `anchor` matches, unless
/// `marker` already occurs anywhere in the text.
///
/// A missing anchor is reported as a warning and the text is left as is.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InsertionRule {
    /// Text used in the change description instead of the default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,

    /// Locates the insertion point. May span several lines.
    pub anchor: Pattern,

    /// Presence means the block is already there.
    pub marker: String,

    /// Text to insert. A trailing newline is added if missing.
    pub block: String,

    /// Insert before every anchor match instead of only the first.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub all: bool,
}

impl InsertionRule {
    /// Creates a rule that inserts before the first anchor match.
    pub fn new(anchor: Pattern, marker: impl Into<String>, block: impl Into<String>) -> Self {
        InsertionRule {
            label: None,
            anchor,
            marker: marker.into(),
            block: block.into(),
            all: false,
        }
    }

    /// Insert before every match.
    pub fn everywhere(mut self) -> Self {
        self.all = true;
        self
    }

    /// Override the description prefix.
    pub fn labelled(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub(crate) fn summary(&self) -> String {
        format!("insert before {}", self.anchor)
    }

    pub(crate) fn validate(&self) -> AppResult<()> {
        if self.marker.is_empty() {
            return Err(AppError::General("insertion rule has an empty `marker`".into()));
        }
        if !self.block.contains(self.marker.as_str()) {
            return Err(AppError::General(format!(
                "insertion block does not contain its marker `{}`; it would be inserted on every run",
                self.marker
            )));
        }
        Ok(())
    }

    pub(crate) fn apply(&self, text: &str) -> RuleOutcome {
        if text.contains(self.marker.as_str()) {
            return RuleOutcome::Unmatched;
        }

        let matches = if self.all {
            self.anchor.find_all(text)
        } else {
            self.anchor.find_first(text).into_iter().collect()
        };

        if matches.is_empty() {
            return RuleOutcome::Warning(format!(
                "anchor {} not found; {} not inserted",
                self.anchor,
                self.label.as_deref().unwrap_or("block")
            ));
        }

        let mut positions: Vec<usize> = matches
            .iter()
            .map(|range| line_start(text, range.start))
            .collect();
        positions.dedup();

        let mut block = self.block.clone();
        if !block.ends_with('\n') {
            block.push('\n');
        }

        let mut out = String::with_capacity(text.len() + block.len() * positions.len());
        let mut cursor = 0;
        for pos in &positions {
            out.push_str(&text[cursor..*pos]);
            out.push_str(&block);
            cursor = *pos;
        }
        out.push_str(&text[cursor..]);

        let label = self
            .label
            .clone()
            .unwrap_or_else(|| format!("Inserted block before {}", self.anchor));
        let description = if positions.len() == 1 {
            label
        } else {
            format!("{} ({} locations)", label, positions.len())
        };

        RuleOutcome::Applied {
            text: out,
            description,
        }
    }
}

/// Start of the line holding the first non-whitespace byte at or after `pos`.
///
/// Anchors written as `\s+- name: ...` begin on the previous line's newline;
/// skipping leading whitespace puts the block before the step itself.
fn line_start(text: &str, pos: usize) -> usize {
    let rest = &text[pos..];
    let first_visible = pos + (rest.len() - rest.trim_start().len());
    text[..first_visible].rfind('\n').map_or(0, |i| i + 1)
}
