use super::{occurrences, RuleOutcome};
use crate::error::{AppError, AppResult};
use serde::{Deserialize, Serialize};

/// Replaces every occurrence of `from` with `to`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LiteralRule {
    /// Text used in the change description instead of the default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,

    /// Text to look for.
    pub from: String,

    /// Replacement text.
    pub to: String,

    /// Only replace occurrences that end a line.
    ///
    /// Keeps `run: npm install` from matching `run: npm install -g pkg`.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub line_end: bool,
}

impl LiteralRule {
    /// Replace anywhere.
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        LiteralRule {
            label: None,
            from: from.into(),
            to: to.into(),
            line_end: false,
        }
    }

    /// Restrict to occurrences at the end of a line.
    pub fn at_line_end(mut self) -> Self {
        self.line_end = true;
        self
    }

    /// Override the description prefix.
    pub fn labelled(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub(crate) fn summary(&self) -> String {
        format!("literal `{}`", self.from)
    }

    pub(crate) fn validate(&self) -> AppResult<()> {
        if self.from.is_empty() {
            return Err(AppError::General("literal rule has an empty `from`".into()));
        }
        if self.to.contains(self.from.as_str()) {
            return Err(AppError::General(format!(
                "literal rule `{}` → `{}` would match its own output on the next run",
                self.from, self.to
            )));
        }
        Ok(())
    }

    pub(crate) fn apply(&self, text: &str) -> RuleOutcome {
        if self.from.is_empty() || self.from == self.to {
            return RuleOutcome::Unmatched;
        }

        let (new_text, count) = if self.line_end {
            self.replace_line_ends(text)
        } else {
            let count = text.matches(self.from.as_str()).count();
            (text.replace(self.from.as_str(), &self.to), count)
        };

        if count == 0 {
            return RuleOutcome::Unmatched;
        }

        let label = self
            .label
            .clone()
            .unwrap_or_else(|| format!("`{}` → `{}`", self.from, self.to));

        RuleOutcome::Applied {
            text: new_text,
            description: format!("{} ({})", label, occurrences(count)),
        }
    }

    fn replace_line_ends(&self, text: &str) -> (String, usize) {
        let mut out = String::with_capacity(text.len());
        let mut count = 0;

        for line in text.split_inclusive('\n') {
            let body = line.trim_end_matches(['\n', '\r']);
            let ending = &line[body.len()..];
            match body.strip_suffix(self.from.as_str()) {
                Some(head) => {
                    out.push_str(head);
                    out.push_str(&self.to);
                    out.push_str(ending);
                    count += 1;
                }
                None => out.push_str(line),
            }
        }

        (out, count)
    }
}
