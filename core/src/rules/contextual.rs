use super::{occurrences, RuleOutcome};
use crate::error::{AppError, AppResult};
use crate::pattern::Pattern;
use serde::{Deserialize, Deserializer, Serialize};

fn default_window() -> usize {
    3
}

/// Accepts `version: 9` as well as `version: "9"` in policy files.
fn scalar<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Scalar {
        Text(String),
        Int(i64),
        Float(f64),
    }

    Ok(match Scalar::deserialize(deserializer)? {
        Scalar::Text(s) => s,
        Scalar::Int(n) => n.to_string(),
        Scalar::Float(n) => n.to_string(),
    })
}

/// Rewrites `field: from` to `field: to`, but only on lines that follow an
/// anchor line.
///
/// The window covers the `window` lines after each line matching `anchor`.
/// It closes early at the next YAML list item (`- ...`), so the value of a
/// sibling step is never touched. Quotes around the value are kept.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ContextualRule {
    /// Text used in the change description instead of the default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,

    /// Line pattern that opens a window.
    pub anchor: Pattern,

    /// Key whose value is rewritten, e.g. `version`.
    pub field: String,

    /// Value to replace.
    #[serde(deserialize_with = "scalar")]
    pub from: String,

    /// Replacement value.
    #[serde(deserialize_with = "scalar")]
    pub to: String,

    /// Number of lines after the anchor that are inspected.
    #[serde(default = "default_window")]
    pub window: usize,
}

impl ContextualRule {
    /// Creates a rule with the default window.
    pub fn new(
        anchor: Pattern,
        field: impl Into<String>,
        from: impl Into<String>,
        to: impl Into<String>,
    ) -> Self {
        ContextualRule {
            label: None,
            anchor,
            field: field.into(),
            from: from.into(),
            to: to.into(),
            window: default_window(),
        }
    }

    /// Changes the window size.
    pub fn within(mut self, lines: usize) -> Self {
        self.window = lines;
        self
    }

    /// Override the description prefix.
    pub fn labelled(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub(crate) fn summary(&self) -> String {
        format!("{} after {}", self.field, self.anchor)
    }

    pub(crate) fn validate(&self) -> AppResult<()> {
        if self.field.is_empty() || self.from.is_empty() {
            return Err(AppError::General(
                "contextual rule needs a `field` and a `from` value".into(),
            ));
        }
        if self.window == 0 {
            return Err(AppError::General("contextual rule has a zero window".into()));
        }
        Ok(())
    }

    pub(crate) fn apply(&self, text: &str) -> RuleOutcome {
        if self.from == self.to {
            return RuleOutcome::Unmatched;
        }

        let mut out = String::with_capacity(text.len() + 8);
        let mut remaining = 0usize;
        let mut count = 0usize;

        for line in text.split_inclusive('\n') {
            if self.anchor.is_match(line) {
                remaining = self.window;
                out.push_str(line);
                continue;
            }

            if remaining > 0 {
                remaining -= 1;
                if starts_list_item(line) {
                    remaining = 0;
                } else if let Some(rewritten) = self.rewrite_field(line) {
                    out.push_str(&rewritten);
                    count += 1;
                    continue;
                }
            }

            out.push_str(line);
        }

        if count == 0 {
            return RuleOutcome::Unmatched;
        }

        let label = self
            .label
            .clone()
            .unwrap_or_else(|| format!("{} {} → {}", self.field, self.from, self.to));

        RuleOutcome::Applied {
            text: out,
            description: format!("{} ({})", label, occurrences(count)),
        }
    }

    /// Returns the line with the value replaced, if the line is `field: from`.
    fn rewrite_field(&self, line: &str) -> Option<String> {
        let body = line.trim_start();
        let after_key = body.strip_prefix(self.field.as_str())?.strip_prefix(':')?;

        let value = after_key.trim_start_matches([' ', '\t']);
        let value_start = line.len() - value.len();

        let token_len = value
            .find(|c: char| c.is_whitespace() || c == '#')
            .unwrap_or(value.len());
        let token = &value[..token_len];

        let (inner, quote_len) = strip_quotes(token);
        if inner != self.from {
            return None;
        }

        let inner_start = value_start + quote_len;
        let mut out = String::with_capacity(line.len() + self.to.len());
        out.push_str(&line[..inner_start]);
        out.push_str(&self.to);
        out.push_str(&line[inner_start + inner.len()..]);
        Some(out)
    }
}

fn strip_quotes(token: &str) -> (&str, usize) {
    for quote in ['\'', '"'] {
        if token.len() >= 2 && token.starts_with(quote) && token.ends_with(quote) {
            return (&token[1..token.len() - 1], 1);
        }
    }
    (token, 0)
}

fn starts_list_item(line: &str) -> bool {
    let body = line.trim_start();
    body.starts_with("- ") || body.trim_end() == "-"
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pnpm_rule(from: &str, to: &str) -> ContextualRule {
        ContextualRule::new(
            Pattern::regex(r"pnpm/action-setup@v\d+").unwrap(),
            "version",
            from,
            to,
        )
    }

    fn applied(outcome: RuleOutcome) -> (String, String) {
        match outcome {
            RuleOutcome::Applied { text, description } => (text, description),
            other => panic!("expected Applied, got {:?}", other),
        }
    }

    #[test]
    fn test_rewrites_inside_window() {
        let text = "\
      - uses: pnpm/action-setup@v4
        with:
          version: 9
";
        let (out, desc) = applied(pnpm_rule("9", "10").apply(text));
        assert!(out.contains("uses: pnpm/action-setup@v4"));
        assert!(out.contains("          version: 10\n"));
        assert_eq!(desc, "version 9 → 10 (1 occurrence)");
    }

    #[test]
    fn test_leaves_value_outside_window() {
        let text = "\
      - uses: actions/setup-node@v4
        with:
          version: 9
      - uses: pnpm/action-setup@v4
        with:
          version: 9
";
        let (out, _) = applied(pnpm_rule("9", "10").apply(text));
        assert_eq!(
            out,
            "\
      - uses: actions/setup-node@v4
        with:
          version: 9
      - uses: pnpm/action-setup@v4
        with:
          version: 10
"
        );
    }

    #[test]
    fn test_window_closes_at_next_step() {
        let text = "\
      - uses: pnpm/action-setup@v4
      - name: Other
        with:
          version: 9
";
        assert_eq!(pnpm_rule("9", "10").apply(text), RuleOutcome::Unmatched);
    }

    #[test]
    fn test_window_size_is_respected() {
        let text = "\
      - uses: pnpm/action-setup@v4
        with:
          run_install: false
          version: 9
";
        assert_eq!(pnpm_rule("9", "10").within(2).apply(text), RuleOutcome::Unmatched);
        let (out, _) = applied(pnpm_rule("9", "10").within(3).apply(text));
        assert!(out.contains("version: 10"));
    }

    #[test]
    fn test_does_not_touch_longer_values() {
        let text = "      - uses: pnpm/action-setup@v2\n        with:\n          version: 90\n";
        assert_eq!(pnpm_rule("9", "10").apply(text), RuleOutcome::Unmatched);
    }

    #[test]
    fn test_keeps_quotes_and_comments() {
        let text = "  uses: pnpm/action-setup@v2\n  with:\n    version: '8' # pinned\n";
        let (out, _) = applied(pnpm_rule("8", "10").apply(text));
        assert!(out.contains("    version: '10' # pinned\n"));
    }

    #[test]
    fn test_counts_every_anchor() {
        let block = "      - uses: pnpm/action-setup@v2\n        with:\n          version: 8\n";
        let text = format!("{block}{block}");
        let (out, desc) = applied(pnpm_rule("8", "10").apply(&text));
        assert_eq!(out.matches("version: 10").count(), 2);
        assert_eq!(desc, "version 8 → 10 (2 occurrences)");
    }

    #[test]
    fn test_numeric_values_in_yaml() {
        let yaml = "anchor: pnpm/action-setup\nfield: version\nfrom: 8\nto: 10\n";
        let rule: ContextualRule = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(rule.from, "8");
        assert_eq!(rule.to, "10");
        assert_eq!(rule.window, 3);
    }

    #[test]
    fn test_no_trailing_newline() {
        let text = "uses: pnpm/action-setup@v2\nwith:\n  version: 8";
        let (out, _) = applied(pnpm_rule("8", "10").apply(text));
        assert_eq!(out, "uses: pnpm/action-setup@v2\nwith:\n  version: 10");
    }
}
