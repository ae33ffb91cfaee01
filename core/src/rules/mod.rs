#![deny(missing_docs)]

//! # Rules
//!
//! A rule is a match condition paired with a text transformation. Rule sets
//! run their rules in order against the *current* text, so a later rule sees
//! whatever an earlier rule inserted or rewrote.
//!
//! - **literal**: replace every occurrence of a string.
//! - **contextual**: rewrite a `field: value` only near an anchor line.
//! - **insertion**: insert a block before an anchor unless a marker exists.
//!
//! A [`Gate`] on the rule set short-circuits all rules for files that lack
//! every precondition substring.

use crate::error::{AppError, AppResult};
use crate::state::ChangeLog;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Contextual substitution (value near an anchor).
pub mod contextual;

/// Conditional block insertion.
pub mod insertion;

/// Literal substitution.
pub mod literal;

pub use contextual::ContextualRule;
pub use insertion::InsertionRule;
pub use literal::LiteralRule;

/// A single rewrite rule.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Rule {
    /// Replace every occurrence of a string.
    Literal(LiteralRule),
    /// Replace a field value within a window after an anchor.
    Contextual(ContextualRule),
    /// Insert a block before an anchor unless a marker is present.
    Insertion(InsertionRule),
}

/// What a single rule did to the text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleOutcome {
    /// The rule matched and produced new text.
    Applied {
        /// The rewritten text.
        text: String,
        /// Human-readable change description.
        description: String,
    },
    /// The match condition did not hold. Not an error.
    Unmatched,
    /// The rule could not run on this file (e.g. missing anchor).
    Warning(String),
}

impl Rule {
    /// Applies the rule to `text`.
    pub fn apply(&self, text: &str) -> RuleOutcome {
        match self {
            Rule::Literal(rule) => rule.apply(text),
            Rule::Contextual(rule) => rule.apply(text),
            Rule::Insertion(rule) => rule.apply(text),
        }
    }

    /// Short name used in logs.
    pub fn summary(&self) -> String {
        match self {
            Rule::Literal(rule) => rule.summary(),
            Rule::Contextual(rule) => rule.summary(),
            Rule::Insertion(rule) => rule.summary(),
        }
    }

    fn validate(&self) -> AppResult<()> {
        match self {
            Rule::Literal(rule) => rule.validate(),
            Rule::Contextual(rule) => rule.validate(),
            Rule::Insertion(rule) => rule.validate(),
        }
    }
}

/// Precondition for a whole rule set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Gate {
    /// The file must contain at least one of these substrings.
    pub any_of: Vec<String>,
}

impl Gate {
    /// Builds a gate from a list of substrings.
    pub fn any_of<I, S>(needles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Gate {
            any_of: needles.into_iter().map(Into::into).collect(),
        }
    }

    /// True if `text` satisfies the precondition. An empty gate admits everything.
    pub fn admits(&self, text: &str) -> bool {
        self.any_of.is_empty() || self.any_of.iter().any(|needle| text.contains(needle.as_str()))
    }
}

/// An ordered, named set of rules (a policy).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RuleSet {
    /// Policy name. Filled in from the catalog key.
    #[serde(skip)]
    pub name: String,

    /// One-line description shown by `list`.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,

    /// Optional precondition; files failing it are skipped entirely.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gate: Option<Gate>,

    /// Whether runs of this policy keep `.bak` copies unless told otherwise.
    #[serde(default)]
    pub backup: bool,

    /// Rules, applied in order.
    pub rules: Vec<Rule>,
}

impl RuleSet {
    /// Creates an empty rule set.
    pub fn new(name: impl Into<String>) -> Self {
        RuleSet {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Sets the description.
    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Sets the gate.
    pub fn gated(mut self, gate: Gate) -> Self {
        self.gate = Some(gate);
        self
    }

    /// Makes backups the default for this policy.
    pub fn with_backup(mut self) -> Self {
        self.backup = true;
        self
    }

    /// Appends a rule.
    pub fn rule(mut self, rule: impl Into<Rule>) -> Self {
        self.rules.push(rule.into());
        self
    }

    /// Rejects rule sets whose rules could never behave idempotently.
    pub fn validate(&self) -> AppResult<()> {
        if self.rules.is_empty() {
            return Err(AppError::General(format!(
                "Policy '{}' has no rules",
                self.name
            )));
        }
        for rule in &self.rules {
            rule.validate().map_err(|e| {
                AppError::General(format!("Policy '{}': {}", self.name, e))
            })?;
        }
        Ok(())
    }
}

impl From<LiteralRule> for Rule {
    fn from(rule: LiteralRule) -> Self {
        Rule::Literal(rule)
    }
}

impl From<ContextualRule> for Rule {
    fn from(rule: ContextualRule) -> Self {
        Rule::Contextual(rule)
    }
}

impl From<InsertionRule> for Rule {
    fn from(rule: InsertionRule) -> Self {
        Rule::Insertion(rule)
    }
}

/// Result of running a rule set over one text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Application {
    /// Final text after every rule ran.
    pub text: String,
    /// What changed, and what was skipped with a warning.
    pub log: ChangeLog,
    /// True if the gate rejected the text and no rule ran.
    pub gated_out: bool,
}

/// Runs `rules` over `text` in order.
///
/// Each rule sees the output of the previous one. The input is never
/// modified; the caller decides whether to persist `Application::text`.
pub fn apply_rules(text: &str, rules: &RuleSet) -> Application {
    let mut log = ChangeLog::default();

    if let Some(gate) = &rules.gate {
        if !gate.admits(text) {
            debug!(policy = %rules.name, "gate not met, skipping all rules");
            return Application {
                text: text.to_string(),
                log,
                gated_out: true,
            };
        }
    }

    let mut current = text.to_string();
    for rule in &rules.rules {
        match rule.apply(&current) {
            RuleOutcome::Applied { text, description } => {
                debug!(rule = %rule.summary(), "{}", description);
                current = text;
                log.changes.push(description);
            }
            RuleOutcome::Unmatched => {
                debug!(rule = %rule.summary(), "rule did not match");
            }
            RuleOutcome::Warning(message) => {
                warn!(rule = %rule.summary(), "{}", message);
                log.warnings.push(message);
            }
        }
    }

    Application {
        text: current,
        log,
        gated_out: false,
    }
}

/// Formats `n occurrence(s)`.
pub(crate) fn occurrences(n: usize) -> String {
    if n == 1 {
        "1 occurrence".to_string()
    } else {
        format!("{} occurrences", n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pattern::Pattern;

    fn bump_set() -> RuleSet {
        RuleSet::new("bump")
            .gated(Gate::any_of(["pnpm/action-setup"]))
            .rule(LiteralRule::new("pnpm/action-setup@v4", "pnpm/action-setup@v2"))
            .rule(ContextualRule::new(
                Pattern::regex(r"pnpm/action-setup@v\d+").unwrap(),
                "version",
                "9",
                "10",
            ))
    }

    #[test]
    fn test_gate_admits() {
        let gate = Gate::any_of(["cache: 'npm'", "run: npm ci"]);
        assert!(gate.admits("run: npm ci\n"));
        assert!(!gate.admits("run: pnpm install\n"));
        assert!(Gate::default().admits("anything"));
    }

    #[test]
    fn test_gated_out_text_is_untouched() {
        let text = "uses: actions/checkout@v4\nversion: 9\n";
        let app = apply_rules(text, &bump_set());
        assert!(app.gated_out);
        assert_eq!(app.text, text);
        assert!(app.log.changes.is_empty());
    }

    #[test]
    fn test_rules_run_in_order() {
        // The contextual rule only matches after the literal rewrite when anchored on @v2.
        let set = RuleSet::new("ordered")
            .rule(LiteralRule::new("pnpm/action-setup@v4", "pnpm/action-setup@v2"))
            .rule(ContextualRule::new(
                Pattern::literal("pnpm/action-setup@v2").unwrap(),
                "version",
                "9",
                "10",
            ));
        let text = "      - uses: pnpm/action-setup@v4\n        with:\n          version: 9\n";
        let app = apply_rules(text, &set);
        assert_eq!(
            app.text,
            "      - uses: pnpm/action-setup@v2\n        with:\n          version: 10\n"
        );
        assert_eq!(app.log.changes.len(), 2);
    }

    #[test]
    fn test_apply_twice_is_stable() {
        let text = "      - uses: pnpm/action-setup@v4\n        with:\n          version: 9\n";
        let first = apply_rules(text, &bump_set());
        let second = apply_rules(&first.text, &bump_set());
        assert_eq!(first.text, second.text);
        assert!(second.log.changes.is_empty());
    }

    #[test]
    fn test_validate_rejects_empty_set() {
        assert!(RuleSet::new("empty").validate().is_err());
        assert!(bump_set().validate().is_ok());
    }

    #[test]
    fn test_occurrences() {
        assert_eq!(occurrences(1), "1 occurrence");
        assert_eq!(occurrences(3), "3 occurrences");
    }
}
