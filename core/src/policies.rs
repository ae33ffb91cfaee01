#![deny(missing_docs)]

//! # Policies
//!
//! Named rule sets. Each built-in policy captures one maintenance task
//! with its own pinned versions; the versions deliberately disagree across
//! policies (pnpm 8, 9 and 10; `action-setup` v2 and v4) and are never
//! merged into a single "current" target.
//!
//! Extra policies can be loaded from a YAML file mapping names to rule sets.
//! A loaded policy replaces a built-in one of the same name.

use crate::error::{AppError, AppResult};
use crate::pattern::Pattern;
use crate::rules::{ContextualRule, Gate, InsertionRule, LiteralRule, RuleSet};
use indexmap::IndexMap;
use std::fs;
use std::path::Path;

/// Step inserted by `npm-to-pnpm`.
const INSTALL_PNPM_V4_STEP: &str = "      - name: Install pnpm
        uses: pnpm/action-setup@v4
        with:
          version: 9

";

/// Step inserted by `pnpm-setup-v2`.
const SETUP_PNPM_V2_STEP: &str = "      - name: 📦 Setup pnpm
        uses: pnpm/action-setup@v2
        with:
          version: 8

";

/// Marker for any pnpm setup step.
const PNPM_SETUP_MARKER: &str = "pnpm/action-setup";

/// Matches `pnpm/action-setup` at any major version.
const PNPM_ACTION_ANY: &str = r"pnpm/action-setup@v\d+";

/// Switches npm-based workflows to pnpm.
///
/// The setup step is only inserted where steps sit at the usual 6-space
/// indentation the inserted block uses; other layouts get a warning instead.
pub fn npm_to_pnpm() -> AppResult<RuleSet> {
    let node_step = Pattern::regex(
        r"(?m)^ {6}- name: [^\n]*Setup Node[^\n]*\n {8}uses: actions/setup-node@",
    )?;

    Ok(RuleSet::new("npm-to-pnpm")
        .describe("Use pnpm instead of npm: cache, install commands and a pnpm setup step")
        .gated(Gate::any_of([
            "cache: 'npm'",
            "run: npm ci",
            "run: npm install",
        ]))
        .with_backup()
        .rule(LiteralRule::new("cache: 'npm'", "cache: 'pnpm'").labelled("cache npm → pnpm"))
        .rule(
            LiteralRule::new("run: npm ci", "run: pnpm install --frozen-lockfile")
                .at_line_end()
                .labelled("npm ci → pnpm install --frozen-lockfile"),
        )
        .rule(
            LiteralRule::new("run: npm install", "run: pnpm install")
                .at_line_end()
                .labelled("npm install → pnpm install"),
        )
        .rule(
            InsertionRule::new(node_step, PNPM_SETUP_MARKER, INSTALL_PNPM_V4_STEP)
                .labelled("Added pnpm setup step before Node.js setup"),
        ))
}

/// Adds a `pnpm/action-setup@v2` step before every `setup-node@v4` step of
/// workflows that already cache pnpm.
pub fn pnpm_setup_v2() -> AppResult<RuleSet> {
    let node_step = Pattern::regex(
        r"(?m)^ {6}- name: [^\n]+Setup Node[^\n]*\n {8}uses: actions/setup-node@v4",
    )?;

    Ok(RuleSet::new("pnpm-setup-v2")
        .describe("Insert a pnpm/action-setup@v2 step before setup-node in pnpm-cached workflows")
        .gated(Gate::any_of(["cache: 'pnpm'"]))
        .rule(
            InsertionRule::new(node_step, PNPM_SETUP_MARKER, SETUP_PNPM_V2_STEP)
                .everywhere()
                .labelled("Added pnpm setup"),
        ))
}

/// Bumps pnpm 8 to 10 under `pnpm/action-setup@v2`.
pub fn pnpm_8_to_10() -> AppResult<RuleSet> {
    Ok(RuleSet::new("pnpm-8-to-10")
        .describe("Bump pnpm version 8 → 10 for pnpm/action-setup@v2 steps")
        .gated(Gate::any_of([PNPM_SETUP_MARKER]))
        .rule(ContextualRule::new(
            Pattern::literal("uses: pnpm/action-setup@v2")?,
            "version",
            "8",
            "10",
        )))
}

/// Bumps pnpm 9 to 10 under any `pnpm/action-setup` version.
pub fn pnpm_9_to_10() -> AppResult<RuleSet> {
    Ok(RuleSet::new("pnpm-9-to-10")
        .describe("Bump pnpm version 9 → 10 for pnpm/action-setup steps")
        .gated(Gate::any_of([PNPM_SETUP_MARKER]))
        .rule(ContextualRule::new(
            Pattern::regex(PNPM_ACTION_ANY)?,
            "version",
            "9",
            "10",
        )))
}

/// Pins `pnpm/action-setup` to v2 and bumps pnpm 9 to 10.
pub fn pnpm_action_v2() -> AppResult<RuleSet> {
    Ok(RuleSet::new("pnpm-action-v2")
        .describe("Downgrade pnpm/action-setup v4 → v2 and bump pnpm 9 → 10")
        .rule(
            LiteralRule::new("pnpm/action-setup@v4", "pnpm/action-setup@v2")
                .labelled("Updated action version v4 → v2"),
        )
        .rule(
            ContextualRule::new(Pattern::regex(PNPM_ACTION_ANY)?, "version", "9", "10")
                .labelled("Updated pnpm version 9 → 10"),
        ))
}

/// Ordered collection of named policies.
#[derive(Debug, Clone, Default)]
pub struct PolicyCatalog {
    policies: IndexMap<String, RuleSet>,
}

impl PolicyCatalog {
    /// The built-in policies.
    pub fn builtin() -> AppResult<Self> {
        let mut catalog = PolicyCatalog::default();
        for policy in [
            npm_to_pnpm()?,
            pnpm_setup_v2()?,
            pnpm_8_to_10()?,
            pnpm_9_to_10()?,
            pnpm_action_v2()?,
        ] {
            catalog.insert(policy);
        }
        Ok(catalog)
    }

    /// Parses a YAML mapping of policy name to rule set.
    pub fn from_yaml(yaml: &str) -> AppResult<Self> {
        let parsed: IndexMap<String, RuleSet> = serde_yaml::from_str(yaml)?;
        let mut catalog = PolicyCatalog::default();
        for (name, mut rule_set) in parsed {
            rule_set.name = name;
            rule_set.validate()?;
            catalog.insert(rule_set);
        }
        Ok(catalog)
    }

    /// Reads a policy file from disk.
    pub fn load(path: &Path) -> AppResult<Self> {
        let yaml = fs::read_to_string(path).map_err(|e| {
            AppError::General(format!("Failed to read policy file {}: {}", path.display(), e))
        })?;
        Self::from_yaml(&yaml)
    }

    /// Adds or replaces a policy.
    pub fn insert(&mut self, rule_set: RuleSet) {
        self.policies.insert(rule_set.name.clone(), rule_set);
    }

    /// Adds every policy of `other`, replacing same-named ones.
    pub fn merge(&mut self, other: PolicyCatalog) {
        for (_, rule_set) in other.policies {
            self.insert(rule_set);
        }
    }

    /// Looks up a policy by name.
    pub fn get(&self, name: &str) -> AppResult<&RuleSet> {
        self.policies
            .get(name)
            .ok_or_else(|| AppError::UnknownPolicy(name.to_string()))
    }

    /// Policies in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &RuleSet> {
        self.policies.values()
    }

    /// Renders one policy in the policy-file format.
    pub fn to_yaml(&self, name: &str) -> AppResult<String> {
        let rule_set = self.get(name)?;
        let mut single = IndexMap::new();
        single.insert(name, rule_set);
        Ok(serde_yaml::to_string(&single)?)
    }
}
