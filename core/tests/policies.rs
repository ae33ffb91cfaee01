use pretty_assertions::assert_eq;
use std::fs;
use tempfile::tempdir;
use wfpatch_core::policies::{npm_to_pnpm, pnpm_8_to_10, pnpm_9_to_10, pnpm_action_v2, pnpm_setup_v2};
use wfpatch_core::{apply_rules, backup_path, run, FileStatus, RunConfig, RunOptions};

const NPM_WORKFLOW: &str = r#"name: CI

on: [push]

jobs:
  test:
    runs-on: ubuntu-latest
    steps:
      - uses: actions/checkout@v4

      - name: Setup Node.js
        uses: actions/setup-node@v4
        with:
          node-version: 20
          cache: 'npm'

      - name: Install dependencies
        run: npm ci

      - name: Install CLI
        run: npm install -g vercel
"#;

const PNPM_WORKFLOW: &str = r#"name: CI

on: [push]

jobs:
  test:
    runs-on: ubuntu-latest
    steps:
      - uses: actions/checkout@v4

      - name: Install pnpm
        uses: pnpm/action-setup@v4
        with:
          version: 9

      - name: Setup Node.js
        uses: actions/setup-node@v4
        with:
          node-version: 20
          cache: 'pnpm'

      - name: Install dependencies
        run: pnpm install --frozen-lockfile
"#;

#[test]
fn test_npm_to_pnpm_end_to_end() {
    let policy = npm_to_pnpm().unwrap();
    let app = apply_rules(NPM_WORKFLOW, &policy);

    let expected = r#"name: CI

on: [push]

jobs:
  test:
    runs-on: ubuntu-latest
    steps:
      - uses: actions/checkout@v4

      - name: Install pnpm
        uses: pnpm/action-setup@v4
        with:
          version: 9

      - name: Setup Node.js
        uses: actions/setup-node@v4
        with:
          node-version: 20
          cache: 'pnpm'

      - name: Install dependencies
        run: pnpm install --frozen-lockfile

      - name: Install CLI
        run: npm install -g vercel
"#;

    assert_eq!(app.text, expected);
    assert_eq!(
        app.log.changes,
        vec![
            "cache npm → pnpm (1 occurrence)".to_string(),
            "npm ci → pnpm install --frozen-lockfile (1 occurrence)".to_string(),
            "Added pnpm setup step before Node.js setup".to_string(),
        ]
    );
    assert!(app.log.warnings.is_empty());
}

#[test]
fn test_npm_to_pnpm_is_idempotent() {
    let policy = npm_to_pnpm().unwrap();
    let once = apply_rules(NPM_WORKFLOW, &policy);
    let twice = apply_rules(&once.text, &policy);
    assert_eq!(twice.text, once.text);
    assert!(twice.log.changes.is_empty());
}

#[test]
fn test_npm_to_pnpm_warns_without_node_step() {
    let text = "    steps:\n      - name: Install\n        run: npm ci\n";
    let app = apply_rules(text, &npm_to_pnpm().unwrap());
    assert_eq!(
        app.text,
        "    steps:\n      - name: Install\n        run: pnpm install --frozen-lockfile\n"
    );
    assert_eq!(app.log.changes.len(), 1);
    assert_eq!(app.log.warnings.len(), 1);
    assert!(app.log.warnings[0].contains("not found"));
}

#[test]
fn test_npm_to_pnpm_skips_insertion_at_other_indentation() {
    let text = "  steps:\n    - name: Setup Node.js\n      uses: actions/setup-node@v4\n      with:\n        cache: 'npm'\n";
    let app = apply_rules(text, &npm_to_pnpm().unwrap());
    assert_eq!(
        app.text,
        "  steps:\n    - name: Setup Node.js\n      uses: actions/setup-node@v4\n      with:\n        cache: 'pnpm'\n"
    );
    assert_eq!(app.log.changes, vec!["cache npm → pnpm (1 occurrence)".to_string()]);
    assert_eq!(app.log.warnings.len(), 1);
}

#[test]
fn test_version_bump_keeps_action_version() {
    let app = apply_rules(PNPM_WORKFLOW, &pnpm_9_to_10().unwrap());
    assert!(app.text.contains("uses: pnpm/action-setup@v4\n        with:\n          version: 10\n"));
    assert_eq!(app.log.changes, vec!["version 9 → 10 (1 occurrence)".to_string()]);
    // node-version: 20 lives in another step and is untouched
    assert!(app.text.contains("node-version: 20"));
}

#[test]
fn test_pnpm_action_v2_rewrites_both() {
    let app = apply_rules(PNPM_WORKFLOW, &pnpm_action_v2().unwrap());
    assert!(app.text.contains("uses: pnpm/action-setup@v2\n        with:\n          version: 10\n"));
    assert_eq!(
        app.log.changes,
        vec![
            "Updated action version v4 → v2 (1 occurrence)".to_string(),
            "Updated pnpm version 9 → 10 (1 occurrence)".to_string(),
        ]
    );
}

#[test]
fn test_pnpm_8_to_10_only_under_v2() {
    let text = "\
      - uses: pnpm/action-setup@v2
        with:
          version: 8
      - uses: pnpm/action-setup@v4
        with:
          version: 8
";
    let app = apply_rules(text, &pnpm_8_to_10().unwrap());
    assert_eq!(app.text.matches("version: 10").count(), 1);
    assert_eq!(app.text.matches("version: 8").count(), 1);
}

#[test]
fn test_pnpm_setup_v2_inserts_before_each_node_step() {
    let text = r#"jobs:
  lint:
    steps:
      - name: 🔧 Setup Node.js
        uses: actions/setup-node@v4
        with:
          cache: 'pnpm'
  test:
    steps:
      - name: 🔧 Setup Node.js
        uses: actions/setup-node@v4
        with:
          cache: 'pnpm'
"#;
    let policy = pnpm_setup_v2().unwrap();
    let app = apply_rules(text, &policy);
    assert_eq!(app.text.matches("uses: pnpm/action-setup@v2").count(), 2);
    assert_eq!(app.log.changes, vec!["Added pnpm setup (2 locations)".to_string()]);

    let again = apply_rules(&app.text, &policy);
    assert_eq!(again.text, app.text);
}

#[test]
fn test_gated_file_is_byte_identical_after_run() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("docs.yml");
    let content = "name: Docs\njobs:\n  build:\n    steps:\n      - run: cargo doc\n";
    fs::write(&path, content).unwrap();

    let report = run(&RunConfig::new(dir.path(), npm_to_pnpm().unwrap())).unwrap();

    assert_eq!(report.files()[0].status, FileStatus::Skipped);
    assert_eq!(fs::read_to_string(&path).unwrap(), content);
}

#[test]
fn test_run_twice_reports_no_changes() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("ci.yml"), PNPM_WORKFLOW).unwrap();
    fs::write(dir.path().join("notes.txt"), "version: 9").unwrap();

    let config = RunConfig::new(dir.path(), pnpm_9_to_10().unwrap());
    let first = run(&config).unwrap();
    assert_eq!(first.files_scanned(), 1);
    assert_eq!(first.files_modified(), 1);

    let second = run(&config).unwrap();
    assert_eq!(second.files_modified(), 0);
    assert_eq!(second.files()[0].status, FileStatus::Unchanged);
    assert!(second.to_string().contains("ci.yml - no changes needed"));
}

#[test]
fn test_npm_to_pnpm_rerun_reports_no_changes() {
    let dir = tempdir().unwrap();
    // still mentions `run: npm install` after conversion, so the gate holds
    fs::write(dir.path().join("ci.yml"), NPM_WORKFLOW).unwrap();
    // fully converted, so the gate no longer holds
    let release = NPM_WORKFLOW.replace("        run: npm install -g vercel\n", "        run: ls\n");
    fs::write(dir.path().join("release.yml"), &release).unwrap();

    let mut config = RunConfig::new(dir.path(), npm_to_pnpm().unwrap());
    config.options.keep_backup = false;
    assert_eq!(run(&config).unwrap().files_modified(), 2);
    let converted = fs::read_to_string(dir.path().join("release.yml")).unwrap();

    let second = run(&config).unwrap();
    assert_eq!(second.files_modified(), 0);
    assert_eq!(second.files()[0].status, FileStatus::Unchanged);
    assert_eq!(second.files()[1].status, FileStatus::Skipped);

    let text = second.to_string();
    assert!(text.contains("• ci.yml - no changes needed\n"));
    assert!(text.contains("• release.yml - no changes needed (precondition not met)\n"));
    assert_eq!(fs::read_to_string(dir.path().join("release.yml")).unwrap(), converted);
}

#[test]
fn test_policy_backup_and_dry_run() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("ci.yml");
    fs::write(&path, NPM_WORKFLOW).unwrap();

    let policy = npm_to_pnpm().unwrap();
    let mut config = RunConfig::new(dir.path(), policy.clone());
    config.options = RunOptions {
        keep_backup: policy.backup,
        dry_run: true,
        ..RunOptions::default()
    };

    let dry = run(&config).unwrap();
    assert_eq!(dry.files_modified(), 1);
    assert_eq!(fs::read_to_string(&path).unwrap(), NPM_WORKFLOW);
    assert!(!backup_path(&path, ".bak").exists());

    config.options.dry_run = false;
    run(&config).unwrap();
    assert_eq!(fs::read_to_string(backup_path(&path, ".bak")).unwrap(), NPM_WORKFLOW);
    assert!(fs::read_to_string(&path).unwrap().contains("cache: 'pnpm'"));
}
