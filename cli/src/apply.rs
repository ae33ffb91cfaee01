#![deny(missing_docs)]

//! # Apply Command
//!
//! Runs one policy over a workflow directory and prints the report.

use std::path::PathBuf;

use wfpatch_core::{run, AppError, AppResult, PolicyCatalog, Report, RunConfig, RunOptions};

/// Report rendering.
#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable summary.
    Text,
    /// Machine-readable JSON.
    Json,
}

/// Arguments for the apply command.
#[derive(clap::Args, Debug, Clone)]
pub struct ApplyArgs {
    /// Policy to run (see `wfpatch list`).
    #[clap(long, short)]
    pub policy: String,

    /// Directory holding the workflow files (not searched recursively).
    #[clap(long, default_value = ".github/workflows", env = "WFPATCH_DIR")]
    pub dir: PathBuf,

    /// File extension to process. Repeat for several.
    #[clap(long = "ext", default_value = "yml")]
    pub extensions: Vec<String>,

    /// Keep a copy of each rewritten file.
    #[clap(long, conflicts_with = "no_backup")]
    pub backup: bool,

    /// Never keep copies, even if the policy does by default.
    #[clap(long)]
    pub no_backup: bool,

    /// Suffix appended to the file name for backups.
    #[clap(long, default_value = ".bak")]
    pub backup_suffix: String,

    /// Report what would change without writing anything.
    #[clap(long)]
    pub dry_run: bool,

    /// Output format of the report.
    #[clap(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

/// Executes the apply command.
///
/// # Arguments
///
/// * `args` - Command arguments.
/// * `catalog` - Built-in and loaded policies.
pub fn execute(args: &ApplyArgs, catalog: &PolicyCatalog) -> AppResult<()> {
    let config = build_config(args, catalog)?;
    let report = run(&config)?;
    println!("{}", render(&report, &config.options, args.format)?);
    Ok(())
}

/// Formats the report for stdout.
pub fn render(report: &Report, options: &RunOptions, format: OutputFormat) -> AppResult<String> {
    match format {
        OutputFormat::Text => {
            let mut out = report.to_string();
            if options.keep_backup && !options.dry_run && report.files_modified() > 0 {
                out.push_str(&format!(
                    "\nBackups written with the '{}' suffix",
                    options.backup_suffix
                ));
            }
            Ok(out)
        }
        OutputFormat::Json => serde_json::to_string_pretty(report)
            .map_err(|e| AppError::General(format!("Failed to render report: {}", e))),
    }
}

/// Turns flags into a [`RunConfig`].
///
/// `--backup` and `--no-backup` override the policy's own default.
pub fn build_config(args: &ApplyArgs, catalog: &PolicyCatalog) -> AppResult<RunConfig> {
    let rule_set = catalog.get(&args.policy)?.clone();

    let keep_backup = if args.no_backup {
        false
    } else {
        args.backup || rule_set.backup
    };

    Ok(RunConfig {
        directory: args.dir.clone(),
        extensions: args.extensions.clone(),
        rule_set,
        options: RunOptions {
            keep_backup,
            backup_suffix: args.backup_suffix.clone(),
            dry_run: args.dry_run,
        },
    })
}
