#![deny(missing_docs)]

//! # wfpatch CLI
//!
//! Command Line Interface for the workflow patcher.
//!
//! Supported Commands:
//! - `apply`: Runs a policy over a directory of workflow files.
//! - `list`: Lists the available policies.
//! - `show`: Prints a policy in policy-file format.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use wfpatch_core::{AppResult, PolicyCatalog};

mod apply;
mod logging;
mod policy;

#[derive(Parser, Debug)]
#[clap(author, version, about = "Rule-based CI workflow patcher")]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[clap(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// YAML file with extra policies. Same-named built-ins are replaced.
    #[clap(long, global = true, env = "WFPATCH_POLICY_FILE")]
    policy_file: Option<PathBuf>,

    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Apply a policy to every workflow file in a directory.
    Apply(apply::ApplyArgs),
    /// List available policies.
    List,
    /// Print a policy as YAML.
    Show(policy::ShowArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    match execute(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("❌ {}", e);
            ExitCode::FAILURE
        }
    }
}

fn execute(cli: &Cli) -> AppResult<()> {
    let catalog = load_catalog(cli.policy_file.as_deref())?;

    match &cli.command {
        Commands::Apply(args) => apply::execute(args, &catalog),
        Commands::List => {
            print!("{}", policy::render_list(&catalog));
            Ok(())
        }
        Commands::Show(args) => policy::show(args, &catalog),
    }
}

fn load_catalog(policy_file: Option<&Path>) -> AppResult<PolicyCatalog> {
    let mut catalog = PolicyCatalog::builtin()?;
    if let Some(path) = policy_file {
        catalog.merge(PolicyCatalog::load(path)?);
    }
    Ok(catalog)
}
