#![deny(missing_docs)]

//! # Policy Commands
//!
//! `list` and `show`.

use wfpatch_core::{AppResult, PolicyCatalog};

/// Arguments for the show command.
#[derive(clap::Args, Debug, Clone)]
pub struct ShowArgs {
    /// Policy name.
    pub name: String,
}

/// One line per policy: name, padded, then description.
pub fn render_list(catalog: &PolicyCatalog) -> String {
    let width = catalog.iter().map(|p| p.name.len()).max().unwrap_or(0);
    let mut out = String::new();
    for policy in catalog.iter() {
        out.push_str(&format!(
            "{:<width$}  {}\n",
            policy.name,
            policy.description,
            width = width
        ));
    }
    out
}

/// Prints a policy in the policy-file format.
pub fn show(args: &ShowArgs, catalog: &PolicyCatalog) -> AppResult<()> {
    print!("{}", catalog.to_yaml(&args.name)?);
    Ok(())
}
