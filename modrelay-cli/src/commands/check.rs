//! `modrelay check` — validate the module catalog without touching the network.

use anyhow::{bail, Context, Result};
use clap::Args;
use colored::Colorize;

use modrelay_core::catalog;
use modrelay_sources::compile_filter;

use super::GlobalArgs;

/// Arguments for `modrelay check`.
#[derive(Args, Debug)]
pub struct CheckArgs {}

impl CheckArgs {
    pub fn run(self, global: &GlobalArgs) -> Result<()> {
        let catalog = catalog::load_at(&global.catalog)
            .with_context(|| format!("catalog at {} is not usable", global.catalog.display()))?;

        let mut problems = 0usize;
        for skipped in catalog.skipped() {
            problems += 1;
            let name = skipped.name.as_deref().unwrap_or("<unnamed>");
            println!(
                "{} entry #{} '{name}' ignored: {}",
                "✗".red(),
                skipped.index,
                skipped.reason
            );
        }

        for module in catalog.modules() {
            if let Some(filter) = module.source.asset_filter() {
                if let Err(err) = compile_filter(filter) {
                    problems += 1;
                    println!("{} '{}': {err}", "✗".red(), module.name);
                }
            }
        }

        let enabled = catalog.enabled().len();
        println!(
            "{} modules ({} enabled, {} disabled)",
            catalog.modules().len(),
            enabled,
            catalog.modules().len() - enabled
        );

        if problems > 0 {
            bail!("{problems} problem(s) in {}", global.catalog.display());
        }
        println!("{} catalog OK", "✓".green());
        Ok(())
    }
}
