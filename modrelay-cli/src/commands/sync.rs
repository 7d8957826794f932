//! `modrelay sync` — fetch phase only.

use anyhow::Result;
use clap::Args;

use modrelay_sync::RunOptions;

use super::{run::execute, GlobalArgs};

/// Arguments for `modrelay sync`.
#[derive(Args, Debug)]
pub struct SyncArgs {
    /// Resolve and report what would be fetched; download nothing.
    #[arg(long)]
    pub dry_run: bool,
}

impl SyncArgs {
    pub fn run(self, global: &GlobalArgs) -> Result<()> {
        execute(
            global,
            RunOptions {
                sync: true,
                publish: false,
                dry_run: self.dry_run,
            },
        )
    }
}
