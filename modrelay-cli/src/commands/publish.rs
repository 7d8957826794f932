//! `modrelay publish` — upload phase only.

use anyhow::Result;
use clap::Args;

use modrelay_sync::RunOptions;

use super::{run::execute, GlobalArgs};

/// Arguments for `modrelay publish`.
#[derive(Args, Debug)]
pub struct PublishArgs {
    /// Report what would be uploaded; delete and upload nothing.
    #[arg(long)]
    pub dry_run: bool,
}

impl PublishArgs {
    pub fn run(self, global: &GlobalArgs) -> Result<()> {
        execute(
            global,
            RunOptions {
                sync: false,
                publish: true,
                dry_run: self.dry_run,
            },
        )
    }
}
