//! `modrelay daemon` — run the pipeline on a fixed interval.

use std::time::Duration;

use anyhow::{Context, Result};
use clap::Args;

use modrelay_daemon::start_blocking;
use modrelay_sync::RunOptions;

use super::{credentials, GlobalArgs};

/// Arguments for `modrelay daemon`.
#[derive(Args, Debug)]
pub struct DaemonArgs {
    /// Seconds between the start of one run and the next.
    #[arg(long, env = "MODRELAY_INTERVAL_SECS", default_value_t = 3600,
          value_parser = clap::value_parser!(u64).range(1..))]
    pub interval_secs: u64,
}

impl DaemonArgs {
    pub fn run(self, global: &GlobalArgs) -> Result<()> {
        let config = global.run_config()?;
        let credentials = credentials()?;
        start_blocking(
            config,
            credentials,
            RunOptions::default(),
            Duration::from_secs(self.interval_secs),
        )
        .context("scheduler exited with error")
    }
}
