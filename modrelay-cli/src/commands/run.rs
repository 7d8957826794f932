//! `modrelay run` — sync then publish.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use modrelay_sync::{pipeline, PublishOutcome, RunOptions, RunReport, SyncOutcome};

use super::{credentials, GlobalArgs};

/// Arguments for `modrelay run`.
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Resolve and report without downloading, uploading, or saving state.
    #[arg(long)]
    pub dry_run: bool,

    /// Skip the sync phase.
    #[arg(long, conflicts_with = "skip_publish")]
    pub skip_sync: bool,

    /// Skip the publish phase.
    #[arg(long)]
    pub skip_publish: bool,
}

impl RunArgs {
    pub fn run(self, global: &GlobalArgs) -> Result<()> {
        execute(
            global,
            RunOptions {
                sync: !self.skip_sync,
                publish: !self.skip_publish,
                dry_run: self.dry_run,
            },
        )
    }
}

/// Validate configuration, run the requested phases, print the outcome.
pub(crate) fn execute(global: &GlobalArgs, options: RunOptions) -> Result<()> {
    // Both checks happen before any network activity or state access.
    let config = global.run_config()?;
    let credentials = credentials()?;

    let report = pipeline::run_with_network(&config, &credentials, options).context("run aborted")?;
    print_report(&report, options.dry_run);
    Ok(())
}

pub(crate) fn print_report(report: &RunReport, dry_run: bool) {
    let prefix = if dry_run { "[dry-run] " } else { "" };

    if let Some(err) = &report.catalog_error {
        println!("{prefix}{} catalog unavailable: {err}", "✗".red());
    }

    if let Some(sync) = &report.sync {
        for m in &sync.modules {
            let line = match &m.outcome {
                SyncOutcome::NotFound => {
                    format!("{} '{}' not found at source", "·".bright_black(), m.module)
                }
                SyncOutcome::Current { version } => {
                    format!("{} '{}' current ({version})", "✓".green(), m.module)
                }
                SyncOutcome::Fetched { version, bytes, .. } => {
                    format!("{} '{}' fetched {version} ({bytes} bytes)", "↓".cyan(), m.module)
                }
                SyncOutcome::WouldFetch { version, file_name } => {
                    format!("{} '{}' would fetch {version} as {file_name}", "↓".cyan(), m.module)
                }
                SyncOutcome::FetchFailed { reason, .. } => {
                    format!("{} '{}' fetch failed: {reason}", "✗".red(), m.module)
                }
            };
            println!("{prefix}{line}");
        }
        println!(
            "{prefix}sync: {} fetched, {} failed",
            sync.fetched(),
            sync.failed()
        );
    }

    if let Some(publish) = &report.publish {
        for m in &publish.modules {
            let line = match &m.outcome {
                PublishOutcome::AlreadyLive => continue,
                PublishOutcome::MissingVersion => {
                    format!("{} '{}' has no version id", "!".yellow(), m.module)
                }
                PublishOutcome::MissingFile { file_name } => {
                    format!("{} '{}' missing from cache: {file_name}", "✗".red(), m.module)
                }
                PublishOutcome::Published {
                    version,
                    message_id,
                    replaced,
                } => match replaced {
                    Some(old) => format!(
                        "{} '{}' published {version} as #{message_id} (replaced #{old})",
                        "↑".cyan(),
                        m.module
                    ),
                    None => format!(
                        "{} '{}' published {version} as #{message_id}",
                        "↑".cyan(),
                        m.module
                    ),
                },
                PublishOutcome::WouldPublish { version } => {
                    format!("{} '{}' would publish {version}", "↑".cyan(), m.module)
                }
                PublishOutcome::CaptionFailed { reason } => {
                    format!("{} '{}' caption failed: {reason}", "✗".red(), m.module)
                }
                PublishOutcome::UploadFailed { reason } => {
                    format!("{} '{}' upload failed: {reason}", "✗".red(), m.module)
                }
            };
            println!("{prefix}{line}");
        }
        println!(
            "{prefix}publish: {} published, {} failed",
            publish.published(),
            publish.failed()
        );
    }
}
