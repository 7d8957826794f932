//! modrelay — track module releases and republish them to a broadcast channel.
//!
//! # Usage
//!
//! ```text
//! modrelay run [--dry-run] [--skip-sync] [--skip-publish]
//! modrelay sync [--dry-run]
//! modrelay publish [--dry-run]
//! modrelay status [--json]
//! modrelay check
//! modrelay daemon [--interval-secs N]
//! ```
//!
//! Secrets come from the environment only: `MODRELAY_BOT_TOKEN` (required
//! for network commands) and `GIT_API_TOKEN` (optional).

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{
    check::CheckArgs, daemon::DaemonArgs, publish::PublishArgs, run::RunArgs, status::StatusArgs,
    sync::SyncArgs, GlobalArgs,
};

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "modrelay",
    version,
    about = "Fetch new module releases and republish them to a broadcast channel",
    long_about = None,
)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    /// Emit log lines as JSON.
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Sync then publish: the scheduled job.
    Run(RunArgs),

    /// Resolve and fetch new versions into the cache; no uploads.
    Sync(SyncArgs),

    /// Upload fetched versions that are not live yet; no resolution.
    Publish(PublishArgs),

    /// Show per-module state from the catalog, state document, and cache.
    Status(StatusArgs),

    /// Validate the module catalog.
    Check(CheckArgs),

    /// Run the pipeline on a fixed interval until ctrl-c.
    Daemon(DaemonArgs),
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    let cli = Cli::parse();
    modrelay_daemon::init_tracing(cli.log_json);

    match cli.command {
        Commands::Run(args) => args.run(&cli.global),
        Commands::Sync(args) => args.run(&cli.global),
        Commands::Publish(args) => args.run(&cli.global),
        Commands::Status(args) => args.run(&cli.global),
        Commands::Check(args) => args.run(&cli.global),
        Commands::Daemon(args) => args.run(&cli.global),
    }
}
