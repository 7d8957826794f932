//! `modrelay status` — offline view of what has been fetched and published.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

use modrelay_core::catalog;
use modrelay_sync::{state_store, status, ModuleStatus, StatusRow};

use super::GlobalArgs;

/// Arguments for `modrelay status`.
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

impl StatusArgs {
    pub fn run(self, global: &GlobalArgs) -> Result<()> {
        let cache_dir = global.cache_dir()?;
        let state =
            state_store::load_at(&global.state_dir).context("failed to load state document")?;
        let catalog = match catalog::load_at(&global.catalog) {
            Ok(c) => Some(c),
            Err(err) => {
                tracing::warn!(error = %err, "catalog unavailable; showing stored state only");
                None
            }
        };

        let rows = status::check(catalog.as_ref(), &state, &cache_dir);
        if self.json {
            return print_json(rows);
        }
        print_table(rows);
        Ok(())
    }
}

#[derive(Serialize)]
struct StatusReportJson {
    summary: StatusSummaryJson,
    modules: Vec<StatusRow>,
}

#[derive(Serialize)]
struct StatusSummaryJson {
    modules: usize,
    current: usize,
    pending_publish: usize,
    never_fetched: usize,
    missing_file: usize,
}

#[derive(Tabled)]
struct StatusTableRow {
    #[tabled(rename = "module")]
    module: String,
    #[tabled(rename = "status")]
    status: String,
    #[tabled(rename = "fetched")]
    fetched: String,
    #[tabled(rename = "live")]
    live: String,
    #[tabled(rename = "date")]
    date: String,
}

fn count(rows: &[StatusRow], status: ModuleStatus) -> usize {
    rows.iter().filter(|r| r.status == status).count()
}

fn print_json(rows: Vec<StatusRow>) -> Result<()> {
    let payload = StatusReportJson {
        summary: StatusSummaryJson {
            modules: rows.len(),
            current: count(&rows, ModuleStatus::Current),
            pending_publish: count(&rows, ModuleStatus::PendingPublish),
            never_fetched: count(&rows, ModuleStatus::NeverFetched),
            missing_file: count(&rows, ModuleStatus::MissingFile),
        },
        modules: rows,
    };
    println!(
        "{}",
        serde_json::to_string_pretty(&payload).context("failed to serialize status JSON")?
    );
    Ok(())
}

fn print_table(rows: Vec<StatusRow>) {
    println!(
        "modrelay v{} | {} modules | {} pending publish | {} missing file",
        env!("CARGO_PKG_VERSION"),
        rows.len(),
        count(&rows, ModuleStatus::PendingPublish),
        count(&rows, ModuleStatus::MissingFile),
    );

    if rows.is_empty() {
        println!("No modules in catalog or state.");
        return;
    }

    println!(
        "Indicators: {} CURRENT  {} PENDING  {} MISSING FILE  {} NEVER FETCHED",
        indicator(ModuleStatus::Current),
        indicator(ModuleStatus::PendingPublish),
        indicator(ModuleStatus::MissingFile),
        indicator(ModuleStatus::NeverFetched),
    );

    let needs_publish = count(&rows, ModuleStatus::PendingPublish) > 0;
    let table_rows: Vec<StatusTableRow> = rows
        .into_iter()
        .map(|row| {
            let mut module = row.module.0;
            if !row.in_catalog {
                module.push_str(" (not in catalog)");
            } else if !row.enabled {
                module.push_str(" (disabled)");
            }
            StatusTableRow {
                module,
                status: format!("{} {}", indicator(row.status), label(row.status)),
                fetched: row.fetched_version.map(|v| v.0).unwrap_or_else(|| "-".into()),
                live: match (row.published_version, row.message_id) {
                    (Some(v), Some(id)) => format!("{v} (#{id})"),
                    _ => "-".into(),
                },
                date: row.date.unwrap_or_else(|| "-".into()),
            }
        })
        .collect();
    let mut table = Table::new(table_rows);
    table.with(Style::rounded());
    println!("{table}");

    if needs_publish {
        println!("Run 'modrelay publish' to upload pending modules.");
    }
}

fn label(status: ModuleStatus) -> &'static str {
    match status {
        ModuleStatus::NeverFetched => "NEVER FETCHED",
        ModuleStatus::MissingFile => "MISSING FILE",
        ModuleStatus::PendingPublish => "PENDING",
        ModuleStatus::Current => "CURRENT",
    }
}

fn indicator(status: ModuleStatus) -> String {
    match status {
        ModuleStatus::NeverFetched => "■".bright_black().bold().to_string(),
        ModuleStatus::MissingFile => "■".red().bold().to_string(),
        ModuleStatus::PendingPublish => "■".yellow().bold().to_string(),
        ModuleStatus::Current => "■".green().bold().to_string(),
    }
}
