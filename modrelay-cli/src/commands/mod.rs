pub mod check;
pub mod daemon;
pub mod publish;
pub mod run;
pub mod status;
pub mod sync;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Args;

use modrelay_core::config::{cache_dir_or_default, DEFAULT_SEARCH_WINDOW};
use modrelay_core::{Credentials, RunConfig};

/// Locations and limits shared by every command.
#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Module catalog (JSON, or YAML by extension).
    #[arg(long, env = "MODRELAY_CATALOG", default_value = "modules.json", global = true)]
    pub catalog: PathBuf,

    /// Directory holding state.json.
    #[arg(long, env = "MODRELAY_STATE_DIR", default_value = "state", global = true)]
    pub state_dir: PathBuf,

    /// Content cache directory [default: platform cache dir + /modrelay].
    #[arg(long, env = "MODRELAY_CACHE_DIR", global = true)]
    pub cache_dir: Option<PathBuf>,

    /// Broadcast chat that receives uploads (@username or numeric id).
    #[arg(long, env = "MODRELAY_PUBLISH_CHAT", global = true)]
    pub publish_chat: Option<String>,

    /// Private chat the bot forwards channel documents to before download.
    #[arg(long, env = "MODRELAY_STAGING_CHAT", global = true)]
    pub staging_chat: Option<String>,

    /// Tera template replacing the built-in caption.
    #[arg(long, env = "MODRELAY_CAPTION_TEMPLATE", global = true)]
    pub caption_template: Option<PathBuf>,

    /// Self-hosted Bot API server URL.
    #[arg(long, env = "MODRELAY_BOT_API_BASE", global = true)]
    pub bot_api_base: Option<String>,

    /// Newest channel messages scanned per channel search.
    #[arg(long, default_value_t = DEFAULT_SEARCH_WINDOW, global = true)]
    pub search_window: usize,

    /// Bound on each resolution request.
    #[arg(long, default_value_t = 30, global = true)]
    pub resolve_timeout_secs: u64,

    /// Bound on each artifact download or upload.
    #[arg(long, default_value_t = 180, global = true)]
    pub transfer_timeout_secs: u64,
}

impl GlobalArgs {
    pub fn cache_dir(&self) -> Result<PathBuf> {
        Ok(cache_dir_or_default(self.cache_dir.as_deref())?)
    }

    /// Full run configuration; fails if a required chat id is missing.
    pub fn run_config(&self) -> Result<RunConfig> {
        let config = RunConfig::new(
            self.catalog.clone(),
            self.state_dir.clone(),
            self.cache_dir()?,
            self.publish_chat.clone(),
            self.staging_chat.clone(),
        )
        .context("incomplete configuration")?
        .with_search_window(self.search_window)?
        .with_timeouts(
            Duration::from_secs(self.resolve_timeout_secs),
            Duration::from_secs(self.transfer_timeout_secs),
        )
        .with_caption_template(self.caption_template.clone())
        .with_bot_api_base(self.bot_api_base.clone());
        Ok(config)
    }
}

/// Secrets from the environment; fails if the bot token is missing.
pub fn credentials() -> Result<Credentials> {
    Credentials::new(
        std::env::var("MODRELAY_BOT_TOKEN").ok(),
        std::env::var("GIT_API_TOKEN").ok(),
    )
    .context("incomplete credentials")
}
