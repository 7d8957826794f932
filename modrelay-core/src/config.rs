//! Run configuration.
//!
//! Every engine receives one [`RunConfig`] by reference. Nothing reads paths,
//! chat ids, or timeouts from globals.

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::ConfigError;

/// Name of the state document inside the state directory.
pub const STATE_FILE: &str = "state.json";

/// Number of newest channel messages scanned by a channel search.
pub const DEFAULT_SEARCH_WINDOW: usize = 100;

pub const DEFAULT_RESOLVE_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_TRANSFER_TIMEOUT: Duration = Duration::from_secs(180);

/// Secrets needed by the network adapters.
#[derive(Clone)]
pub struct Credentials {
    /// Messaging platform bot token.
    pub bot_token: String,
    /// Bearer token for the forge API. Anonymous requests when absent.
    pub forge_token: Option<String>,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("bot_token", &"<redacted>")
            .field("forge_token", &self.forge_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl Credentials {
    /// Build credentials, failing if the bot token is missing or blank.
    pub fn new(
        bot_token: Option<String>,
        forge_token: Option<String>,
    ) -> Result<Self, ConfigError> {
        Ok(Self {
            bot_token: require("MODRELAY_BOT_TOKEN", bot_token)?,
            forge_token: forge_token.filter(|t| !t.trim().is_empty()),
        })
    }
}

/// Immutable settings for one pipeline run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    pub catalog_path: PathBuf,
    pub state_dir: PathBuf,
    pub cache_dir: PathBuf,
    /// Broadcast channel that receives uploads.
    pub publish_chat: String,
    /// Private chat used to obtain downloadable handles for channel documents.
    pub staging_chat: String,
    /// Optional Tera template overriding the built-in caption.
    pub caption_template: Option<PathBuf>,
    /// Self-hosted Bot API server; lifts the public server's download cap.
    pub bot_api_base: Option<String>,
    pub search_window: usize,
    pub resolve_timeout: Duration,
    pub transfer_timeout: Duration,
}

impl RunConfig {
    /// Config with default window and timeouts.
    ///
    /// Fails if either chat id is missing or blank.
    pub fn new(
        catalog_path: PathBuf,
        state_dir: PathBuf,
        cache_dir: PathBuf,
        publish_chat: Option<String>,
        staging_chat: Option<String>,
    ) -> Result<Self, ConfigError> {
        Ok(Self {
            catalog_path,
            state_dir,
            cache_dir,
            publish_chat: require("MODRELAY_PUBLISH_CHAT", publish_chat)?,
            staging_chat: require("MODRELAY_STAGING_CHAT", staging_chat)?,
            caption_template: None,
            bot_api_base: None,
            search_window: DEFAULT_SEARCH_WINDOW,
            resolve_timeout: DEFAULT_RESOLVE_TIMEOUT,
            transfer_timeout: DEFAULT_TRANSFER_TIMEOUT,
        })
    }

    pub fn with_search_window(mut self, window: usize) -> Result<Self, ConfigError> {
        if window == 0 {
            return Err(ConfigError::Invalid {
                name: "search_window",
                reason: "must be at least 1".into(),
            });
        }
        self.search_window = window;
        Ok(self)
    }

    pub fn with_timeouts(mut self, resolve: Duration, transfer: Duration) -> Self {
        self.resolve_timeout = resolve;
        self.transfer_timeout = transfer;
        self
    }

    pub fn with_caption_template(mut self, path: Option<PathBuf>) -> Self {
        self.caption_template = path;
        self
    }

    pub fn with_bot_api_base(mut self, base: Option<String>) -> Self {
        self.bot_api_base = base.filter(|b| !b.trim().is_empty());
        self
    }

    /// `<state_dir>/state.json`
    pub fn state_path(&self) -> PathBuf {
        self.state_dir.join(STATE_FILE)
    }

    /// `<cache_dir>/<file_name>` — pure, no I/O.
    pub fn cache_path(&self, file_name: &str) -> PathBuf {
        self.cache_dir.join(file_name)
    }
}

/// `<platform cache dir>/modrelay`
pub fn default_cache_dir() -> Result<PathBuf, ConfigError> {
    dirs::cache_dir()
        .map(|d| d.join("modrelay"))
        .ok_or(ConfigError::CacheDirNotFound)
}

/// Resolve the cache dir: explicit value wins, else the platform default.
pub fn cache_dir_or_default(explicit: Option<&Path>) -> Result<PathBuf, ConfigError> {
    match explicit {
        Some(p) => Ok(p.to_path_buf()),
        None => default_cache_dir(),
    }
}

fn require(name: &'static str, value: Option<String>) -> Result<String, ConfigError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(ConfigError::Missing { name }),
    }
}
