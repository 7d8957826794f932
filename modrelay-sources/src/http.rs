//! HTTP capability used by the forge resolvers and URL downloads.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::time::Duration;

use serde_json::Value;

use modrelay_core::{Credentials, RunConfig};

use crate::error::{io_err, SourceError};

pub const USER_AGENT: &str = concat!("modrelay/", env!("CARGO_PKG_VERSION"));

/// Host that receives the forge bearer token. No other host ever sees it.
const AUTHENTICATED_PREFIX: &str = "https://api.github.com/";

/// Blocking HTTP operations the resolvers and fetcher rely on.
pub trait HttpClient {
    /// GET `url` and decode the body as JSON.
    fn get_json(&self, url: &str) -> Result<Value, SourceError>;

    /// GET `url` and return the body as text.
    fn get_text(&self, url: &str) -> Result<String, SourceError>;

    /// Stream the body of `url` into `dest`, returning the byte count.
    fn download_to(&self, url: &str, dest: &Path) -> Result<u64, SourceError>;
}

/// [`HttpClient`] backed by two `ureq` agents: a short-timeout one for API
/// calls and a long-timeout one for artifact downloads.
pub struct UreqHttpClient {
    api: ureq::Agent,
    transfer: ureq::Agent,
    forge_token: Option<String>,
}

impl UreqHttpClient {
    pub fn new(config: &RunConfig, credentials: &Credentials) -> Self {
        Self::with_timeouts(
            config.resolve_timeout,
            config.transfer_timeout,
            credentials.forge_token.clone(),
        )
    }

    pub fn with_timeouts(
        resolve: Duration,
        transfer: Duration,
        forge_token: Option<String>,
    ) -> Self {
        Self {
            api: agent(resolve),
            transfer: agent(transfer),
            forge_token,
        }
    }

    fn get(&self, agent: &ureq::Agent, url: &str) -> Result<ureq::Response, SourceError> {
        let mut request = agent.get(url);
        if let Some(token) = self.forge_token.as_deref() {
            if needs_auth(url) {
                request = request
                    .set("Authorization", &format!("Bearer {token}"))
                    .set("Accept", "application/vnd.github+json");
            }
        }
        request.call().map_err(|e| http_err(url, e))
    }
}

impl HttpClient for UreqHttpClient {
    fn get_json(&self, url: &str) -> Result<Value, SourceError> {
        let response = self.get(&self.api, url)?;
        let body = response.into_string().map_err(|e| read_err(url, e))?;
        Ok(serde_json::from_str(&body)?)
    }

    fn get_text(&self, url: &str) -> Result<String, SourceError> {
        let response = self.get(&self.api, url)?;
        response.into_string().map_err(|e| read_err(url, e))
    }

    fn download_to(&self, url: &str, dest: &Path) -> Result<u64, SourceError> {
        tracing::debug!(url, dest = %dest.display(), "downloading");
        let response = self.get(&self.transfer, url)?;
        let file = File::create(dest).map_err(|e| io_err(dest, e))?;
        let mut writer = BufWriter::new(file);
        let written =
            std::io::copy(&mut response.into_reader(), &mut writer).map_err(|e| io_err(dest, e))?;
        writer.flush().map_err(|e| io_err(dest, e))?;
        Ok(written)
    }
}

pub(crate) fn agent(timeout: Duration) -> ureq::Agent {
    ureq::AgentBuilder::new()
        .timeout(timeout)
        .user_agent(USER_AGENT)
        .build()
}

fn needs_auth(url: &str) -> bool {
    url.starts_with(AUTHENTICATED_PREFIX)
}

fn http_err(url: &str, err: ureq::Error) -> SourceError {
    let reason = match err {
        ureq::Error::Status(code, _) => format!("status {code}"),
        ureq::Error::Transport(t) => t.kind().to_string(),
    };
    SourceError::Http {
        target: url.to_string(),
        reason,
    }
}

fn read_err(url: &str, err: std::io::Error) -> SourceError {
    SourceError::Http {
        target: url.to_string(),
        reason: format!("reading body: {err}"),
    }
}
