//! Source resolution — one variant per [`SourceLocator`] case.
//!
//! [`SourceResolver`] dispatches on the module's locator. Variants return
//! `Result<Option<_>, SourceError>`; the dispatcher logs any error with the
//! module name and collapses it to `None`, so one broken source never stops
//! the run.

mod alt_forge_release;
mod channel_search;
mod forge_ci;
mod forge_release;

use chrono::DateTime;
use regex::Regex;

use modrelay_core::{types::DISPLAY_DATE_FORMAT, ModuleDescriptor, SourceLocator, VersionDescriptor};

use crate::error::SourceError;
use crate::http::HttpClient;
use crate::messenger::Messenger;

pub use alt_forge_release::GITLAB_API;
pub use forge_ci::artifact_link_pattern;
pub use forge_release::GITHUB_API;

/// Latest-version lookup for one module.
pub trait Resolve {
    /// `None` means "nothing usable upstream right now", for any reason.
    fn resolve(&self, module: &ModuleDescriptor) -> Option<VersionDescriptor>;
}

/// Production resolver over the HTTP and messaging capabilities.
pub struct SourceResolver<'a> {
    http: &'a dyn HttpClient,
    messenger: &'a dyn Messenger,
    search_window: usize,
}

impl<'a> SourceResolver<'a> {
    pub fn new(
        http: &'a dyn HttpClient,
        messenger: &'a dyn Messenger,
        search_window: usize,
    ) -> Self {
        Self {
            http,
            messenger,
            search_window,
        }
    }

    fn try_resolve(
        &self,
        module: &ModuleDescriptor,
    ) -> Result<Option<VersionDescriptor>, SourceError> {
        match &module.source {
            SourceLocator::ChannelSearch { channel, keyword } => {
                channel_search::resolve(self.messenger, channel, keyword, self.search_window)
            }
            SourceLocator::ForgeRelease {
                repository,
                asset_filter,
            } => forge_release::resolve(self.http, repository, &compile_filter(asset_filter)?),
            SourceLocator::ForgeCi { feed_url } => forge_ci::resolve(self.http, feed_url),
            SourceLocator::AltForgeRelease {
                project,
                asset_filter,
            } => alt_forge_release::resolve(self.http, project, &compile_filter(asset_filter)?),
        }
    }
}

impl Resolve for SourceResolver<'_> {
    fn resolve(&self, module: &ModuleDescriptor) -> Option<VersionDescriptor> {
        match self.try_resolve(module) {
            Ok(Some(found)) => Some(found),
            Ok(None) => {
                tracing::info!(
                    module = %module.name,
                    stage = "resolve",
                    kind = %module.kind(),
                    "no matching artifact at source"
                );
                None
            }
            Err(err) => {
                tracing::warn!(
                    module = %module.name,
                    stage = "resolve",
                    kind = %module.kind(),
                    error = %err,
                    "source lookup failed"
                );
                None
            }
        }
    }
}

/// Compile a module's asset filter.
pub fn compile_filter(pattern: &str) -> Result<Regex, SourceError> {
    Regex::new(pattern).map_err(|source| SourceError::InvalidFilter {
        pattern: pattern.to_string(),
        source,
    })
}

/// Render an RFC 3339 timestamp for display, keeping its own offset.
/// Unparseable input is passed through unchanged.
pub(crate) fn display_remote_date(raw: &str) -> String {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.format(DISPLAY_DATE_FORMAT).to_string())
        .unwrap_or_else(|_| raw.to_string())
}
