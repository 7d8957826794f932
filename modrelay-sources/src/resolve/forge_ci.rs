//! Forge CI resolver: first artifact link found in a feed page.
//!
//! CI artifacts carry no version metadata, so the file name is the version.

use std::sync::OnceLock;

use chrono::Utc;
use regex::Regex;

use modrelay_core::{types::display_date, Transfer, VersionDescriptor, VersionId};

use crate::error::SourceError;
use crate::http::HttpClient;

/// Links to CI artifacts look like `https://nightly.link/<...>.zip`.
pub fn artifact_link_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"https://nightly\.link/[^"]*\.zip"#).expect("static regex"))
}

pub(super) fn resolve(
    http: &dyn HttpClient,
    feed_url: &str,
) -> Result<Option<VersionDescriptor>, SourceError> {
    let page = http.get_text(feed_url)?;
    Ok(extract_artifact(&page, feed_url))
}

fn extract_artifact(page: &str, feed_url: &str) -> Option<VersionDescriptor> {
    let url = artifact_link_pattern().find(page)?.as_str();
    let file_name = url.rsplit('/').next().filter(|n| !n.is_empty())?;
    Some(VersionDescriptor {
        file_name: file_name.to_string(),
        version_id: VersionId::from(file_name),
        source_url: feed_url.to_string(),
        date: display_date(Utc::now()),
        transfer: Transfer::Url(url.to_string()),
    })
}
