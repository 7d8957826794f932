//! Forge release resolver: latest release of a repository.

use regex::Regex;
use serde_json::Value;

use modrelay_core::{Transfer, VersionDescriptor, VersionId};

use super::display_remote_date;
use crate::error::SourceError;
use crate::http::HttpClient;

pub const GITHUB_API: &str = "https://api.github.com";

pub(super) fn resolve(
    http: &dyn HttpClient,
    repository: &str,
    filter: &Regex,
) -> Result<Option<VersionDescriptor>, SourceError> {
    let url = format!("{GITHUB_API}/repos/{repository}/releases/latest");
    let release = http.get_json(&url)?;
    Ok(select_asset(&release, filter))
}

/// First asset whose name matches `filter`. The asset's `updated_at` is the
/// version id, so re-uploading an asset under the same release counts as new.
fn select_asset(release: &Value, filter: &Regex) -> Option<VersionDescriptor> {
    let assets = release.get("assets")?.as_array()?;
    let asset = assets.iter().find(|a| {
        a.get("name")
            .and_then(Value::as_str)
            .is_some_and(|name| filter.is_match(name))
    })?;

    let file_name = asset.get("name")?.as_str()?;
    let updated_at = asset.get("updated_at")?.as_str()?;
    let download_url = asset.get("browser_download_url")?.as_str()?;
    let source_url = release
        .get("html_url")
        .and_then(Value::as_str)
        .unwrap_or("#");

    Some(VersionDescriptor {
        file_name: file_name.to_string(),
        version_id: VersionId::from(updated_at),
        source_url: source_url.to_string(),
        date: display_remote_date(updated_at),
        transfer: Transfer::Url(download_url.to_string()),
    })
}
