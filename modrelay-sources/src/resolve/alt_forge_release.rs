//! Alternate forge release resolver: newest release of a project, first
//! asset link matching the filter.

use regex::Regex;
use serde_json::Value;
use url::Url;

use modrelay_core::{Transfer, VersionDescriptor, VersionId};

use super::display_remote_date;
use crate::error::{malformed, SourceError};
use crate::http::HttpClient;

pub const GITLAB_API: &str = "https://gitlab.com/api/v4";

pub(super) fn resolve(
    http: &dyn HttpClient,
    project: &str,
    filter: &Regex,
) -> Result<Option<VersionDescriptor>, SourceError> {
    let url = releases_url(project)?;
    let releases = http.get_json(&url)?;
    Ok(select_link(&releases, filter))
}

/// The project path goes in as one segment, so `group/name` becomes
/// `group%2Fname`.
fn releases_url(project: &str) -> Result<String, SourceError> {
    let mut url = Url::parse(GITLAB_API)?;
    url.path_segments_mut()
        .map_err(|()| malformed("releases", "API base cannot take a path"))?
        .extend(["projects", project, "releases"]);
    Ok(url.into())
}

fn select_link(releases: &Value, filter: &Regex) -> Option<VersionDescriptor> {
    let release = releases.as_array()?.first()?;
    let links = release.pointer("/assets/links")?.as_array()?;
    let link = links.iter().find(|l| {
        l.get("name")
            .and_then(Value::as_str)
            .is_some_and(|name| filter.is_match(name))
    })?;

    let file_name = link.get("name")?.as_str()?;
    let url = link.get("url")?.as_str()?;
    let released_at = release.get("released_at")?.as_str()?;
    let source_url = release
        .pointer("/_links/self")
        .and_then(Value::as_str)
        .unwrap_or("#");

    Some(VersionDescriptor {
        file_name: file_name.to_string(),
        version_id: VersionId::from(released_at),
        source_url: source_url.to_string(),
        date: display_remote_date(released_at),
        transfer: Transfer::Url(url.to_string()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeHttp;
    use serde_json::json;

    const URL: &str = "https://gitlab.com/api/v4/projects/group%2Fqux/releases";

    fn releases() -> Value {
        json!([
            {
                "released_at": "2024-05-02T10:20:30.000+00:00",
                "_links": {"self": "https://gitlab.com/group/qux/-/releases/v3"},
                "assets": {"links": [
                    {"name": "qux-v3.apk", "url": "https://gl/qux-v3.apk"},
                    {"name": "qux-v3.zip", "url": "https://gl/qux-v3.zip"}
                ]}
            },
            {
                "released_at": "2024-04-01T00:00:00.000+00:00",
                "assets": {"links": [{"name": "qux-v2.zip", "url": "https://gl/qux-v2.zip"}]}
            }
        ])
    }

    #[test]
    fn newest_release_matching_link() {
        let http = FakeHttp::default().with_json(URL, releases());
        let found = resolve(&http, "group/qux", &Regex::new(r"\.zip$").unwrap())
            .expect("resolve")
            .expect("found");
        assert_eq!(found.file_name, "qux-v3.zip");
        assert_eq!(found.version_id, VersionId::from("2024-05-02T10:20:30.000+00:00"));
        assert_eq!(found.source_url, "https://gitlab.com/group/qux/-/releases/v3");
        assert_eq!(found.date, "02.05.2024 10:20");
    }

    #[test]
    fn older_releases_are_not_searched() {
        let http = FakeHttp::default().with_json(URL, releases());
        let found =
            resolve(&http, "group/qux", &Regex::new("qux-v2").unwrap()).expect("resolve");
        assert!(found.is_none());
    }

    #[test]
    fn project_path_is_one_encoded_segment() {
        assert_eq!(
            releases_url("group/sub project").unwrap(),
            "https://gitlab.com/api/v4/projects/group%2Fsub%20project/releases"
        );
        assert_eq!(
            releases_url("plain-name_1.0~x").unwrap(),
            "https://gitlab.com/api/v4/projects/plain-name_1.0~x/releases"
        );
    }

    #[test]
    fn empty_release_list_is_not_found() {
        let http = FakeHttp::default().with_json(URL, json!([]));
        assert!(resolve(&http, "group/qux", &Regex::new("zip").unwrap())
            .expect("resolve")
            .is_none());
    }
}
