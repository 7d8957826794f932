//! Domain types for the module catalog and the persisted version state.
//!
//! Catalog types mirror the on-disk `modules.json` schema. State types
//! (`ManifestEntry`, `PublishEntry`) mirror the two maps of the state
//! document. The transient [`Transfer`] handle lives only on
//! [`VersionDescriptor`] and has no persisted counterpart.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Human-readable date format used in manifest entries and captions.
pub const DISPLAY_DATE_FORMAT: &str = "%d.%m.%Y %H:%M";

/// Render a timestamp in [`DISPLAY_DATE_FORMAT`].
pub fn display_date(at: DateTime<Utc>) -> String {
    at.format(DISPLAY_DATE_FORMAT).to_string()
}

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

/// Unique key of a module in the catalog and in both state maps.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ModuleName(pub String);

impl fmt::Display for ModuleName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for ModuleName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for ModuleName {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// Opaque, source-specific version identifier.
///
/// Only ever compared for equality within one module's history. It is a
/// message id, an asset timestamp, or a file name depending on the source
/// kind, so ordering between two values carries no meaning.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VersionId(pub String);

impl VersionId {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for VersionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for VersionId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for VersionId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// Identifier of a message on the messaging platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId(pub i64);

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

/// The protocol a module's upstream artifact is discovered through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceKind {
    ChannelSearch,
    ForgeRelease,
    ForgeCi,
    AltForgeRelease,
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceKind::ChannelSearch => write!(f, "channel_search"),
            SourceKind::ForgeRelease => write!(f, "forge_release"),
            SourceKind::ForgeCi => write!(f, "forge_ci"),
            SourceKind::AltForgeRelease => write!(f, "alt_forge_release"),
        }
    }
}

/// Where and how to look for a module's latest artifact.
///
/// Tagged by the catalog's `type` field. The original type names are the
/// canonical tags; the source-kind names are accepted as aliases.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SourceLocator {
    /// Search recent messages of `channel` for a document named like `keyword`.
    #[serde(rename = "telegram_forwarder", alias = "channel_search")]
    ChannelSearch {
        #[serde(rename = "source_channel")]
        channel: String,
        #[serde(rename = "source")]
        keyword: String,
    },

    /// Latest release of `owner/repo`, first asset matching `asset_filter`.
    #[serde(rename = "github_release", alias = "forge_release")]
    ForgeRelease {
        #[serde(rename = "source")]
        repository: String,
        asset_filter: String,
    },

    /// First artifact link found in the page at `feed_url`.
    #[serde(rename = "github_ci", alias = "forge_ci")]
    ForgeCi {
        #[serde(rename = "source")]
        feed_url: String,
    },

    /// Newest release of `project`, first asset link matching `asset_filter`.
    #[serde(rename = "gitlab_release", alias = "alt_forge_release")]
    AltForgeRelease {
        #[serde(rename = "source")]
        project: String,
        asset_filter: String,
    },
}

impl SourceLocator {
    pub fn kind(&self) -> SourceKind {
        match self {
            SourceLocator::ChannelSearch { .. } => SourceKind::ChannelSearch,
            SourceLocator::ForgeRelease { .. } => SourceKind::ForgeRelease,
            SourceLocator::ForgeCi { .. } => SourceKind::ForgeCi,
            SourceLocator::AltForgeRelease { .. } => SourceKind::AltForgeRelease,
        }
    }

    /// The regex filter for kinds that select among release assets.
    pub fn asset_filter(&self) -> Option<&str> {
        match self {
            SourceLocator::ForgeRelease { asset_filter, .. }
            | SourceLocator::AltForgeRelease { asset_filter, .. } => Some(asset_filter),
            _ => None,
        }
    }
}

/// A module entry from the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleDescriptor {
    pub name: ModuleName,
    #[serde(flatten)]
    pub source: SourceLocator,
    #[serde(default)]
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl ModuleDescriptor {
    pub fn kind(&self) -> SourceKind {
        self.source.kind()
    }
}

// ---------------------------------------------------------------------------
// Version descriptor (ephemeral)
// ---------------------------------------------------------------------------

/// A message on the messaging platform that carries a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageRef {
    /// Channel username (without `@`) or numeric chat id.
    pub channel: String,
    pub message_id: MessageId,
}

/// How to obtain the artifact bytes. Consumed by the fetch step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transfer {
    /// Platform-native media transfer from an existing message.
    Message(MessageRef),
    /// Plain HTTP download.
    Url(String),
}

/// The latest version a source reports for one module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionDescriptor {
    pub file_name: String,
    pub version_id: VersionId,
    pub source_url: String,
    pub date: String,
    pub transfer: Transfer,
}

impl VersionDescriptor {
    /// Split into the persistable entry and the transfer handle.
    pub fn into_parts(self) -> (ManifestEntry, Transfer) {
        let entry = ManifestEntry {
            file_name: self.file_name,
            version_id: self.version_id,
            source_url: self.source_url,
            date: self.date,
        };
        (entry, self.transfer)
    }
}

// ---------------------------------------------------------------------------
// Persisted state
// ---------------------------------------------------------------------------

/// Last artifact successfully fetched for a module, and where it came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub file_name: String,
    pub version_id: VersionId,
    pub source_url: String,
    pub date: String,
}

/// What is currently live in the broadcast channel for a module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishEntry {
    pub message_id: MessageId,
    pub file_name: String,
    pub version_id: VersionId,
}

impl PublishEntry {
    /// The only constructor: publish-state always mirrors a manifest entry.
    pub fn from_manifest(message_id: MessageId, entry: &ManifestEntry) -> Self {
        Self {
            message_id,
            file_name: entry.file_name.clone(),
            version_id: entry.version_id.clone(),
        }
    }
}

/// Module → last fetched artifact. Sorted for deterministic iteration and output.
pub type Manifest = BTreeMap<ModuleName, ManifestEntry>;

/// Module → last broadcast artifact.
pub type PublishState = BTreeMap<ModuleName, PublishEntry>;

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn newtype_display() {
        assert_eq!(ModuleName::from("foo").to_string(), "foo");
        assert_eq!(VersionId::from("42").to_string(), "42");
        assert_eq!(MessageId(7).to_string(), "7");
    }

    #[test]
    fn descriptor_parses_original_schema() {
        let json = r#"{
            "name": "foo",
            "type": "github_release",
            "source": "owner/foo",
            "asset_filter": "\\.zip$",
            "enabled": true,
            "description": "Foo module"
        }"#;
        let m: ModuleDescriptor = serde_json::from_str(json).expect("parse");
        assert_eq!(m.name, ModuleName::from("foo"));
        assert_eq!(m.kind(), SourceKind::ForgeRelease);
        assert_eq!(m.source.asset_filter(), Some("\\.zip$"));
        assert!(m.enabled);
    }

    #[test]
    fn descriptor_accepts_kind_alias() {
        let json = r#"{"name":"bar","type":"channel_search","source_channel":"chan","source":"bar"}"#;
        let m: ModuleDescriptor = serde_json::from_str(json).expect("parse");
        assert_eq!(
            m.source,
            SourceLocator::ChannelSearch {
                channel: "chan".into(),
                keyword: "bar".into()
            }
        );
        assert!(!m.enabled, "enabled defaults to false");
        assert!(m.description.is_none());
    }

    #[test]
    fn into_parts_drops_transfer_from_entry() {
        let d = VersionDescriptor {
            file_name: "foo.zip".into(),
            version_id: "v1".into(),
            source_url: "https://example.com".into(),
            date: "01.01.2024 00:00".into(),
            transfer: Transfer::Url("https://example.com/foo.zip".into()),
        };
        let (entry, transfer) = d.into_parts();
        assert_eq!(entry.file_name, "foo.zip");
        assert!(matches!(transfer, Transfer::Url(_)));
        let json = serde_json::to_string(&entry).unwrap();
        assert!(!json.contains("download"), "entry must not carry the transfer: {json}");
    }

    #[test]
    fn publish_entry_copies_manifest_version() {
        let entry = ManifestEntry {
            file_name: "a.zip".into(),
            version_id: "2024".into(),
            source_url: "#".into(),
            date: String::new(),
        };
        let p = PublishEntry::from_manifest(MessageId(9), &entry);
        assert_eq!(p.version_id, entry.version_id);
        assert_eq!(p.file_name, "a.zip");
    }

    #[test]
    fn display_date_format() {
        let at = Utc.with_ymd_and_hms(2024, 3, 5, 7, 9, 0).unwrap();
        assert_eq!(display_date(at), "05.03.2024 07:09");
    }
}
