//! Version state store — the manifest and publish-state maps.
//!
//! Persists one [`StateDocument`] at `<state_dir>/state.json`:
//!
//! ```json
//! {
//!   "manifest":      { "<module>": { "file_name", "version_id", "source_url", "date" } },
//!   "publish-state": { "<module>": { "message_id", "file_name", "version_id" } }
//! }
//! ```
//!
//! Keys are `BTreeMap`-ordered so rewrites produce minimal diffs. Saves use
//! the `.tmp` + rename pattern; the document is always rewritten in full.
//!
//! Older deployments kept the two maps in separate files
//! (`manifest.json`, `telegram_state.json`). When `state.json` is absent
//! those are read instead, and the next save writes the combined document.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use modrelay_core::{config::STATE_FILE, Manifest, PublishState};

use crate::error::{io_err, SyncError};

pub const LEGACY_MANIFEST_FILE: &str = "manifest.json";
pub const LEGACY_PUBLISH_FILE: &str = "telegram_state.json";

/// On-disk state payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateDocument {
    #[serde(default)]
    pub manifest: Manifest,
    #[serde(default, rename = "publish-state")]
    pub publish_state: PublishState,
}

/// `<state_dir>/state.json`
pub fn state_path_at(state_dir: &Path) -> PathBuf {
    state_dir.join(STATE_FILE)
}

/// Load the state document.
///
/// Returns an empty document if neither the combined file nor the legacy
/// files exist. A file that exists but does not parse is an error: treating
/// it as empty would re-fetch and re-post every module.
pub fn load_at(state_dir: &Path) -> Result<StateDocument, SyncError> {
    let path = state_path_at(state_dir);
    if path.exists() {
        return read_json(&path);
    }

    let legacy_manifest = state_dir.join(LEGACY_MANIFEST_FILE);
    let legacy_publish = state_dir.join(LEGACY_PUBLISH_FILE);
    let mut doc = StateDocument::default();
    if legacy_manifest.exists() {
        doc.manifest = read_json(&legacy_manifest)?;
    }
    if legacy_publish.exists() {
        doc.publish_state = read_json(&legacy_publish)?;
    }
    if legacy_manifest.exists() || legacy_publish.exists() {
        tracing::info!(
            dir = %state_dir.display(),
            modules = doc.manifest.len(),
            "loaded legacy two-file state; next save writes {}",
            STATE_FILE
        );
    }
    Ok(doc)
}

/// Save the state document atomically.
///
/// Writes to `state.json.tmp` then renames to `state.json`.
pub fn save_at(state_dir: &Path, doc: &StateDocument) -> Result<(), SyncError> {
    std::fs::create_dir_all(state_dir).map_err(|e| io_err(state_dir, e))?;

    let path = state_path_at(state_dir);
    let mut json = serde_json::to_string_pretty(doc)?;
    json.push('\n');
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, &json).map_err(|e| io_err(&tmp, e))?;
    if let Err(e) = std::fs::rename(&tmp, &path) {
        let _ = std::fs::remove_file(&tmp);
        return Err(io_err(&path, e));
    }
    tracing::debug!(path = %path.display(), "state saved");
    Ok(())
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, SyncError> {
    let contents = std::fs::read_to_string(path).map_err(|e| io_err(path, e))?;
    serde_json::from_str(&contents).map_err(|source| SyncError::StateParse {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use modrelay_core::{ManifestEntry, MessageId, ModuleName, PublishEntry, VersionId};
    use tempfile::TempDir;

    fn entry(file: &str, version: &str) -> ManifestEntry {
        ManifestEntry {
            file_name: file.into(),
            version_id: VersionId::from(version),
            source_url: "https://example.com".into(),
            date: "01.01.2024 00:00".into(),
        }
    }

    #[test]
    fn empty_document_when_nothing_on_disk() {
        let tmp = TempDir::new().unwrap();
        let doc = load_at(tmp.path()).unwrap();
        assert!(doc.manifest.is_empty());
        assert!(doc.publish_state.is_empty());
    }

    #[test]
    fn roundtrip_save_load() {
        let tmp = TempDir::new().unwrap();
        let mut doc = StateDocument::default();
        let e = entry("foo.zip", "v1");
        doc.publish_state.insert(
            ModuleName::from("foo"),
            PublishEntry::from_manifest(MessageId(10), &e),
        );
        doc.manifest.insert(ModuleName::from("foo"), e);

        save_at(tmp.path(), &doc).unwrap();
        assert_eq!(load_at(tmp.path()).unwrap(), doc);
    }

    #[test]
    fn tmp_file_cleaned_up_after_save() {
        let tmp = TempDir::new().unwrap();
        save_at(tmp.path(), &StateDocument::default()).unwrap();
        let tmp_path = state_path_at(tmp.path()).with_extension("json.tmp");
        assert!(!tmp_path.exists(), "tmp file should be removed after atomic rename");
    }

    #[test]
    fn keys_are_written_in_sorted_order() {
        let tmp = TempDir::new().unwrap();
        let mut doc = StateDocument::default();
        for name in ["zeta", "alpha", "mid"] {
            doc.manifest.insert(ModuleName::from(name), entry("f.zip", "1"));
        }
        save_at(tmp.path(), &doc).unwrap();

        let text = std::fs::read_to_string(state_path_at(tmp.path())).unwrap();
        let a = text.find("\"alpha\"").unwrap();
        let m = text.find("\"mid\"").unwrap();
        let z = text.find("\"zeta\"").unwrap();
        assert!(a < m && m < z);
        assert!(text.contains("\"publish-state\""));
    }

    #[test]
    fn legacy_two_file_layout_is_migrated() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(
            tmp.path().join(LEGACY_MANIFEST_FILE),
            r##"{"foo":{"file_name":"foo.zip","version_id":"v1","source_url":"#","date":"d"}}"##,
        )
        .unwrap();
        std::fs::write(
            tmp.path().join(LEGACY_PUBLISH_FILE),
            r#"{"foo":{"message_id":55,"file_name":"foo.zip","version_id":"v1"}}"#,
        )
        .unwrap();

        let doc = load_at(tmp.path()).unwrap();
        let name = ModuleName::from("foo");
        assert_eq!(doc.manifest[&name].version_id, VersionId::from("v1"));
        assert_eq!(doc.publish_state[&name].message_id, MessageId(55));

        save_at(tmp.path(), &doc).unwrap();
        assert!(state_path_at(tmp.path()).exists());
        assert_eq!(load_at(tmp.path()).unwrap(), doc);
    }

    #[test]
    fn corrupt_document_is_an_error() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(state_path_at(tmp.path()), "{ not json").unwrap();
        let err = load_at(tmp.path()).unwrap_err();
        assert!(matches!(err, SyncError::StateParse { .. }), "got: {err}");
    }

    #[test]
    fn document_missing_one_map_loads() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(state_path_at(tmp.path()), r#"{"manifest":{}}"#).unwrap();
        let doc = load_at(tmp.path()).unwrap();
        assert!(doc.publish_state.is_empty());
    }
}
