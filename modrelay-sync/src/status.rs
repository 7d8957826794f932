//! Offline per-module status from catalog, state document, and cache.
//!
//! Signal precedence:
//! 1. `NeverFetched` (no manifest entry)
//! 2. `MissingFile` (manifest entry but artifact absent from the cache)
//! 3. `PendingPublish` (manifest version differs from publish-state)
//! 4. `Current`

use std::collections::BTreeSet;
use std::path::Path;

use serde::Serialize;

use modrelay_core::{Catalog, MessageId, ModuleName, VersionId};

use crate::state_store::StateDocument;

/// Classification of one module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ModuleStatus {
    NeverFetched,
    MissingFile,
    PendingPublish,
    Current,
}

/// One row of the status report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusRow {
    pub module: ModuleName,
    pub status: ModuleStatus,
    /// Present and enabled in the catalog.
    pub enabled: bool,
    /// Known to the catalog at all; state may outlive a catalog entry.
    pub in_catalog: bool,
    pub fetched_version: Option<VersionId>,
    pub published_version: Option<VersionId>,
    pub message_id: Option<MessageId>,
    pub date: Option<String>,
}

/// Status of every module named by the catalog or the state document,
/// sorted by name.
pub fn check(catalog: Option<&Catalog>, state: &StateDocument, cache_dir: &Path) -> Vec<StatusRow> {
    let mut names: BTreeSet<ModuleName> = state.manifest.keys().cloned().collect();
    names.extend(state.publish_state.keys().cloned());
    if let Some(c) = catalog {
        names.extend(c.modules().iter().map(|m| m.name.clone()));
    }

    names
        .into_iter()
        .map(|name| {
            let descriptor = catalog.and_then(|c| c.get(&name));
            let fetched = state.manifest.get(&name);
            let published = state.publish_state.get(&name);

            let status = match fetched {
                None => ModuleStatus::NeverFetched,
                Some(e) if !cache_dir.join(&e.file_name).is_file() => ModuleStatus::MissingFile,
                Some(e) if published.map(|p| &p.version_id) != Some(&e.version_id) => {
                    ModuleStatus::PendingPublish
                }
                Some(_) => ModuleStatus::Current,
            };

            StatusRow {
                status,
                enabled: descriptor.is_some_and(|d| d.enabled),
                in_catalog: descriptor.is_some(),
                fetched_version: fetched.map(|e| e.version_id.clone()),
                published_version: published.map(|p| p.version_id.clone()),
                message_id: published.map(|p| p.message_id),
                date: fetched.map(|e| e.date.clone()),
                module: name,
            }
        })
        .collect()
}
