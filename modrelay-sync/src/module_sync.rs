//! Module sync engine — resolve, compare, fetch, record.
//!
//! ## Per-module protocol
//!
//! 1. Resolve the latest remote version. Not found → skip.
//! 2. Compare its version id with the manifest entry (string equality).
//!    Equal → skip.
//! 3. Fetch into `<cache>/<file_name>`. Failure → skip; manifest untouched.
//! 4. Delete the previous cache file if it had a different name, then
//!    overwrite the manifest entry.
//!
//! Modules are processed one at a time, in name order. The caller persists
//! the manifest, and only when [`SyncReport::changed`] is set.

use std::path::Path;

use modrelay_core::{Catalog, Manifest, ModuleDescriptor, ModuleName, RunConfig, VersionId};
use modrelay_sources::{cache_file_name, Fetch, Resolve};

/// What happened to one module during a sync pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Source had nothing usable.
    NotFound,
    /// Manifest already records this version.
    Current { version: VersionId },
    /// New version fetched and recorded.
    Fetched {
        version: VersionId,
        file_name: String,
        bytes: u64,
    },
    /// Dry-run: this version would have been fetched.
    WouldFetch { version: VersionId, file_name: String },
    /// Fetch failed; retried next run.
    FetchFailed { version: VersionId, reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleSyncResult {
    pub module: ModuleName,
    pub outcome: SyncOutcome,
}

/// Outcome of one sync pass.
#[derive(Debug, Clone, Default)]
pub struct SyncReport {
    pub modules: Vec<ModuleSyncResult>,
    /// At least one manifest entry was overwritten.
    pub changed: bool,
}

impl SyncReport {
    pub fn fetched(&self) -> usize {
        self.count(|o| matches!(o, SyncOutcome::Fetched { .. } | SyncOutcome::WouldFetch { .. }))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, SyncOutcome::FetchFailed { .. }))
    }

    fn count(&self, pred: impl Fn(&SyncOutcome) -> bool) -> usize {
        self.modules.iter().filter(|m| pred(&m.outcome)).count()
    }
}

/// Drives resolution and fetching for every enabled module.
pub struct ModuleSyncEngine<'a> {
    config: &'a RunConfig,
    resolver: &'a dyn Resolve,
    fetcher: &'a dyn Fetch,
}

impl<'a> ModuleSyncEngine<'a> {
    pub fn new(config: &'a RunConfig, resolver: &'a dyn Resolve, fetcher: &'a dyn Fetch) -> Self {
        Self {
            config,
            resolver,
            fetcher,
        }
    }

    /// Sync every enabled module of `catalog` into `manifest`.
    ///
    /// In dry-run mode nothing is fetched and `manifest` is left untouched.
    pub fn run(&self, catalog: &Catalog, manifest: &mut Manifest, dry_run: bool) -> SyncReport {
        let mut report = SyncReport::default();
        for module in catalog.enabled() {
            tracing::info!(module = %module.name, kind = %module.kind(), "checking remote version");
            let outcome = self.sync_module(module, manifest, dry_run);
            if matches!(outcome, SyncOutcome::Fetched { .. }) {
                report.changed = true;
            }
            report.modules.push(ModuleSyncResult {
                module: module.name.clone(),
                outcome,
            });
        }

        if !report.changed {
            tracing::info!("no module fetched; manifest unchanged");
        }
        report
    }

    fn sync_module(
        &self,
        module: &ModuleDescriptor,
        manifest: &mut Manifest,
        dry_run: bool,
    ) -> SyncOutcome {
        let name = &module.name;

        let Some(remote) = self.resolver.resolve(module) else {
            return SyncOutcome::NotFound;
        };

        let previous = manifest.get(name);
        if previous.map(|e| &e.version_id) == Some(&remote.version_id) {
            tracing::info!(
                module = %name,
                version = %remote.version_id,
                "already current; skipping"
            );
            return SyncOutcome::Current {
                version: remote.version_id,
            };
        }

        let version = remote.version_id.clone();
        let file_name = match cache_file_name(&remote.file_name) {
            Ok(f) => f.to_string(),
            Err(err) => {
                tracing::warn!(
                    module = %name,
                    stage = "fetch",
                    error = %err,
                    "unusable file name"
                );
                return SyncOutcome::FetchFailed {
                    version,
                    reason: err.to_string(),
                };
            }
        };

        tracing::info!(
            module = %name,
            version = %version,
            previous = previous.map(|e| e.version_id.as_str()).unwrap_or("none"),
            file = %file_name,
            "new version upstream"
        );

        if dry_run {
            return SyncOutcome::WouldFetch { version, file_name };
        }

        let dest = self.config.cache_path(&file_name);
        let (entry, transfer) = remote.into_parts();
        let bytes = match self.fetcher.fetch(transfer, &dest) {
            Ok(bytes) => bytes,
            Err(err) => {
                tracing::error!(
                    module = %name,
                    stage = "fetch",
                    error = %err,
                    "download failed; will retry next run"
                );
                return SyncOutcome::FetchFailed {
                    version,
                    reason: err.to_string(),
                };
            }
        };

        if let Some(prev) = manifest.get(name) {
            if prev.file_name != entry.file_name {
                self.remove_superseded(name, &prev.file_name, manifest);
            }
        }
        manifest.insert(name.clone(), entry);

        tracing::info!(module = %name, version = %version, bytes, "fetched; manifest updated");
        SyncOutcome::Fetched {
            version,
            file_name,
            bytes,
        }
    }

    /// Delete the module's previous artifact unless another module still
    /// records the same file name.
    fn remove_superseded(&self, name: &ModuleName, old_file: &str, manifest: &Manifest) {
        let shared = manifest
            .iter()
            .any(|(other, e)| other != name && e.file_name == old_file);
        if shared {
            return;
        }
        let Ok(old_file) = cache_file_name(old_file) else {
            tracing::warn!(
                module = %name,
                stage = "prune",
                file = old_file,
                "not removing unsafe path"
            );
            return;
        };
        remove_if_present(name, &self.config.cache_path(old_file));
    }
}

fn remove_if_present(name: &ModuleName, path: &Path) {
    if !path.exists() {
        return;
    }
    match std::fs::remove_file(path) {
        Ok(()) => tracing::info!(
            module = %name,
            stage = "prune",
            path = %path.display(),
            "removed superseded artifact"
        ),
        Err(err) => tracing::warn!(
            module = %name,
            stage = "prune",
            path = %path.display(),
            error = %err,
            "could not remove superseded artifact"
        ),
    }
}
