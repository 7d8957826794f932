//! Publish engine — push fetched artifacts to the broadcast channel.
//!
//! For each manifest entry whose version differs from the publish-state:
//! check the cached file, render the caption, delete the previous broadcast
//! message (best-effort), upload, then record the new message id. An upload
//! failure leaves the module's publish-state entry exactly as it was.

use modrelay_core::{
    Catalog, Manifest, ManifestEntry, MessageId, ModuleName, PublishEntry, PublishState,
    RunConfig, VersionId,
};
use modrelay_sources::{cache_file_name, Messenger};

use crate::caption::CaptionRenderer;

/// What happened to one module during a publish pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishOutcome {
    /// Publish-state already carries the manifest's version.
    AlreadyLive,
    /// Manifest entry has no version id.
    MissingVersion,
    /// Manifest names a file that is not in the cache.
    MissingFile { file_name: String },
    /// Uploaded; `replaced` is the previous message, if there was one.
    Published {
        version: VersionId,
        message_id: MessageId,
        replaced: Option<MessageId>,
    },
    /// Dry-run: this version would have been uploaded.
    WouldPublish { version: VersionId },
    /// Caption template failed to render; the live post is left alone.
    CaptionFailed { reason: String },
    /// Upload failed; retried next run.
    UploadFailed { reason: String },
}

impl PublishOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            Self::MissingFile { .. } | Self::CaptionFailed { .. } | Self::UploadFailed { .. }
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModulePublishResult {
    pub module: ModuleName,
    pub outcome: PublishOutcome,
}

/// Outcome of one publish pass.
#[derive(Debug, Clone, Default)]
pub struct PublishReport {
    pub modules: Vec<ModulePublishResult>,
}

impl PublishReport {
    pub fn published(&self) -> usize {
        self.modules
            .iter()
            .filter(|m| {
                matches!(
                    m.outcome,
                    PublishOutcome::Published { .. } | PublishOutcome::WouldPublish { .. }
                )
            })
            .count()
    }

    pub fn failed(&self) -> usize {
        self.modules.iter().filter(|m| m.outcome.is_failure()).count()
    }
}

/// Broadcasts manifest entries that are not yet live.
pub struct PublishEngine<'a> {
    config: &'a RunConfig,
    messenger: &'a dyn Messenger,
    captions: &'a CaptionRenderer,
}

impl<'a> PublishEngine<'a> {
    pub fn new(
        config: &'a RunConfig,
        messenger: &'a dyn Messenger,
        captions: &'a CaptionRenderer,
    ) -> Self {
        Self {
            config,
            messenger,
            captions,
        }
    }

    /// Publish every manifest entry that differs from `publish_state`.
    ///
    /// `catalog` supplies caption titles; without it captions fall back to
    /// the file name. In dry-run mode nothing is deleted or uploaded and
    /// `publish_state` is left untouched.
    pub fn run(
        &self,
        catalog: Option<&Catalog>,
        manifest: &Manifest,
        publish_state: &mut PublishState,
        dry_run: bool,
    ) -> PublishReport {
        let mut report = PublishReport::default();
        for (name, entry) in manifest {
            let description = catalog.and_then(|c| c.description(name));
            let outcome = self.publish_module(name, entry, description, publish_state, dry_run);
            report.modules.push(ModulePublishResult {
                module: name.clone(),
                outcome,
            });
        }
        report
    }

    fn publish_module(
        &self,
        name: &ModuleName,
        entry: &ManifestEntry,
        description: Option<&str>,
        publish_state: &mut PublishState,
        dry_run: bool,
    ) -> PublishOutcome {
        if entry.version_id.is_empty() {
            tracing::warn!(
                module = %name,
                stage = "publish",
                "manifest entry has no version id; skipping"
            );
            return PublishOutcome::MissingVersion;
        }

        let previous = publish_state.get(name);
        if previous.map(|p| &p.version_id) == Some(&entry.version_id) {
            tracing::debug!(module = %name, version = %entry.version_id, "already live");
            return PublishOutcome::AlreadyLive;
        }

        let path = match cache_file_name(&entry.file_name) {
            Ok(file) => self.config.cache_path(file),
            Err(err) => {
                tracing::error!(
                    module = %name,
                    stage = "publish",
                    error = %err,
                    "manifest file name unusable"
                );
                return PublishOutcome::MissingFile {
                    file_name: entry.file_name.clone(),
                };
            }
        };
        if !path.is_file() {
            tracing::error!(
                module = %name,
                stage = "publish",
                path = %path.display(),
                "artifact missing from cache; not publishing"
            );
            return PublishOutcome::MissingFile {
                file_name: entry.file_name.clone(),
            };
        }

        let caption = match self.captions.render(description, entry) {
            Ok(c) => c,
            Err(err) => {
                tracing::error!(
                    module = %name,
                    stage = "caption",
                    error = %err,
                    "caption render failed"
                );
                return PublishOutcome::CaptionFailed {
                    reason: err.to_string(),
                };
            }
        };

        let replaced = previous.map(|p| p.message_id);
        if dry_run {
            tracing::info!(module = %name, version = %entry.version_id, "would publish");
            return PublishOutcome::WouldPublish {
                version: entry.version_id.clone(),
            };
        }

        let chat = self.config.publish_chat.as_str();
        if let Some(old) = replaced {
            match self.messenger.delete_message(chat, old) {
                Ok(()) => {
                    tracing::info!(module = %name, message_id = %old, "deleted previous post")
                }
                Err(err) => tracing::warn!(
                    module = %name,
                    stage = "delete",
                    message_id = %old,
                    error = %err,
                    "could not delete previous post; uploading anyway"
                ),
            }
        }

        match self.messenger.send_document(chat, &path, &caption) {
            Ok(message_id) => {
                publish_state.insert(
                    name.clone(),
                    PublishEntry::from_manifest(message_id, entry),
                );
                tracing::info!(
                    module = %name,
                    version = %entry.version_id,
                    message_id = %message_id,
                    "published"
                );
                PublishOutcome::Published {
                    version: entry.version_id.clone(),
                    message_id,
                    replaced,
                }
            }
            Err(err) => {
                tracing::error!(
                    module = %name,
                    stage = "upload",
                    error = %err,
                    "upload failed; will retry next run"
                );
                PublishOutcome::UploadFailed {
                    reason: err.to_string(),
                }
            }
        }
    }
}
