//! Shared run entrypoint used by CLI and daemon.
//!
//! One run = load state, sync phase, persist manifest, publish phase,
//! persist publish-state. Each phase writes the store once, at its end.

use modrelay_core::{catalog, Catalog, Credentials, RunConfig};
use modrelay_sources::{
    BotApiMessenger, Fetch, Fetcher, Messenger, Resolve, SourceResolver, UreqHttpClient,
};

use crate::caption::CaptionRenderer;
use crate::module_sync::{ModuleSyncEngine, SyncReport};
use crate::publish::{PublishEngine, PublishReport};
use crate::state_store;
use crate::SyncError;

/// Which phases to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunOptions {
    pub sync: bool,
    pub publish: bool,
    pub dry_run: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            sync: true,
            publish: true,
            dry_run: false,
        }
    }
}

/// What a run did. A phase that did not run is `None`.
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    pub sync: Option<SyncReport>,
    pub publish: Option<PublishReport>,
    /// Set when the catalog could not be loaded and the sync phase was skipped.
    pub catalog_error: Option<String>,
}

impl RunReport {
    pub fn failures(&self) -> usize {
        self.sync.as_ref().map_or(0, SyncReport::failed)
            + self.publish.as_ref().map_or(0, PublishReport::failed)
            + usize::from(self.catalog_error.is_some())
    }
}

/// Run the pipeline against the given collaborators.
///
/// Fails only on configuration-level problems: an unreadable caption
/// template, or a state document that cannot be loaded or saved. A missing
/// or malformed catalog skips the sync phase; publishing still runs against
/// the stored manifest.
pub fn run(
    config: &RunConfig,
    resolver: &dyn Resolve,
    fetcher: &dyn Fetch,
    messenger: &dyn Messenger,
    options: RunOptions,
) -> Result<RunReport, SyncError> {
    let captions = CaptionRenderer::from_file(config.caption_template.as_deref())?;
    let mut state = state_store::load_at(&config.state_dir)?;
    let mut report = RunReport::default();

    let catalog: Option<Catalog> = match catalog::load_at(&config.catalog_path) {
        Ok(c) => Some(c),
        Err(err) => {
            if options.sync {
                tracing::error!(
                    stage = "catalog",
                    error = %err,
                    "catalog unavailable; skipping sync phase"
                );
            } else {
                tracing::warn!(
                    stage = "catalog",
                    error = %err,
                    "catalog unavailable; captions fall back to file names"
                );
            }
            report.catalog_error = Some(err.to_string());
            None
        }
    };

    if options.sync {
        if let Some(catalog) = &catalog {
            let engine = ModuleSyncEngine::new(config, resolver, fetcher);
            let sync = engine.run(catalog, &mut state.manifest, options.dry_run);
            if sync.changed && !options.dry_run {
                state_store::save_at(&config.state_dir, &state)?;
            }
            tracing::info!(
                fetched = sync.fetched(),
                failed = sync.failed(),
                dry_run = options.dry_run,
                "sync phase complete"
            );
            report.sync = Some(sync);
        }
    }

    if options.publish {
        let engine = PublishEngine::new(config, messenger, &captions);
        let publish = engine.run(
            catalog.as_ref(),
            &state.manifest,
            &mut state.publish_state,
            options.dry_run,
        );
        if !options.dry_run {
            state_store::save_at(&config.state_dir, &state)?;
        }
        tracing::info!(
            published = publish.published(),
            failed = publish.failed(),
            dry_run = options.dry_run,
            "publish phase complete"
        );
        report.publish = Some(publish);
    }

    Ok(report)
}

/// Run the pipeline over the production adapters (`ureq`, Telegram Bot API).
pub fn run_with_network(
    config: &RunConfig,
    credentials: &Credentials,
    options: RunOptions,
) -> Result<RunReport, SyncError> {
    let http = UreqHttpClient::new(config, credentials);
    let messenger = BotApiMessenger::new(config, credentials);
    let resolver = SourceResolver::new(&http, &messenger, config.search_window);
    let fetcher = Fetcher::new(&http, &messenger);
    run(config, &resolver, &fetcher, &messenger, options)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{config, release, RecordingMessenger, StubFetcher, StubResolver};
    use modrelay_core::{ModuleName, VersionId};
    use tempfile::TempDir;

    fn write_catalog(cfg: &RunConfig, names: &[&str]) {
        let modules: Vec<_> = names
            .iter()
            .map(|n| {
                serde_json::json!({
                    "name": n,
                    "type": "github_release",
                    "source": format!("o/{n}"),
                    "asset_filter": "zip",
                    "enabled": true,
                })
            })
            .collect();
        let body = serde_json::json!({ "modules": modules }).to_string();
        std::fs::write(&cfg.catalog_path, body).unwrap();
    }

    #[test]
    fn full_run_syncs_then_publishes() {
        let tmp = TempDir::new().unwrap();
        let cfg = config(tmp.path());
        write_catalog(&cfg, &["foo"]);
        let resolver = StubResolver::default().with("foo", release("foo.zip", "v1"));
        let fetcher = StubFetcher::default();
        let messenger = RecordingMessenger::default();

        let report = run(&cfg, &resolver, &fetcher, &messenger, RunOptions::default()).unwrap();

        assert_eq!(report.failures(), 0);
        let state = state_store::load_at(&cfg.state_dir).unwrap();
        let name = ModuleName::from("foo");
        assert_eq!(state.manifest[&name].version_id, VersionId::from("v1"));
        assert_eq!(state.publish_state[&name].version_id, VersionId::from("v1"));
    }

    #[test]
    fn missing_catalog_still_publishes_stored_manifest() {
        let tmp = TempDir::new().unwrap();
        let cfg = config(tmp.path());
        std::fs::create_dir_all(&cfg.cache_dir).unwrap();
        std::fs::write(cfg.cache_path("foo.zip"), b"x").unwrap();
        let mut doc = state_store::StateDocument::default();
        doc.manifest
            .insert(ModuleName::from("foo"), release("foo.zip", "v1").into_parts().0);
        state_store::save_at(&cfg.state_dir, &doc).unwrap();

        let resolver = StubResolver::default();
        let fetcher = StubFetcher::default();
        let messenger = RecordingMessenger::default();
        let report = run(&cfg, &resolver, &fetcher, &messenger, RunOptions::default()).unwrap();

        assert!(report.catalog_error.is_some());
        assert!(report.sync.is_none());
        assert!(resolver.calls.borrow().is_empty());
        assert_eq!(messenger.uploads(), vec!["foo.zip".to_string()]);
    }

    #[test]
    fn corrupt_state_aborts_before_any_work() {
        let tmp = TempDir::new().unwrap();
        let cfg = config(tmp.path());
        write_catalog(&cfg, &["foo"]);
        std::fs::create_dir_all(&cfg.state_dir).unwrap();
        std::fs::write(cfg.state_path(), "garbage").unwrap();
        let resolver = StubResolver::default().with("foo", release("foo.zip", "v1"));
        let fetcher = StubFetcher::default();
        let messenger = RecordingMessenger::default();

        let err = run(&cfg, &resolver, &fetcher, &messenger, RunOptions::default()).unwrap_err();

        assert!(matches!(err, SyncError::StateParse { .. }));
        assert!(resolver.calls.borrow().is_empty());
        assert_eq!(std::fs::read_to_string(cfg.state_path()).unwrap(), "garbage");
    }

    #[test]
    fn dry_run_writes_no_state() {
        let tmp = TempDir::new().unwrap();
        let cfg = config(tmp.path());
        write_catalog(&cfg, &["foo"]);
        let resolver = StubResolver::default().with("foo", release("foo.zip", "v1"));
        let fetcher = StubFetcher::default();
        let messenger = RecordingMessenger::default();

        let options = RunOptions {
            dry_run: true,
            ..RunOptions::default()
        };
        run(&cfg, &resolver, &fetcher, &messenger, options).unwrap();

        assert!(!cfg.state_path().exists());
        assert!(fetcher.fetched.borrow().is_empty());
    }

    #[test]
    fn publish_only_skips_resolution() {
        let tmp = TempDir::new().unwrap();
        let cfg = config(tmp.path());
        write_catalog(&cfg, &["foo"]);
        let resolver = StubResolver::default().with("foo", release("foo.zip", "v1"));
        let fetcher = StubFetcher::default();
        let messenger = RecordingMessenger::default();

        let options = RunOptions {
            sync: false,
            ..RunOptions::default()
        };
        let report = run(&cfg, &resolver, &fetcher, &messenger, options).unwrap();

        assert!(resolver.calls.borrow().is_empty());
        assert!(report.sync.is_none());
        assert!(cfg.state_path().exists());
    }
}
