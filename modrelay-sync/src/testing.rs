//! In-memory collaborators for engine unit tests.

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use modrelay_core::{
    MessageId, MessageRef, ModuleDescriptor, ModuleName, RunConfig, SourceLocator, Transfer,
    VersionDescriptor, VersionId,
};
use modrelay_sources::{ChannelDocument, Fetch, Messenger, Resolve, SourceError};

pub fn config(root: &Path) -> RunConfig {
    RunConfig::new(
        root.join("modules.json"),
        root.join("state"),
        root.join("cache"),
        Some("@broadcast".into()),
        Some("-1001".into()),
    )
    .unwrap()
}

pub fn module(name: &str) -> ModuleDescriptor {
    ModuleDescriptor {
        name: ModuleName::from(name),
        source: SourceLocator::ForgeRelease {
            repository: format!("o/{name}"),
            asset_filter: r"\.zip$".into(),
        },
        enabled: true,
        description: None,
    }
}

pub fn release(file: &str, version: &str) -> VersionDescriptor {
    VersionDescriptor {
        file_name: file.into(),
        version_id: VersionId::from(version),
        source_url: format!("https://example.com/{file}"),
        date: "01.01.2024 00:00".into(),
        transfer: Transfer::Url(format!("https://dl.example.com/{file}")),
    }
}

#[derive(Default)]
pub struct StubResolver {
    found: HashMap<ModuleName, VersionDescriptor>,
    pub calls: RefCell<Vec<ModuleName>>,
}

impl StubResolver {
    pub fn with(mut self, name: &str, found: VersionDescriptor) -> Self {
        self.found.insert(ModuleName::from(name), found);
        self
    }
}

impl Resolve for StubResolver {
    fn resolve(&self, module: &ModuleDescriptor) -> Option<VersionDescriptor> {
        self.calls.borrow_mut().push(module.name.clone());
        self.found.get(&module.name).cloned()
    }
}

/// Writes a fixed payload; fails for URLs containing a registered needle.
#[derive(Default)]
pub struct StubFetcher {
    failing: HashSet<String>,
    pub fetched: RefCell<Vec<PathBuf>>,
}

impl StubFetcher {
    pub fn failing_for(mut self, needle: &str) -> Self {
        self.failing.insert(needle.to_string());
        self
    }
}

impl Fetch for StubFetcher {
    fn fetch(&self, transfer: Transfer, dest: &Path) -> Result<u64, SourceError> {
        let target = match transfer {
            Transfer::Url(url) => url,
            Transfer::Message(m) => format!("{}/{}", m.channel, m.message_id),
        };
        if self.failing.iter().any(|n| target.contains(n.as_str())) {
            return Err(SourceError::Http {
                target,
                reason: "connection reset".into(),
            });
        }
        std::fs::create_dir_all(dest.parent().unwrap()).unwrap();
        std::fs::write(dest, b"artifact").unwrap();
        self.fetched.borrow_mut().push(dest.to_path_buf());
        Ok(8)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sent {
    Delete { chat: String, id: MessageId },
    Upload { chat: String, file: String, caption: String },
}

/// Records broadcast calls in order and hands out increasing message ids.
pub struct RecordingMessenger {
    pub log: RefCell<Vec<Sent>>,
    next_id: Cell<i64>,
    failing_uploads: HashSet<String>,
    failing_deletes: bool,
}

impl Default for RecordingMessenger {
    fn default() -> Self {
        Self {
            log: RefCell::default(),
            next_id: Cell::new(100),
            failing_uploads: HashSet::new(),
            failing_deletes: false,
        }
    }
}

impl RecordingMessenger {
    pub fn failing_upload(mut self, file: &str) -> Self {
        self.failing_uploads.insert(file.to_string());
        self
    }

    pub fn failing_deletes(mut self) -> Self {
        self.failing_deletes = true;
        self
    }

    pub fn uploads(&self) -> Vec<String> {
        self.log
            .borrow()
            .iter()
            .filter_map(|s| match s {
                Sent::Upload { file, .. } => Some(file.clone()),
                Sent::Delete { .. } => None,
            })
            .collect()
    }
}

impl Messenger for RecordingMessenger {
    fn recent_documents(&self, _: &str, _: usize) -> Result<Vec<ChannelDocument>, SourceError> {
        Ok(Vec::new())
    }

    fn download_document(&self, _: &MessageRef, _: &Path) -> Result<u64, SourceError> {
        unreachable!("publishing never downloads")
    }

    fn send_document(
        &self,
        chat: &str,
        path: &Path,
        caption: &str,
    ) -> Result<MessageId, SourceError> {
        let file = path.file_name().unwrap().to_string_lossy().into_owned();
        if self.failing_uploads.contains(&file) {
            return Err(SourceError::Api {
                method: "sendDocument",
                description: "Request Entity Too Large".into(),
            });
        }
        self.log.borrow_mut().push(Sent::Upload {
            chat: chat.into(),
            file,
            caption: caption.into(),
        });
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        Ok(MessageId(id))
    }

    fn delete_message(&self, chat: &str, id: MessageId) -> Result<(), SourceError> {
        self.log.borrow_mut().push(Sent::Delete {
            chat: chat.into(),
            id,
        });
        if self.failing_deletes {
            return Err(SourceError::Api {
                method: "deleteMessage",
                description: "message to delete not found".into(),
            });
        }
        Ok(())
    }
}
