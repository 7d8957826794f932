//! In-memory capability fakes for unit tests.

use std::cell::RefCell;
use std::collections::HashMap;
use std::path::Path;

use serde_json::Value;

use modrelay_core::{MessageId, MessageRef};

use crate::error::SourceError;
use crate::http::HttpClient;
use crate::messenger::{ChannelDocument, Messenger};

#[derive(Default)]
pub(crate) struct FakeHttp {
    json: HashMap<String, Value>,
    text: HashMap<String, String>,
    files: HashMap<String, Vec<u8>>,
    pub requested: RefCell<Vec<String>>,
}

impl FakeHttp {
    pub fn with_json(mut self, url: &str, body: Value) -> Self {
        self.json.insert(url.to_string(), body);
        self
    }

    pub fn with_text(mut self, url: &str, body: &str) -> Self {
        self.text.insert(url.to_string(), body.to_string());
        self
    }

    pub fn with_file(mut self, url: &str, bytes: &[u8]) -> Self {
        self.files.insert(url.to_string(), bytes.to_vec());
        self
    }

    fn missing(url: &str) -> SourceError {
        SourceError::Http {
            target: url.to_string(),
            reason: "status 404".into(),
        }
    }
}

impl HttpClient for FakeHttp {
    fn get_json(&self, url: &str) -> Result<Value, SourceError> {
        self.requested.borrow_mut().push(url.to_string());
        self.json.get(url).cloned().ok_or_else(|| Self::missing(url))
    }

    fn get_text(&self, url: &str) -> Result<String, SourceError> {
        self.requested.borrow_mut().push(url.to_string());
        self.text.get(url).cloned().ok_or_else(|| Self::missing(url))
    }

    fn download_to(&self, url: &str, dest: &Path) -> Result<u64, SourceError> {
        self.requested.borrow_mut().push(url.to_string());
        match self.files.get(url) {
            Some(bytes) => {
                std::fs::write(dest, bytes).map_err(|e| crate::error::io_err(dest, e))?;
                Ok(bytes.len() as u64)
            }
            None => {
                // Leave a partial file behind, like an interrupted transfer would.
                std::fs::write(dest, b"partial").map_err(|e| crate::error::io_err(dest, e))?;
                Err(Self::missing(url))
            }
        }
    }
}

/// Channel documents listed newest-first in insertion order.
#[derive(Default)]
pub(crate) struct FakeMessenger {
    documents: Vec<ChannelDocument>,
    payloads: HashMap<i64, Vec<u8>>,
}

impl FakeMessenger {
    pub fn with_document(mut self, channel: &str, id: i64, file_name: &str) -> Self {
        self.documents.push(ChannelDocument {
            message: MessageRef {
                channel: channel.to_string(),
                message_id: MessageId(id),
            },
            file_name: file_name.to_string(),
            posted_at: None,
        });
        self
    }

    pub fn with_payload(mut self, id: i64, bytes: &[u8]) -> Self {
        self.payloads.insert(id, bytes.to_vec());
        self
    }
}

impl Messenger for FakeMessenger {
    fn recent_documents(
        &self,
        channel: &str,
        limit: usize,
    ) -> Result<Vec<ChannelDocument>, SourceError> {
        Ok(self
            .documents
            .iter()
            .filter(|d| d.message.channel == channel)
            .take(limit)
            .cloned()
            .collect())
    }

    fn download_document(&self, message: &MessageRef, dest: &Path) -> Result<u64, SourceError> {
        let bytes = self
            .payloads
            .get(&message.message_id.0)
            .ok_or_else(|| SourceError::Api {
                method: "forwardMessage",
                description: "message not found".into(),
            })?;
        std::fs::write(dest, bytes).map_err(|e| crate::error::io_err(dest, e))?;
        Ok(bytes.len() as u64)
    }

    fn send_document(&self, _: &str, _: &Path, _: &str) -> Result<MessageId, SourceError> {
        unimplemented!("not used by source tests")
    }

    fn delete_message(&self, _: &str, _: MessageId) -> Result<(), SourceError> {
        unimplemented!("not used by source tests")
    }
}
