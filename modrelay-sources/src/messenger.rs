//! Messaging capability: channel documents in, broadcast messages out.

use std::path::Path;

use chrono::{DateTime, Utc};

use modrelay_core::{MessageId, MessageRef};

use crate::error::SourceError;

/// A document attached to a channel message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelDocument {
    pub message: MessageRef,
    pub file_name: String,
    pub posted_at: Option<DateTime<Utc>>,
}

impl ChannelDocument {
    /// Public permalink of the carrying message.
    pub fn permalink(&self) -> String {
        format!(
            "https://t.me/{}/{}",
            self.message.channel.trim_start_matches('@'),
            self.message.message_id
        )
    }
}

/// Operations consumed from the messaging platform.
///
/// Every call is blocking and bounded by the adapter's own timeout.
pub trait Messenger {
    /// Documents among the newest `limit` messages of `channel`, newest first.
    fn recent_documents(
        &self,
        channel: &str,
        limit: usize,
    ) -> Result<Vec<ChannelDocument>, SourceError>;

    /// Write the document attached to `message` to `dest`.
    fn download_document(&self, message: &MessageRef, dest: &Path) -> Result<u64, SourceError>;

    /// Upload `path` to `chat` with an HTML caption; returns the new message id.
    fn send_document(
        &self,
        chat: &str,
        path: &Path,
        caption: &str,
    ) -> Result<MessageId, SourceError>;

    /// Delete message `id` from `chat`.
    fn delete_message(&self, chat: &str, id: MessageId) -> Result<(), SourceError>;
}
