//! Channel search resolver: newest document whose name contains the keyword.

use chrono::Utc;

use modrelay_core::{types::display_date, Transfer, VersionDescriptor, VersionId};

use crate::error::SourceError;
use crate::messenger::Messenger;

pub(super) fn resolve(
    messenger: &dyn Messenger,
    channel: &str,
    keyword: &str,
    window: usize,
) -> Result<Option<VersionDescriptor>, SourceError> {
    let needle = keyword.to_lowercase();
    let documents = messenger.recent_documents(channel, window)?;
    let found = documents
        .into_iter()
        .find(|doc| doc.file_name.to_lowercase().contains(&needle))
        .map(|doc| VersionDescriptor {
            version_id: VersionId(doc.message.message_id.to_string()),
            source_url: doc.permalink(),
            date: display_date(doc.posted_at.unwrap_or_else(Utc::now)),
            file_name: doc.file_name,
            transfer: Transfer::Message(doc.message),
        });
    Ok(found)
}
