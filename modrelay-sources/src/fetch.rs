//! Artifact fetcher.
//!
//! Downloads always land in `<dest>.part` first and are renamed into place
//! only on success, so a failed transfer never leaves a file under the
//! artifact's real name. The `.part` file is removed on every failure path.

use std::path::{Path, PathBuf};

use modrelay_core::Transfer;

use crate::error::{io_err, SourceError};
use crate::http::HttpClient;
use crate::messenger::Messenger;

/// Retrieve an artifact into the content cache.
pub trait Fetch {
    /// Consume `transfer` and write the artifact to `dest`; returns its size.
    fn fetch(&self, transfer: Transfer, dest: &Path) -> Result<u64, SourceError>;
}

/// Production fetcher: message handles go through the messenger, URLs
/// through the HTTP client.
pub struct Fetcher<'a> {
    http: &'a dyn HttpClient,
    messenger: &'a dyn Messenger,
}

impl<'a> Fetcher<'a> {
    pub fn new(http: &'a dyn HttpClient, messenger: &'a dyn Messenger) -> Self {
        Self { http, messenger }
    }
}

impl Fetch for Fetcher<'_> {
    fn fetch(&self, transfer: Transfer, dest: &Path) -> Result<u64, SourceError> {
        if let Some(parent) = dest.parent() {
            std::fs::create_dir_all(parent).map_err(|e| io_err(parent, e))?;
        }
        let part = part_path(dest);

        let result = match &transfer {
            Transfer::Message(message) => self.messenger.download_document(message, &part),
            Transfer::Url(url) => self.http.download_to(url, &part),
        };

        match result {
            Ok(size) => {
                if let Err(e) = std::fs::rename(&part, dest) {
                    let _ = std::fs::remove_file(&part);
                    return Err(io_err(dest, e));
                }
                Ok(size)
            }
            Err(err) => {
                let _ = std::fs::remove_file(&part);
                Err(err)
            }
        }
    }
}

/// `<dest>.part`
pub fn part_path(dest: &Path) -> PathBuf {
    PathBuf::from(format!("{}.part", dest.display()))
}

/// Validate a remote file name for use as a cache file name.
///
/// Must be a single, plain path component: no separators, not `.`/`..`,
/// not empty.
pub fn cache_file_name(name: &str) -> Result<&str, SourceError> {
    let unsafe_name = name.is_empty()
        || name == "."
        || name == ".."
        || name.contains(['/', '\\', '\0']);
    if unsafe_name {
        return Err(SourceError::UnsafeFileName {
            name: name.to_string(),
        });
    }
    Ok(name)
}
