//! Error types for modrelay-sync.

use std::path::PathBuf;

use thiserror::Error;

use modrelay_core::{CatalogError, ConfigError};

/// Errors that abort a phase or a whole run.
///
/// Per-module failures never appear here; they are logged and recorded in
/// the phase report instead.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The module catalog could not be loaded.
    #[error("catalog error: {0}")]
    Catalog(#[from] CatalogError),

    /// Invalid run configuration.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// An I/O error, with annotated path for context.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The state document exists but cannot be decoded.
    #[error("failed to parse state document at {path}: {source}")]
    StateParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// JSON serialization error (state save path).
    #[error("state JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Caption template failed to load or render.
    #[error("caption template error: {0}")]
    Template(#[from] tera::Error),
}

/// Convenience constructor for [`SyncError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> SyncError {
    SyncError::Io {
        path: path.into(),
        source,
    }
}
