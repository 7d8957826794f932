//! Error types for modrelay-sources.

use std::path::PathBuf;

use thiserror::Error;

/// Failures inside a resolver, the fetcher, or a platform adapter.
///
/// Resolvers never surface these to the engines; they are logged and turned
/// into "not found". Fetch and broadcast errors are returned so the engines
/// can leave the affected state entry untouched.
#[derive(Debug, Error)]
pub enum SourceError {
    /// Transport failure or non-success status from an HTTP endpoint.
    #[error("request to {target} failed: {reason}")]
    Http { target: String, reason: String },

    /// The messaging platform answered but refused the call.
    #[error("{method} rejected: {description}")]
    Api {
        method: &'static str,
        description: String,
    },

    /// A response did not have the expected shape.
    #[error("unexpected response from {target}: {reason}")]
    Malformed { target: String, reason: String },

    /// An endpoint URL could not be built.
    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// JSON decode error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// An I/O error, with annotated path for context.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A module's asset filter is not a valid regular expression.
    #[error("invalid asset filter '{pattern}': {source}")]
    InvalidFilter {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// A remote file name cannot be used as a cache file name.
    #[error("refusing unsafe file name '{name}'")]
    UnsafeFileName { name: String },
}

/// Convenience constructor for [`SourceError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> SourceError {
    SourceError::Io {
        path: path.into(),
        source,
    }
}

pub(crate) fn malformed(target: impl Into<String>, reason: impl Into<String>) -> SourceError {
    SourceError::Malformed {
        target: target.into(),
        reason: reason.into(),
    }
}
