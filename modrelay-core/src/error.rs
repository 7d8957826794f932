//! Error types for modrelay-core.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can arise while loading the module catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Underlying I/O failure reading the catalog file.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The catalog file does not exist.
    #[error("module catalog not found at {path}")]
    CatalogNotFound { path: PathBuf },

    /// JSON catalog is not a `{ "modules": [...] }` document.
    #[error("failed to parse catalog at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// YAML catalog is not a `modules:` document.
    #[error("failed to parse catalog at {path}: {source}")]
    ParseYaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// Two entries share a name; the name is the state key, so this is fatal.
    #[error("duplicate module name '{name}' in catalog")]
    DuplicateModule { name: String },
}

/// Errors in assembling the run configuration. Always fatal.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required credential or setting was not provided.
    #[error("missing required setting {name}")]
    Missing { name: &'static str },

    /// A setting was provided but is unusable.
    #[error("invalid value for {name}: {reason}")]
    Invalid { name: &'static str, reason: String },

    /// `dirs::cache_dir()` returned `None` and no cache dir was given.
    #[error("cannot determine cache directory; pass --cache-dir")]
    CacheDirNotFound,
}

pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> CatalogError {
    CatalogError::Io {
        path: path.into(),
        source,
    }
}
