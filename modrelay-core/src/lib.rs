//! modrelay core library — domain types, catalog loading, run configuration.
//!
//! - [`types`] — module descriptors, version descriptors, state entries
//! - [`catalog`] — load and validate the module catalog
//! - [`config`] — the immutable [`RunConfig`] threaded through every engine
//! - [`error`] — [`CatalogError`], [`ConfigError`]

pub mod catalog;
pub mod config;
pub mod error;
pub mod types;

pub use catalog::Catalog;
pub use config::{Credentials, RunConfig};
pub use error::{CatalogError, ConfigError};
pub use types::{
    Manifest, ManifestEntry, MessageId, MessageRef, ModuleDescriptor, ModuleName, PublishEntry,
    PublishState, SourceKind, SourceLocator, Transfer, VersionDescriptor, VersionId,
};
