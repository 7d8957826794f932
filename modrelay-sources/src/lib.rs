//! # modrelay-sources
//!
//! Capabilities and adapters for everything that crosses the network:
//!
//! - [`http`] — [`HttpClient`] and its `ureq` implementation
//! - [`messenger`] — [`Messenger`] (channel documents, broadcast uploads)
//! - [`telegram`] — Bot API implementation of [`Messenger`]
//! - [`resolve`] — [`Resolve`] and the per-source-kind [`SourceResolver`]
//! - [`fetch`] — [`Fetch`] and the `.part`-then-rename [`Fetcher`]

pub mod error;
pub mod fetch;
pub mod http;
pub mod messenger;
pub mod resolve;
pub mod telegram;

#[cfg(test)]
mod testing;

pub use error::SourceError;
pub use fetch::{cache_file_name, Fetch, Fetcher};
pub use http::{HttpClient, UreqHttpClient};
pub use messenger::{ChannelDocument, Messenger};
pub use resolve::{compile_filter, Resolve, SourceResolver};
pub use telegram::BotApiMessenger;
