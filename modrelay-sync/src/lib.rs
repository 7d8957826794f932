//! # modrelay-sync
//!
//! State store, the two reconciliation engines, and run orchestration.
//!
//! Call [`pipeline::run_with_network`] for a production run, or
//! [`pipeline::run`] with your own collaborators.

pub mod caption;
pub mod error;
pub mod module_sync;
pub mod pipeline;
pub mod publish;
pub mod state_store;
pub mod status;

#[cfg(test)]
mod testing;

pub use caption::CaptionRenderer;
pub use error::SyncError;
pub use module_sync::{ModuleSyncEngine, SyncOutcome, SyncReport};
pub use pipeline::{run, run_with_network, RunOptions, RunReport};
pub use publish::{PublishEngine, PublishOutcome, PublishReport};
pub use state_store::StateDocument;
pub use status::{ModuleStatus, StatusRow};
