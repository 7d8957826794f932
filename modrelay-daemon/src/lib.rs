//! Scheduled pipeline runs: one run per interval until ctrl-c.

mod error;
mod runtime;

pub use error::DaemonError;
pub use runtime::{init_tracing, run, run_schedule, start_blocking, RunJob};
