//! Finalization store and drift detector
//!
//! A finalized quarter carries a durable record of who certified it, when,
//! and the digest of every input at that moment. Later edits are detected
//! by recomputing the digest, never by tracking changes in the source.

mod engine;
mod errors;
mod locks;
mod record;

pub use engine::FinalizationEngine;
pub use errors::{FinalizeError, FinalizeResult};
pub use locks::QuarterLocks;
pub use record::{current_of, QuarterFinalization, QuarterFinalizationStatus};
