//! quarterclose - quarterly readiness and finalization for incident data
//!
//! Evaluates a fiscal quarter's incident records against a frozen rule
//! catalog, lets approvers suppress individual findings with permanent
//! overrides, and certifies the quarter with a content digest of every
//! contributing fact. Later edits are surfaced as drift.
//!
//! ```text
//! FactSource --> rules --> readiness <-- overrides
//!                              |
//!                              v
//!            digest --> finalization --> RecordStore
//! ```

pub mod cli;
pub mod clock;
pub mod digest;
pub mod finalization;
pub mod model;
pub mod observability;
pub mod overrides;
pub mod readiness;
pub mod rules;
pub mod source;
pub mod store;

pub use finalization::{
    FinalizationEngine, FinalizeError, FinalizeResult, QuarterFinalization,
    QuarterFinalizationStatus,
};
pub use overrides::QuarterOverride;
pub use readiness::QuarterReadinessReport;
pub use rules::{FindingSeverity, ReadinessFinding, RuleKey};
