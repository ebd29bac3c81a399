//! Durable storage for overrides and finalization records
//!
//! Both collections are append-only and keyed by quarter id. Overrides are
//! additionally unique on `(quarter_id, rule_key, incident_id)`.
//!
//! Supports both in-memory (testing, embedding) and file-backed storage.

mod checksum;
mod errors;
mod file;
mod memory;

pub use errors::{StoreError, StoreResult};
pub use file::FileRecordStore;
pub use memory::MemoryRecordStore;

use crate::finalization::QuarterFinalization;
use crate::overrides::QuarterOverride;

/// Trait for override and finalization persistence
pub trait RecordStore: Send + Sync {
    /// Insert an override.
    ///
    /// Fails with `StoreError::Conflict` if the triple already exists.
    fn insert_override(&self, record: &QuarterOverride) -> StoreResult<()>;

    /// All overrides recorded for a quarter, in no particular order
    fn overrides_for(&self, quarter_id: &str) -> StoreResult<Vec<QuarterOverride>>;

    /// Append a finalization record.
    ///
    /// Fails with `StoreError::Conflict` if the sequence number is taken.
    fn append_finalization(&self, record: &QuarterFinalization) -> StoreResult<()>;

    /// All finalization records for a quarter, in append order
    fn finalizations_for(&self, quarter_id: &str) -> StoreResult<Vec<QuarterFinalization>>;
}

impl<T: RecordStore + ?Sized> RecordStore for std::sync::Arc<T> {
    fn insert_override(&self, record: &QuarterOverride) -> StoreResult<()> {
        (**self).insert_override(record)
    }

    fn overrides_for(&self, quarter_id: &str) -> StoreResult<Vec<QuarterOverride>> {
        (**self).overrides_for(quarter_id)
    }

    fn append_finalization(&self, record: &QuarterFinalization) -> StoreResult<()> {
        (**self).append_finalization(record)
    }

    fn finalizations_for(&self, quarter_id: &str) -> StoreResult<Vec<QuarterFinalization>> {
        (**self).finalizations_for(quarter_id)
    }
}

/// Shared duplicate check for store implementations
pub(crate) fn check_override_unique(
    existing: &[QuarterOverride],
    record: &QuarterOverride,
) -> StoreResult<()> {
    if existing.iter().any(|o| o.same_triple(record)) {
        return Err(StoreError::Conflict(format!(
            "override exists for ({}, {}, {})",
            record.quarter_id, record.rule_key, record.incident_id
        )));
    }
    Ok(())
}

/// Shared sequence check for store implementations
pub(crate) fn check_sequence_free(
    existing: &[QuarterFinalization],
    record: &QuarterFinalization,
) -> StoreResult<()> {
    if existing.iter().any(|f| f.sequence == record.sequence) {
        return Err(StoreError::Conflict(format!(
            "finalization sequence {} already used for quarter {}",
            record.sequence, record.quarter_id
        )));
    }
    Ok(())
}
