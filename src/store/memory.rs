//! In-memory record store

use std::collections::HashMap;
use std::sync::RwLock;

use super::{check_override_unique, check_sequence_free, RecordStore, StoreError, StoreResult};
use crate::finalization::QuarterFinalization;
use crate::overrides::QuarterOverride;

/// In-memory record store for testing and embedding
#[derive(Debug, Default)]
pub struct MemoryRecordStore {
    overrides: RwLock<HashMap<String, Vec<QuarterOverride>>>,
    finalizations: RwLock<HashMap<String, Vec<QuarterFinalization>>>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RecordStore for MemoryRecordStore {
    fn insert_override(&self, record: &QuarterOverride) -> StoreResult<()> {
        let mut overrides = self
            .overrides
            .write()
            .map_err(|_| StoreError::lock_poisoned())?;
        let entries = overrides.entry(record.quarter_id.clone()).or_default();
        check_override_unique(entries, record)?;
        entries.push(record.clone());
        Ok(())
    }

    fn overrides_for(&self, quarter_id: &str) -> StoreResult<Vec<QuarterOverride>> {
        let overrides = self
            .overrides
            .read()
            .map_err(|_| StoreError::lock_poisoned())?;
        Ok(overrides.get(quarter_id).cloned().unwrap_or_default())
    }

    fn append_finalization(&self, record: &QuarterFinalization) -> StoreResult<()> {
        let mut finalizations = self
            .finalizations
            .write()
            .map_err(|_| StoreError::lock_poisoned())?;
        let entries = finalizations.entry(record.quarter_id.clone()).or_default();
        check_sequence_free(entries, record)?;
        entries.push(record.clone());
        Ok(())
    }

    fn finalizations_for(&self, quarter_id: &str) -> StoreResult<Vec<QuarterFinalization>> {
        let finalizations = self
            .finalizations
            .read()
            .map_err(|_| StoreError::lock_poisoned())?;
        Ok(finalizations.get(quarter_id).cloned().unwrap_or_default())
    }
}
