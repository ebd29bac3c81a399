//! Append-only override ledger
//!
//! - `record` inserts a new override; duplicates of the triple fail
//! - No update or delete path exists
//! - Overrides are not validated against current findings, since the
//!   dataset may change before finalize

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::record::QuarterOverride;
use super::OverrideMask;
use crate::finalization::{FinalizeError, FinalizeResult};
use crate::rules::RuleKey;
use crate::store::{RecordStore, StoreError};

/// Parameters for a new override
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverrideRequest {
    pub quarter_id: String,
    pub rule_key: String,
    pub incident_id: String,
    pub reason: String,
    pub approved_by: String,
}

impl OverrideRequest {
    fn validate(&self) -> FinalizeResult<()> {
        if RuleKey::parse(&self.rule_key).is_none() {
            return Err(FinalizeError::UnknownRule(self.rule_key.clone()));
        }
        for (field, value) in [
            ("incident_id", &self.incident_id),
            ("reason", &self.reason),
            ("approved_by", &self.approved_by),
        ] {
            if value.trim().is_empty() {
                return Err(FinalizeError::InvalidInput(format!(
                    "{} must not be empty",
                    field
                )));
            }
        }
        Ok(())
    }
}

/// Ledger view over a record store
pub struct OverrideLedger<'a> {
    store: &'a dyn RecordStore,
}

impl<'a> OverrideLedger<'a> {
    pub fn new(store: &'a dyn RecordStore) -> Self {
        Self { store }
    }

    /// Record a new override.
    ///
    /// # Errors
    ///
    /// - `UnknownRule` if the rule key is not in the catalog
    /// - `InvalidInput` if a required field is blank
    /// - `DuplicateOverride` if the triple already exists
    pub fn record(
        &self,
        request: &OverrideRequest,
        created_at: DateTime<Utc>,
    ) -> FinalizeResult<QuarterOverride> {
        request.validate()?;

        let record = QuarterOverride::new(
            request.quarter_id.clone(),
            request.rule_key.clone(),
            request.incident_id.trim(),
            request.reason.trim(),
            request.approved_by.trim(),
            created_at,
        );

        match self.store.insert_override(&record) {
            Ok(()) => Ok(record),
            Err(StoreError::Conflict(_)) => Err(FinalizeError::DuplicateOverride {
                quarter_id: record.quarter_id,
                rule_key: record.rule_key,
                incident_id: record.incident_id,
            }),
            Err(e) => Err(e.into()),
        }
    }

    /// Overrides for a quarter, sorted by `created_at` then id
    pub fn list(&self, quarter_id: &str) -> FinalizeResult<Vec<QuarterOverride>> {
        let mut overrides = self.store.overrides_for(quarter_id)?;
        overrides.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(overrides)
    }

    /// Suppression mask for a quarter
    pub fn mask(&self, quarter_id: &str) -> FinalizeResult<OverrideMask> {
        Ok(OverrideMask::from_overrides(&self.store.overrides_for(quarter_id)?))
    }
}
