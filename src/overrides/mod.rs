//! Override ledger
//!
//! Overrides are a sparse mask applied at decision time. They never modify
//! findings and are never merged into stored state: the raw report keeps
//! every finding, and only finalize-eligibility consults the mask.

mod ledger;
mod record;

pub use ledger::{OverrideLedger, OverrideRequest};
pub use record::{OverrideId, OverrideKey, QuarterOverride};

use std::collections::BTreeSet;

/// Set of suppressed `(rule_key, incident_id)` pairings
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OverrideMask {
    keys: BTreeSet<OverrideKey>,
}

impl OverrideMask {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a mask from ledger records
    pub fn from_overrides(overrides: &[QuarterOverride]) -> Self {
        Self {
            keys: overrides.iter().map(QuarterOverride::key).collect(),
        }
    }

    /// Whether the pairing is suppressed
    pub fn suppresses(&self, rule_key: &str, incident_id: &str) -> bool {
        self.keys.contains(&OverrideKey::new(rule_key, incident_id))
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}
