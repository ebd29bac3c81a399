//! Override records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Override identifier
pub type OverrideId = Uuid;

/// A human-approved exception for one `(rule_key, incident_id)` pairing.
///
/// Immutable once recorded. Corrections are new overrides.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuarterOverride {
    pub id: OverrideId,
    pub quarter_id: String,
    pub rule_key: String,
    pub incident_id: String,
    pub reason: String,
    pub approved_by: String,
    pub created_at: DateTime<Utc>,
}

impl QuarterOverride {
    /// Create a new override with a fresh id
    pub fn new(
        quarter_id: impl Into<String>,
        rule_key: impl Into<String>,
        incident_id: impl Into<String>,
        reason: impl Into<String>,
        approved_by: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            quarter_id: quarter_id.into(),
            rule_key: rule_key.into(),
            incident_id: incident_id.into(),
            reason: reason.into(),
            approved_by: approved_by.into(),
            created_at,
        }
    }

    /// The pairing this override suppresses
    pub fn key(&self) -> OverrideKey {
        OverrideKey::new(self.rule_key.clone(), self.incident_id.clone())
    }

    /// Whether both overrides share the uniqueness triple
    pub fn same_triple(&self, other: &QuarterOverride) -> bool {
        self.quarter_id == other.quarter_id
            && self.rule_key == other.rule_key
            && self.incident_id == other.incident_id
    }
}

/// `(rule_key, incident_id)` pairing, ordered by rule key then incident
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct OverrideKey {
    pub rule_key: String,
    pub incident_id: String,
}

impl OverrideKey {
    pub fn new(rule_key: impl Into<String>, incident_id: impl Into<String>) -> Self {
        Self {
            rule_key: rule_key.into(),
            incident_id: incident_id.into(),
        }
    }
}
