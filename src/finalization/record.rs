//! Finalization records and status view

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::overrides::QuarterOverride;
use crate::readiness::QuarterReadinessReport;

/// Durable record of one successful finalize.
///
/// Never mutated. A later finalize supersedes it; the old record stays in
/// the history for audit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuarterFinalization {
    pub snapshot_id: Uuid,
    pub quarter_id: String,
    /// 1-based position in the quarter's finalization history
    pub sequence: u32,
    pub finalized_at: DateTime<Utc>,
    pub finalized_by: String,
    /// Lowercase hex SHA-256 of the canonical inputs
    pub inputs_hash: String,
    #[serde(default)]
    pub notes: Option<String>,
    /// Snapshot id of the record this one superseded
    #[serde(default)]
    pub supersedes: Option<Uuid>,
}

impl QuarterFinalization {
    /// Create a record with a fresh snapshot id
    pub fn new(
        quarter_id: impl Into<String>,
        sequence: u32,
        finalized_by: impl Into<String>,
        inputs_hash: impl Into<String>,
        notes: Option<String>,
        supersedes: Option<Uuid>,
        finalized_at: DateTime<Utc>,
    ) -> Self {
        Self {
            snapshot_id: Uuid::new_v4(),
            quarter_id: quarter_id.into(),
            sequence,
            finalized_at,
            finalized_by: finalized_by.into(),
            inputs_hash: inputs_hash.into(),
            notes,
            supersedes,
        }
    }
}

/// Pick the active record: the highest sequence
pub fn current_of(history: &[QuarterFinalization]) -> Option<&QuarterFinalization> {
    history.iter().max_by_key(|f| f.sequence)
}

/// Read-only composite view of a quarter's finalization state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuarterFinalizationStatus {
    pub quarter_id: String,
    pub is_finalized: bool,
    pub finalization: Option<QuarterFinalization>,
    pub readiness: QuarterReadinessReport,
    pub overrides: Vec<QuarterOverride>,
    /// Digest stored at finalization time
    pub snapshot_inputs_hash: Option<String>,
    /// Digest of the current facts and overrides
    pub current_inputs_hash: String,
    pub facts_changed_since_finalization: bool,
}

impl QuarterFinalizationStatus {
    /// Derived lifecycle state name
    pub fn state_name(&self) -> &'static str {
        match (self.is_finalized, self.facts_changed_since_finalization) {
            (false, _) => "Open",
            (true, false) => "Finalized",
            (true, true) => "Drifted",
        }
    }
}
