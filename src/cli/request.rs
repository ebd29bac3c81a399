//! Request types
//!
//! One JSON object per request, discriminated by `"command"`.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use super::errors::{CliError, CliResult};

/// Unified request envelope
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum Request {
    GetQuarterReadiness {
        quarter_id: String,
    },
    ListQuarterOverrides {
        quarter_id: String,
    },
    RecordQuarterOverride {
        quarter_id: String,
        rule_key: String,
        incident_id: String,
        reason: String,
        approved_by: String,
    },
    FinalizeQuarter {
        quarter_id: String,
        finalized_by: String,
        #[serde(default)]
        notes: Option<String>,
    },
    GetQuarterFinalizationStatus {
        quarter_id: String,
    },
    ListQuarterFinalizations {
        quarter_id: String,
    },
    GetQuarterFinalization {
        quarter_id: String,
        snapshot_id: Uuid,
    },
    ListRuleCatalog,
    /// Re-read the facts dataset from disk
    ReloadFacts,
}

impl Request {
    /// Parse a request from a JSON value
    pub fn parse(value: Value) -> CliResult<Self> {
        serde_json::from_value(value)
            .map_err(|e| CliError::InvalidRequest(format!("Invalid request: {}", e)))
    }

    /// Command name as it appears on the wire
    pub fn name(&self) -> &'static str {
        match self {
            Request::GetQuarterReadiness { .. } => "get_quarter_readiness",
            Request::ListQuarterOverrides { .. } => "list_quarter_overrides",
            Request::RecordQuarterOverride { .. } => "record_quarter_override",
            Request::FinalizeQuarter { .. } => "finalize_quarter",
            Request::GetQuarterFinalizationStatus { .. } => "get_quarter_finalization_status",
            Request::ListQuarterFinalizations { .. } => "list_quarter_finalizations",
            Request::GetQuarterFinalization { .. } => "get_quarter_finalization",
            Request::ListRuleCatalog => "list_rule_catalog",
            Request::ReloadFacts => "reload_facts",
        }
    }
}
