//! # Finalization Errors
//!
//! Every error carries its kind and context so callers can branch on it.
//! Nothing is retried inside the engine.

use thiserror::Error;

use super::record::QuarterFinalization;
use crate::rules::ReadinessFinding;
use crate::store::StoreError;

/// Result type for engine operations
pub type FinalizeResult<T> = Result<T, FinalizeError>;

/// Finalization engine errors
#[derive(Debug, Clone, Error)]
pub enum FinalizeError {
    #[error("Quarter not found: {0}")]
    QuarterNotFound(String),

    #[error("Quarter {quarter_id} is not eligible to finalize: {} blocking finding(s)", findings.len())]
    NotEligible {
        quarter_id: String,
        findings: Vec<ReadinessFinding>,
    },

    #[error("Quarter {} is already finalized (snapshot {})", existing.quarter_id, existing.snapshot_id)]
    AlreadyFinalized { existing: Box<QuarterFinalization> },

    #[error("Override already recorded for rule {rule_key} on incident {incident_id} in quarter {quarter_id}")]
    DuplicateOverride {
        quarter_id: String,
        rule_key: String,
        incident_id: String,
    },

    #[error("Unknown rule key: {0}")]
    UnknownRule(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Store unavailable: {0}")]
    StoreUnavailable(StoreError),

    #[error("Digest mismatch for quarter {quarter_id}: {first} != {second}")]
    DigestMismatchInternal {
        quarter_id: String,
        first: String,
        second: String,
    },
}

impl FinalizeError {
    /// Get the stable error code
    pub fn code(&self) -> &'static str {
        match self {
            FinalizeError::QuarterNotFound(_) => "QC_QUARTER_NOT_FOUND",
            FinalizeError::NotEligible { .. } => "QC_NOT_ELIGIBLE",
            FinalizeError::AlreadyFinalized { .. } => "QC_ALREADY_FINALIZED",
            FinalizeError::DuplicateOverride { .. } => "QC_DUPLICATE_OVERRIDE",
            FinalizeError::UnknownRule(_) => "QC_UNKNOWN_RULE",
            FinalizeError::InvalidInput(_) => "QC_INVALID_INPUT",
            FinalizeError::StoreUnavailable(_) => "QC_STORE_UNAVAILABLE",
            FinalizeError::DigestMismatchInternal { .. } => "QC_DIGEST_MISMATCH_INTERNAL",
        }
    }

    /// Whether the caller can resolve the condition and retry.
    ///
    /// A digest mismatch is an implementation bug, not a user condition.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, FinalizeError::DigestMismatchInternal { .. })
    }
}

impl From<StoreError> for FinalizeError {
    fn from(err: StoreError) -> Self {
        match err {
            // keys come from caller input
            StoreError::InvalidKey(reason) => FinalizeError::InvalidInput(reason),
            other => FinalizeError::StoreUnavailable(other),
        }
    }
}
