//! Observable engine events
//!
//! Events are explicit and typed.

use std::fmt;

/// Observable events in the finalization engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Lifecycle
    /// Engine opened its stores
    EngineOpened,
    /// Configuration loaded
    ConfigLoaded,
    /// Request loop ready
    Serving,
    /// Request loop ended
    ShutdownComplete,

    // Readiness
    /// Readiness report computed
    ReadinessEvaluated,

    // Overrides
    /// Override appended to the ledger
    OverrideRecorded,
    /// Override rejected (duplicate, unknown rule, invalid input)
    OverrideRejected,

    // Finalization
    /// Finalize rejected by a business rule
    FinalizeRejected,
    /// Drift detected on a finalized quarter
    DriftDetected,
    /// Two hashes of one payload disagreed (FATAL)
    DigestMismatch,

    // Storage
    /// Unfinished trailing record skipped on read
    IncompleteRecordDiscarded,
    /// Failed append truncated back to the last complete record
    AppendRolledBack,

    // Requests
    /// Request failed
    RequestFailed,
}

impl Event {
    /// Returns the string representation of the event
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::EngineOpened => "ENGINE_OPENED",
            Event::ConfigLoaded => "CONFIG_LOADED",
            Event::Serving => "QUARTERCLOSE_SERVING",
            Event::ShutdownComplete => "SHUTDOWN_COMPLETE",

            Event::ReadinessEvaluated => "READINESS_EVALUATED",

            Event::OverrideRecorded => "OVERRIDE_RECORDED",
            Event::OverrideRejected => "OVERRIDE_REJECTED",

            Event::FinalizeRejected => "FINALIZE_REJECTED",
            Event::DriftDetected => "DRIFT_DETECTED",
            Event::DigestMismatch => "DIGEST_MISMATCH",

            Event::IncompleteRecordDiscarded => "INCOMPLETE_RECORD_DISCARDED",
            Event::AppendRolledBack => "APPEND_ROLLED_BACK",

            Event::RequestFailed => "REQUEST_FAILED",
        }
    }

    /// Returns true if this event indicates a broken internal invariant
    pub fn is_fatal(&self) -> bool {
        matches!(self, Event::DigestMismatch)
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
