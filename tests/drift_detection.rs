//! Drift Detection Tests
//!
//! Quarter states: Open -> Finalized -> Drifted -> Finalized(new)
//!
//! - Drift is derived by re-hashing, never stored
//! - Re-finalize supersedes; prior records stay retrievable

mod common;

use common::*;
use quarterclose::model::{ActionItem, ChecklistSummary};
use quarterclose::FinalizeError;

// =============================================================================
// Drift Round-Trip
// =============================================================================

/// Finalize, then add an action item: drift is reported.
#[test]
fn test_new_action_item_causes_drift() {
    let engine = engine_with(vec![clean_incident("INC-1", 4)]);
    let record = engine.finalize_quarter(QUARTER, "alice", None).unwrap();

    let status = engine.get_quarter_finalization_status(QUARTER).unwrap();
    assert!(status.is_finalized);
    assert!(!status.facts_changed_since_finalization);
    assert_eq!(status.state_name(), "Finalized");
    assert_eq!(status.snapshot_inputs_hash.as_deref(), Some(record.inputs_hash.as_str()));
    assert_eq!(status.current_inputs_hash, record.inputs_hash);

    engine
        .source()
        .upsert_action_item(ActionItem::new("AI-1", "INC-1", "add cert expiry alert"))
        .unwrap();

    let status = engine.get_quarter_finalization_status(QUARTER).unwrap();
    assert!(status.is_finalized);
    assert!(status.facts_changed_since_finalization);
    assert_eq!(status.state_name(), "Drifted");
    assert_ne!(
        status.snapshot_inputs_hash.as_deref(),
        Some(status.current_inputs_hash.as_str())
    );
    // drift does not unlock or alter the record
    assert_eq!(status.finalization, Some(record));
}

/// A new override after finalization is drift too.
#[test]
fn test_new_override_causes_drift() {
    let engine = engine_with(vec![clean_incident("INC-1", 4)]);
    engine.finalize_quarter(QUARTER, "alice", None).unwrap();

    engine
        .record_quarter_override(QUARTER, "missing_resolution", "INC-1", "late note", "bob")
        .unwrap();

    assert!(
        engine
            .get_quarter_finalization_status(QUARTER)
            .unwrap()
            .facts_changed_since_finalization
    );
}

/// Facts outside the window never cause drift.
#[test]
fn test_out_of_window_change_is_not_drift() {
    let engine = engine_with(vec![clean_incident("INC-1", 4)]);
    engine.finalize_quarter(QUARTER, "alice", None).unwrap();

    let mut next_quarter = open_incident("INC-50", 1);
    next_quarter.started_at = at(2025, 4, 2);
    engine.source().upsert_incident(next_quarter).unwrap();

    assert!(
        !engine
            .get_quarter_finalization_status(QUARTER)
            .unwrap()
            .facts_changed_since_finalization
    );
}

/// Reverting the edit clears the drift flag.
#[test]
fn test_revert_clears_drift() {
    let engine = engine_with(vec![clean_incident("INC-1", 4)]);
    engine.finalize_quarter(QUARTER, "alice", None).unwrap();

    let mut edited = clean_incident("INC-1", 4);
    edited.category = Some("network".to_string());
    engine.source().upsert_incident(edited).unwrap();
    assert!(engine.get_quarter_finalization_status(QUARTER).unwrap().facts_changed_since_finalization);

    engine.source().upsert_incident(clean_incident("INC-1", 4)).unwrap();
    assert!(!engine.get_quarter_finalization_status(QUARTER).unwrap().facts_changed_since_finalization);
}

// =============================================================================
// Re-finalize Supersession
// =============================================================================

/// After drift a second finalize supersedes the first.
#[test]
fn test_refinalize_supersedes() {
    let engine = engine_with(vec![clean_incident("INC-1", 4)]);
    let first = engine.finalize_quarter(QUARTER, "alice", Some("initial close")).unwrap();

    engine
        .source()
        .upsert_checklist(ChecklistSummary {
            incident_id: "INC-1".to_string(),
            template_id: "postmortem".to_string(),
            required: false,
            completed_items: 2,
            total_items: 5,
        })
        .unwrap();

    let second = engine.finalize_quarter(QUARTER, "bob", Some("reclose")).unwrap();
    assert_ne!(second.snapshot_id, first.snapshot_id);
    assert_ne!(second.inputs_hash, first.inputs_hash);
    assert_eq!(second.sequence, 2);
    assert_eq!(second.supersedes, Some(first.snapshot_id));

    let status = engine.get_quarter_finalization_status(QUARTER).unwrap();
    assert_eq!(status.finalization.as_ref(), Some(&second));
    assert!(!status.facts_changed_since_finalization);

    // prior record still retrievable by audit lookup
    let history = engine.list_quarter_finalizations(QUARTER).unwrap();
    assert_eq!(history, vec![first.clone(), second.clone()]);
    assert_eq!(
        engine.get_quarter_finalization(QUARTER, first.snapshot_id).unwrap(),
        Some(first)
    );
}

/// Without drift a second finalize is AlreadyFinalized.
#[test]
fn test_refinalize_without_drift_rejected() {
    let engine = engine_with(vec![clean_incident("INC-1", 4)]);
    let first = engine.finalize_quarter(QUARTER, "alice", None).unwrap();

    match engine.finalize_quarter(QUARTER, "bob", None) {
        Err(FinalizeError::AlreadyFinalized { existing }) => assert_eq!(*existing, first),
        other => panic!("expected AlreadyFinalized, got {:?}", other),
    }
    assert_eq!(engine.list_quarter_finalizations(QUARTER).unwrap().len(), 1);
}

/// Drift that introduces a critical finding blocks the re-finalize.
#[test]
fn test_refinalize_after_regression_not_eligible() {
    let engine = engine_with(vec![clean_incident("INC-1", 4)]);
    let first = engine.finalize_quarter(QUARTER, "alice", None).unwrap();

    engine.source().upsert_incident(open_incident("INC-7", 20)).unwrap();

    let err = engine.finalize_quarter(QUARTER, "alice", None).unwrap_err();
    assert_eq!(err.code(), "QC_NOT_ELIGIBLE");

    let status = engine.get_quarter_finalization_status(QUARTER).unwrap();
    assert_eq!(status.finalization, Some(first));
    assert!(status.facts_changed_since_finalization);
    assert!(!status.readiness.can_finalize);
}
