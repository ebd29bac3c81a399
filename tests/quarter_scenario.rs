//! End-to-End Quarter Scenario
//!
//! Q1-2025 has one unresolved incident past its window end:
//! evaluate -> NotEligible -> override -> finalize succeeds.

mod common;

use common::*;
use quarterclose::cli::{Request, RequestHandler};
use quarterclose::digest::is_hex_digest;
use quarterclose::rules::evaluate;
use quarterclose::source::gather_facts;
use quarterclose::store::MemoryRecordStore;
use quarterclose::{FinalizeError, FindingSeverity};
use serde_json::json;

/// The full scenario through the engine API.
#[test]
fn test_unresolved_incident_scenario() {
    let engine = engine_with(vec![open_incident("INC-42", 28)]);

    let facts = gather_facts(engine.source(), &q1_2025()).unwrap();
    let findings = evaluate(&facts, after_quarter());
    assert_eq!(findings.len(), 1);
    assert_eq!(findings[0].rule_key, "unresolved_past_window");
    assert_eq!(findings[0].severity, FindingSeverity::Critical);
    assert_eq!(findings[0].incident_ids, vec!["INC-42".to_string()]);

    match engine.finalize_quarter(QUARTER, "alice", None) {
        Err(FinalizeError::NotEligible { quarter_id, findings: blocking }) => {
            assert_eq!(quarter_id, QUARTER);
            assert_eq!(blocking, findings);
        }
        other => panic!("expected NotEligible, got {:?}", other),
    }
    assert!(engine.list_quarter_finalizations(QUARTER).unwrap().is_empty());

    let recorded = engine
        .record_quarter_override(
            QUARTER,
            "unresolved_past_window",
            "INC-42",
            "Long-running vendor investigation, tracked in Q2",
            "cfo@example.com",
        )
        .unwrap();
    assert_eq!(recorded.quarter_id, QUARTER);

    let record = engine
        .finalize_quarter(QUARTER, "alice", Some("Q1 close"))
        .unwrap();
    assert_eq!(record.inputs_hash.len(), 64);
    assert!(is_hex_digest(&record.inputs_hash));
    assert_eq!(record.finalized_by, "alice");
    assert_eq!(record.finalized_at, after_quarter());

    let status = engine.get_quarter_finalization_status(QUARTER).unwrap();
    assert_eq!(status.overrides, vec![recorded]);
    assert_eq!(status.readiness.findings.len(), 1);
    assert!(status.readiness.can_finalize);
}

/// Inside the window the open incident is not yet a finding.
#[test]
fn test_open_incident_before_quarter_end() {
    let engine = engine_with(vec![open_incident("INC-42", 28)]);
    let facts = gather_facts(engine.source(), &q1_2025()).unwrap();

    assert!(evaluate(&facts, at(2025, 3, 30)).is_empty());
}

/// The same scenario as JSON requests.
#[test]
fn test_scenario_through_request_handler() {
    let handler = RequestHandler::new(engine_over(
        source_with(vec![open_incident("INC-42", 28)]),
        MemoryRecordStore::new(),
    ));

    let readiness = handler
        .handle(json!({"command": "get_quarter_readiness", "quarter_id": QUARTER}))
        .to_json();
    assert_eq!(readiness["status"], "ok");
    assert_eq!(readiness["data"]["can_finalize"], false);
    assert_eq!(readiness["data"]["findings"][0]["rule_key"], "unresolved_past_window");

    let finalize = Request::FinalizeQuarter {
        quarter_id: QUARTER.to_string(),
        finalized_by: "alice".to_string(),
        notes: None,
    };
    let rejected = handler.handle_request(&finalize).to_json();
    assert_eq!(rejected["status"], "error");
    assert_eq!(rejected["code"], "QC_NOT_ELIGIBLE");
    assert_eq!(rejected["context"]["findings"][0]["incident_ids"][0], "INC-42");

    let override_response = handler
        .handle(json!({
            "command": "record_quarter_override",
            "quarter_id": QUARTER,
            "rule_key": "unresolved_past_window",
            "incident_id": "INC-42",
            "reason": "vendor investigation",
            "approved_by": "cfo@example.com"
        }))
        .to_json();
    assert_eq!(override_response["status"], "ok");

    let accepted = handler.handle_request(&finalize).to_json();
    assert_eq!(accepted["status"], "ok");
    let hash = accepted["data"]["inputs_hash"].as_str().unwrap();
    assert!(is_hex_digest(hash));

    let history = handler
        .handle(json!({"command": "list_quarter_finalizations", "quarter_id": QUARTER}))
        .to_json();
    assert_eq!(history["data"].as_array().unwrap().len(), 1);

    let snapshot_id = accepted["data"]["snapshot_id"].clone();
    let lookup = handler
        .handle(json!({
            "command": "get_quarter_finalization",
            "quarter_id": QUARTER,
            "snapshot_id": snapshot_id
        }))
        .to_json();
    assert_eq!(lookup["data"]["inputs_hash"], hash);
}
