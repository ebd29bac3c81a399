//! Finalize Atomicity Tests
//!
//! Concurrent finalize calls on one quarter produce exactly one record;
//! every other caller sees AlreadyFinalized carrying that record.

mod common;

use std::sync::{Arc, Barrier};
use std::thread;

use common::*;
use quarterclose::store::{FileRecordStore, MemoryRecordStore, RecordStore};
use quarterclose::{FinalizationEngine, FinalizeError, QuarterFinalization};
use quarterclose::source::InMemoryFactSource;
use tempfile::TempDir;

// =============================================================================
// Test Utilities
// =============================================================================

fn race<S: RecordStore + 'static>(
    engine: Arc<FinalizationEngine<InMemoryFactSource, S>>,
    callers: usize,
) -> Vec<Result<QuarterFinalization, FinalizeError>> {
    let barrier = Arc::new(Barrier::new(callers));
    let handles: Vec<_> = (0..callers)
        .map(|n| {
            let engine = Arc::clone(&engine);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                engine.finalize_quarter(QUARTER, &format!("approver-{}", n), None)
            })
        })
        .collect();

    handles.into_iter().map(|h| h.join().unwrap()).collect()
}

fn assert_single_winner(results: &[Result<QuarterFinalization, FinalizeError>]) -> QuarterFinalization {
    let winners: Vec<&QuarterFinalization> = results.iter().filter_map(|r| r.as_ref().ok()).collect();
    assert_eq!(winners.len(), 1, "expected exactly one successful finalize");
    let winner = winners[0].clone();

    for result in results.iter().filter(|r| r.is_err()) {
        match result {
            Err(FinalizeError::AlreadyFinalized { existing }) => {
                assert_eq!(existing.snapshot_id, winner.snapshot_id)
            }
            other => panic!("expected AlreadyFinalized, got {:?}", other),
        }
    }
    winner
}

// =============================================================================
// Atomicity
// =============================================================================

/// Two concurrent calls: one success, one AlreadyFinalized.
#[test]
fn test_two_concurrent_finalizes() {
    for _ in 0..25 {
        let engine = Arc::new(engine_with(vec![clean_incident("INC-1", 4)]));
        let results = race(Arc::clone(&engine), 2);

        let winner = assert_single_winner(&results);
        assert_eq!(winner.sequence, 1);
        assert_eq!(engine.list_quarter_finalizations(QUARTER).unwrap().len(), 1);
    }
}

/// Many callers still yield one record.
#[test]
fn test_many_concurrent_finalizes() {
    let engine = Arc::new(engine_with(vec![clean_incident("INC-1", 4)]));
    let results = race(Arc::clone(&engine), 8);

    assert_single_winner(&results);
    assert_eq!(
        results.iter().filter(|r| r.is_err()).count(),
        7
    );
    assert_eq!(engine.list_quarter_finalizations(QUARTER).unwrap().len(), 1);
}

/// The file-backed store keeps the same guarantee.
#[test]
fn test_concurrent_finalizes_file_store() {
    let dir = TempDir::new().unwrap();
    let store = FileRecordStore::open(dir.path()).unwrap();
    let engine = Arc::new(engine_over(source_with(vec![clean_incident("INC-1", 4)]), store));

    let results = race(Arc::clone(&engine), 4);
    assert_single_winner(&results);

    let reopened = FileRecordStore::open(dir.path()).unwrap();
    assert_eq!(reopened.finalizations_for(QUARTER).unwrap().len(), 1);
}

/// Concurrent ineligible finalizes write nothing.
#[test]
fn test_concurrent_ineligible_finalizes() {
    let store = Arc::new(MemoryRecordStore::new());
    let engine = Arc::new(engine_over(
        source_with(vec![open_incident("INC-2", 6)]),
        Arc::clone(&store),
    ));

    let results = race(engine, 4);
    assert!(results
        .iter()
        .all(|r| matches!(r, Err(FinalizeError::NotEligible { .. }))));
    assert!(store.finalizations_for(QUARTER).unwrap().is_empty());
}
