//! Per-quarter write serialization
//!
//! Mutating operations on one quarter run one at a time. Different quarters
//! never contend. The guard is released on every exit path, including early
//! returns and panics in the critical section.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Registry of one mutex per quarter id
#[derive(Debug, Default)]
pub struct QuarterLocks {
    slots: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl QuarterLocks {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, quarter_id: &str) -> Arc<Mutex<()>> {
        // The map holds no invariant a panicking holder could break
        let mut slots = self.slots.lock().unwrap_or_else(|e| e.into_inner());
        slots
            .entry(quarter_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Run `f` while holding the quarter's lock
    pub fn with_lock<T>(&self, quarter_id: &str, f: impl FnOnce() -> T) -> T {
        let slot = self.slot(quarter_id);
        let _guard = slot.lock().unwrap_or_else(|e| e.into_inner());
        f()
    }

    /// Number of quarters that have been locked at least once
    pub fn len(&self) -> usize {
        self.slots.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
