//! Shared fixtures for integration tests

#![allow(dead_code)]

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use quarterclose::clock::FixedClock;
use quarterclose::model::{Incident, IncidentStatus, QuarterConfig};
use quarterclose::source::InMemoryFactSource;
use quarterclose::store::{MemoryRecordStore, RecordStore};
use quarterclose::FinalizationEngine;

pub const QUARTER: &str = "Q1-2025";

pub fn q1_2025() -> QuarterConfig {
    QuarterConfig::new(
        QUARTER,
        2025,
        1,
        NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
        NaiveDate::from_ymd_opt(2025, 4, 1).unwrap(),
    )
}

pub fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap()
}

/// A few days after Q1-2025 closed
pub fn after_quarter() -> DateTime<Utc> {
    at(2025, 4, 7)
}

/// Resolved incident with every required field filled in
pub fn clean_incident(id: &str, day: u32) -> Incident {
    let mut incident = Incident::new(id, format!("incident {}", id), at(2025, 2, day));
    incident.status = IncidentStatus::Resolved;
    incident.resolved_at = Some(at(2025, 2, day + 1));
    incident.root_cause = Some("expired certificate".to_string());
    incident.resolution = Some("rotated certificate".to_string());
    incident
}

/// Incident that never left the open state
pub fn open_incident(id: &str, day: u32) -> Incident {
    Incident::new(id, format!("incident {}", id), at(2025, 3, day))
}

pub fn source_with(incidents: Vec<Incident>) -> InMemoryFactSource {
    let source = InMemoryFactSource::new();
    source.upsert_quarter(q1_2025()).unwrap();
    for incident in incidents {
        source.upsert_incident(incident).unwrap();
    }
    source
}

pub fn engine_over<S: RecordStore>(
    source: InMemoryFactSource,
    store: S,
) -> FinalizationEngine<InMemoryFactSource, S> {
    FinalizationEngine::new(source, store).with_clock(Arc::new(FixedClock::new(after_quarter())))
}

pub fn engine_with(
    incidents: Vec<Incident>,
) -> FinalizationEngine<InMemoryFactSource, MemoryRecordStore> {
    engine_over(source_with(incidents), MemoryRecordStore::new())
}
