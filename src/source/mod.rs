//! Fact source collaborator
//!
//! The application owns incidents, action items and checklists. The engine
//! only reads them through this trait and never writes back.

mod memory;

pub use memory::{FactDataset, InMemoryFactSource};

use chrono::{DateTime, Utc};

use crate::model::{ActionItem, ChecklistSummary, Incident, QuarterConfig, QuarterFacts};
use crate::store::StoreResult;

/// Read-only access to the application's incident data
pub trait FactSource: Send + Sync {
    /// Look up a quarter definition
    fn quarter(&self, quarter_id: &str) -> StoreResult<Option<QuarterConfig>>;

    /// Incidents whose `started_at` falls in `[start, end)`
    fn incidents_in_range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> StoreResult<Vec<Incident>>;

    /// Action items linked to any of the given incidents
    fn action_items_for(&self, incident_ids: &[String]) -> StoreResult<Vec<ActionItem>>;

    /// Checklist completion state for any of the given incidents
    fn checklist_state_for(&self, incident_ids: &[String]) -> StoreResult<Vec<ChecklistSummary>>;
}

impl<T: FactSource + ?Sized> FactSource for std::sync::Arc<T> {
    fn quarter(&self, quarter_id: &str) -> StoreResult<Option<QuarterConfig>> {
        (**self).quarter(quarter_id)
    }

    fn incidents_in_range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> StoreResult<Vec<Incident>> {
        (**self).incidents_in_range(start, end)
    }

    fn action_items_for(&self, incident_ids: &[String]) -> StoreResult<Vec<ActionItem>> {
        (**self).action_items_for(incident_ids)
    }

    fn checklist_state_for(&self, incident_ids: &[String]) -> StoreResult<Vec<ChecklistSummary>> {
        (**self).checklist_state_for(incident_ids)
    }
}

/// Collect every fact contributing to a quarter.
///
/// Reads are independent; no cross-read snapshot consistency is implied.
pub fn gather_facts<F: FactSource + ?Sized>(
    source: &F,
    quarter: &QuarterConfig,
) -> StoreResult<QuarterFacts> {
    let incidents = source.incidents_in_range(quarter.window_start(), quarter.window_end())?;
    let ids: Vec<String> = incidents.iter().map(|i| i.id.clone()).collect();

    let (action_items, checklists) = if ids.is_empty() {
        (Vec::new(), Vec::new())
    } else {
        (
            source.action_items_for(&ids)?,
            source.checklist_state_for(&ids)?,
        )
    };

    Ok(QuarterFacts {
        quarter: quarter.clone(),
        incidents,
        action_items,
        checklists,
    })
}
