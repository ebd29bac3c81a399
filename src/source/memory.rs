//! In-memory fact source
//!
//! Holds a mutable copy of the application's incident data. Mutation goes
//! through `&self` so a source shared with an engine can still be edited.

use std::collections::HashSet;
use std::path::Path;
use std::sync::RwLock;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::FactSource;
use crate::model::{ActionItem, ChecklistSummary, Incident, QuarterConfig};
use crate::store::{StoreError, StoreResult};

/// Serializable dataset, as loaded from a facts JSON file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FactDataset {
    #[serde(default)]
    pub quarters: Vec<QuarterConfig>,
    #[serde(default)]
    pub incidents: Vec<Incident>,
    #[serde(default)]
    pub action_items: Vec<ActionItem>,
    #[serde(default)]
    pub checklists: Vec<ChecklistSummary>,
}

impl FactDataset {
    /// Load a dataset from a JSON file
    pub fn load(path: &Path) -> StoreResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            StoreError::Unavailable(format!("Failed to read facts {}: {}", path.display(), e))
        })?;
        let dataset: FactDataset = serde_json::from_str(&content).map_err(|e| {
            StoreError::Corrupt(format!("Invalid facts JSON {}: {}", path.display(), e))
        })?;

        dataset
            .validate()
            .map_err(|reason| StoreError::Corrupt(format!("{}: {}", path.display(), reason)))?;
        Ok(dataset)
    }

    /// Check quarter definitions and id uniqueness
    pub fn validate(&self) -> Result<(), String> {
        for quarter in &self.quarters {
            quarter.validate()?;
        }
        ensure_unique("quarter", self.quarters.iter().map(|q| q.id.clone()))?;
        ensure_unique("incident", self.incidents.iter().map(|i| i.id.clone()))?;
        ensure_unique("action item", self.action_items.iter().map(|a| a.id.clone()))?;
        ensure_unique("checklist", self.checklists.iter().map(ChecklistSummary::entity_id))
    }
}

fn ensure_unique(kind: &str, ids: impl Iterator<Item = String>) -> Result<(), String> {
    let mut seen = HashSet::new();
    for id in ids {
        if !seen.insert(id.clone()) {
            return Err(format!("duplicate {} id '{}'", kind, id));
        }
    }
    Ok(())
}

/// Fact source backed by an in-memory dataset
#[derive(Debug, Default)]
pub struct InMemoryFactSource {
    data: RwLock<FactDataset>,
}

impl InMemoryFactSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a source from a dataset
    pub fn from_dataset(dataset: FactDataset) -> Self {
        Self {
            data: RwLock::new(dataset),
        }
    }

    /// Load a source from a facts JSON file
    pub fn load(path: &Path) -> StoreResult<Self> {
        Ok(Self::from_dataset(FactDataset::load(path)?))
    }

    fn write(&self) -> StoreResult<std::sync::RwLockWriteGuard<'_, FactDataset>> {
        self.data.write().map_err(|_| StoreError::lock_poisoned())
    }

    fn read(&self) -> StoreResult<std::sync::RwLockReadGuard<'_, FactDataset>> {
        self.data.read().map_err(|_| StoreError::lock_poisoned())
    }

    /// Add or replace a quarter definition
    pub fn upsert_quarter(&self, quarter: QuarterConfig) -> StoreResult<()> {
        let mut data = self.write()?;
        data.quarters.retain(|q| q.id != quarter.id);
        data.quarters.push(quarter);
        Ok(())
    }

    /// Add or replace an incident by id
    pub fn upsert_incident(&self, incident: Incident) -> StoreResult<()> {
        let mut data = self.write()?;
        data.incidents.retain(|i| i.id != incident.id);
        data.incidents.push(incident);
        Ok(())
    }

    /// Remove an incident and everything linked to it
    pub fn remove_incident(&self, incident_id: &str) -> StoreResult<()> {
        let mut data = self.write()?;
        data.incidents.retain(|i| i.id != incident_id);
        data.action_items.retain(|a| a.incident_id != incident_id);
        data.checklists.retain(|c| c.incident_id != incident_id);
        Ok(())
    }

    /// Add or replace an action item by id
    pub fn upsert_action_item(&self, item: ActionItem) -> StoreResult<()> {
        let mut data = self.write()?;
        data.action_items.retain(|a| a.id != item.id);
        data.action_items.push(item);
        Ok(())
    }

    /// Add or replace a checklist summary by incident/template pair
    pub fn upsert_checklist(&self, summary: ChecklistSummary) -> StoreResult<()> {
        let mut data = self.write()?;
        data.checklists
            .retain(|c| c.entity_id() != summary.entity_id());
        data.checklists.push(summary);
        Ok(())
    }

    /// Swap in a whole new dataset
    pub fn replace(&self, dataset: FactDataset) -> StoreResult<()> {
        *self.write()? = dataset;
        Ok(())
    }

    /// Snapshot of the current dataset
    pub fn dataset(&self) -> StoreResult<FactDataset> {
        Ok(self.read()?.clone())
    }
}

impl FactSource for InMemoryFactSource {
    fn quarter(&self, quarter_id: &str) -> StoreResult<Option<QuarterConfig>> {
        let data = self.read()?;
        Ok(data.quarters.iter().find(|q| q.id == quarter_id).cloned())
    }

    fn incidents_in_range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> StoreResult<Vec<Incident>> {
        let data = self.read()?;
        Ok(data
            .incidents
            .iter()
            .filter(|i| i.started_at >= start && i.started_at < end)
            .cloned()
            .collect())
    }

    fn action_items_for(&self, incident_ids: &[String]) -> StoreResult<Vec<ActionItem>> {
        let wanted: HashSet<&str> = incident_ids.iter().map(String::as_str).collect();
        let data = self.read()?;
        Ok(data
            .action_items
            .iter()
            .filter(|a| wanted.contains(a.incident_id.as_str()))
            .cloned()
            .collect())
    }

    fn checklist_state_for(&self, incident_ids: &[String]) -> StoreResult<Vec<ChecklistSummary>> {
        let wanted: HashSet<&str> = incident_ids.iter().map(String::as_str).collect();
        let data = self.read()?;
        Ok(data
            .checklists
            .iter()
            .filter(|c| wanted.contains(c.incident_id.as_str()))
            .cloned()
            .collect())
    }
}
