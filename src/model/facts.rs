//! Fact projections of incidents, action items and checklists
//!
//! Facts are derived from the application's entities; the engine never
//! writes back to them.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::quarter::QuarterConfig;

/// Incident lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IncidentStatus {
    Open,
    Investigating,
    Mitigated,
    Resolved,
    Closed,
}

impl IncidentStatus {
    /// Returns the stable string form
    pub fn as_str(&self) -> &'static str {
        match self {
            IncidentStatus::Open => "open",
            IncidentStatus::Investigating => "investigating",
            IncidentStatus::Mitigated => "mitigated",
            IncidentStatus::Resolved => "resolved",
            IncidentStatus::Closed => "closed",
        }
    }

    /// Resolved and closed incidents are both considered resolved
    pub fn is_resolved(&self) -> bool {
        matches!(self, IncidentStatus::Resolved | IncidentStatus::Closed)
    }
}

/// Action item status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionItemStatus {
    Open,
    InProgress,
    Done,
    Cancelled,
}

impl ActionItemStatus {
    /// Returns the stable string form
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionItemStatus::Open => "open",
            ActionItemStatus::InProgress => "in_progress",
            ActionItemStatus::Done => "done",
            ActionItemStatus::Cancelled => "cancelled",
        }
    }

    /// Open and in-progress items still need work
    pub fn is_open(&self) -> bool {
        matches!(self, ActionItemStatus::Open | ActionItemStatus::InProgress)
    }
}

/// Incident projection used for rule evaluation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Incident {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub category: Option<String>,
    pub status: IncidentStatus,
    pub started_at: DateTime<Utc>,
    #[serde(default)]
    pub resolved_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub root_cause: Option<String>,
    #[serde(default)]
    pub resolution: Option<String>,
    #[serde(default)]
    pub is_recurring: bool,
    #[serde(default)]
    pub recurrence_of: Option<String>,
}

impl Incident {
    /// Create an open incident with no optional fields populated
    pub fn new(id: impl Into<String>, title: impl Into<String>, started_at: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            category: None,
            status: IncidentStatus::Open,
            started_at,
            resolved_at: None,
            root_cause: None,
            resolution: None,
            is_recurring: false,
            recurrence_of: None,
        }
    }
}

/// Action item projection
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ActionItem {
    pub id: String,
    pub incident_id: String,
    pub title: String,
    pub status: ActionItemStatus,
    #[serde(default)]
    pub owner: Option<String>,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
}

impl ActionItem {
    /// Create an open action item
    pub fn new(
        id: impl Into<String>,
        incident_id: impl Into<String>,
        title: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            incident_id: incident_id.into(),
            title: title.into(),
            status: ActionItemStatus::Open,
            owner: None,
            due_date: None,
            completed_at: None,
        }
    }
}

/// Checklist completion state for one incident/template pair
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChecklistSummary {
    pub incident_id: String,
    pub template_id: String,
    /// Whether the template is mandatory for the incident's category
    #[serde(default)]
    pub required: bool,
    pub completed_items: u32,
    pub total_items: u32,
}

impl ChecklistSummary {
    /// Entity id used for canonical ordering
    pub fn entity_id(&self) -> String {
        format!("{}/{}", self.incident_id, self.template_id)
    }
}

/// All facts contributing to one quarter's readiness
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct QuarterFacts {
    pub quarter: QuarterConfig,
    pub incidents: Vec<Incident>,
    pub action_items: Vec<ActionItem>,
    pub checklists: Vec<ChecklistSummary>,
}

impl QuarterFacts {
    /// Create an empty fact set for a quarter
    pub fn empty(quarter: QuarterConfig) -> Self {
        Self {
            quarter,
            incidents: Vec::new(),
            action_items: Vec::new(),
            checklists: Vec::new(),
        }
    }

    /// Incident ids in this fact set, in source order
    pub fn incident_ids(&self) -> Vec<String> {
        self.incidents.iter().map(|i| i.id.clone()).collect()
    }
}

/// Returns true when an optional text field is absent or whitespace only
pub fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().map_or(true, |s| s.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolved_statuses() {
        assert!(IncidentStatus::Resolved.is_resolved());
        assert!(IncidentStatus::Closed.is_resolved());
        assert!(!IncidentStatus::Mitigated.is_resolved());
        assert!(!IncidentStatus::Open.is_resolved());
    }

    #[test]
    fn test_open_action_statuses() {
        assert!(ActionItemStatus::Open.is_open());
        assert!(ActionItemStatus::InProgress.is_open());
        assert!(!ActionItemStatus::Done.is_open());
        assert!(!ActionItemStatus::Cancelled.is_open());
    }

    #[test]
    fn test_is_blank() {
        assert!(is_blank(&None));
        assert!(is_blank(&Some("   ".to_string())));
        assert!(!is_blank(&Some("disk full".to_string())));
    }

    #[test]
    fn test_incident_deserializes_with_defaults() {
        let json = r#"{
            "id": "INC-1",
            "title": "API outage",
            "status": "investigating",
            "started_at": "2025-02-01T10:00:00Z"
        }"#;
        let incident: Incident = serde_json::from_str(json).unwrap();
        assert_eq!(incident.status, IncidentStatus::Investigating);
        assert!(incident.root_cause.is_none());
        assert!(!incident.is_recurring);
    }
}
