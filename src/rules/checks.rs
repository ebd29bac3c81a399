//! Individual readiness rules
//!
//! Each rule is independent and emits one finding per affected incident.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use super::finding::ReadinessFinding;
use super::{Rule, RuleKey};
use crate::model::{is_blank, QuarterFacts};

/// Unresolved incident whose quarter window has fully elapsed
#[derive(Debug, Clone, Copy)]
pub struct UnresolvedPastWindow;

impl Rule for UnresolvedPastWindow {
    fn key(&self) -> RuleKey {
        RuleKey::UnresolvedPastWindow
    }

    fn check(&self, facts: &QuarterFacts, as_of: DateTime<Utc>) -> Vec<ReadinessFinding> {
        if !facts.quarter.has_elapsed(as_of) {
            return Vec::new();
        }
        facts
            .incidents
            .iter()
            .filter(|i| !i.status.is_resolved())
            .filter_map(|i| {
                ReadinessFinding::new(
                    self.key().as_str(),
                    self.key().severity(),
                    format!(
                        "Incident {} is still {} after quarter {} ended",
                        i.id,
                        i.status.as_str(),
                        facts.quarter.id
                    ),
                    [i.id.clone()],
                    "Resolve the incident or record an override explaining why it stays open",
                )
            })
            .collect()
    }
}

/// Resolved incident without root cause text
#[derive(Debug, Clone, Copy)]
pub struct MissingRootCause;

impl Rule for MissingRootCause {
    fn key(&self) -> RuleKey {
        RuleKey::MissingRootCause
    }

    fn check(&self, facts: &QuarterFacts, _as_of: DateTime<Utc>) -> Vec<ReadinessFinding> {
        facts
            .incidents
            .iter()
            .filter(|i| i.status.is_resolved() && is_blank(&i.root_cause))
            .filter_map(|i| {
                ReadinessFinding::new(
                    self.key().as_str(),
                    self.key().severity(),
                    format!("Resolved incident {} has no root cause", i.id),
                    [i.id.clone()],
                    "Document the root cause on the incident",
                )
            })
            .collect()
    }
}

/// Resolved incident without resolution text
#[derive(Debug, Clone, Copy)]
pub struct MissingResolution;

impl Rule for MissingResolution {
    fn key(&self) -> RuleKey {
        RuleKey::MissingResolution
    }

    fn check(&self, facts: &QuarterFacts, _as_of: DateTime<Utc>) -> Vec<ReadinessFinding> {
        facts
            .incidents
            .iter()
            .filter(|i| i.status.is_resolved() && is_blank(&i.resolution))
            .filter_map(|i| {
                ReadinessFinding::new(
                    self.key().as_str(),
                    self.key().severity(),
                    format!("Resolved incident {} has no resolution summary", i.id),
                    [i.id.clone()],
                    "Describe how the incident was resolved",
                )
            })
            .collect()
    }
}

/// Recurring incident without a link to the earlier occurrence
#[derive(Debug, Clone, Copy)]
pub struct RecurrenceUnlinked;

impl Rule for RecurrenceUnlinked {
    fn key(&self) -> RuleKey {
        RuleKey::RecurrenceUnlinked
    }

    fn check(&self, facts: &QuarterFacts, _as_of: DateTime<Utc>) -> Vec<ReadinessFinding> {
        facts
            .incidents
            .iter()
            .filter(|i| i.is_recurring && is_blank(&i.recurrence_of))
            .filter_map(|i| {
                ReadinessFinding::new(
                    self.key().as_str(),
                    self.key().severity(),
                    format!("Incident {} is marked recurring but is not linked", i.id),
                    [i.id.clone()],
                    "Link the incident it recurs from",
                )
            })
            .collect()
    }
}

/// Open action items past their due date, grouped per incident
#[derive(Debug, Clone, Copy)]
pub struct OverdueActionItems;

impl Rule for OverdueActionItems {
    fn key(&self) -> RuleKey {
        RuleKey::OverdueActionItems
    }

    fn check(&self, facts: &QuarterFacts, as_of: DateTime<Utc>) -> Vec<ReadinessFinding> {
        let today = as_of.date_naive();
        let mut overdue: BTreeMap<&str, Vec<&str>> = BTreeMap::new();

        for item in &facts.action_items {
            let past_due = item.due_date.map_or(false, |due| due < today);
            if item.status.is_open() && past_due {
                overdue
                    .entry(item.incident_id.as_str())
                    .or_default()
                    .push(item.id.as_str());
            }
        }

        overdue
            .into_iter()
            .filter_map(|(incident_id, mut items)| {
                items.sort_unstable();
                ReadinessFinding::new(
                    self.key().as_str(),
                    self.key().severity(),
                    format!(
                        "Incident {} has {} overdue action item(s): {}",
                        incident_id,
                        items.len(),
                        items.join(", ")
                    ),
                    [incident_id],
                    "Complete, reschedule or cancel the overdue action items",
                )
            })
            .collect()
    }
}

/// Required checklist with nothing completed
#[derive(Debug, Clone, Copy)]
pub struct MandatoryChecklistIncomplete;

impl Rule for MandatoryChecklistIncomplete {
    fn key(&self) -> RuleKey {
        RuleKey::MandatoryChecklistIncomplete
    }

    fn check(&self, facts: &QuarterFacts, _as_of: DateTime<Utc>) -> Vec<ReadinessFinding> {
        // incident id -> completed items across its required checklists
        let mut required: BTreeMap<&str, u64> = BTreeMap::new();
        for summary in facts.checklists.iter().filter(|c| c.required) {
            *required.entry(summary.incident_id.as_str()).or_default() +=
                u64::from(summary.completed_items);
        }

        required
            .into_iter()
            .filter(|(_, completed)| *completed == 0)
            .filter_map(|(incident_id, _)| {
                ReadinessFinding::new(
                    self.key().as_str(),
                    self.key().severity(),
                    format!(
                        "Incident {} has a mandatory checklist with no completed items",
                        incident_id
                    ),
                    [incident_id],
                    "Work through the mandatory checklist for this incident category",
                )
            })
            .collect()
    }
}
