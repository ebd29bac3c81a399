//! Rule engine
//!
//! `evaluate` is a pure function from facts to an ordered list of findings:
//! - No I/O, no randomness, no clock reads (the instant is passed in)
//! - Total: absent or empty fields are valid inputs that produce findings
//! - Rules contribute additively; the final sort makes rule order irrelevant
//!
//! # Rule keys
//!
//! Rule keys are part of the override ledger's identity and are frozen.
//! New rules get new keys; existing keys are never renamed.

mod checks;
mod finding;

pub use checks::{
    MandatoryChecklistIncomplete, MissingResolution, MissingRootCause, OverdueActionItems,
    RecurrenceUnlinked, UnresolvedPastWindow,
};
pub use finding::{sort_findings, FindingSeverity, ReadinessFinding};

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::QuarterFacts;

/// Frozen catalog of rule identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RuleKey {
    UnresolvedPastWindow,
    MissingRootCause,
    MissingResolution,
    RecurrenceUnlinked,
    OverdueActionItems,
    MandatoryChecklistIncomplete,
}

impl RuleKey {
    /// Every rule the engine can produce
    pub const ALL: [RuleKey; 6] = [
        RuleKey::UnresolvedPastWindow,
        RuleKey::MissingRootCause,
        RuleKey::MissingResolution,
        RuleKey::RecurrenceUnlinked,
        RuleKey::OverdueActionItems,
        RuleKey::MandatoryChecklistIncomplete,
    ];

    /// Returns the stable rule key string
    pub fn as_str(&self) -> &'static str {
        match self {
            RuleKey::UnresolvedPastWindow => "unresolved_past_window",
            RuleKey::MissingRootCause => "missing_root_cause",
            RuleKey::MissingResolution => "missing_resolution",
            RuleKey::RecurrenceUnlinked => "recurrence_unlinked",
            RuleKey::OverdueActionItems => "overdue_action_items",
            RuleKey::MandatoryChecklistIncomplete => "mandatory_checklist_incomplete",
        }
    }

    /// Severity of every finding this rule emits
    pub fn severity(&self) -> FindingSeverity {
        match self {
            RuleKey::UnresolvedPastWindow
            | RuleKey::MissingRootCause
            | RuleKey::MissingResolution => FindingSeverity::Critical,
            RuleKey::RecurrenceUnlinked
            | RuleKey::OverdueActionItems
            | RuleKey::MandatoryChecklistIncomplete => FindingSeverity::Warning,
        }
    }

    /// One-line description for the rule catalog
    pub fn description(&self) -> &'static str {
        match self {
            RuleKey::UnresolvedPastWindow => "Incident unresolved after its quarter ended",
            RuleKey::MissingRootCause => "Resolved incident without root cause",
            RuleKey::MissingResolution => "Resolved incident without resolution summary",
            RuleKey::RecurrenceUnlinked => "Recurring incident not linked to its predecessor",
            RuleKey::OverdueActionItems => "Open action items past their due date",
            RuleKey::MandatoryChecklistIncomplete => "Mandatory checklist with nothing completed",
        }
    }

    /// Parse a rule key string
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|k| k.as_str() == s)
    }
}

impl fmt::Display for RuleKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Catalog entry exposed to callers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleDescriptor {
    pub rule_key: String,
    pub severity: FindingSeverity,
    pub description: String,
}

/// Describe every rule in the catalog
pub fn rule_catalog() -> Vec<RuleDescriptor> {
    RuleKey::ALL
        .iter()
        .map(|k| RuleDescriptor {
            rule_key: k.as_str().to_string(),
            severity: k.severity(),
            description: k.description().to_string(),
        })
        .collect()
}

/// A single readiness rule
pub trait Rule: Send + Sync {
    /// The key of every finding this rule emits
    fn key(&self) -> RuleKey;

    /// Evaluate the rule. Must be pure.
    fn check(&self, facts: &QuarterFacts, as_of: DateTime<Utc>) -> Vec<ReadinessFinding>;
}

/// An ordered collection of rules
pub struct RuleSet {
    rules: Vec<Box<dyn Rule>>,
}

impl RuleSet {
    /// Empty rule set
    pub fn empty() -> Self {
        Self { rules: Vec::new() }
    }

    /// The standard rule set covering the whole catalog
    pub fn standard() -> Self {
        Self::empty()
            .with_rule(UnresolvedPastWindow)
            .with_rule(MissingRootCause)
            .with_rule(MissingResolution)
            .with_rule(RecurrenceUnlinked)
            .with_rule(OverdueActionItems)
            .with_rule(MandatoryChecklistIncomplete)
    }

    /// Add a rule
    pub fn with_rule(mut self, rule: impl Rule + 'static) -> Self {
        self.rules.push(Box::new(rule));
        self
    }

    /// Number of rules
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Run every rule and return findings in canonical order
    pub fn evaluate(&self, facts: &QuarterFacts, as_of: DateTime<Utc>) -> Vec<ReadinessFinding> {
        let mut findings: Vec<ReadinessFinding> = self
            .rules
            .iter()
            .flat_map(|rule| rule.check(facts, as_of))
            .collect();
        sort_findings(&mut findings);
        findings
    }
}

impl Default for RuleSet {
    fn default() -> Self {
        Self::standard()
    }
}

impl fmt::Debug for RuleSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.rules.iter().map(|r| r.key()))
            .finish()
    }
}

/// Evaluate the standard rule set
pub fn evaluate(facts: &QuarterFacts, as_of: DateTime<Utc>) -> Vec<ReadinessFinding> {
    RuleSet::standard().evaluate(facts, as_of)
}
