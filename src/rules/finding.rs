//! Readiness findings
//!
//! Findings are recomputed on every evaluation and never persisted.

use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Finding severity. Critical findings block finalization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FindingSeverity {
    /// Blocks finalize-eligibility unless overridden
    Critical,
    /// Advisory only
    Warning,
}

impl FindingSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            FindingSeverity::Critical => "critical",
            FindingSeverity::Warning => "warning",
        }
    }
}

impl fmt::Display for FindingSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A data-quality or process issue scoped to one or more incidents
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadinessFinding {
    pub rule_key: String,
    pub severity: FindingSeverity,
    pub message: String,
    /// Non-empty, sorted, deduplicated
    pub incident_ids: Vec<String>,
    pub remediation: String,
}

impl ReadinessFinding {
    /// Create a finding; incident ids are sorted and deduplicated.
    ///
    /// Returns `None` when no incident ids are given.
    pub fn new<I, S>(
        rule_key: impl Into<String>,
        severity: FindingSeverity,
        message: impl Into<String>,
        incident_ids: I,
        remediation: impl Into<String>,
    ) -> Option<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let ids: BTreeSet<String> = incident_ids.into_iter().map(Into::into).collect();
        if ids.is_empty() {
            return None;
        }
        Some(Self {
            rule_key: rule_key.into(),
            severity,
            message: message.into(),
            incident_ids: ids.into_iter().collect(),
            remediation: remediation.into(),
        })
    }

    pub fn is_critical(&self) -> bool {
        self.severity == FindingSeverity::Critical
    }

    /// Sort key: severity, rule key, first incident id, then the rest
    fn order(&self, other: &Self) -> Ordering {
        self.severity
            .cmp(&other.severity)
            .then_with(|| self.rule_key.cmp(&other.rule_key))
            .then_with(|| self.incident_ids.first().cmp(&other.incident_ids.first()))
            .then_with(|| self.incident_ids.cmp(&other.incident_ids))
            .then_with(|| self.message.cmp(&other.message))
    }
}

/// Sort findings into their canonical order
pub fn sort_findings(findings: &mut [ReadinessFinding]) {
    findings.sort_by(|a, b| a.order(b));
}
