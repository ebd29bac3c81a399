//! Readiness evaluator
//!
//! Joins rule engine output with the override mask:
//! - The raw finding list is reported unchanged
//! - An incident is ready once every critical finding naming it is absent
//!   or covered by an override
//! - A quarter is finalize-eligible iff the effective critical set is empty
//! - Warnings never block

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::QuarterFacts;
use crate::overrides::OverrideMask;
use crate::rules::{FindingSeverity, ReadinessFinding, RuleSet};

/// Readiness report for one quarter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuarterReadinessReport {
    pub quarter_id: String,
    pub evaluated_at: DateTime<Utc>,
    pub total_incidents: usize,
    pub ready_incidents: usize,
    pub needs_attention_incidents: usize,
    pub critical_count: usize,
    pub warning_count: usize,
    /// Critical `(rule_key, incident_id)` pairings covered by an override
    pub suppressed_count: usize,
    pub can_finalize: bool,
    /// Raw findings in canonical order, overrides not applied
    pub findings: Vec<ReadinessFinding>,
}

impl QuarterReadinessReport {
    /// Critical findings that still block, narrowed to unsuppressed incidents
    pub fn blocking_findings(&self, mask: &OverrideMask) -> Vec<ReadinessFinding> {
        effective_critical(&self.findings, mask)
    }
}

/// Effective critical-finding set: raw critical findings minus suppressed
/// pairings. Findings whose every incident is suppressed are dropped; the
/// rest keep only their unsuppressed incident ids.
pub fn effective_critical(
    findings: &[ReadinessFinding],
    mask: &OverrideMask,
) -> Vec<ReadinessFinding> {
    findings
        .iter()
        .filter(|f| f.is_critical())
        .filter_map(|f| {
            let remaining: Vec<String> = f
                .incident_ids
                .iter()
                .filter(|id| !mask.suppresses(&f.rule_key, id))
                .cloned()
                .collect();
            if remaining.is_empty() {
                None
            } else {
                Some(ReadinessFinding {
                    incident_ids: remaining,
                    ..f.clone()
                })
            }
        })
        .collect()
}

/// Evaluate rules over the facts and fold in the override mask
pub fn build_report(
    rules: &RuleSet,
    facts: &QuarterFacts,
    mask: &OverrideMask,
    as_of: DateTime<Utc>,
) -> QuarterReadinessReport {
    let findings = rules.evaluate(facts, as_of);
    let blocking = effective_critical(&findings, mask);

    let blocked: BTreeSet<&str> = blocking
        .iter()
        .flat_map(|f| f.incident_ids.iter().map(String::as_str))
        .collect();

    let incident_ids: BTreeSet<&str> = facts.incidents.iter().map(|i| i.id.as_str()).collect();
    let needs_attention = incident_ids.iter().filter(|id| blocked.contains(*id)).count();

    let critical_pairs: usize = findings
        .iter()
        .filter(|f| f.is_critical())
        .map(|f| f.incident_ids.len())
        .sum();
    let blocking_pairs: usize = blocking.iter().map(|f| f.incident_ids.len()).sum();

    QuarterReadinessReport {
        quarter_id: facts.quarter.id.clone(),
        evaluated_at: as_of,
        total_incidents: incident_ids.len(),
        ready_incidents: incident_ids.len() - needs_attention,
        needs_attention_incidents: needs_attention,
        critical_count: findings
            .iter()
            .filter(|f| f.severity == FindingSeverity::Critical)
            .count(),
        warning_count: findings
            .iter()
            .filter(|f| f.severity == FindingSeverity::Warning)
            .count(),
        suppressed_count: critical_pairs - blocking_pairs,
        can_finalize: blocking.is_empty(),
        findings,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Incident, IncidentStatus, QuarterConfig};
    use crate::overrides::QuarterOverride;
    use chrono::{NaiveDate, TimeZone};

    fn facts() -> QuarterFacts {
        let mut facts = QuarterFacts::empty(QuarterConfig::new(
            "Q1-2025",
            2025,
            1,
            NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2025, 4, 1).unwrap(),
        ));
        let started = Utc.with_ymd_and_hms(2025, 2, 3, 0, 0, 0).unwrap();

        facts.incidents.push(Incident::new("INC-1", "still open", started));

        let mut recurring = Incident::new("INC-2", "flaky job", started);
        recurring.status = IncidentStatus::Resolved;
        recurring.root_cause = Some("race".to_string());
        recurring.resolution = Some("lock added".to_string());
        recurring.is_recurring = true;
        facts.incidents.push(recurring);
        facts
    }

    fn as_of() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 4, 10, 0, 0, 0).unwrap()
    }

    fn mask_for(rule_key: &str, incident_id: &str) -> OverrideMask {
        OverrideMask::from_overrides(&[QuarterOverride::new(
            "Q1-2025",
            rule_key,
            incident_id,
            "r",
            "a",
            as_of(),
        )])
    }

    #[test]
    fn test_counts_without_overrides() {
        let report = build_report(&RuleSet::standard(), &facts(), &OverrideMask::new(), as_of());
        assert_eq!(report.total_incidents, 2);
        assert_eq!(report.ready_incidents, 1);
        assert_eq!(report.needs_attention_incidents, 1);
        assert_eq!(report.critical_count, 1);
        assert_eq!(report.warning_count, 1);
        assert!(!report.can_finalize);
    }

    #[test]
    fn test_override_suppresses_without_removing_finding() {
        let mask = mask_for("unresolved_past_window", "INC-1");
        let report = build_report(&RuleSet::standard(), &facts(), &mask, as_of());

        assert!(report.can_finalize);
        assert_eq!(report.ready_incidents, 2);
        assert_eq!(report.suppressed_count, 1);
        // raw report still carries the finding
        assert_eq!(report.critical_count, 1);
        assert!(report
            .findings
            .iter()
            .any(|f| f.rule_key == "unresolved_past_window"));
    }

    #[test]
    fn test_override_for_other_incident_does_not_suppress() {
        let mask = mask_for("unresolved_past_window", "INC-2");
        let report = build_report(&RuleSet::standard(), &facts(), &mask, as_of());
        assert!(!report.can_finalize);
        assert_eq!(report.blocking_findings(&mask).len(), 1);
    }

    #[test]
    fn test_effective_critical_narrows_incidents() {
        let finding = ReadinessFinding::new(
            "missing_root_cause",
            FindingSeverity::Critical,
            "m",
            ["INC-1", "INC-2"],
            "r",
        )
        .unwrap();
        let mask = mask_for("missing_root_cause", "INC-1");

        let blocking = effective_critical(&[finding], &mask);
        assert_eq!(blocking.len(), 1);
        assert_eq!(blocking[0].incident_ids, vec!["INC-2"]);
    }

    #[test]
    fn test_warnings_never_block() {
        let mut facts = facts();
        facts.incidents.retain(|i| i.id == "INC-2");
        let report = build_report(&RuleSet::standard(), &facts, &OverrideMask::new(), as_of());
        assert_eq!(report.warning_count, 1);
        assert!(report.can_finalize);
    }
}
