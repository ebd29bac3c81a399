//! Finalization engine
//!
//! State machine per quarter:
//!
//! ```text
//! Open --finalize--> Finalized --facts/overrides change--> Drifted --finalize--> Finalized(new)
//! ```
//!
//! `Drifted` is never stored; it is derived at query time by comparing the
//! stored digest with a freshly computed one. Drift is advisory only: there
//! is no automatic unlock.
//!
//! # Concurrency
//!
//! Mutating operations (record override, finalize) take the quarter's lock.
//! Finalize holds it across the whole check-then-write section, so two
//! concurrent finalize calls on one quarter yield exactly one record.
//! Reads (readiness, status, history) take no lock.

use std::sync::Arc;

use uuid::Uuid;

use super::errors::{FinalizeError, FinalizeResult};
use super::locks::QuarterLocks;
use super::record::{current_of, QuarterFinalization, QuarterFinalizationStatus};
use crate::clock::{Clock, SystemClock};
use crate::digest::{inputs_hash, InputsDigest};
use crate::model::{QuarterConfig, QuarterFacts};
use crate::observability::{log_event_at, log_event_with_fields, Event, ObservationScope, Severity};
use crate::overrides::{OverrideLedger, OverrideMask, OverrideRequest, QuarterOverride};
use crate::readiness::{build_report, QuarterReadinessReport};
use crate::rules::RuleSet;
use crate::source::{gather_facts, FactSource};
use crate::store::RecordStore;

/// Quarterly finalization engine over a fact source and a record store
pub struct FinalizationEngine<F: FactSource, S: RecordStore> {
    source: F,
    store: S,
    rules: RuleSet,
    clock: Arc<dyn Clock>,
    locks: QuarterLocks,
}

impl<F: FactSource, S: RecordStore> FinalizationEngine<F, S> {
    /// Create an engine with the standard rule set and the system clock
    pub fn new(source: F, store: S) -> Self {
        Self {
            source,
            store,
            rules: RuleSet::standard(),
            clock: Arc::new(SystemClock),
            locks: QuarterLocks::new(),
        }
    }

    /// Replace the clock
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Replace the rule set
    pub fn with_rules(mut self, rules: RuleSet) -> Self {
        self.rules = rules;
        self
    }

    pub fn source(&self) -> &F {
        &self.source
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    fn ledger(&self) -> OverrideLedger<'_> {
        OverrideLedger::new(&self.store)
    }

    fn quarter(&self, quarter_id: &str) -> FinalizeResult<QuarterConfig> {
        self.source
            .quarter(quarter_id)?
            .ok_or_else(|| FinalizeError::QuarterNotFound(quarter_id.to_string()))
    }

    fn facts(&self, quarter: &QuarterConfig) -> FinalizeResult<QuarterFacts> {
        Ok(gather_facts(&self.source, quarter)?)
    }

    /// Raw findings plus readiness counts, overrides applied to eligibility
    pub fn get_quarter_readiness(&self, quarter_id: &str) -> FinalizeResult<QuarterReadinessReport> {
        let quarter = self.quarter(quarter_id)?;
        let facts = self.facts(&quarter)?;
        let mask = self.ledger().mask(quarter_id)?;

        let report = build_report(&self.rules, &facts, &mask, self.clock.now());
        log_event_at(
            Severity::Trace,
            Event::ReadinessEvaluated,
            &[
                ("quarter_id", quarter_id),
                ("findings", &report.findings.len().to_string()),
                ("can_finalize", if report.can_finalize { "true" } else { "false" }),
            ],
        );
        Ok(report)
    }

    /// Overrides for a quarter, sorted by `created_at` then id
    pub fn list_quarter_overrides(&self, quarter_id: &str) -> FinalizeResult<Vec<QuarterOverride>> {
        self.quarter(quarter_id)?;
        self.ledger().list(quarter_id)
    }

    /// Append an override to the ledger
    pub fn record_quarter_override(
        &self,
        quarter_id: &str,
        rule_key: &str,
        incident_id: &str,
        reason: &str,
        approved_by: &str,
    ) -> FinalizeResult<QuarterOverride> {
        self.quarter(quarter_id)?;
        let request = OverrideRequest {
            quarter_id: quarter_id.to_string(),
            rule_key: rule_key.to_string(),
            incident_id: incident_id.to_string(),
            reason: reason.to_string(),
            approved_by: approved_by.to_string(),
        };

        let result = self.locks.with_lock(quarter_id, || {
            self.ledger().record(&request, self.clock.now())
        });

        match &result {
            Ok(record) => log_event_with_fields(
                Event::OverrideRecorded,
                &[
                    ("quarter_id", quarter_id),
                    ("rule_key", &record.rule_key),
                    ("incident_id", &record.incident_id),
                    ("approved_by", &record.approved_by),
                ],
            ),
            Err(e) => log_event_at(
                Severity::Warn,
                Event::OverrideRejected,
                &[
                    ("quarter_id", quarter_id),
                    ("rule_key", rule_key),
                    ("incident_id", incident_id),
                    ("code", e.code()),
                ],
            ),
        }
        result
    }

    /// Certify a quarter as closed.
    ///
    /// # Errors
    ///
    /// - `NotEligible` with the blocking findings when unsuppressed critical
    ///   findings remain
    /// - `AlreadyFinalized` when the active record still matches current
    ///   inputs
    /// - `DigestMismatchInternal` if hashing is not reproducible; nothing
    ///   is written
    pub fn finalize_quarter(
        &self,
        quarter_id: &str,
        finalized_by: &str,
        notes: Option<&str>,
    ) -> FinalizeResult<QuarterFinalization> {
        if finalized_by.trim().is_empty() {
            return Err(FinalizeError::InvalidInput(
                "finalized_by must not be empty".to_string(),
            ));
        }
        let quarter = self.quarter(quarter_id)?;
        let notes = notes
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(str::to_string);

        let scope = ObservationScope::with_fields(
            "FINALIZE",
            &[("quarter_id", quarter_id), ("finalized_by", finalized_by)],
        );

        let result = self.locks.with_lock(quarter_id, || {
            self.finalize_locked(&quarter, finalized_by.trim(), notes)
        });

        match &result {
            Ok(record) => scope.complete_with_fields(&[
                ("snapshot_id", &record.snapshot_id.to_string()),
                ("sequence", &record.sequence.to_string()),
                ("inputs_hash", &record.inputs_hash),
            ]),
            Err(e @ FinalizeError::DigestMismatchInternal { .. }) => {
                scope.fail(Severity::Fatal, &e.to_string())
            }
            Err(e @ (FinalizeError::NotEligible { .. } | FinalizeError::AlreadyFinalized { .. })) => {
                log_event_at(
                    Severity::Warn,
                    Event::FinalizeRejected,
                    &[("quarter_id", quarter_id), ("code", e.code())],
                );
                scope.fail(Severity::Warn, e.code())
            }
            Err(e) => scope.fail(Severity::Error, &e.to_string()),
        }
        result
    }

    /// Check-then-write section; caller holds the quarter lock
    fn finalize_locked(
        &self,
        quarter: &QuarterConfig,
        finalized_by: &str,
        notes: Option<String>,
    ) -> FinalizeResult<QuarterFinalization> {
        let history = self.store.finalizations_for(&quarter.id)?;
        let overrides = self.store.overrides_for(&quarter.id)?;
        let facts = self.facts(quarter)?;
        let now = self.clock.now();

        let digest = InputsDigest::compute(&facts, &overrides);
        if let Err(second) = digest.verify() {
            log_event_with_fields(
                Event::DigestMismatch,
                &[
                    ("quarter_id", &quarter.id),
                    ("first", digest.hash()),
                    ("second", &second),
                ],
            );
            return Err(FinalizeError::DigestMismatchInternal {
                quarter_id: quarter.id.clone(),
                first: digest.hash().to_string(),
                second,
            });
        }

        let current = current_of(&history);
        if let Some(existing) = current {
            if existing.inputs_hash == digest.hash() {
                return Err(FinalizeError::AlreadyFinalized {
                    existing: Box::new(existing.clone()),
                });
            }
        }

        let mask = OverrideMask::from_overrides(&overrides);
        let report = build_report(&self.rules, &facts, &mask, now);
        if !report.can_finalize {
            return Err(FinalizeError::NotEligible {
                quarter_id: quarter.id.clone(),
                findings: report.blocking_findings(&mask),
            });
        }

        let record = QuarterFinalization::new(
            quarter.id.clone(),
            current.map_or(1, |c| c.sequence + 1),
            finalized_by,
            digest.hash(),
            notes,
            current.map(|c| c.snapshot_id),
            now,
        );
        self.store.append_finalization(&record)?;
        Ok(record)
    }

    /// Composite status view including drift detection
    pub fn get_quarter_finalization_status(
        &self,
        quarter_id: &str,
    ) -> FinalizeResult<QuarterFinalizationStatus> {
        let quarter = self.quarter(quarter_id)?;
        let history = self.store.finalizations_for(quarter_id)?;
        let overrides = self.ledger().list(quarter_id)?;
        let facts = self.facts(&quarter)?;

        let mask = OverrideMask::from_overrides(&overrides);
        let readiness = build_report(&self.rules, &facts, &mask, self.clock.now());
        let current_inputs_hash = inputs_hash(&facts, &overrides);

        let finalization = current_of(&history).cloned();
        let snapshot_inputs_hash = finalization.as_ref().map(|f| f.inputs_hash.clone());
        let facts_changed = snapshot_inputs_hash
            .as_deref()
            .map_or(false, |stored| stored != current_inputs_hash);

        if facts_changed {
            log_event_at(
                Severity::Warn,
                Event::DriftDetected,
                &[
                    ("quarter_id", quarter_id),
                    ("snapshot_inputs_hash", snapshot_inputs_hash.as_deref().unwrap_or("")),
                    ("current_inputs_hash", &current_inputs_hash),
                ],
            );
        }

        Ok(QuarterFinalizationStatus {
            quarter_id: quarter_id.to_string(),
            is_finalized: finalization.is_some(),
            finalization,
            readiness,
            overrides,
            snapshot_inputs_hash,
            current_inputs_hash,
            facts_changed_since_finalization: facts_changed,
        })
    }

    /// Every finalization ever recorded for a quarter, oldest first
    pub fn list_quarter_finalizations(
        &self,
        quarter_id: &str,
    ) -> FinalizeResult<Vec<QuarterFinalization>> {
        self.quarter(quarter_id)?;
        let mut history = self.store.finalizations_for(quarter_id)?;
        history.sort_by_key(|f| f.sequence);
        Ok(history)
    }

    /// Audit lookup of one finalization by snapshot id
    pub fn get_quarter_finalization(
        &self,
        quarter_id: &str,
        snapshot_id: Uuid,
    ) -> FinalizeResult<Option<QuarterFinalization>> {
        Ok(self
            .list_quarter_finalizations(quarter_id)?
            .into_iter()
            .find(|f| f.snapshot_id == snapshot_id))
    }

    /// Digest of the quarter's current facts and overrides
    pub fn current_inputs_hash(&self, quarter_id: &str) -> FinalizeResult<String> {
        let quarter = self.quarter(quarter_id)?;
        let overrides = self.store.overrides_for(quarter_id)?;
        let facts = self.facts(&quarter)?;
        Ok(inputs_hash(&facts, &overrides))
    }
}
