//! Request handler
//!
//! Maps each request onto one engine operation. Engine errors become error
//! responses; they never end the serving loop.

use std::path::PathBuf;

use serde::Serialize;
use serde_json::Value;

use super::errors::CliError;
use super::request::Request;
use super::response::Response;
use crate::finalization::{FinalizationEngine, FinalizeError, FinalizeResult};
use crate::observability::{log_event_at, Event, Severity};
use crate::rules::rule_catalog;
use crate::source::{FactDataset, InMemoryFactSource};
use crate::store::RecordStore;

/// Dispatches requests to a finalization engine
pub struct RequestHandler<S: RecordStore> {
    engine: FinalizationEngine<InMemoryFactSource, S>,
    facts_path: Option<PathBuf>,
}

impl<S: RecordStore> RequestHandler<S> {
    pub fn new(engine: FinalizationEngine<InMemoryFactSource, S>) -> Self {
        Self {
            engine,
            facts_path: None,
        }
    }

    /// Remember where facts came from so `reload_facts` can re-read them
    pub fn with_facts_path(mut self, path: PathBuf) -> Self {
        self.facts_path = Some(path);
        self
    }

    pub fn engine(&self) -> &FinalizationEngine<InMemoryFactSource, S> {
        &self.engine
    }

    /// Handle one raw JSON request
    pub fn handle(&self, raw: Value) -> Response {
        let request = match Request::parse(raw) {
            Ok(r) => r,
            Err(e) => {
                log_event_at(
                    Severity::Warn,
                    Event::RequestFailed,
                    &[("code", e.code()), ("message", &e.to_string())],
                );
                return Response::from(&e);
            }
        };
        self.handle_request(&request)
    }

    /// Handle one parsed request
    pub fn handle_request(&self, request: &Request) -> Response {
        let result = self.dispatch(request);
        if let Response::Error { code, .. } = &result {
            log_event_at(
                Severity::Warn,
                Event::RequestFailed,
                &[("command", request.name()), ("code", code)],
            );
        }
        result
    }

    fn dispatch(&self, request: &Request) -> Response {
        let engine = &self.engine;
        match request {
            Request::GetQuarterReadiness { quarter_id } => {
                respond(engine.get_quarter_readiness(quarter_id))
            }
            Request::ListQuarterOverrides { quarter_id } => {
                respond(engine.list_quarter_overrides(quarter_id))
            }
            Request::RecordQuarterOverride {
                quarter_id,
                rule_key,
                incident_id,
                reason,
                approved_by,
            } => respond(engine.record_quarter_override(
                quarter_id,
                rule_key,
                incident_id,
                reason,
                approved_by,
            )),
            Request::FinalizeQuarter {
                quarter_id,
                finalized_by,
                notes,
            } => respond(engine.finalize_quarter(quarter_id, finalized_by, notes.as_deref())),
            Request::GetQuarterFinalizationStatus { quarter_id } => {
                respond(engine.get_quarter_finalization_status(quarter_id))
            }
            Request::ListQuarterFinalizations { quarter_id } => {
                respond(engine.list_quarter_finalizations(quarter_id))
            }
            Request::GetQuarterFinalization {
                quarter_id,
                snapshot_id,
            } => respond(engine.get_quarter_finalization(quarter_id, *snapshot_id)),
            Request::ListRuleCatalog => respond(Ok(rule_catalog())),
            Request::ReloadFacts => respond(
                self.reload_facts()
                    .map(|count| serde_json::json!({ "incidents": count })),
            ),
        }
    }

    /// Re-read the facts file. A failed reload keeps the previous facts.
    fn reload_facts(&self) -> FinalizeResult<usize> {
        let path = self
            .facts_path
            .as_ref()
            .ok_or_else(|| FinalizeError::InvalidInput("No facts file configured".to_string()))?;
        let dataset = FactDataset::load(path)?;
        let count = dataset.incidents.len();
        self.engine.source().replace(dataset)?;
        Ok(count)
    }
}

fn respond<T: Serialize>(result: FinalizeResult<T>) -> Response {
    match result {
        Ok(data) => match serde_json::to_value(data) {
            Ok(value) => Response::ok(value),
            Err(e) => Response::from(&CliError::from(e)),
        },
        Err(e) => Response::from(&e),
    }
}
