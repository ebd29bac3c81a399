//! Data model shared by the finalization subsystems
//!
//! - Quarter definitions and their fact-selection window
//! - Fact projections of incidents, action items and checklist state

mod facts;
mod quarter;

pub use facts::{
    is_blank, ActionItem, ActionItemStatus, ChecklistSummary, Incident, IncidentStatus,
    QuarterFacts,
};
pub use quarter::{is_valid_quarter_id, QuarterConfig, QuarterId};
