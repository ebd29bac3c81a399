//! Canonical serialization of quarter inputs
//!
//! Format (UTF-8, `\n` line endings):
//!
//! ```text
//! quarterclose/inputs/v1
//! quarter;id=s7:Q1-2025;fiscal_year=i2025;quarter=i1;start_date=s10:2025-01-01;end_date=s10:2025-04-01
//! [facts]
//! <one record per fact, sorted by entity id, then kind>
//! [overrides]
//! <one record per override, sorted by (rule_key, incident_id)>
//! ```
//!
//! A record is `<kind>` followed by `;<field>=<value>` in a fixed field
//! order. Values:
//! - string: `s<byte length>:<bytes>`
//! - absent: `~` (distinct from the empty string `s0:`)
//! - bool: `t` / `f`
//! - integer: `i<decimal>`
//! - timestamp: string of RFC 3339 UTC with nanosecond precision
//! - date: string of `YYYY-MM-DD`

use std::fmt::Write;

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};

use crate::model::{ActionItem, ChecklistSummary, Incident, QuarterConfig, QuarterFacts};
use crate::overrides::QuarterOverride;

/// Format header line
pub const FORMAT_HEADER: &str = "quarterclose/inputs/v1";
/// Separator preceding fact records
pub const FACTS_MARKER: &str = "[facts]";
/// Separator preceding override records
pub const OVERRIDES_MARKER: &str = "[overrides]";

const NULL: &str = "~";

/// Builds one canonical record line
struct Record {
    line: String,
}

impl Record {
    fn new(kind: &str) -> Self {
        Self {
            line: kind.to_string(),
        }
    }

    fn raw(mut self, name: &str, value: &str) -> Self {
        // Writing to a String cannot fail
        let _ = write!(self.line, ";{}={}", name, value);
        self
    }

    fn str(self, name: &str, value: &str) -> Self {
        let encoded = format!("s{}:{}", value.len(), value);
        self.raw(name, &encoded)
    }

    fn opt_str(self, name: &str, value: Option<&str>) -> Self {
        match value {
            Some(v) => self.str(name, v),
            None => self.raw(name, NULL),
        }
    }

    fn bool(self, name: &str, value: bool) -> Self {
        self.raw(name, if value { "t" } else { "f" })
    }

    fn int(self, name: &str, value: i64) -> Self {
        let encoded = format!("i{}", value);
        self.raw(name, &encoded)
    }

    fn timestamp(self, name: &str, value: DateTime<Utc>) -> Self {
        let ts = value.to_rfc3339_opts(SecondsFormat::Nanos, true);
        self.str(name, &ts)
    }

    fn opt_timestamp(self, name: &str, value: Option<DateTime<Utc>>) -> Self {
        match value {
            Some(v) => self.timestamp(name, v),
            None => self.raw(name, NULL),
        }
    }

    fn date(self, name: &str, value: NaiveDate) -> Self {
        let d = value.format("%Y-%m-%d").to_string();
        self.str(name, &d)
    }

    fn opt_date(self, name: &str, value: Option<NaiveDate>) -> Self {
        match value {
            Some(v) => self.date(name, v),
            None => self.raw(name, NULL),
        }
    }

    fn finish(self) -> String {
        self.line
    }
}

fn quarter_record(q: &QuarterConfig) -> String {
    Record::new("quarter")
        .str("id", &q.id)
        .int("fiscal_year", i64::from(q.fiscal_year))
        .int("quarter", i64::from(q.quarter))
        .date("start_date", q.start_date)
        .date("end_date", q.end_date)
        .finish()
}

fn incident_record(i: &Incident) -> String {
    Record::new("incident")
        .str("id", &i.id)
        .str("title", &i.title)
        .opt_str("category", i.category.as_deref())
        .str("status", i.status.as_str())
        .timestamp("started_at", i.started_at)
        .opt_timestamp("resolved_at", i.resolved_at)
        .opt_str("root_cause", i.root_cause.as_deref())
        .opt_str("resolution", i.resolution.as_deref())
        .bool("is_recurring", i.is_recurring)
        .opt_str("recurrence_of", i.recurrence_of.as_deref())
        .finish()
}

fn action_item_record(a: &ActionItem) -> String {
    Record::new("action_item")
        .str("id", &a.id)
        .str("incident_id", &a.incident_id)
        .str("title", &a.title)
        .str("status", a.status.as_str())
        .opt_str("owner", a.owner.as_deref())
        .opt_date("due_date", a.due_date)
        .opt_timestamp("completed_at", a.completed_at)
        .finish()
}

fn checklist_record(c: &ChecklistSummary) -> String {
    Record::new("checklist")
        .str("id", &c.entity_id())
        .str("incident_id", &c.incident_id)
        .str("template_id", &c.template_id)
        .bool("required", c.required)
        .int("completed_items", i64::from(c.completed_items))
        .int("total_items", i64::from(c.total_items))
        .finish()
}

fn override_record(o: &QuarterOverride) -> String {
    Record::new("override")
        .str("rule_key", &o.rule_key)
        .str("incident_id", &o.incident_id)
        .str("reason", &o.reason)
        .str("approved_by", &o.approved_by)
        .timestamp("created_at", o.created_at)
        .finish()
}

/// Canonical bytes for a quarter's facts and overrides.
///
/// Independent of the order of facts and overrides in the inputs.
pub fn canonical_payload(facts: &QuarterFacts, overrides: &[QuarterOverride]) -> String {
    // (entity id, kind, record)
    let mut fact_records: Vec<(String, &'static str, String)> = Vec::with_capacity(
        facts.incidents.len() + facts.action_items.len() + facts.checklists.len(),
    );
    fact_records.extend(
        facts
            .incidents
            .iter()
            .map(|i| (i.id.clone(), "incident", incident_record(i))),
    );
    fact_records.extend(
        facts
            .action_items
            .iter()
            .map(|a| (a.id.clone(), "action_item", action_item_record(a))),
    );
    fact_records.extend(
        facts
            .checklists
            .iter()
            .map(|c| (c.entity_id(), "checklist", checklist_record(c))),
    );
    fact_records.sort();

    let mut override_records: Vec<(&str, &str, String)> = overrides
        .iter()
        .map(|o| (o.rule_key.as_str(), o.incident_id.as_str(), override_record(o)))
        .collect();
    override_records.sort();

    let mut out = String::new();
    out.push_str(FORMAT_HEADER);
    out.push('\n');
    out.push_str(&quarter_record(&facts.quarter));
    out.push('\n');
    out.push_str(FACTS_MARKER);
    out.push('\n');
    for (_, _, record) in &fact_records {
        out.push_str(record);
        out.push('\n');
    }
    out.push_str(OVERRIDES_MARKER);
    out.push('\n');
    for (_, _, record) in &override_records {
        out.push_str(record);
        out.push('\n');
    }
    out
}
