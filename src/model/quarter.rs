//! Quarter configuration
//!
//! A quarter is a fiscal reporting period. Its half-open window
//! `[start_date, end_date)` selects which incidents contribute facts.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

/// Quarter identifier (e.g. "Q1-2025")
pub type QuarterId = String;

/// Whether an id can key durable records.
///
/// Ids become directory names: ASCII letters, digits, `-`, `_` and `.`,
/// not starting with a dot.
pub fn is_valid_quarter_id(id: &str) -> bool {
    !id.is_empty()
        && !id.starts_with('.')
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
}

/// Fiscal quarter definition.
///
/// Immutable once incidents reference it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct QuarterConfig {
    pub id: QuarterId,
    pub fiscal_year: i32,
    /// Quarter number, 1..=4
    pub quarter: u8,
    /// First day of the window (inclusive)
    pub start_date: NaiveDate,
    /// First day after the window (exclusive)
    pub end_date: NaiveDate,
}

impl QuarterConfig {
    /// Create a new quarter config
    pub fn new(
        id: impl Into<String>,
        fiscal_year: i32,
        quarter: u8,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Self {
        Self {
            id: id.into(),
            fiscal_year,
            quarter,
            start_date,
            end_date,
        }
    }

    /// Validate the quarter definition.
    ///
    /// Returns a human-readable reason on failure.
    pub fn validate(&self) -> Result<(), String> {
        if self.id.trim().is_empty() {
            return Err("quarter id must not be empty".to_string());
        }
        if !is_valid_quarter_id(&self.id) {
            return Err(format!(
                "quarter id '{}' may only use letters, digits, '-', '_' and '.'",
                self.id
            ));
        }
        if !(1..=4).contains(&self.quarter) {
            return Err(format!(
                "quarter number must be 1..=4, got {}",
                self.quarter
            ));
        }
        if self.start_date >= self.end_date {
            return Err(format!(
                "quarter {} has empty window: {} >= {}",
                self.id, self.start_date, self.end_date
            ));
        }
        Ok(())
    }

    /// Start of the window as a UTC instant (midnight, inclusive)
    pub fn window_start(&self) -> DateTime<Utc> {
        self.start_date.and_time(NaiveTime::default()).and_utc()
    }

    /// End of the window as a UTC instant (midnight, exclusive)
    pub fn window_end(&self) -> DateTime<Utc> {
        self.end_date.and_time(NaiveTime::default()).and_utc()
    }

    /// Whether the given instant falls inside `[start, end)`
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        at >= self.window_start() && at < self.window_end()
    }

    /// Whether the window has fully elapsed as of the given instant
    pub fn has_elapsed(&self, as_of: DateTime<Utc>) -> bool {
        as_of >= self.window_end()
    }
}
