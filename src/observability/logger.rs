//! Structured JSON logger
//!
//! - One log line = one event
//! - Keys sorted, so identical events render identically
//! - Explicit severity levels with a process-wide minimum
//! - Synchronous, no buffering
//!
//! Logs go to stderr; stdout carries command responses.

use std::collections::BTreeMap;
use std::fmt;
use std::io::{self, Write};
use std::sync::atomic::{AtomicU8, Ordering};

/// Log severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Trace = 0,
    Info = 1,
    Warn = 2,
    Error = 3,
    /// Internal invariant broken
    Fatal = 4,
}

impl Severity {
    const ALL: [Severity; 5] = [
        Severity::Trace,
        Severity::Info,
        Severity::Warn,
        Severity::Error,
        Severity::Fatal,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Trace => "TRACE",
            Severity::Info => "INFO",
            Severity::Warn => "WARN",
            Severity::Error => "ERROR",
            Severity::Fatal => "FATAL",
        }
    }

    /// Parse a severity name, ignoring case
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|level| level.as_str().eq_ignore_ascii_case(s.trim()))
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

static MIN_SEVERITY: AtomicU8 = AtomicU8::new(Severity::Info as u8);

/// Process-wide JSON-lines logger
pub struct Logger;

impl Logger {
    pub fn set_min_severity(severity: Severity) {
        MIN_SEVERITY.store(severity as u8, Ordering::Relaxed);
    }

    pub fn min_severity() -> Severity {
        let raw = MIN_SEVERITY.load(Ordering::Relaxed);
        Severity::ALL
            .into_iter()
            .find(|level| *level as u8 == raw)
            .unwrap_or(Severity::Fatal)
    }

    /// Emit one event if it clears the minimum severity
    pub fn log(severity: Severity, event: &str, fields: &[(&str, &str)]) {
        if severity >= Self::min_severity() {
            Self::emit(&mut io::stderr().lock(), severity, event, fields);
        }
    }

    fn emit<W: Write>(out: &mut W, severity: Severity, event: &str, fields: &[(&str, &str)]) {
        let line = Self::render(severity, event, fields);
        // a lost log line never fails the operation being logged
        let _ = out.write_all(line.as_bytes()).and_then(|_| out.flush());
    }

    /// Render a line. `event` and `severity` win over same-named fields.
    fn render(severity: Severity, event: &str, fields: &[(&str, &str)]) -> String {
        let mut record: BTreeMap<&str, &str> = fields.iter().copied().collect();
        record.insert("event", event);
        record.insert("severity", severity.as_str());

        let mut line = serde_json::to_string(&record).unwrap_or_else(|e| {
            format!(
                "{{\"event\":\"LOG_RENDER_FAILED\",\"severity\":\"ERROR\",\"reason\":{:?}}}",
                e.to_string()
            )
        });
        line.push('\n');
        line
    }

    pub fn trace(event: &str, fields: &[(&str, &str)]) {
        Self::log(Severity::Trace, event, fields);
    }

    pub fn info(event: &str, fields: &[(&str, &str)]) {
        Self::log(Severity::Info, event, fields);
    }

    pub fn warn(event: &str, fields: &[(&str, &str)]) {
        Self::log(Severity::Warn, event, fields);
    }
}

/// Render a log line into a string instead of stderr
#[cfg(test)]
pub fn capture_log(severity: Severity, event: &str, fields: &[(&str, &str)]) -> String {
    let mut buffer = Vec::new();
    Logger::emit(&mut buffer, severity, event, fields);
    String::from_utf8(buffer).unwrap()
}
