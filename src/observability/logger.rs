//! JSON line logger
//!
//! Each event becomes one line on stderr: `event` first, then `severity`,
//! then the fields sorted by key. Events below the process-wide minimum
//! severity are dropped before anything is rendered.

use std::collections::BTreeMap;
use std::io::{self, Write};
use std::sync::atomic::{AtomicU8, Ordering};

use serde_json::Value;

/// Log severity levels, lowest first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    /// Per-region payload transfers
    Trace = 0,
    /// Container lifecycle
    Info = 1,
    /// Rejected calls
    Warn = 2,
    Error = 3,
    /// Persisted data cannot be trusted
    Fatal = 4,
}

const LEVELS: [Severity; 5] = [
    Severity::Trace,
    Severity::Info,
    Severity::Warn,
    Severity::Error,
    Severity::Fatal,
];

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Trace => "TRACE",
            Severity::Info => "INFO",
            Severity::Warn => "WARN",
            Severity::Error => "ERROR",
            Severity::Fatal => "FATAL",
        }
    }

    /// Parse a configured level name, ignoring case
    pub fn parse(name: &str) -> Option<Self> {
        LEVELS
            .iter()
            .copied()
            .find(|level| level.as_str().eq_ignore_ascii_case(name))
    }
}

static MIN_SEVERITY: AtomicU8 = AtomicU8::new(Severity::Info as u8);

#[cfg(test)]
thread_local! {
    static CAPTURED: std::cell::RefCell<Option<Vec<String>>> = std::cell::RefCell::new(None);
}

/// Collect the lines `f` logs on this thread instead of writing them
#[cfg(test)]
pub(crate) fn capture_lines(f: impl FnOnce()) -> Vec<String> {
    CAPTURED.with(|c| *c.borrow_mut() = Some(Vec::new()));
    f();
    CAPTURED.with(|c| c.borrow_mut().take().unwrap_or_default())
}

pub struct Logger;

impl Logger {
    /// Drop events below `severity` from now on
    pub fn set_min_severity(severity: Severity) {
        MIN_SEVERITY.store(severity as u8, Ordering::Relaxed);
    }

    pub fn min_severity() -> Severity {
        let raw = MIN_SEVERITY.load(Ordering::Relaxed) as usize;
        LEVELS.get(raw).copied().unwrap_or(Severity::Fatal)
    }

    /// Write one event line to stderr unless it is below the minimum
    pub fn log(severity: Severity, event: &str, fields: &[(&str, &str)]) {
        if severity < Self::min_severity() {
            return;
        }
        let line = render_line(severity, event, fields);
        #[cfg(test)]
        {
            let captured = CAPTURED.with(|c| match c.borrow_mut().as_mut() {
                Some(lines) => {
                    lines.push(line.clone());
                    true
                }
                None => false,
            });
            if captured {
                return;
            }
        }
        // a lost log line never fails the operation being logged
        let _ = io::stderr().lock().write_all(line.as_bytes());
    }
}

/// Render one newline-terminated JSON object. A repeated key keeps its
/// last value.
fn render_line(severity: Severity, event: &str, fields: &[(&str, &str)]) -> String {
    let sorted: BTreeMap<&str, &str> = fields.iter().copied().collect();

    let mut line = format!(
        "{{\"event\":{},\"severity\":\"{}\"",
        Value::from(event),
        severity.as_str()
    );
    for (key, value) in sorted {
        line.push(',');
        line.push_str(&Value::from(key).to_string());
        line.push(':');
        line.push_str(&Value::from(value).to_string());
    }
    line.push_str("}\n");
    line
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parsed(line: &str) -> serde_json::Value {
        serde_json::from_str(line).unwrap()
    }

    #[test]
    fn test_severity_parse() {
        assert_eq!(Severity::parse("warn"), Some(Severity::Warn));
        assert_eq!(Severity::parse("TRACE"), Some(Severity::Trace));
        assert_eq!(Severity::parse("Fatal"), Some(Severity::Fatal));
        assert_eq!(Severity::parse("verbose"), None);
        assert!(Severity::Trace < Severity::Warn && Severity::Error < Severity::Fatal);
    }

    #[test]
    fn test_line_layout() {
        let line = render_line(
            Severity::Warn,
            "UNIT_REJECTED",
            &[("unit", "somestring"), ("array", "array_one")],
        );
        assert!(line.starts_with("{\"event\":\"UNIT_REJECTED\",\"severity\":\"WARN\""));
        assert!(line.find("array").unwrap() < line.find("unit\"").unwrap());
        assert_eq!(line.matches('\n').count(), 1);

        let value = parsed(&line);
        assert_eq!(value["unit"], "somestring");
        assert_eq!(value["array"], "array_one");
    }

    #[test]
    fn test_field_order_does_not_matter() {
        let a = render_line(Severity::Info, "X", &[("zebra", "1"), ("apple", "2")]);
        let b = render_line(Severity::Info, "X", &[("apple", "2"), ("zebra", "1")]);
        assert_eq!(a, b);
    }

    #[test]
    fn test_capture_collects_lines() {
        // FATAL passes any minimum
        let lines = capture_lines(|| {
            Logger::log(Severity::Fatal, "MANIFEST_CORRUPT", &[("path", "/x")]);
        });
        assert_eq!(lines.len(), 1);
        assert_eq!(parsed(&lines[0])["path"], "/x");
        assert!(capture_lines(|| {}).is_empty());
    }

    #[test]
    fn test_values_are_escaped() {
        let line = render_line(
            Severity::Info,
            "TEST",
            &[("message", "hello \"world\"\nline2\u{1}")],
        );
        assert_eq!(line.matches('\n').count(), 1);
        assert_eq!(parsed(&line)["message"], "hello \"world\"\nline2\u{1}");
    }
}
