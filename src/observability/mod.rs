//! Observability
//!
//! Structured JSON logging of lifecycle events. Logging is read-only with
//! respect to the data model: it never changes what an operation does.
//!
//! ```ignore
//! use ndblock::observability::{log_event_with_fields, Event};
//!
//! log_event_with_fields(Event::ArrayCreated, &[("name", "array_one")]);
//! ```

mod events;
mod logger;

pub use events::Event;
pub use logger::{Logger, Severity};

#[cfg(test)]
pub(crate) use logger::capture_lines;

/// Log a lifecycle event
pub fn log_event(event: Event) {
    log_event_with_fields(event, &[]);
}

/// Log a lifecycle event with fields
pub fn log_event_with_fields(event: Event, fields: &[(&str, &str)]) {
    let severity = if event.is_fatal() {
        Severity::Fatal
    } else if event.is_chatty() {
        Severity::Trace
    } else {
        Severity::Info
    };
    Logger::log(severity, event.as_str(), fields);
}

/// Log a rejected call at WARN
pub fn log_rejection(event: Event, fields: &[(&str, &str)]) {
    Logger::log(Severity::Warn, event.as_str(), fields);
}
