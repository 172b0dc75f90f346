//! Observability
//!
//! - Structured JSON logging with a process-wide threshold
//! - Typed events
//! - Atomic counters
//!
//! Observability is read-only: it never changes what an operation returns.
//!
//! ```ignore
//! use shapekit::observability::{log_event, Event, Logger, Severity};
//!
//! Logger::set_min_severity(Severity::Trace);
//! log_event(Event::QueryComplete, &[("entity", "book"), ("results", "3")]);
//! ```

mod events;
mod logger;
mod metrics;

pub use events::Event;
pub use logger::{Logger, Severity};
pub use metrics::{MetricsRegistry, MetricsSnapshot};

/// Logs an event at its own severity.
///
/// Events always go to stderr: stdout carries the CLI's response envelopes.
pub fn log_event(event: Event, fields: &[(&str, &str)]) {
    Logger::log_stderr(event.severity(), event.as_str(), fields)
}
