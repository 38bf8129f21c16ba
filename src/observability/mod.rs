//! Observability
//!
//! - Structured JSON logging to stderr
//! - Typed lifecycle events
//! - Begin/complete scopes around multi-step operations
//!
//! Observability never affects the outcome of an operation: logging failures
//! are swallowed.
//!
//! ```ignore
//! use walletapps::observability::{log_event_with_fields, Event};
//!
//! log_event_with_fields(Event::ItemWritten, &[("model", "invoice"), ("key", &key)]);
//! ```

mod events;
mod logger;
mod scope;

pub use events::Event;
pub use logger::{Logger, Severity};
pub use scope::ObservationScope;

/// Log a lifecycle event at its own severity
pub fn log_event(event: Event) {
    Logger::log(event.severity(), event.as_str(), &[]);
}

/// Log a lifecycle event with fields at its own severity
pub fn log_event_with_fields(event: Event, fields: &[(&str, &str)]) {
    Logger::log(event.severity(), event.as_str(), fields);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_event() {
        log_event(Event::ConfigLoaded);
        log_event(Event::SettingsLoaded);
    }

    #[test]
    fn test_log_event_with_fields() {
        log_event_with_fields(Event::ItemWritten, &[("model", "invoice"), ("key", "k1")]);
    }
}
