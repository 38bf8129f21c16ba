//! Observable events
//!
//! Every lifecycle point that produces a log line has a typed event here.

use std::fmt;

use super::logger::Severity;

/// Observable events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Configuration
    /// Runtime configuration loaded
    ConfigLoaded,
    /// App manifests loaded into a settings snapshot
    SettingsLoaded,
    /// An app's settings failed validation
    SettingsRejected,
    /// A script module was compiled for an app
    ModuleLoaded,

    // Writes
    /// Item validated and stored
    ItemWritten,
    /// Item payload failed validation
    ItemRejected,
    /// Item removed
    ItemDeleted,

    // Reads
    /// Item list computed, filtered and returned
    ListServed,
    /// A computed field could not be evaluated for one item
    ComputedFieldFailed,
    /// A filter predicate could not be evaluated for one item
    FilterFailed,

    // Actions
    /// Action executed successfully
    ActionInvoked,
    /// Action execution failed
    ActionFailed,

    // CLI
    /// CLI command dispatched
    CliCommand,
}

impl Event {
    /// Returns the string representation of the event
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::ConfigLoaded => "CONFIG_LOADED",
            Event::SettingsLoaded => "SETTINGS_LOADED",
            Event::SettingsRejected => "SETTINGS_REJECTED",
            Event::ModuleLoaded => "MODULE_LOADED",
            Event::ItemWritten => "ITEM_WRITTEN",
            Event::ItemRejected => "ITEM_REJECTED",
            Event::ItemDeleted => "ITEM_DELETED",
            Event::ListServed => "LIST_SERVED",
            Event::ComputedFieldFailed => "COMPUTED_FIELD_FAILED",
            Event::FilterFailed => "FILTER_FAILED",
            Event::ActionInvoked => "ACTION_INVOKED",
            Event::ActionFailed => "ACTION_FAILED",
            Event::CliCommand => "CLI_COMMAND",
        }
    }

    /// Severity the event is logged at
    pub fn severity(&self) -> Severity {
        match self {
            Event::ComputedFieldFailed | Event::FilterFailed | Event::ItemRejected => Severity::Warn,
            Event::SettingsRejected | Event::ActionFailed => Severity::Error,
            Event::CliCommand => Severity::Trace,
            _ => Severity::Info,
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
