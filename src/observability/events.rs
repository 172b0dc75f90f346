//! Observable events
//!
//! Events are explicit and typed; each carries the severity it is logged at.

use std::fmt;

use super::logger::Severity;

/// Observable events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Loading
    /// Configuration file parsed and validated
    ConfigLoaded,
    /// Relation registry built
    RegistryLoaded,
    /// Dataset loaded into the memory store
    DatasetLoaded,

    // Engines
    /// Filter document compiled to a predicate
    FilterCompiled,
    /// Entity shaped into a document
    ProjectionComplete,
    /// Predicate applied to a collection
    ExecutionComplete,

    // Requests
    /// Query answered
    QueryComplete,
    /// Query failed with an engine error
    QueryRejected,
}

impl Event {
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::ConfigLoaded => "CONFIG_LOADED",
            Event::RegistryLoaded => "REGISTRY_LOADED",
            Event::DatasetLoaded => "DATASET_LOADED",
            Event::FilterCompiled => "FILTER_COMPILED",
            Event::ProjectionComplete => "PROJECTION_COMPLETE",
            Event::ExecutionComplete => "EXECUTION_COMPLETE",
            Event::QueryComplete => "QUERY_COMPLETE",
            Event::QueryRejected => "QUERY_REJECTED",
        }
    }

    /// Severity the event is logged at
    pub fn severity(&self) -> Severity {
        match self {
            Event::FilterCompiled | Event::ProjectionComplete | Event::ExecutionComplete => {
                Severity::Trace
            }
            Event::ConfigLoaded
            | Event::RegistryLoaded
            | Event::DatasetLoaded
            | Event::QueryComplete => Severity::Info,
            Event::QueryRejected => Severity::Warn,
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
