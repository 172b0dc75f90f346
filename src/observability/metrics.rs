//! Engine counters
//!
//! - Counters only, monotonic
//! - Reset only on process start
//! - Atomic, relaxed ordering

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Counters shared by a query handler
#[derive(Debug, Default)]
pub struct MetricsRegistry {
    filters_compiled: AtomicU64,
    projections: AtomicU64,
    entities_projected: AtomicU64,
    queries_executed: AtomicU64,
    queries_rejected: AtomicU64,
}

impl MetricsRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment_filters_compiled(&self) {
        self.filters_compiled.fetch_add(1, Ordering::Relaxed);
    }

    /// Counts one projection call that shaped `entities` top-level entities
    pub fn record_projection(&self, entities: u64) {
        self.projections.fetch_add(1, Ordering::Relaxed);
        self.entities_projected.fetch_add(entities, Ordering::Relaxed);
    }

    pub fn increment_queries_executed(&self) {
        self.queries_executed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_queries_rejected(&self) {
        self.queries_rejected.fetch_add(1, Ordering::Relaxed);
    }

    /// Point-in-time copy of every counter
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            filters_compiled: self.filters_compiled.load(Ordering::Relaxed),
            projections: self.projections.load(Ordering::Relaxed),
            entities_projected: self.entities_projected.load(Ordering::Relaxed),
            queries_executed: self.queries_executed.load(Ordering::Relaxed),
            queries_rejected: self.queries_rejected.load(Ordering::Relaxed),
        }
    }
}

/// A point-in-time snapshot of all counters
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub filters_compiled: u64,
    pub projections: u64,
    pub entities_projected: u64,
    pub queries_executed: u64,
    pub queries_rejected: u64,
}
