//! Predicate execution over entity collections

use crate::errors::ShapeResult;
use crate::filter::Predicate;
use crate::model::Entity;
use crate::observability::{log_event, Event};

use super::filters::PredicateFilter;

/// Applies a compiled predicate to a collection.
///
/// Implementations must return the matching entities in their input order.
/// Backends that push predicates down to a query language implement this
/// instead of evaluating in memory.
pub trait PredicateExecutor {
    fn execute<E: Entity>(&self, predicate: &Predicate, items: Vec<E>) -> ShapeResult<Vec<E>>;
}

impl<X: PredicateExecutor> PredicateExecutor for &X {
    fn execute<E: Entity>(&self, predicate: &Predicate, items: Vec<E>) -> ShapeResult<Vec<E>> {
        (**self).execute(predicate, items)
    }
}

/// Evaluates predicates against entities held in memory
#[derive(Debug, Clone, Copy, Default)]
pub struct InMemoryExecutor;

impl InMemoryExecutor {
    pub fn new() -> Self {
        Self
    }
}

impl PredicateExecutor for InMemoryExecutor {
    fn execute<E: Entity>(&self, predicate: &Predicate, items: Vec<E>) -> ShapeResult<Vec<E>> {
        if predicate.is_match_all() {
            return Ok(items);
        }

        let filter = PredicateFilter::new(predicate)?;
        let scanned = items.len();
        let mut matched = Vec::with_capacity(scanned);
        for item in items {
            if filter.matches(&item)? {
                matched.push(item);
            }
        }

        log_event(
            Event::ExecutionComplete,
            &[
                ("matched", matched.len().to_string().as_str()),
                ("scanned", scanned.to_string().as_str()),
            ],
        );
        Ok(matched)
    }
}
