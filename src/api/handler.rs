//! Query handler
//!
//! Runs one request through the full pipeline:
//! 1. Resolve the entity type
//! 2. Parse the shape (default spec when absent) and check its depth
//! 3. Parse and compile the filter
//! 4. Execute the predicate over the stored collection
//! 5. Project each match in order
//!
//! A request either returns every projected document or exactly one error.

use serde_json::Value;

use crate::config::EngineLimits;
use crate::errors::ShapeResult;
use crate::executor::{InMemoryExecutor, PredicateExecutor};
use crate::filter::{FilterCompiler, Predicate};
use crate::observability::{log_event, Event, MetricsRegistry, MetricsSnapshot};
use crate::projection::{pick, ProjectionSpec, Projector};
use crate::store::MemoryStore;

use super::request::{PickRequest, QueryRequest};
use super::response::Response;

/// Answers query requests against a memory store
pub struct QueryHandler<X: PredicateExecutor = InMemoryExecutor> {
    store: MemoryStore,
    executor: X,
    limits: EngineLimits,
    metrics: MetricsRegistry,
}

impl QueryHandler {
    /// Handler evaluating filters in memory
    pub fn new(store: MemoryStore, limits: EngineLimits) -> Self {
        Self::with_executor(store, limits, InMemoryExecutor::new())
    }
}

impl<X: PredicateExecutor> QueryHandler<X> {
    pub fn with_executor(store: MemoryStore, limits: EngineLimits, executor: X) -> Self {
        Self {
            store,
            executor,
            limits,
            metrics: MetricsRegistry::new(),
        }
    }

    /// Handle a raw JSON request string
    pub fn handle(&self, json_request: &str) -> Response {
        match QueryRequest::parse(json_request) {
            Ok(request) => self.handle_request(&request),
            Err(e) => {
                self.metrics.increment_queries_rejected();
                log_event(
                    Event::QueryRejected,
                    &[("code", e.code().code()), ("message", e.message())],
                );
                Response::error(&e)
            }
        }
    }

    /// Handle a parsed request
    pub fn handle_request(&self, request: &QueryRequest) -> Response {
        match self.execute(request) {
            Ok(documents) => {
                self.metrics.increment_queries_executed();
                log_event(
                    Event::QueryComplete,
                    &[
                        ("entity", request.entity.as_str()),
                        ("results", documents.len().to_string().as_str()),
                    ],
                );
                Response::success(Value::Array(documents))
            }
            Err(e) => {
                self.metrics.increment_queries_rejected();
                log_event(
                    Event::QueryRejected,
                    &[
                        ("code", e.code().code()),
                        ("entity", request.entity.as_str()),
                        ("path", e.path().unwrap_or("")),
                    ],
                );
                Response::error(&e)
            }
        }
    }

    /// Runs the pipeline and returns the projected documents
    pub fn execute(&self, request: &QueryRequest) -> ShapeResult<Vec<Value>> {
        let registry = self.store.registry();
        registry.require(&request.entity)?;

        let spec = match request.shape {
            Some(ref shape) => ProjectionSpec::parse_with_limit(shape, Some(self.limits.max_spec_depth))?,
            None => registry.default_spec(&request.entity)?.clone(),
        };

        let predicate = match request.filter {
            Some(ref filter) => {
                let predicate = FilterCompiler::with_limits(&self.limits).compile_value(filter)?;
                self.metrics.increment_filters_compiled();
                predicate
            }
            None => Predicate::MatchAll,
        };

        let items = self.store.all(&request.entity)?;
        let matched = self.executor.execute(&predicate, items)?;

        let projector = Projector::with_executor(registry, &self.executor).with_limits(&self.limits);
        let documents = projector.project_all(&matched, &spec)?;
        self.metrics.record_projection(documents.len() as u64);
        Ok(documents)
    }

    pub fn store(&self) -> &MemoryStore {
        &self.store
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }
}

/// Shapes the document in a pick request
pub fn handle_pick(request: &PickRequest, limits: &EngineLimits) -> ShapeResult<Value> {
    let spec = ProjectionSpec::parse_with_limit(&request.shape, Some(limits.max_spec_depth))?;
    pick(&request.document, &spec)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ShapeErrorCode;
    use crate::registry::RelationRegistry;
    use serde_json::json;
    use std::sync::Arc;

    fn handler() -> QueryHandler {
        let registry = RelationRegistry::from_json(&json!({
            "types": {
                "book": {"fields": ["title", "year"], "label": "title"}
            }
        }))
        .unwrap();
        let store = MemoryStore::from_json(
            Arc::new(registry),
            &json!({"book": [
                {"id": 1, "title": "Dune", "year": 1965},
                {"id": 2, "title": "Solaris", "year": 1961},
                {"id": 3, "title": "Ubik", "year": 1969}
            ]}),
        )
        .unwrap();
        QueryHandler::new(store, EngineLimits::default())
    }

    #[test]
    fn test_query_with_filter_and_shape() {
        let handler = handler();
        let resp = handler.handle(
            r#"{"entity": "book", "filter": {"year": {"_gte": 1965}}, "shape": {"title": true}}"#,
        );
        assert_eq!(
            resp.to_value(),
            json!({"status": "ok", "data": [{"title": "Dune"}, {"title": "Ubik"}]})
        );

        let metrics = handler.metrics();
        assert_eq!(metrics.queries_executed, 1);
        assert_eq!(metrics.filters_compiled, 1);
        assert_eq!(metrics.entities_projected, 2);
    }

    #[test]
    fn test_default_shape() {
        let handler = handler();
        let docs = handler
            .execute(&QueryRequest::new("book").with_filter(json!({"id": {"_eq": 2}})))
            .unwrap();
        assert_eq!(docs, vec![json!({"id": 2, "title": "Solaris", "year": 1961})]);
    }

    #[test]
    fn test_rejection_is_single_error() {
        let handler = handler();
        let resp = handler.handle(r#"{"entity": "book", "filter": {"_or": []}}"#);
        let value = resp.to_value();
        assert_eq!(value["status"], "error");
        assert_eq!(value["code"], "SHAPE_EMPTY_COMBINATOR");
        assert!(value.get("data").is_none());
        assert_eq!(handler.metrics().queries_rejected, 1);
    }

    #[test]
    fn test_unknown_entity() {
        let err = handler().execute(&QueryRequest::new("film")).unwrap_err();
        assert_eq!(err.code(), ShapeErrorCode::UnknownField);
    }

    #[test]
    fn test_pick() {
        let request = PickRequest {
            document: json!({"a": 1, "b": {"c": 2, "d": 3}}),
            shape: json!({"b": {"d": true}}),
        };
        assert_eq!(
            handle_pick(&request, &EngineLimits::default()).unwrap(),
            json!({"b": {"d": 3}})
        );
    }
}
