//! Request types
//!
//! JSON request parsing for queries and document picks.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::{ShapeError, ShapeResult};

/// Query request: filter one entity type and shape the matches
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryRequest {
    /// Entity type to query
    pub entity: String,
    /// Filter document; absent matches everything
    #[serde(default)]
    pub filter: Option<Value>,
    /// Projection spec; absent uses the type's default spec
    #[serde(default)]
    pub shape: Option<Value>,
}

impl QueryRequest {
    pub fn new(entity: impl Into<String>) -> Self {
        Self {
            entity: entity.into(),
            filter: None,
            shape: None,
        }
    }

    pub fn with_filter(mut self, filter: Value) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn with_shape(mut self, shape: Value) -> Self {
        self.shape = Some(shape);
        self
    }

    /// Parse a query request from a JSON string
    pub fn parse(json: &str) -> ShapeResult<Self> {
        parse_json(json)
    }
}

/// Pick request: shape a plain JSON document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PickRequest {
    pub document: Value,
    pub shape: Value,
}

impl PickRequest {
    /// Parse a pick request from a JSON string
    pub fn parse(json: &str) -> ShapeResult<Self> {
        parse_json(json)
    }
}

fn parse_json<T: serde::de::DeserializeOwned>(json: &str) -> ShapeResult<T> {
    serde_json::from_str(json)
        .map_err(|e| ShapeError::invalid_document(format!("Invalid request: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ShapeErrorCode;
    use serde_json::json;

    #[test]
    fn test_parse_query() {
        let req = QueryRequest::parse(
            r#"{"entity": "book", "filter": {"year": {"_gt": 1970}}, "shape": {"title": true}}"#,
        )
        .unwrap();
        assert_eq!(
            req,
            QueryRequest::new("book")
                .with_filter(json!({"year": {"_gt": 1970}}))
                .with_shape(json!({"title": true}))
        );
    }

    #[test]
    fn test_optional_parts() {
        let req = QueryRequest::parse(r#"{"entity": "book"}"#).unwrap();
        assert!(req.filter.is_none());
        assert!(req.shape.is_none());
    }

    #[test]
    fn test_invalid_requests() {
        let err = QueryRequest::parse(r#"{"filter": {}}"#).unwrap_err();
        assert_eq!(err.code(), ShapeErrorCode::InvalidDocument);

        let err = PickRequest::parse("not json").unwrap_err();
        assert_eq!(err.code(), ShapeErrorCode::InvalidDocument);
    }
}
