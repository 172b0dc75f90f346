//! Projection spec parsing
//!
//! A spec maps field names to what to emit for them. Each value is tagged
//! once here; the projector only matches on [`SpecNode`].

use serde_json::{Map, Value};

use crate::errors::{ShapeError, ShapeResult};
use crate::filter::{json_type_name, FilterExpr};

/// Reserved key attaching a filter to a to-many relation
pub const FILTER_KEY: &str = "__filter";

/// Prefix of meta keys, which are never projected
pub const META_PREFIX: &str = "__";

/// Relation shorthand: primary key only
pub const AS_ID: &str = "AS_ID";

/// Relation shorthand: display label only
pub const AS_LABEL: &str = "AS_LABEL";

/// What to emit for one field
#[derive(Debug, Clone, PartialEq)]
pub enum SpecNode {
    /// `true`
    Include,
    /// `false`
    Exclude,
    /// `"AS_ID"`
    AsId,
    /// `"AS_LABEL"`
    AsLabel,
    /// Nested spec
    Nested(ProjectionSpec),
}

impl SpecNode {
    fn parse(key: &str, value: &Value, depth: usize, max_depth: Option<usize>) -> ShapeResult<Self> {
        match value {
            Value::Bool(true) => Ok(SpecNode::Include),
            Value::Bool(false) => Ok(SpecNode::Exclude),
            Value::String(s) => match s.as_str() {
                AS_ID | "SERIALIZE_AS_PK" => Ok(SpecNode::AsId),
                AS_LABEL | "SERIALIZE_AS_STRING" => Ok(SpecNode::AsLabel),
                other => Err(ShapeError::ambiguous_structure(format!(
                    "'{}' has unknown shorthand '{}'; expected AS_ID or AS_LABEL",
                    key, other
                ))),
            },
            Value::Object(map) => Ok(SpecNode::Nested(ProjectionSpec::parse_map(
                map,
                depth + 1,
                max_depth,
            )?)),
            // `[{...}]` is accepted as a spelling of a nested spec for lists
            Value::Array(items) if items.len() == 1 && items[0].is_object() => {
                Self::parse(key, &items[0], depth, max_depth)
            }
            other => Err(ShapeError::invalid_document(format!(
                "'{}' must be true, false, AS_ID, AS_LABEL or an object, got {}",
                key,
                json_type_name(other)
            ))),
        }
    }

    fn to_json(&self) -> Value {
        match self {
            SpecNode::Include => Value::Bool(true),
            SpecNode::Exclude => Value::Bool(false),
            SpecNode::AsId => Value::String(AS_ID.to_string()),
            SpecNode::AsLabel => Value::String(AS_LABEL.to_string()),
            SpecNode::Nested(spec) => spec.to_json(),
        }
    }
}

/// Parsed projection spec
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProjectionSpec {
    fields: Vec<(String, SpecNode)>,
    filter: Option<FilterExpr>,
    /// Raw filter document, kept for rendering
    filter_source: Option<Value>,
}

impl ProjectionSpec {
    /// Empty spec
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a spec document without a depth cap
    pub fn parse(value: &Value) -> ShapeResult<Self> {
        Self::parse_with_limit(value, None)
    }

    /// Parses a spec document, rejecting nesting deeper than `max_depth`
    pub fn parse_with_limit(value: &Value, max_depth: Option<usize>) -> ShapeResult<Self> {
        let map = value.as_object().ok_or_else(|| {
            ShapeError::invalid_document(format!(
                "projection spec must be an object, got {}",
                json_type_name(value)
            ))
        })?;
        Self::parse_map(map, 1, max_depth)
    }

    fn parse_map(map: &Map<String, Value>, depth: usize, max_depth: Option<usize>) -> ShapeResult<Self> {
        if let Some(max) = max_depth {
            if depth > max {
                return Err(ShapeError::limit_exceeded("projection", depth, max));
            }
        }

        let mut spec = Self::new();
        for (key, value) in map {
            if key == FILTER_KEY {
                spec.filter = Some(FilterExpr::parse(value).map_err(|e| e.within(key))?);
                spec.filter_source = Some(value.clone());
                continue;
            }
            if key.starts_with(META_PREFIX) {
                continue;
            }
            let node = SpecNode::parse(key, value, depth, max_depth).map_err(|e| e.within(key))?;
            spec.fields.push((key.clone(), node));
        }
        Ok(spec)
    }

    /// Adds a field with `true`
    pub fn include(self, field: impl Into<String>) -> Self {
        self.with(field, SpecNode::Include)
    }

    /// Adds or replaces a field
    pub fn with(mut self, field: impl Into<String>, node: SpecNode) -> Self {
        let field = field.into();
        match self.fields.iter_mut().find(|(name, _)| *name == field) {
            Some(entry) => entry.1 = node,
            None => self.fields.push((field, node)),
        }
        self
    }

    /// Attaches a filter document
    pub fn with_filter(mut self, filter: &Value) -> ShapeResult<Self> {
        self.filter = Some(FilterExpr::parse(filter)?);
        self.filter_source = Some(filter.clone());
        Ok(self)
    }

    /// Fields in spec order
    pub fn fields(&self) -> impl Iterator<Item = (&str, &SpecNode)> {
        self.fields.iter().map(|(name, node)| (name.as_str(), node))
    }

    /// Node for a field, if present
    pub fn get(&self, field: &str) -> Option<&SpecNode> {
        self.fields
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, node)| node)
    }

    /// Attached filter, if any
    pub fn filter(&self) -> Option<&FilterExpr> {
        self.filter.as_ref()
    }

    /// Number of fields
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns true when no field is named
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Nesting depth; a flat spec has depth 1
    pub fn depth(&self) -> usize {
        1 + self
            .fields
            .iter()
            .filter_map(|(_, node)| match node {
                SpecNode::Nested(spec) => Some(spec.depth()),
                _ => None,
            })
            .max()
            .unwrap_or(0)
    }

    /// Renders back to a spec document
    pub fn to_json(&self) -> Value {
        let mut map = Map::new();
        for (name, node) in &self.fields {
            map.insert(name.clone(), node.to_json());
        }
        if let Some(ref source) = self.filter_source {
            map.insert(FILTER_KEY.to_string(), source.clone());
        }
        Value::Object(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ShapeErrorCode;
    use serde_json::json;

    #[test]
    fn test_parse_nodes() {
        let spec = ProjectionSpec::parse(&json!({
            "title": true,
            "secret": false,
            "author": "AS_ID",
            "publisher": "AS_LABEL",
            "reviews": {"score": true, "__filter": {"score": {"_gte": 4}}},
            "__comment": "ignored"
        }))
        .unwrap();

        assert_eq!(spec.len(), 5);
        assert_eq!(spec.get("title"), Some(&SpecNode::Include));
        assert_eq!(spec.get("secret"), Some(&SpecNode::Exclude));
        assert_eq!(spec.get("author"), Some(&SpecNode::AsId));
        assert_eq!(spec.get("publisher"), Some(&SpecNode::AsLabel));
        assert!(spec.get("__comment").is_none());
        assert!(spec.filter().is_none());

        match spec.get("reviews") {
            Some(SpecNode::Nested(inner)) => {
                assert!(inner.filter().is_some());
                assert_eq!(inner.len(), 1);
            }
            other => panic!("unexpected node {:?}", other),
        }
    }

    #[test]
    fn test_legacy_mode_names() {
        let spec = ProjectionSpec::parse(&json!({
            "a": "SERIALIZE_AS_PK",
            "b": "SERIALIZE_AS_STRING"
        }))
        .unwrap();
        assert_eq!(spec.get("a"), Some(&SpecNode::AsId));
        assert_eq!(spec.get("b"), Some(&SpecNode::AsLabel));
    }

    #[test]
    fn test_list_spelling_of_nested_spec() {
        let spec = ProjectionSpec::parse(&json!({"phones": [{"number": true}]})).unwrap();
        assert_eq!(
            spec.get("phones"),
            Some(&SpecNode::Nested(ProjectionSpec::new().include("number")))
        );
    }

    #[test]
    fn test_invalid_values() {
        let err = ProjectionSpec::parse(&json!({"a": "AS_NAME"})).unwrap_err();
        assert_eq!(err.code(), ShapeErrorCode::AmbiguousStructure);
        assert_eq!(err.path(), Some("a"));

        let err = ProjectionSpec::parse(&json!({"a": 1})).unwrap_err();
        assert_eq!(err.code(), ShapeErrorCode::InvalidDocument);

        let err = ProjectionSpec::parse(&json!("a")).unwrap_err();
        assert_eq!(err.code(), ShapeErrorCode::InvalidDocument);

        let err = ProjectionSpec::parse(&json!({"a": {"__filter": {"_and": []}}})).unwrap_err();
        assert_eq!(err.code(), ShapeErrorCode::EmptyCombinator);
    }

    #[test]
    fn test_depth() {
        let spec = ProjectionSpec::parse(&json!({
            "a": true,
            "b": {"c": {"d": true}},
            "e": {"f": true}
        }))
        .unwrap();
        assert_eq!(spec.depth(), 3);
        assert_eq!(ProjectionSpec::new().depth(), 1);

        let err = ProjectionSpec::parse_with_limit(&json!({"b": {"c": {"d": true}}}), Some(2))
            .unwrap_err();
        assert_eq!(err.code(), ShapeErrorCode::LimitExceeded);
    }

    #[test]
    fn test_builder_and_render() {
        let spec = ProjectionSpec::new()
            .include("name")
            .with("author", SpecNode::AsLabel)
            .with("name", SpecNode::Exclude);
        assert_eq!(spec.to_json(), json!({"name": false, "author": "AS_LABEL"}));
    }
}
