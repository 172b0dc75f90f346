//! Filter document AST
//!
//! A filter document is parsed once into a tree of tagged nodes. Key
//! classification (leaf operator, combinator, field) happens here and
//! nowhere else.

use serde_json::{Map, Value};

use crate::errors::{ShapeError, ShapeResult};

/// Leaf comparison operators as written in filter documents
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeafOperator {
    Eq,
    Neq,
    Gt,
    Gte,
    Lt,
    Lte,
    In,
    Nin,
    Contains,
    IContains,
    Regex,
}

impl LeafOperator {
    /// All leaf operators
    pub const ALL: [LeafOperator; 11] = [
        LeafOperator::Eq,
        LeafOperator::Neq,
        LeafOperator::Gt,
        LeafOperator::Gte,
        LeafOperator::Lt,
        LeafOperator::Lte,
        LeafOperator::In,
        LeafOperator::Nin,
        LeafOperator::Contains,
        LeafOperator::IContains,
        LeafOperator::Regex,
    ];

    /// Returns the reserved key for this operator
    pub fn key(&self) -> &'static str {
        match self {
            LeafOperator::Eq => "_eq",
            LeafOperator::Neq => "_neq",
            LeafOperator::Gt => "_gt",
            LeafOperator::Gte => "_gte",
            LeafOperator::Lt => "_lt",
            LeafOperator::Lte => "_lte",
            LeafOperator::In => "_in",
            LeafOperator::Nin => "_nin",
            LeafOperator::Contains => "_contains",
            LeafOperator::IContains => "_icontains",
            LeafOperator::Regex => "_regex",
        }
    }

    /// Checks that `value` is an acceptable operand for this operator
    fn check_operand(&self, value: &Value) -> ShapeResult<()> {
        match self {
            LeafOperator::Eq | LeafOperator::Neq => {
                if !is_scalar(value) && !value.is_null() {
                    return Err(ShapeError::type_mismatch(format!(
                        "'{}' expects a scalar, got {}",
                        self.key(),
                        json_type_name(value)
                    )));
                }
            }
            LeafOperator::Gt | LeafOperator::Gte | LeafOperator::Lt | LeafOperator::Lte => {
                if !is_scalar(value) {
                    return Err(ShapeError::type_mismatch(format!(
                        "'{}' expects a non-null scalar, got {}",
                        self.key(),
                        json_type_name(value)
                    )));
                }
            }
            LeafOperator::In | LeafOperator::Nin => {
                let items = value.as_array().ok_or_else(|| {
                    ShapeError::type_mismatch(format!(
                        "'{}' expects a list, got {}",
                        self.key(),
                        json_type_name(value)
                    ))
                })?;
                if let Some(bad) = items.iter().find(|v| !is_scalar(v) && !v.is_null()) {
                    return Err(ShapeError::type_mismatch(format!(
                        "'{}' list elements must be scalars, got {}",
                        self.key(),
                        json_type_name(bad)
                    )));
                }
            }
            LeafOperator::Contains | LeafOperator::IContains => {
                if !value.is_string() {
                    return Err(ShapeError::type_mismatch(format!(
                        "'{}' expects a string, got {}",
                        self.key(),
                        json_type_name(value)
                    )));
                }
            }
            LeafOperator::Regex => {
                let pattern = value.as_str().ok_or_else(|| {
                    ShapeError::type_mismatch(format!(
                        "'_regex' expects a string, got {}",
                        json_type_name(value)
                    ))
                })?;
                regex::Regex::new(pattern).map_err(|e| {
                    ShapeError::type_mismatch(format!("'_regex' pattern is invalid: {}", e))
                })?;
            }
        }
        Ok(())
    }
}

/// Logical combinators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Combinator {
    And,
    Or,
    Not,
}

impl Combinator {
    /// Returns the reserved key for this combinator
    pub fn key(&self) -> &'static str {
        match self {
            Combinator::And => "_and",
            Combinator::Or => "_or",
            Combinator::Not => "_not",
        }
    }
}

/// Classification of a reserved key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReservedKey {
    Leaf(LeafOperator),
    Combinator(Combinator),
}

impl ReservedKey {
    /// Classifies a mapping key.
    ///
    /// Returns `Ok(None)` for ordinary field names. Exact reserved names win
    /// over field names; any other `_`-prefixed key is rejected.
    pub fn classify(key: &str) -> ShapeResult<Option<Self>> {
        if let Some(op) = LeafOperator::ALL.iter().find(|op| op.key() == key) {
            return Ok(Some(ReservedKey::Leaf(*op)));
        }
        let combinator = match key {
            "_and" => Some(Combinator::And),
            "_or" => Some(Combinator::Or),
            "_not" => Some(Combinator::Not),
            _ => None,
        };
        if let Some(c) = combinator {
            return Ok(Some(ReservedKey::Combinator(c)));
        }
        if key.starts_with('_') {
            return Err(ShapeError::invalid_operator(key));
        }
        Ok(None)
    }
}

/// One entry of a filter mapping
#[derive(Debug, Clone, PartialEq)]
pub enum FilterNode {
    /// `_op: value` applied to the current path
    Leaf { op: LeafOperator, value: Value },
    /// `_and` / `_or` / `_not` over sibling expressions
    Combinator {
        op: Combinator,
        items: Vec<FilterExpr>,
    },
    /// `field: {...}` extending the current path
    Field { key: String, expr: FilterExpr },
}

/// A parsed filter document: one node per mapping key, in key order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterExpr {
    nodes: Vec<FilterNode>,
}

impl FilterExpr {
    /// The empty filter, which matches everything
    pub fn empty() -> Self {
        Self::default()
    }

    /// Parses a filter document without a depth cap
    pub fn parse(value: &Value) -> ShapeResult<Self> {
        Self::parse_with_limit(value, None)
    }

    /// Parses a filter document, rejecting mappings nested deeper than `max_depth`
    pub fn parse_with_limit(value: &Value, max_depth: Option<usize>) -> ShapeResult<Self> {
        let map = value.as_object().ok_or_else(|| {
            ShapeError::invalid_document(format!(
                "filter must be an object, got {}",
                json_type_name(value)
            ))
        })?;
        Self::parse_map(map, 1, max_depth)
    }

    fn parse_map(map: &Map<String, Value>, depth: usize, max_depth: Option<usize>) -> ShapeResult<Self> {
        if let Some(max) = max_depth {
            if depth > max {
                return Err(ShapeError::limit_exceeded("filter", depth, max));
            }
        }

        let mut nodes = Vec::with_capacity(map.len());
        for (key, value) in map {
            let node = match ReservedKey::classify(key)? {
                Some(ReservedKey::Leaf(op)) => {
                    op.check_operand(value)?;
                    FilterNode::Leaf {
                        op,
                        value: value.clone(),
                    }
                }
                Some(ReservedKey::Combinator(op)) => {
                    let list = value.as_array().ok_or_else(|| {
                        ShapeError::type_mismatch(format!(
                            "'{}' expects a list, got {}",
                            op.key(),
                            json_type_name(value)
                        ))
                    })?;
                    if list.is_empty() {
                        return Err(ShapeError::empty_combinator(op.key()));
                    }
                    let mut items = Vec::with_capacity(list.len());
                    for item in list {
                        let item_map = item.as_object().ok_or_else(|| {
                            ShapeError::type_mismatch(format!(
                                "'{}' elements must be objects, got {}",
                                op.key(),
                                json_type_name(item)
                            ))
                        })?;
                        items.push(Self::parse_map(item_map, depth + 1, max_depth)?);
                    }
                    FilterNode::Combinator { op, items }
                }
                None => {
                    let inner = value.as_object().ok_or_else(|| {
                        ShapeError::type_mismatch(format!(
                            "field '{}' expects an object of operators, got {}",
                            key,
                            json_type_name(value)
                        ))
                    })?;
                    FilterNode::Field {
                        key: key.clone(),
                        expr: Self::parse_map(inner, depth + 1, max_depth)?,
                    }
                }
            };
            nodes.push(node);
        }

        Ok(Self { nodes })
    }

    /// Nodes at this level
    pub fn nodes(&self) -> &[FilterNode] {
        &self.nodes
    }

    /// Returns true if the document has no keys
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Mapping nesting depth; a flat document has depth 1
    pub fn depth(&self) -> usize {
        let deepest = self
            .nodes
            .iter()
            .map(|node| match node {
                FilterNode::Leaf { .. } => 0,
                FilterNode::Field { expr, .. } => expr.depth(),
                FilterNode::Combinator { items, .. } => {
                    items.iter().map(FilterExpr::depth).max().unwrap_or(0)
                }
            })
            .max()
            .unwrap_or(0);
        1 + deepest
    }
}

fn is_scalar(value: &Value) -> bool {
    matches!(value, Value::Bool(_) | Value::Number(_) | Value::String(_))
}

/// JSON type name for error messages
pub(crate) fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "list",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ShapeErrorCode;
    use serde_json::json;

    #[test]
    fn test_classify_keys() {
        assert_eq!(
            ReservedKey::classify("_eq").unwrap(),
            Some(ReservedKey::Leaf(LeafOperator::Eq))
        );
        assert_eq!(
            ReservedKey::classify("_not").unwrap(),
            Some(ReservedKey::Combinator(Combinator::Not))
        );
        assert_eq!(ReservedKey::classify("name").unwrap(), None);

        let err = ReservedKey::classify("_like").unwrap_err();
        assert_eq!(err.code(), ShapeErrorCode::InvalidOperator);
    }

    #[test]
    fn test_parse_tags_nodes_once() {
        let expr = FilterExpr::parse(&json!({
            "age": {"_gte": 18},
            "_or": [{"name": {"_eq": "a"}}]
        }))
        .unwrap();

        assert_eq!(expr.nodes().len(), 2);
        assert!(matches!(
            expr.nodes()[0],
            FilterNode::Combinator {
                op: Combinator::Or,
                ..
            }
        ));
        match &expr.nodes()[1] {
            FilterNode::Field { key, expr } => {
                assert_eq!(key, "age");
                assert_eq!(
                    expr.nodes()[0],
                    FilterNode::Leaf {
                        op: LeafOperator::Gte,
                        value: json!(18)
                    }
                );
            }
            other => panic!("unexpected node {:?}", other),
        }
    }

    #[test]
    fn test_empty_combinator_rejected() {
        let err = FilterExpr::parse(&json!({"_and": []})).unwrap_err();
        assert_eq!(err.code(), ShapeErrorCode::EmptyCombinator);
    }

    #[test]
    fn test_operand_types_checked() {
        let cases = [
            json!({"a": {"_in": 5}}),
            json!({"a": {"_nin": [[1]]}}),
            json!({"a": {"_contains": 3}}),
            json!({"a": {"_icontains": null}}),
            json!({"a": {"_regex": "("}}),
            json!({"a": {"_gt": null}}),
            json!({"a": {"_eq": {"b": 1}}}),
            json!({"a": 5}),
            json!({"_or": [5]}),
            json!({"_not": {"a": {"_eq": 1}}}),
        ];
        for case in cases {
            let err = FilterExpr::parse(&case).unwrap_err();
            assert_eq!(err.code(), ShapeErrorCode::TypeMismatch, "{}", case);
        }
    }

    #[test]
    fn test_eq_null_allowed() {
        assert!(FilterExpr::parse(&json!({"a": {"_eq": null}})).is_ok());
        assert!(FilterExpr::parse(&json!({"a": {"_in": [1, null]}})).is_ok());
    }

    #[test]
    fn test_non_object_document_rejected() {
        let err = FilterExpr::parse(&json!([1, 2])).unwrap_err();
        assert_eq!(err.code(), ShapeErrorCode::InvalidDocument);
    }

    #[test]
    fn test_depth_limit() {
        let doc = json!({"a": {"b": {"c": {"_eq": 1}}}});
        assert!(FilterExpr::parse_with_limit(&doc, Some(4)).is_ok());

        let err = FilterExpr::parse_with_limit(&doc, Some(3)).unwrap_err();
        assert_eq!(err.code(), ShapeErrorCode::LimitExceeded);
    }

    #[test]
    fn test_depth_matches_parse_limit() {
        assert_eq!(FilterExpr::empty().depth(), 1);
        assert_eq!(FilterExpr::parse(&json!({"a": {"_eq": 1}})).unwrap().depth(), 2);

        let doc = json!({"_or": [{"a": {"b": {"_eq": 1}}}, {"c": {"_eq": 2}}]});
        let expr = FilterExpr::parse(&doc).unwrap();
        assert_eq!(expr.depth(), 4);
        assert!(FilterExpr::parse_with_limit(&doc, Some(4)).is_ok());
        assert!(FilterExpr::parse_with_limit(&doc, Some(3)).is_err());
    }
}
