//! Predicate evaluation against entities
//!
//! Resolves comparison paths through declared relations and applies the
//! operator to the value found. No type coercion: integers and floats compare
//! numerically, strings lexically, anything else mixed is a type mismatch.

use std::cmp::Ordering;
use std::collections::HashMap;

use regex::Regex;
use serde_json::Value;

use crate::errors::{ShapeError, ShapeResult};
use crate::filter::{json_type_name, CompareOp, Comparison, Predicate};
use crate::model::{Entity, Relation};
use crate::path::FieldPath;

/// Evaluates one predicate against entities.
///
/// Every `_regex` pattern in the predicate is compiled once, when the filter
/// is built, and reused for each entity and relation hop.
pub struct PredicateFilter<'p> {
    predicate: &'p Predicate,
    patterns: HashMap<&'p str, Regex>,
}

impl<'p> PredicateFilter<'p> {
    /// Prepares `predicate` for evaluation
    pub fn new(predicate: &'p Predicate) -> ShapeResult<Self> {
        let mut patterns = HashMap::new();
        collect_patterns(predicate, &mut patterns)?;
        Ok(Self {
            predicate,
            patterns,
        })
    }

    /// Checks if an entity satisfies the predicate
    pub fn matches<E: Entity>(&self, entity: &E) -> ShapeResult<bool> {
        self.matches_node(entity, self.predicate)
    }

    fn matches_node<E: Entity>(&self, entity: &E, predicate: &Predicate) -> ShapeResult<bool> {
        match predicate {
            Predicate::MatchAll => Ok(true),
            Predicate::Comparison(c) => self.matches_comparison(entity, c),
            Predicate::And { children } => {
                for child in children {
                    if !self.matches_node(entity, child)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            Predicate::Or { children } => {
                for child in children {
                    if self.matches_node(entity, child)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
            Predicate::Not { child } => Ok(!self.matches_node(entity, child)?),
        }
    }

    fn matches_comparison<E: Entity>(&self, entity: &E, comparison: &Comparison) -> ShapeResult<bool> {
        self.matches_at(entity, &comparison.path, comparison)
            .map_err(|e| e.at(comparison.path.lookup()))
    }

    fn apply(&self, comparison: &Comparison, actual: &Value) -> ShapeResult<bool> {
        let pattern = comparison
            .value
            .as_str()
            .and_then(|p| self.patterns.get(p));
        apply(comparison.op, actual, &comparison.value, pattern)
    }

    /// Walks `path` from `entity`. Any related entity on a to-many hop that
    /// satisfies the remainder satisfies the comparison.
    fn matches_at<E: Entity>(&self, entity: &E, path: &FieldPath, comparison: &Comparison) -> ShapeResult<bool> {
        let (head, rest) = path
            .split_first()
            .ok_or_else(|| ShapeError::unresolved_path("comparison has an empty path"))?;

        if rest.is_root() {
            if let Some(value) = entity.get_field(head) {
                return self.apply(comparison, &value.to_json());
            }
            // A relation compared directly is compared by primary key
            return match entity.get_relation(head) {
                Some(Relation::One(Some(related))) => {
                    self.apply(comparison, &related.primary_key().to_json())
                }
                Some(Relation::One(None)) => self.apply(comparison, &Value::Null),
                Some(Relation::Many(items)) => {
                    for related in items {
                        if self.apply(comparison, &related.primary_key().to_json())? {
                            return Ok(true);
                        }
                    }
                    Ok(false)
                }
                None => Err(ShapeError::unknown_field(entity.entity_type(), head)),
            };
        }

        match entity.get_relation(head) {
            Some(Relation::One(Some(related))) => self.matches_at(&related, &rest, comparison),
            Some(Relation::One(None)) => Ok(false),
            Some(Relation::Many(items)) => {
                for related in items {
                    if self.matches_at(&related, &rest, comparison)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
            None => {
                // Descend into an embedded JSON document
                let value = entity
                    .get_field(head)
                    .ok_or_else(|| ShapeError::unknown_field(entity.entity_type(), head))?
                    .to_json();
                let mut current = &value;
                for segment in rest.segments() {
                    current = match current.get(segment.as_str()) {
                        Some(v) => v,
                        None => return self.apply(comparison, &Value::Null),
                    };
                }
                self.apply(comparison, current)
            }
        }
    }
}

fn collect_patterns<'p>(predicate: &'p Predicate, patterns: &mut HashMap<&'p str, Regex>) -> ShapeResult<()> {
    match predicate {
        Predicate::MatchAll => Ok(()),
        Predicate::Comparison(c) if c.op == CompareOp::Regex => {
            let source = operand_str(&c.value, c.op).map_err(|e| e.at(c.path.lookup()))?;
            if !patterns.contains_key(source) {
                patterns.insert(source, compile_pattern(source).map_err(|e| e.at(c.path.lookup()))?);
            }
            Ok(())
        }
        Predicate::Comparison(_) => Ok(()),
        Predicate::And { children } | Predicate::Or { children } => children
            .iter()
            .try_for_each(|child| collect_patterns(child, patterns)),
        Predicate::Not { child } => collect_patterns(child, patterns),
    }
}

fn compile_pattern(source: &str) -> ShapeResult<Regex> {
    Regex::new(source)
        .map_err(|e| ShapeError::type_mismatch(format!("invalid regex pattern: {}", e)))
}

/// Applies one operator to a resolved field value
///
/// `pattern` is the compiled `operand` when `op` is `Regex`.
fn apply(op: CompareOp, actual: &Value, operand: &Value, pattern: Option<&Regex>) -> ShapeResult<bool> {
    match op {
        CompareOp::Eq => Ok(eq_match(actual, operand)),
        CompareOp::Gt => Ok(ordering(actual, operand, op)? == Some(Ordering::Greater)),
        CompareOp::Gte => Ok(matches!(
            ordering(actual, operand, op)?,
            Some(Ordering::Greater | Ordering::Equal)
        )),
        CompareOp::Lt => Ok(ordering(actual, operand, op)? == Some(Ordering::Less)),
        CompareOp::Lte => Ok(matches!(
            ordering(actual, operand, op)?,
            Some(Ordering::Less | Ordering::Equal)
        )),
        CompareOp::In => {
            let items = operand
                .as_array()
                .ok_or_else(|| ShapeError::type_mismatch("'in' operand must be a list"))?;
            Ok(items.iter().any(|item| eq_match(actual, item)))
        }
        CompareOp::Contains => match actual {
            Value::Null => Ok(false),
            Value::String(s) => Ok(s.contains(operand_str(operand, op)?)),
            Value::Array(items) => Ok(items.iter().any(|item| eq_match(item, operand))),
            other => Err(string_op_mismatch(op, other)),
        },
        CompareOp::IContains => match actual {
            Value::Null => Ok(false),
            Value::String(s) => Ok(s
                .to_lowercase()
                .contains(&operand_str(operand, op)?.to_lowercase())),
            other => Err(string_op_mismatch(op, other)),
        },
        CompareOp::Regex => match actual {
            Value::Null => Ok(false),
            Value::String(s) => match pattern {
                Some(re) => Ok(re.is_match(s)),
                None => Ok(compile_pattern(operand_str(operand, op)?)?.is_match(s)),
            },
            other => Err(string_op_mismatch(op, other)),
        },
    }
}

/// Exact equality; numbers compare by value across integer and float forms
fn eq_match(actual: &Value, expected: &Value) -> bool {
    match (actual, expected) {
        (Value::Number(a), Value::Number(b)) => {
            if let (Some(ai), Some(bi)) = (a.as_i64(), b.as_i64()) {
                return ai == bi;
            }
            if let (Some(au), Some(bu)) = (a.as_u64(), b.as_u64()) {
                return au == bu;
            }
            match (a.as_f64(), b.as_f64()) {
                (Some(af), Some(bf)) => af == bf,
                _ => false,
            }
        }
        _ => actual == expected,
    }
}

/// Ordering for range operators; `None` when the field is null
fn ordering(actual: &Value, bound: &Value, op: CompareOp) -> ShapeResult<Option<Ordering>> {
    match (actual, bound) {
        (Value::Null, _) => Ok(None),
        (Value::Number(a), Value::Number(b)) => {
            if let (Some(ai), Some(bi)) = (a.as_i64(), b.as_i64()) {
                return Ok(Some(ai.cmp(&bi)));
            }
            if let (Some(au), Some(bu)) = (a.as_u64(), b.as_u64()) {
                return Ok(Some(au.cmp(&bu)));
            }
            match (a.as_f64(), b.as_f64()) {
                (Some(af), Some(bf)) => Ok(af.partial_cmp(&bf)),
                _ => Ok(None),
            }
        }
        (Value::String(a), Value::String(b)) => Ok(Some(a.cmp(b))),
        (Value::Bool(a), Value::Bool(b)) => Ok(Some(a.cmp(b))),
        (a, b) => Err(ShapeError::type_mismatch(format!(
            "cannot apply '{}' to {} and {}",
            op.symbol(),
            json_type_name(a),
            json_type_name(b)
        ))),
    }
}

fn operand_str(operand: &Value, op: CompareOp) -> ShapeResult<&str> {
    operand.as_str().ok_or_else(|| {
        ShapeError::type_mismatch(format!(
            "'{}' operand must be a string, got {}",
            op.symbol(),
            json_type_name(operand)
        ))
    })
}

fn string_op_mismatch(op: CompareOp, actual: &Value) -> ShapeError {
    ShapeError::type_mismatch(format!(
        "'{}' requires a string field, got {}",
        op.symbol(),
        json_type_name(actual)
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ShapeErrorCode;
    use serde_json::json;

    fn check(op: CompareOp, actual: &Value, operand: &Value) -> ShapeResult<bool> {
        apply(op, actual, operand, None)
    }

    fn regex_on(path: &str, pattern: &str) -> Predicate {
        Predicate::compare(FieldPath::parse(path).unwrap(), CompareOp::Regex, json!(pattern))
    }

    #[test]
    fn test_equality_no_coercion() {
        assert!(eq_match(&json!(123), &json!(123)));
        assert!(!eq_match(&json!(123), &json!("123")));
        assert!(eq_match(&json!(2), &json!(2.0)));
        assert!(eq_match(&json!(null), &json!(null)));
    }

    #[test]
    fn test_range_operators() {
        assert!(check(CompareOp::Gte, &json!(25), &json!(18)).unwrap());
        assert!(check(CompareOp::Lte, &json!(25), &json!(25)).unwrap());
        assert!(!check(CompareOp::Gt, &json!(25), &json!(25)).unwrap());
        assert!(!check(CompareOp::Lt, &json!(25), &json!(25)).unwrap());
        assert!(check(CompareOp::Lt, &json!(1.5), &json!(2)).unwrap());
        assert!(check(CompareOp::Gt, &json!("b"), &json!("a")).unwrap());
    }

    #[test]
    fn test_null_never_orders() {
        assert!(!check(CompareOp::Gt, &Value::Null, &json!(1)).unwrap());
        assert!(!check(CompareOp::Lte, &Value::Null, &json!(1)).unwrap());
    }

    #[test]
    fn test_mixed_kinds_mismatch() {
        assert!(check(CompareOp::Gt, &json!("10"), &json!(5)).is_err());
        assert!(check(CompareOp::Contains, &json!(10), &json!("1")).is_err());
        assert!(check(CompareOp::Regex, &json!(true), &json!("t")).is_err());
    }

    #[test]
    fn test_membership_and_strings() {
        assert!(check(CompareOp::In, &json!("a"), &json!(["a", "b"])).unwrap());
        assert!(!check(CompareOp::In, &json!("c"), &json!(["a", "b"])).unwrap());
        assert!(check(CompareOp::Contains, &json!("Johnson"), &json!("son")).unwrap());
        assert!(check(CompareOp::Contains, &json!(["x", "y"]), &json!("y")).unwrap());
        assert!(check(CompareOp::IContains, &json!("Johnson"), &json!("JOHN")).unwrap());
        assert!(check(CompareOp::Regex, &json!("abc"), &json!("^a.c$")).unwrap());
        assert!(!check(CompareOp::Regex, &Value::Null, &json!("^a")).unwrap());
    }

    #[test]
    fn test_patterns_compiled_once_per_predicate() {
        let predicate = Predicate::or(vec![
            regex_on("name", "^A"),
            regex_on("nick", "^A"),
            Predicate::not(regex_on("name", "z$")),
        ]);
        let filter = PredicateFilter::new(&predicate).unwrap();
        assert_eq!(filter.patterns.len(), 2);
        assert!(filter.patterns.contains_key("^A"));
        assert!(filter.patterns.contains_key("z$"));
    }

    #[test]
    fn test_bad_pattern_rejected_before_evaluation() {
        let predicate = regex_on("name", "(unclosed");
        let err = PredicateFilter::new(&predicate).err().unwrap();
        assert_eq!(err.code(), ShapeErrorCode::TypeMismatch);
        assert_eq!(err.path(), Some("name"));
    }
}
