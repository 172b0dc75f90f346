//! Filter predicate compiler
//!
//! Walks a parsed [`FilterExpr`] and produces a [`Predicate`]. Pure and
//! deterministic: no I/O, no hidden state, the same document always yields a
//! structurally equal tree.
//!
//! # Rules
//!
//! - Empty mapping compiles to match-all
//! - Leaf operators compare against the current path
//! - Field keys extend the path (flattened with `__`) and recurse
//! - `_and` / `_or` / `_not` compile their elements at the current path
//! - Everything found at one level is AND-ed together

use serde_json::Value;

use super::ast::{Combinator, FilterExpr, FilterNode, LeafOperator};
use super::predicate::{CompareOp, Predicate};
use crate::config::EngineLimits;
use crate::errors::{ShapeError, ShapeResult};
use crate::observability::{log_event, Event};
use crate::path::FieldPath;

/// Compiles filter documents into predicates
#[derive(Debug, Clone, Default)]
pub struct FilterCompiler {
    max_depth: Option<usize>,
}

impl FilterCompiler {
    /// Compiler without a nesting cap
    pub fn new() -> Self {
        Self::default()
    }

    /// Compiler enforcing the configured filter depth
    pub fn with_limits(limits: &EngineLimits) -> Self {
        Self {
            max_depth: Some(limits.max_filter_depth),
        }
    }

    /// Parses and compiles a raw JSON filter document at the root path
    pub fn compile_value(&self, value: &Value) -> ShapeResult<Predicate> {
        let expr = FilterExpr::parse_with_limit(value, self.max_depth)?;
        self.compile(&expr, &FieldPath::root())
    }

    /// Compiles a parsed document relative to `path`.
    ///
    /// The depth cap applies here too, so documents parsed elsewhere (such as
    /// a `__filter` inside a projection spec) are held to the same limit.
    pub fn compile(&self, expr: &FilterExpr, path: &FieldPath) -> ShapeResult<Predicate> {
        if let Some(max) = self.max_depth {
            let depth = expr.depth();
            if depth > max {
                return Err(ShapeError::limit_exceeded("filter", depth, max));
            }
        }
        let predicate = compile_at(expr, path)?;
        log_event(
            Event::FilterCompiled,
            &[
                ("nodes", predicate.node_count().to_string().as_str()),
                ("path", path.lookup().as_str()),
            ],
        );
        Ok(predicate)
    }
}

fn compile_at(expr: &FilterExpr, path: &FieldPath) -> ShapeResult<Predicate> {
    let mut parts = Vec::with_capacity(expr.nodes().len());

    for node in expr.nodes() {
        let part = match node {
            FilterNode::Leaf { op, value } => compile_leaf(*op, value, path)?,
            FilterNode::Field { key, expr } => {
                let child = path.join(key)?;
                compile_at(expr, &child)?
            }
            FilterNode::Combinator { op, items } => {
                let mut children = Vec::with_capacity(items.len());
                for item in items {
                    children.push(compile_at(item, path)?);
                }
                match op {
                    Combinator::And => Predicate::and(children),
                    Combinator::Or => Predicate::or(children),
                    Combinator::Not => Predicate::not(Predicate::and(children)),
                }
            }
        };
        parts.push(part);
    }

    Ok(Predicate::and(parts))
}

fn compile_leaf(op: LeafOperator, value: &Value, path: &FieldPath) -> ShapeResult<Predicate> {
    if path.is_root() {
        return Err(ShapeError::unresolved_path(format!(
            "'{}' must be applied to a field",
            op.key()
        )));
    }

    let (compare, negate) = match op {
        LeafOperator::Eq => (CompareOp::Eq, false),
        LeafOperator::Neq => (CompareOp::Eq, true),
        LeafOperator::Gt => (CompareOp::Gt, false),
        LeafOperator::Gte => (CompareOp::Gte, false),
        LeafOperator::Lt => (CompareOp::Lt, false),
        LeafOperator::Lte => (CompareOp::Lte, false),
        LeafOperator::In => (CompareOp::In, false),
        LeafOperator::Nin => (CompareOp::In, true),
        LeafOperator::Contains => (CompareOp::Contains, false),
        LeafOperator::IContains => (CompareOp::IContains, false),
        LeafOperator::Regex => (CompareOp::Regex, false),
    };

    let comparison = Predicate::compare(path.clone(), compare, value.clone());
    Ok(if negate {
        Predicate::not(comparison)
    } else {
        comparison
    })
}
