//! Compiled predicate tree
//!
//! Backend-agnostic boolean expression produced by the compiler. Every
//! comparison carries a fully resolved, non-empty path.

use std::fmt;

use serde::Serialize;
use serde_json::Value;

use crate::path::FieldPath;

/// Comparison operators after compilation
///
/// Negated leaf operators (`_neq`, `_nin`) compile to `Not` around the
/// positive form, so they have no variant here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CompareOp {
    Eq,
    Gt,
    Gte,
    Lt,
    Lte,
    In,
    Contains,
    #[serde(rename = "icontains")]
    IContains,
    Regex,
}

impl CompareOp {
    /// Infix symbol used when rendering
    pub fn symbol(&self) -> &'static str {
        match self {
            CompareOp::Eq => "==",
            CompareOp::Gt => ">",
            CompareOp::Gte => ">=",
            CompareOp::Lt => "<",
            CompareOp::Lte => "<=",
            CompareOp::In => "IN",
            CompareOp::Contains => "CONTAINS",
            CompareOp::IContains => "ICONTAINS",
            CompareOp::Regex => "~",
        }
    }
}

/// A single `path op value` test
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Comparison {
    pub path: FieldPath,
    pub op: CompareOp,
    pub value: Value,
}

/// Boolean expression tree
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Predicate {
    /// Trivially true
    MatchAll,
    Comparison(Comparison),
    And { children: Vec<Predicate> },
    Or { children: Vec<Predicate> },
    Not { child: Box<Predicate> },
}

impl Predicate {
    /// Builds a comparison
    pub fn compare(path: FieldPath, op: CompareOp, value: Value) -> Self {
        Predicate::Comparison(Comparison { path, op, value })
    }

    /// Conjunction.
    ///
    /// Nested conjunctions are flattened and match-all children dropped. An
    /// empty list is match-all; a single child is returned as is.
    pub fn and(children: Vec<Predicate>) -> Self {
        let mut flat = Vec::with_capacity(children.len());
        for child in children {
            match child {
                Predicate::MatchAll => {}
                Predicate::And { children } => flat.extend(children),
                other => flat.push(other),
            }
        }
        match flat.len() {
            0 => Predicate::MatchAll,
            1 => flat.remove(0),
            _ => Predicate::And { children: flat },
        }
    }

    /// Disjunction.
    ///
    /// Nested disjunctions are flattened; a match-all child makes the whole
    /// disjunction match-all. A single child is returned as is.
    pub fn or(children: Vec<Predicate>) -> Self {
        let mut flat = Vec::with_capacity(children.len());
        for child in children {
            match child {
                Predicate::MatchAll => return Predicate::MatchAll,
                Predicate::Or { children } => flat.extend(children),
                other => flat.push(other),
            }
        }
        match flat.len() {
            0 => Predicate::MatchAll,
            1 => flat.remove(0),
            _ => Predicate::Or { children: flat },
        }
    }

    /// Negation
    pub fn not(child: Predicate) -> Self {
        Predicate::Not {
            child: Box::new(child),
        }
    }

    /// Returns true for the trivially true predicate
    pub fn is_match_all(&self) -> bool {
        matches!(self, Predicate::MatchAll)
    }

    /// Every comparison path, depth first
    pub fn paths(&self) -> Vec<&FieldPath> {
        let mut out = Vec::new();
        self.collect_paths(&mut out);
        out
    }

    fn collect_paths<'a>(&'a self, out: &mut Vec<&'a FieldPath>) {
        match self {
            Predicate::MatchAll => {}
            Predicate::Comparison(c) => out.push(&c.path),
            Predicate::And { children } | Predicate::Or { children } => {
                for child in children {
                    child.collect_paths(out);
                }
            }
            Predicate::Not { child } => child.collect_paths(out),
        }
    }

    /// Number of nodes in the tree
    pub fn node_count(&self) -> usize {
        match self {
            Predicate::MatchAll | Predicate::Comparison(_) => 1,
            Predicate::And { children } | Predicate::Or { children } => {
                1 + children.iter().map(Predicate::node_count).sum::<usize>()
            }
            Predicate::Not { child } => 1 + child.node_count(),
        }
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Predicate::MatchAll => write!(f, "TRUE"),
            Predicate::Comparison(c) => {
                write!(f, "{} {} {}", c.path.lookup(), c.op.symbol(), c.value)
            }
            Predicate::And { children } => write_joined(f, children, " AND "),
            Predicate::Or { children } => write_joined(f, children, " OR "),
            Predicate::Not { child } => write!(f, "NOT ({})", child),
        }
    }
}

fn write_joined(f: &mut fmt::Formatter<'_>, children: &[Predicate], sep: &str) -> fmt::Result {
    for (i, child) in children.iter().enumerate() {
        if i > 0 {
            write!(f, "{}", sep)?;
        }
        match child {
            Predicate::And { .. } | Predicate::Or { .. } => write!(f, "({})", child)?,
            _ => write!(f, "{}", child)?,
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn cmp(path: &str, value: Value) -> Predicate {
        Predicate::compare(FieldPath::parse(path).unwrap(), CompareOp::Eq, value)
    }

    #[test]
    fn test_and_flattens_and_collapses() {
        let nested = Predicate::and(vec![
            Predicate::and(vec![cmp("a", json!(1)), cmp("b", json!(2))]),
            cmp("c", json!(3)),
        ]);
        let flat = Predicate::and(vec![cmp("a", json!(1)), cmp("b", json!(2)), cmp("c", json!(3))]);
        assert_eq!(nested, flat);

        assert_eq!(Predicate::and(vec![cmp("a", json!(1))]), cmp("a", json!(1)));
        assert_eq!(Predicate::and(vec![]), Predicate::MatchAll);
        assert_eq!(
            Predicate::and(vec![Predicate::MatchAll, cmp("a", json!(1))]),
            cmp("a", json!(1))
        );
    }

    #[test]
    fn test_or_absorbs_match_all() {
        let p = Predicate::or(vec![cmp("a", json!(1)), Predicate::MatchAll]);
        assert!(p.is_match_all());
    }

    #[test]
    fn test_display() {
        let p = Predicate::not(Predicate::and(vec![
            cmp("a__b", json!(7)),
            Predicate::or(vec![cmp("c", json!(1)), cmp("c", json!(2))]),
        ]));
        assert_eq!(p.to_string(), "NOT (a__b == 7 AND (c == 1 OR c == 2))");
    }

    #[test]
    fn test_serialize() {
        let p = Predicate::not(cmp("a__b", json!(5)));
        let json = serde_json::to_value(&p).unwrap();
        assert_eq!(
            json,
            json!({
                "type": "not",
                "child": {"type": "comparison", "path": "a__b", "op": "eq", "value": 5}
            })
        );
    }

    #[test]
    fn test_paths_and_node_count() {
        let p = Predicate::and(vec![cmp("a", json!(1)), Predicate::not(cmp("b__c", json!(2)))]);
        let paths: Vec<String> = p.paths().iter().map(|p| p.lookup()).collect();
        assert_eq!(paths, vec!["a", "b__c"]);
        assert_eq!(p.node_count(), 4);
    }
}
