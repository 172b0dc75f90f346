//! Field path resolution
//!
//! A path is the sequence of field names leading from an entity to a value.
//! Paths are flattened with `__`, so `{"a": {"b": ...}}` and `{"a__b": ...}`
//! resolve to the same lookup.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::{ShapeError, ShapeResult};

/// Token joining path segments in flattened lookups
pub const JOIN_TOKEN: &str = "__";

/// A resolved field path
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct FieldPath {
    segments: Vec<String>,
}

impl FieldPath {
    /// The empty path
    pub fn root() -> Self {
        Self::default()
    }

    /// Parses a flattened lookup such as `author__name`
    pub fn parse(lookup: &str) -> ShapeResult<Self> {
        Self::root().join(lookup)
    }

    /// Extends the path by one key.
    ///
    /// A key that itself contains the join token contributes every segment.
    pub fn join(&self, key: &str) -> ShapeResult<Self> {
        let mut segments = self.segments.clone();
        for segment in key.split(JOIN_TOKEN) {
            if segment.is_empty() {
                return Err(ShapeError::unresolved_path(format!(
                    "'{}' contains an empty path segment",
                    key
                ))
                .at(self.lookup()));
            }
            segments.push(segment.to_string());
        }
        Ok(Self { segments })
    }

    /// Path segments in order
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Returns true for the empty path
    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Number of segments
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// First segment and the remaining path
    pub fn split_first(&self) -> Option<(&str, FieldPath)> {
        self.segments.split_first().map(|(head, tail)| {
            (
                head.as_str(),
                FieldPath {
                    segments: tail.to_vec(),
                },
            )
        })
    }

    /// Flattened lookup form, e.g. `a__b`
    pub fn lookup(&self) -> String {
        self.segments.join(JOIN_TOKEN)
    }

    /// Dotted form for messages, e.g. `a.b`
    pub fn dotted(&self) -> String {
        self.segments.join(".")
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.lookup())
    }
}

impl From<FieldPath> for String {
    fn from(path: FieldPath) -> Self {
        path.lookup()
    }
}

impl TryFrom<String> for FieldPath {
    type Error = ShapeError;

    fn try_from(lookup: String) -> ShapeResult<Self> {
        if lookup.is_empty() {
            return Ok(Self::root());
        }
        Self::parse(&lookup)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nested_and_flattened_are_identical() {
        let nested = FieldPath::root().join("a").unwrap().join("b").unwrap();
        let flat = FieldPath::root().join("a__b").unwrap();
        assert_eq!(nested, flat);
        assert_eq!(nested.lookup(), "a__b");
        assert_eq!(nested.dotted(), "a.b");
    }

    #[test]
    fn test_root_path() {
        let root = FieldPath::root();
        assert!(root.is_root());
        assert_eq!(root.lookup(), "");
        assert!(root.split_first().is_none());
    }

    #[test]
    fn test_split_first() {
        let path = FieldPath::parse("author__address__city").unwrap();
        let (head, rest) = path.split_first().unwrap();
        assert_eq!(head, "author");
        assert_eq!(rest.lookup(), "address__city");
        assert_eq!(path.len(), 3);
    }

    #[test]
    fn test_empty_segment_rejected() {
        assert!(FieldPath::parse("a____b").is_err());
        assert!(FieldPath::parse("__a").is_err());
        assert!(FieldPath::parse("").is_err());
    }

    #[test]
    fn test_serde_as_lookup_string() {
        let path = FieldPath::parse("a__b").unwrap();
        let json = serde_json::to_value(&path).unwrap();
        assert_eq!(json, serde_json::json!("a__b"));
        let back: FieldPath = serde_json::from_value(json).unwrap();
        assert_eq!(back, path);
    }
}
