//! Shaping plain JSON documents
//!
//! Uses the projection vocabulary on documents that have no entity type:
//! `true` copies, `false` omits, nested specs recurse into objects and map
//! over arrays. A scalar met by a nested spec is copied as is.

use serde_json::{Map, Value};

use super::spec::{ProjectionSpec, SpecNode};
use crate::errors::{ShapeError, ShapeResult};

/// Shapes `document` by `spec`
pub fn pick(document: &Value, spec: &ProjectionSpec) -> ShapeResult<Value> {
    match document {
        Value::Object(map) => pick_object(map, spec),
        Value::Array(items) => items
            .iter()
            .map(|item| pick(item, spec))
            .collect::<ShapeResult<Vec<_>>>()
            .map(Value::Array),
        other => Ok(other.clone()),
    }
}

fn pick_object(map: &Map<String, Value>, spec: &ProjectionSpec) -> ShapeResult<Value> {
    let mut out = Map::new();
    for (key, node) in spec.fields() {
        let value = map.get(key).ok_or_else(|| {
            ShapeError::unresolved_path(format!("document has no key '{}'", key)).at(key)
        })?;
        match node {
            SpecNode::Exclude => continue,
            SpecNode::Include => {
                out.insert(key.to_string(), value.clone());
            }
            SpecNode::Nested(inner) => {
                out.insert(key.to_string(), pick(value, inner).map_err(|e| e.within(key))?);
            }
            SpecNode::AsId | SpecNode::AsLabel => {
                return Err(ShapeError::ambiguous_structure(format!(
                    "'{}' is a plain value; AS_ID and AS_LABEL apply to relations",
                    key
                ))
                .at(key));
            }
        }
    }
    Ok(Value::Object(out))
}
