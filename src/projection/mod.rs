//! Structured projection
//!
//! A [`ProjectionSpec`] says which fields of an entity to emit and how to
//! render its relations:
//!
//! - `true` includes a field; on a relation it expands the target's default spec
//! - `false` omits a scalar field; it is rejected on relations
//! - `"AS_ID"` / `"AS_LABEL"` render a relation as its key or label
//! - a nested object recurses; on a to-many relation it may carry `__filter`
//!
//! Output is JSON-safe. The same vocabulary shapes plain documents via [`pick`].

mod pick;
mod projector;
mod spec;

pub use pick::pick;
pub use projector::{DefaultResolver, Projector};
pub use spec::{ProjectionSpec, SpecNode, AS_ID, AS_LABEL, FILTER_KEY, META_PREFIX};
