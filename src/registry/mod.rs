//! Relation descriptor registry
//!
//! Per entity type: which field names are relations, their cardinality and
//! target type, plus the declared scalar fields and default projection.
//!
//! The registry is constructed explicitly and immutably, then passed to the
//! engines. There is no global registration.

mod descriptor;
mod registry;

pub use descriptor::{Cardinality, EntityDescriptor, RelationDescriptor};
pub use registry::{RegistryBuilder, RelationRegistry};
