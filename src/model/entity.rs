//! Entity capability consumed by the engines
//!
//! Entities are owned by the backing store. The engines only read them.

use super::value::FieldValue;

/// Related entities returned for a relation field
#[derive(Debug, Clone, PartialEq)]
pub enum Relation<E> {
    /// To-one; `None` for a null relation
    One(Option<E>),
    /// To-many, in the collection's natural order
    Many(Vec<E>),
}

impl<E> Relation<E> {
    /// Number of related entities
    pub fn len(&self) -> usize {
        match self {
            Relation::One(Some(_)) => 1,
            Relation::One(None) => 0,
            Relation::Many(items) => items.len(),
        }
    }

    /// Returns true when no entity is related
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A persisted record as seen by the filter executor and projector
///
/// Implementations are usually cheap handles into a store; related entities
/// are returned by value.
pub trait Entity: Sized {
    /// Name of the entity type, as registered in the relation registry
    fn entity_type(&self) -> &str;

    /// Primary key value
    fn primary_key(&self) -> FieldValue;

    /// Display label
    fn label(&self) -> String;

    /// Reads a scalar field; `None` if the type has no such field
    fn get_field(&self, name: &str) -> Option<FieldValue>;

    /// Resolves a relation field; `None` if `name` is not a relation
    fn get_relation(&self, name: &str) -> Option<Relation<Self>>;
}
