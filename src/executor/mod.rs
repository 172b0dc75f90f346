//! Predicate execution
//!
//! Compiled predicates are backend-neutral. This module evaluates them
//! against [`Entity`](crate::model::Entity) collections held in memory.
//!
//! # Semantics
//!
//! - Paths traverse relations; a to-many hop matches when any related entity does
//! - Equality is exact, with no coercion between strings and numbers
//! - Range operators never match a null field
//! - Output order equals input order

mod executor;
mod filters;

pub use executor::{InMemoryExecutor, PredicateExecutor};
pub use filters::PredicateFilter;
