//! In-memory backing store
//!
//! Supplies [`Entity`](crate::model::Entity) handles to the executor and
//! projector for tests, the CLI and embedded use.

mod memory;
mod record;

pub use memory::{MemoryStore, RecordRef};
pub use record::{Link, Record};
