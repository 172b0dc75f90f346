//! Record model shared by both engines

mod entity;
mod value;

pub use entity::{Entity, Relation};
pub use value::{EnumValue, FieldValue};
