//! Filter predicate compiler
//!
//! Turns nested JSON filter documents into backend-agnostic predicates.
//!
//! ```ignore
//! use shapekit::filter::FilterCompiler;
//!
//! let predicate = FilterCompiler::new()
//!     .compile_value(&json!({"author": {"name": {"_icontains": "le guin"}}}))?;
//! assert_eq!(predicate.to_string(), "author__name ICONTAINS \"le guin\"");
//! ```
//!
//! # Limitation
//!
//! Reserved names take precedence over field names: a field literally named
//! `_eq` cannot be filtered on.

mod ast;
mod compiler;
mod predicate;

pub use ast::{Combinator, FilterExpr, FilterNode, LeafOperator, ReservedKey};
pub(crate) use ast::json_type_name;
pub use compiler::FilterCompiler;
pub use predicate::{CompareOp, Comparison, Predicate};
