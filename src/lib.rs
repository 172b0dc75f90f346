//! shapekit - filter predicate compiler and structured projection engine
//!
//! Two engines share one relation registry:
//! - `filter`: nested JSON filter documents to backend-agnostic predicates
//! - `projection`: entities to JSON-compatible trees shaped by a spec
//!
//! The `store`, `executor` and `api` modules wire both engines to an
//! in-memory record set for the `shapekit` CLI.

pub mod api;
pub mod cli;
pub mod config;
pub mod errors;
pub mod executor;
pub mod filter;
pub mod model;
pub mod observability;
pub mod path;
pub mod projection;
pub mod registry;
pub mod store;
