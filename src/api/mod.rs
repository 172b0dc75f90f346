//! Query pipeline
//!
//! Request and response envelopes plus the handler that wires the compiler,
//! executor and projector together.
//!
//! # Design Principles
//!
//! - One error per failed request, passed through unchanged
//! - No partial results
//! - Output order equals store order

mod handler;
mod request;
mod response;

pub use handler::{handle_pick, QueryHandler};
pub use request::{PickRequest, QueryRequest};
pub use response::{ErrorResponse, Response, SuccessResponse};
