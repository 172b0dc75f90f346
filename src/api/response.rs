//! Response envelope
//!
//! `{"status":"ok","data":...}` or
//! `{"status":"error","code":"SHAPE_...","message":"...","path":"..."}`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::ShapeError;

/// Success response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuccessResponse {
    pub status: String,
    pub data: Value,
}

impl SuccessResponse {
    pub fn new(data: Value) -> Self {
        Self {
            status: "ok".to_string(),
            data,
        }
    }
}

/// Error response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub status: String,
    pub code: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

impl ErrorResponse {
    /// Create from an engine error
    pub fn from_error(err: &ShapeError) -> Self {
        Self {
            status: "error".to_string(),
            code: err.code().code().to_string(),
            message: err.message().to_string(),
            path: err.path().map(str::to_string),
        }
    }
}

/// Unified response type
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Response {
    Success(SuccessResponse),
    Error(ErrorResponse),
}

impl Response {
    pub fn success(data: Value) -> Self {
        Response::Success(SuccessResponse::new(data))
    }

    pub fn error(err: &ShapeError) -> Self {
        Response::Error(ErrorResponse::from_error(err))
    }

    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).expect("Response serialization cannot fail")
    }

    /// Convert to JSON string
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).expect("Response serialization cannot fail")
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Response::Success(_))
    }
}

impl From<Result<Value, ShapeError>> for Response {
    fn from(result: Result<Value, ShapeError>) -> Self {
        match result {
            Ok(data) => Response::success(data),
            Err(e) => Response::error(&e),
        }
    }
}
