//! Engine error types
//!
//! Error codes:
//! - SHAPE_INVALID_OPERATOR (COMPILE)
//! - SHAPE_EMPTY_COMBINATOR (COMPILE)
//! - SHAPE_TYPE_MISMATCH (COMPILE)
//! - SHAPE_UNKNOWN_FIELD (PROJECTION)
//! - SHAPE_AMBIGUOUS_STRUCTURE (PROJECTION)
//! - SHAPE_LIMIT_EXCEEDED (INPUT)
//! - SHAPE_INVALID_DOCUMENT (INPUT)
//!
//! Every failing compile or project call returns exactly one of these.
//! No partial predicate or partial document is ever produced.

use std::fmt;

use crate::path::JOIN_TOKEN;

/// Category an error code belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Filter document could not be compiled
    Compile,
    /// Entity could not be shaped by the projection spec
    Projection,
    /// Caller input is malformed or exceeds configured limits
    Input,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::Compile => write!(f, "COMPILE"),
            ErrorKind::Projection => write!(f, "PROJECTION"),
            ErrorKind::Input => write!(f, "INPUT"),
        }
    }
}

/// Engine error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShapeErrorCode {
    /// Unrecognized `_`-prefixed key
    InvalidOperator,
    /// Combinator list has zero elements
    EmptyCombinator,
    /// Operator applied to an incompatible value type
    TypeMismatch,
    /// Field or path not declared on the entity type
    UnknownField,
    /// Relation projected with `false`, or a shorthand where a shape is required
    AmbiguousStructure,
    /// Configured depth cap exceeded
    LimitExceeded,
    /// Input document is not of the expected JSON shape
    InvalidDocument,
}

impl ShapeErrorCode {
    /// Returns the string code
    pub fn code(&self) -> &'static str {
        match self {
            ShapeErrorCode::InvalidOperator => "SHAPE_INVALID_OPERATOR",
            ShapeErrorCode::EmptyCombinator => "SHAPE_EMPTY_COMBINATOR",
            ShapeErrorCode::TypeMismatch => "SHAPE_TYPE_MISMATCH",
            ShapeErrorCode::UnknownField => "SHAPE_UNKNOWN_FIELD",
            ShapeErrorCode::AmbiguousStructure => "SHAPE_AMBIGUOUS_STRUCTURE",
            ShapeErrorCode::LimitExceeded => "SHAPE_LIMIT_EXCEEDED",
            ShapeErrorCode::InvalidDocument => "SHAPE_INVALID_DOCUMENT",
        }
    }

    /// Returns the category for this code
    pub fn kind(&self) -> ErrorKind {
        match self {
            ShapeErrorCode::InvalidOperator
            | ShapeErrorCode::EmptyCombinator
            | ShapeErrorCode::TypeMismatch => ErrorKind::Compile,
            ShapeErrorCode::UnknownField | ShapeErrorCode::AmbiguousStructure => {
                ErrorKind::Projection
            }
            ShapeErrorCode::LimitExceeded | ShapeErrorCode::InvalidDocument => ErrorKind::Input,
        }
    }
}

impl fmt::Display for ShapeErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Engine error with full context
#[derive(Debug, Clone, PartialEq)]
pub struct ShapeError {
    code: ShapeErrorCode,
    message: String,
    /// Flattened lookup path of the offending node, if known
    path: Option<String>,
}

impl ShapeError {
    fn new(code: ShapeErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            path: None,
        }
    }

    /// Unrecognized reserved key
    pub fn invalid_operator(key: &str) -> Self {
        Self::new(
            ShapeErrorCode::InvalidOperator,
            format!("Unknown operator '{}'", key),
        )
    }

    /// Combinator with an empty list
    pub fn empty_combinator(key: &str) -> Self {
        Self::new(
            ShapeErrorCode::EmptyCombinator,
            format!("'{}' requires at least one element", key),
        )
    }

    /// Operator value or field value of the wrong type
    pub fn type_mismatch(reason: impl Into<String>) -> Self {
        Self::new(ShapeErrorCode::TypeMismatch, reason)
    }

    /// Field not declared on the entity type
    pub fn unknown_field(entity_type: &str, field: &str) -> Self {
        Self::new(
            ShapeErrorCode::UnknownField,
            format!("'{}' has no field '{}'", entity_type, field),
        )
    }

    /// Field reference that cannot be resolved, without an entity type
    pub fn unresolved_path(reason: impl Into<String>) -> Self {
        Self::new(ShapeErrorCode::UnknownField, reason)
    }

    /// Relation projected without a usable sub-spec
    pub fn ambiguous_structure(reason: impl Into<String>) -> Self {
        Self::new(ShapeErrorCode::AmbiguousStructure, reason)
    }

    /// Configured limit exceeded
    pub fn limit_exceeded(what: &str, depth: usize, max: usize) -> Self {
        Self::new(
            ShapeErrorCode::LimitExceeded,
            format!("{} depth {} exceeds maximum {}", what, depth, max),
        )
    }

    /// Malformed input document
    pub fn invalid_document(reason: impl Into<String>) -> Self {
        Self::new(ShapeErrorCode::InvalidDocument, reason)
    }

    /// Attaches the path the error occurred at, keeping an existing one
    pub fn at(mut self, path: impl Into<String>) -> Self {
        if self.path.is_none() {
            let path = path.into();
            if !path.is_empty() {
                self.path = Some(path);
            }
        }
        self
    }

    /// Prefixes the path with an enclosing field name
    pub fn within(mut self, field: &str) -> Self {
        self.path = Some(match self.path.take() {
            Some(inner) => format!("{}{}{}", field, JOIN_TOKEN, inner),
            None => field.to_string(),
        });
        self
    }

    /// Returns the error code
    pub fn code(&self) -> ShapeErrorCode {
        self.code
    }

    /// Returns the error category
    pub fn kind(&self) -> ErrorKind {
        self.code.kind()
    }

    /// Returns the error message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the path if known
    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }
}

impl fmt::Display for ShapeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.kind(), self.code.code(), self.message)?;
        if let Some(ref path) = self.path {
            write!(f, " (at {})", path)?;
        }
        Ok(())
    }
}

impl std::error::Error for ShapeError {}

/// Result type for engine operations
pub type ShapeResult<T> = Result<T, ShapeError>;
