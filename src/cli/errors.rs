//! CLI-specific error types
//!
//! Engine errors inside a request are reported in the response envelope.
//! A `CliError` means the command itself could not run.

use std::io;

use thiserror::Error;

use crate::config::ConfigError;
use crate::errors::ShapeError;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("invalid JSON input: {0}")]
    Json(#[from] serde_json::Error),

    #[error("empty input")]
    EmptyInput,

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Shape(#[from] ShapeError),
}

impl CliError {
    /// Error code string
    pub fn code(&self) -> &'static str {
        match self {
            CliError::Io(_) | CliError::Json(_) | CliError::EmptyInput => "SHAPE_CLI_IO_ERROR",
            CliError::Config(ConfigError::Shape(e)) | CliError::Shape(e) => e.code().code(),
            CliError::Config(_) => "SHAPE_CLI_CONFIG_ERROR",
        }
    }
}

/// CLI result type
pub type CliResult<T> = Result<T, CliError>;
