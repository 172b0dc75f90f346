//! CLI module for shapekit
//!
//! Provides command-line access to:
//! - compile: filter document to predicate
//! - pick: shape a plain JSON document
//! - query: one-shot query against the configured dataset
//! - check: validate configuration, registry and dataset

mod args;
mod commands;
mod errors;
mod io;

pub use args::{Cli, Command};
pub use commands::{check, compile, compile_document, pick, query, run, run_command};
pub use errors::{CliError, CliResult};
pub use io::{read_document, read_input, write_response};
