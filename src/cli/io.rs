//! JSON I/O handling for CLI
//!
//! - Input: one JSON document on stdin
//! - Output: one JSON envelope line on stdout

use std::io::{self, Read, Write};

use serde_json::Value;

use super::errors::{CliError, CliResult};
use crate::api::Response;

/// Read all of stdin as text
pub fn read_input() -> CliResult<String> {
    let mut input = String::new();
    io::stdin().lock().read_to_string(&mut input)?;
    if input.trim().is_empty() {
        return Err(CliError::EmptyInput);
    }
    Ok(input)
}

/// Read a JSON document from stdin
pub fn read_document() -> CliResult<Value> {
    Ok(serde_json::from_str(&read_input()?)?)
}

/// Write a response envelope to stdout
pub fn write_response(response: &Response) -> CliResult<()> {
    let mut stdout = io::stdout();
    writeln!(stdout, "{}", response.to_json())?;
    stdout.flush()?;
    Ok(())
}
