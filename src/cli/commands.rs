//! CLI command implementations

use std::path::Path;
use std::sync::Arc;

use serde_json::{json, Value};

use super::args::{Cli, Command};
use super::errors::CliResult;
use super::io::{read_document, read_input, write_response};
use crate::api::{handle_pick, PickRequest, QueryHandler, Response};
use crate::config::{EngineLimits, ShapeConfig};
use crate::errors::{ShapeError, ShapeResult};
use crate::filter::FilterCompiler;

/// Parse arguments and run the selected command
pub fn run() -> CliResult<()> {
    run_command(Cli::parse_args().command)
}

/// Run a command
pub fn run_command(cmd: Command) -> CliResult<()> {
    match cmd {
        Command::Compile { max_depth } => compile(max_depth),
        Command::Pick => pick(),
        Command::Query { config } => query(&config),
        Command::Check { config } => check(&config),
    }
}

/// Compile a filter document from stdin
pub fn compile(max_depth: usize) -> CliResult<()> {
    let filter = read_document()?;
    let limits = EngineLimits {
        max_filter_depth: max_depth,
        ..EngineLimits::default()
    };
    write_response(&Response::from(compile_document(&filter, &limits)))
}

/// Compiled predicate as `{"predicate": <tree>, "text": <infix>}`
pub fn compile_document(filter: &Value, limits: &EngineLimits) -> ShapeResult<Value> {
    let predicate = FilterCompiler::with_limits(limits).compile_value(filter)?;
    let tree = serde_json::to_value(&predicate)
        .map_err(|e| ShapeError::invalid_document(format!("Unrenderable predicate: {}", e)))?;
    Ok(json!({"predicate": tree, "text": predicate.to_string()}))
}

/// Shape a document from stdin
pub fn pick() -> CliResult<()> {
    let input = read_input()?;
    let result = PickRequest::parse(&input)
        .and_then(|request| handle_pick(&request, &EngineLimits::default()));
    write_response(&Response::from(result))
}

/// Answer one query from stdin
pub fn query(config_path: &Path) -> CliResult<()> {
    let handler = load_handler(config_path)?;
    let input = read_input()?;
    write_response(&handler.handle(&input))
}

/// Validate configuration, registry and dataset; print a summary
pub fn check(config_path: &Path) -> CliResult<()> {
    let handler = load_handler(config_path)?;
    let store = handler.store();

    let types: serde_json::Map<String, Value> = store
        .registry()
        .type_names()
        .map(|name| (name.to_string(), json!({"records": store.count(name)})))
        .collect();

    write_response(&Response::success(json!({"valid": true, "types": types})))
}

fn load_handler(config_path: &Path) -> CliResult<QueryHandler> {
    let config = ShapeConfig::load(config_path)?;
    config.apply_logging()?;

    let registry = Arc::new(config.load_registry()?);
    let store = config.load_store(registry)?;
    Ok(QueryHandler::new(store, config.limits()))
}
