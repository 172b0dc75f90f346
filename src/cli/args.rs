//! CLI argument definitions using clap
//!
//! Commands:
//! - shapekit compile
//! - shapekit pick
//! - shapekit query --config <path>
//! - shapekit check --config <path>

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// shapekit - filter compiler and projection engine for JSON records
#[derive(Parser, Debug)]
#[command(name = "shapekit")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Compile a filter document read from stdin and print the predicate
    Compile {
        /// Maximum filter nesting depth
        #[arg(long, default_value_t = 32)]
        max_depth: usize,
    },

    /// Shape a {"document", "shape"} request read from stdin
    Pick,

    /// Answer a query request read from stdin against the configured dataset
    Query {
        /// Path to configuration file
        #[arg(long, default_value = "./shapekit.json")]
        config: PathBuf,
    },

    /// Load and validate the configuration, registry and dataset
    Check {
        /// Path to configuration file
        #[arg(long, default_value = "./shapekit.json")]
        config: PathBuf,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
