//! CLI argument parsing for the trustgraph diagnostics binary

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Output format for listings
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text format (default)
    Text,
    /// JSON format for machine parsing
    Json,
}

#[derive(Parser, Debug)]
#[command(name = "trustgraph")]
#[command(version)]
#[command(about = "Inspect the attribute registry and edge probability catalog", long_about = None)]
pub struct Cli {
    /// Enable debug tracing to stderr
    #[arg(long = "debug", global = true)]
    pub debug: bool,

    /// Output format (text or json)
    #[arg(long = "format", value_enum, default_value = "text", global = true)]
    pub format: OutputFormat,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List every declared edge kind with its defaults and description
    Catalog {
        /// TOML file with edge default overrides
        #[arg(long = "overrides", value_name = "FILE")]
        overrides: Option<PathBuf>,
    },
    /// Intern the directory schema and print the popularity ranking
    Attributes {
        /// Additional attribute names to intern before ranking
        #[arg(value_name = "NAME")]
        names: Vec<String>,
    },
}
