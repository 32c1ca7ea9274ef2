//! Command-line arguments for duckpad
//!
//! This module defines the CLI arguments structure using clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use super::defaults::*;
use crate::cli_format::{parse_table_source, OutputFormat};

/// Command-line arguments for duckpad
#[derive(Parser, Debug, Clone)]
#[command(name = "duckpad")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Load CSV, Parquet and JSON into an embedded DuckDB and query it")]
#[command(long_about = r#"Load CSV, Parquet and JSON into an embedded DuckDB and query it

QUICK START:
    # Open the interactive shell (default when no command is given)
    duckpad

    # Load a file and query it in one go
    duckpad query --load sales=./sales.parquet "SELECT COUNT(*) FROM sales"

    # Persist tables across invocations
    duckpad --database ./pad.duckdb ingest people ./people.csv
    duckpad --database ./pad.duckdb tables

    # Install and load an extension
    duckpad extension spatial

ENVIRONMENT VARIABLES:
    DUCKPAD_CONFIG          Configuration file
    DUCKPAD_DATABASE        Database file (default: in-memory)
    DUCKPAD_FORMAT          Output format
    NO_COLOR                Disable colored output
    RUST_LOG                Log filter (overrides --log-level)"#)]
pub struct CliArgs {
    /// Path to configuration file (TOML format)
    /// If not specified, looks for duckpad.toml in the current directory,
    /// then in the user config directory (e.g. ~/.config/duckpad/)
    #[arg(short, long, global = true, env = "DUCKPAD_CONFIG")]
    pub config: Option<PathBuf>,

    /// Generate example configuration file and exit
    #[arg(long)]
    pub generate_config: bool,

    /// Database file; omit for an in-memory database
    #[arg(long, global = true, env = "DUCKPAD_DATABASE")]
    pub database: Option<PathBuf>,

    /// Directory uploaded files are staged into before DuckDB reads them
    #[arg(long, global = true, env = "DUCKPAD_SCRATCH_DIR")]
    pub scratch_dir: Option<PathBuf>,

    /// Core extension repository
    #[arg(long, global = true, env = "DUCKPAD_CORE_REPOSITORY", default_value = DEFAULT_CORE_REPOSITORY)]
    pub core_repository: String,

    /// Community extension repository
    #[arg(long, global = true, env = "DUCKPAD_COMMUNITY_REPOSITORY", default_value = DEFAULT_COMMUNITY_REPOSITORY)]
    pub community_repository: String,

    /// Extension loaded before reading http(s) sources
    #[arg(long, global = true, env = "DUCKPAD_NETWORK_EXTENSION", default_value = DEFAULT_NETWORK_EXTENSION)]
    pub network_extension: String,

    /// Output format
    #[arg(long, global = true, value_enum, env = "DUCKPAD_FORMAT", default_value = DEFAULT_FORMAT)]
    pub format: OutputFormat,

    /// Maximum rows printed in text mode
    #[arg(long, global = true, env = "DUCKPAD_MAX_ROWS", default_value_t = DEFAULT_MAX_ROWS)]
    pub max_rows: usize,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, env = "DUCKPAD_LOG_LEVEL", default_value = DEFAULT_LOG_LEVEL)]
    pub log_level: String,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// duckpad subcommands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Create a table from a local file or an http(s) URL
    #[command(long_about = r#"Create a table from a local file or an http(s) URL

The reader is chosen from the file extension: .csv, .parquet or .json.
Remote sources are read by DuckDB directly through the httpfs extension.

EXAMPLES:
    duckpad ingest sales ./sales.parquet
    duckpad ingest trips https://example.com/trips.csv?version=2
    duckpad ingest places ./places.json --extension spatial"#)]
    Ingest {
        /// Table name
        table: String,

        /// File path or http(s) URL
        source: String,

        /// Extension to install/load before reading
        #[arg(short, long)]
        extension: Option<String>,
    },

    /// Run a SQL query
    Query {
        /// SQL text
        sql: String,

        /// Load sources first, as table=path_or_url (can be repeated)
        #[arg(short, long = "load", value_parser = parse_table_source)]
        loads: Vec<(String, String)>,
    },

    /// List tables in the database
    Tables,

    /// Install and load an extension
    Extension {
        /// Extension name (e.g. httpfs, spatial, h3)
        name: String,
    },

    /// Start the interactive shell
    Shell,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let args = CliArgs::try_parse_from(["duckpad"]).unwrap();
        assert_eq!(args.core_repository, DEFAULT_CORE_REPOSITORY);
        assert_eq!(args.network_extension, "httpfs");
        assert_eq!(args.format, OutputFormat::Text);
        assert!(args.command.is_none());
    }

    #[test]
    fn test_query_with_loads() {
        let args = CliArgs::try_parse_from([
            "duckpad",
            "query",
            "--load",
            "sales=./sales.parquet",
            "-l",
            "people=people.csv",
            "SELECT 1",
        ])
        .unwrap();
        match args.command {
            Some(Commands::Query { sql, loads }) => {
                assert_eq!(sql, "SELECT 1");
                assert_eq!(loads.len(), 2);
                assert_eq!(loads[0].0, "sales");
            }
            other => panic!("Expected Query, got {:?}", other),
        }
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let args =
            CliArgs::try_parse_from(["duckpad", "tables", "--format", "json"]).unwrap();
        assert_eq!(args.format, OutputFormat::Json);
        assert_eq!(args.command, Some(Commands::Tables));
    }
}
