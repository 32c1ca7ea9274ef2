//! duckpad - a terminal workbench for an embedded DuckDB
//!
//! Load CSV, Parquet and JSON files (local or over http(s)) into tables,
//! provision DuckDB extensions and run SQL, with results rendered as grids.
//!
//! The ingestion, extension provisioning and catalog logic lives in the
//! [`duckpad_engine`] workspace crate; this crate adds configuration,
//! logging, terminal rendering, the command-line surface and the shell.
//!
//! # Modules
//!
//! - [`config`] -- CLI arguments, TOML config file and merging.
//! - [`commands`] -- Handlers shared by subcommands and the shell.
//! - [`render`] -- Terminal presentation sink.
//! - [`repl`] -- Interactive shell.
//! - [`cli_format`] -- Output formats and CSV/TSV escaping.
//! - [`error`] -- Error types.

#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

pub mod cli_format;
pub mod commands;
pub mod config;
pub mod error;
pub mod render;
pub mod repl;

pub use cli_format::OutputFormat;
pub use config::{AppConfig, CliArgs, Commands, ConfigFile};
pub use error::{DuckpadError, Result};
pub use render::{CatalogMode, TerminalSink};

pub use duckpad_engine;
