//! Configuration module for duckpad
//!
//! This module is organized into submodules:
//! - `defaults` - Default constants and values
//! - `args` - CLI argument definitions
//! - `file` - TOML configuration file
//! - `merge` - Applying file values under CLI arguments

mod args;
mod defaults;
pub mod file;
mod merge;

pub use args::{CliArgs, Commands};
pub use defaults::*;
pub use file::ConfigFile;
pub use merge::merge_config_with_args;

use duckpad_engine::{EngineOptions, ProvisionerConfig, WorkbenchError};
use std::path::PathBuf;

use crate::cli_format::OutputFormat;
use crate::error::{DuckpadError, Result};

/// Complete runtime configuration for duckpad.
///
/// # Configuration Sources
///
/// Configuration is loaded from multiple sources with this precedence:
/// 1. **CLI arguments** - Command-line flags
/// 2. **Environment variables** - `DUCKPAD_*` prefix
/// 3. **Config file** - TOML configuration file
/// 4. **Built-in defaults** (lowest priority)
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    /// Database file; `None` means in-memory
    pub database: Option<PathBuf>,

    /// Staging directory for uploaded files
    pub scratch_dir: Option<PathBuf>,

    /// Extension repositories and network extension
    pub extensions: ProvisionerConfig,

    /// Output format
    pub format: OutputFormat,

    /// Maximum rows printed in text mode
    pub max_rows: usize,

    /// Log level used when RUST_LOG is unset
    pub log_level: String,

    /// Colored output enabled
    pub color: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database: None,
            scratch_dir: None,
            extensions: ProvisionerConfig::default(),
            format: OutputFormat::Text,
            max_rows: DEFAULT_MAX_ROWS,
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            color: true,
        }
    }
}

impl AppConfig {
    /// Build the configuration from (already merged) CLI arguments
    pub fn from_args(args: &CliArgs) -> Self {
        Self {
            database: args.database.clone(),
            scratch_dir: args.scratch_dir.clone(),
            extensions: ProvisionerConfig {
                core_repository: args.core_repository.trim().to_string(),
                community_repository: args.community_repository.trim().to_string(),
                network_extension: args.network_extension.trim().to_string(),
            },
            format: args.format,
            max_rows: args.max_rows,
            log_level: args.log_level.clone(),
            color: !args.no_color,
        }
    }

    /// Reject settings the workbench cannot run with
    pub fn validate(&self) -> Result<()> {
        self.extensions
            .validate()
            .map_err(|e| match e {
                WorkbenchError::Config(msg) => DuckpadError::Config(msg),
                other => other.into(),
            })?;

        if self.max_rows == 0 {
            return Err(DuckpadError::Config(
                "max_rows must be greater than 0".to_string(),
            ));
        }

        if let Some(dir) = &self.scratch_dir {
            if dir.is_file() {
                return Err(DuckpadError::Config(format!(
                    "scratch_dir {:?} is a file",
                    dir
                )));
            }
        }

        Ok(())
    }

    /// Options for opening the embedded database
    pub fn engine_options(&self) -> EngineOptions {
        EngineOptions {
            database: self.database.clone(),
            scratch_dir: self.scratch_dir.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_default_config_is_valid() {
        assert!(AppConfig::default().validate().is_ok());
    }

    #[test]
    fn test_from_args_trims_repositories() {
        let args = CliArgs::try_parse_from([
            "duckpad",
            "--core-repository",
            " http://mirror.local/core ",
            "--no-color",
        ])
        .unwrap();
        let config = AppConfig::from_args(&args);
        assert_eq!(config.extensions.core_repository, "http://mirror.local/core");
        assert!(!config.color);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let zero_rows = AppConfig {
            max_rows: 0,
            ..Default::default()
        };
        assert!(matches!(zero_rows.validate(), Err(DuckpadError::Config(_))));

        let mut empty_repo = AppConfig::default();
        empty_repo.extensions.core_repository = String::new();
        assert!(empty_repo.validate().is_err());

        let mut bad_ext = AppConfig::default();
        bad_ext.extensions.network_extension = "http fs".into();
        assert!(bad_ext.validate().is_err());
    }

    #[test]
    fn test_engine_options() {
        let config = AppConfig {
            database: Some(PathBuf::from("pad.duckdb")),
            ..Default::default()
        };
        assert_eq!(
            config.engine_options().database,
            Some(PathBuf::from("pad.duckdb"))
        );
    }
}
