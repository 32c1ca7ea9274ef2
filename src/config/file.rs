//! Configuration file support for duckpad
//!
//! This module provides TOML configuration file parsing and merging with CLI arguments.
//!
//! ## Priority Order
//!
//! Configuration is loaded with the following priority (highest to lowest):
//! 1. Command-line arguments
//! 2. Environment variables
//! 3. Configuration file
//! 4. Default values
//!
//! ## Example Configuration
//!
//! ```toml
//! # duckpad.toml
//!
//! [engine]
//! database = "./pad.duckdb"
//!
//! [extensions]
//! core_repository = "https://extensions.duckdb.org"
//! community_repository = "https://community-extensions.duckdb.org"
//! network_extension = "httpfs"
//!
//! [output]
//! format = "text"
//! max_rows = 1000
//!
//! [logging]
//! level = "warn"
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::defaults::CONFIG_FILE_NAME;
use crate::cli_format::OutputFormat;
use crate::error::{DuckpadError, Result};

/// Root configuration structure for TOML file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigFile {
    /// Embedded database configuration
    pub engine: EngineSection,

    /// Extension repositories
    pub extensions: ExtensionsSection,

    /// Result output
    pub output: OutputSection,

    /// Logging
    pub logging: LoggingSection,
}

/// Engine section configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSection {
    /// Database file path (in-memory when absent)
    pub database: Option<PathBuf>,

    /// Staging directory for uploaded files
    pub scratch_dir: Option<PathBuf>,
}

/// Extensions section configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtensionsSection {
    /// Core repository base URL
    pub core_repository: Option<String>,

    /// Community repository base URL
    pub community_repository: Option<String>,

    /// Extension required for http(s) sources
    pub network_extension: Option<String>,
}

/// Output section configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputSection {
    /// Output format (text, json, csv, tsv)
    pub format: Option<String>,

    /// Maximum rows printed in text mode
    pub max_rows: Option<usize>,
}

/// Logging section configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Log level (trace, debug, info, warn, error)
    pub level: Option<String>,
}

impl ConfigFile {
    /// Load configuration from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            DuckpadError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        toml::from_str(&contents).map_err(|e| {
            DuckpadError::Config(format!("Failed to parse config file {:?}: {}", path, e))
        })
    }

    /// Locations searched by [`ConfigFile::load_default`], in order
    pub fn default_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from(CONFIG_FILE_NAME)];
        if let Some(dir) = dirs::config_dir() {
            paths.push(dir.join("duckpad").join(CONFIG_FILE_NAME));
        }
        paths
    }

    /// Try to load configuration from default locations
    ///
    /// Searches in order:
    /// 1. ./duckpad.toml
    /// 2. <config dir>/duckpad/duckpad.toml (e.g. ~/.config/duckpad/duckpad.toml)
    pub fn load_default() -> Option<(PathBuf, Self)> {
        for path in Self::default_paths() {
            if path.exists() {
                match Self::load(&path) {
                    Ok(config) => return Some((path, config)),
                    Err(e) => {
                        eprintln!("Ignoring config file {:?}: {}", path, e);
                    }
                }
            }
        }

        None
    }

    /// Check values that cannot be expressed in the TOML types alone
    pub fn validate(&self) -> Result<()> {
        if let Some(format) = &self.output.format {
            if OutputFormat::parse(format).is_none() {
                return Err(DuckpadError::Config(format!(
                    "Unknown output format '{}' (expected text, json, csv or tsv)",
                    format
                )));
            }
        }
        Ok(())
    }

    /// Generate an example configuration file
    pub fn generate_example() -> String {
        r#"# duckpad Configuration File
# Copy to duckpad.toml and customize as needed
#
# Configuration priority (highest to lowest):
# 1. Command-line arguments
# 2. Environment variables
# 3. This configuration file
# 4. Default values

[engine]
# Database file. Leave unset for an in-memory database.
# database = "./pad.duckdb"

# Directory uploaded files are staged into before DuckDB reads them.
# Defaults to a private temporary directory.
# scratch_dir = "/tmp/duckpad"

[extensions]
# Tried in order: LOAD, core repository, community repository, default INSTALL
core_repository = "https://extensions.duckdb.org"
community_repository = "https://community-extensions.duckdb.org"

# Loaded before reading http(s) sources
network_extension = "httpfs"

[output]
# Output format (text, json, csv, tsv)
format = "text"

# Maximum rows printed in text mode
max_rows = 1000

[logging]
# Log level (trace, debug, info, warn, error). RUST_LOG overrides it.
level = "warn"
"#
        .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_empty_config() {
        let config: ConfigFile = toml::from_str("").unwrap();
        assert_eq!(config, ConfigFile::default());
    }

    #[test]
    fn test_parse_engine_section() {
        let toml = r#"
            [engine]
            database = "./pad.duckdb"
        "#;
        let config: ConfigFile = toml::from_str(toml).unwrap();
        assert_eq!(config.engine.database, Some(PathBuf::from("./pad.duckdb")));
        assert!(config.engine.scratch_dir.is_none());
    }

    #[test]
    fn test_parse_extensions_section() {
        let toml = r#"
            [extensions]
            core_repository = "http://mirror.local/core"
            network_extension = "httpfs"
        "#;
        let config: ConfigFile = toml::from_str(toml).unwrap();
        assert_eq!(
            config.extensions.core_repository,
            Some("http://mirror.local/core".to_string())
        );
        assert!(config.extensions.community_repository.is_none());
    }

    #[test]
    fn test_parse_output_and_logging() {
        let toml = r#"
            [output]
            format = "csv"
            max_rows = 50

            [logging]
            level = "debug"
        "#;
        let config: ConfigFile = toml::from_str(toml).unwrap();
        assert_eq!(config.output.format, Some("csv".to_string()));
        assert_eq!(config.output.max_rows, Some(50));
        assert_eq!(config.logging.level, Some("debug".to_string()));
    }

    #[test]
    fn test_load_reports_parse_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("duckpad.toml");
        std::fs::write(&path, "[output]\nmax_rows = \"many\"\n").unwrap();
        assert!(matches!(ConfigFile::load(&path), Err(DuckpadError::Config(_))));
    }

    #[test]
    fn test_validate_output_format() {
        let bad: ConfigFile = toml::from_str("[output]\nformat = \"xml\"\n").unwrap();
        assert!(bad.validate().is_err());
        assert!(ConfigFile::default().validate().is_ok());
    }

    #[test]
    fn test_generate_example_is_valid_toml() {
        let example = ConfigFile::generate_example();
        let config: ConfigFile = toml::from_str(&example).unwrap();
        assert_eq!(config.extensions.network_extension, Some("httpfs".to_string()));
    }
}
