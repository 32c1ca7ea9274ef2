//! Default constants for duckpad configuration
//!
//! These constants define the default values used throughout the configuration
//! system when no explicit value is provided.

pub use duckpad_engine::provision::{
    COMMUNITY_REPOSITORY_URL as DEFAULT_COMMUNITY_REPOSITORY,
    CORE_REPOSITORY_URL as DEFAULT_CORE_REPOSITORY, NETWORK_EXTENSION as DEFAULT_NETWORK_EXTENSION,
};

/// Config file name searched for in the working and config directories
pub const CONFIG_FILE_NAME: &str = "duckpad.toml";

/// Default log level; RUST_LOG overrides it
pub const DEFAULT_LOG_LEVEL: &str = "warn";

/// Default output format ("text", "json", "csv", "tsv")
pub const DEFAULT_FORMAT: &str = "text";

/// Default maximum number of rows printed in a text grid
pub const DEFAULT_MAX_ROWS: usize = 1000;

/// Default maximum number of shell history entries
pub const DEFAULT_MAX_HISTORY: usize = 1000;
