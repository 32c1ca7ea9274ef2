//! Configuration merging utilities
//!
//! This module provides functions to merge configuration from files
//! with command-line arguments, where CLI arguments take precedence.

use super::args::CliArgs;
use super::defaults::*;
use super::file::ConfigFile;
use crate::cli_format::OutputFormat;

/// Merge configuration file values with CLI arguments.
/// CLI arguments take precedence over config file values.
/// Only applies config file values where CLI uses defaults.
pub fn merge_config_with_args(mut args: CliArgs, config: &ConfigFile) -> CliArgs {
    macro_rules! apply_if_default {
        ($field:ident, $config_val:expr, $default:expr) => {
            if let Some(val) = $config_val {
                if args.$field == $default {
                    args.$field = val;
                }
            }
        };
    }

    macro_rules! apply_if_default_string {
        ($field:ident, $config_val:expr, $default:expr) => {
            if let Some(ref val) = $config_val {
                if args.$field == $default {
                    args.$field = val.clone();
                }
            }
        };
    }

    macro_rules! apply_option {
        ($field:ident, $config_val:expr) => {
            if args.$field.is_none() {
                if let Some(val) = $config_val {
                    args.$field = Some(val);
                }
            }
        };
    }

    // Engine section
    apply_option!(database, config.engine.database.clone());
    apply_option!(scratch_dir, config.engine.scratch_dir.clone());

    // Extensions section
    apply_if_default_string!(
        core_repository,
        config.extensions.core_repository,
        DEFAULT_CORE_REPOSITORY
    );
    apply_if_default_string!(
        community_repository,
        config.extensions.community_repository,
        DEFAULT_COMMUNITY_REPOSITORY
    );
    apply_if_default_string!(
        network_extension,
        config.extensions.network_extension,
        DEFAULT_NETWORK_EXTENSION
    );

    // Output section
    apply_if_default!(
        format,
        config.output.format.as_deref().and_then(OutputFormat::parse),
        OutputFormat::Text
    );
    apply_if_default!(max_rows, config.output.max_rows, DEFAULT_MAX_ROWS);

    // Logging section
    apply_if_default_string!(log_level, config.logging.level, DEFAULT_LOG_LEVEL);

    args
}
