//! duckpad - load files into an embedded DuckDB and query them from the terminal.

use clap::Parser;
use colored::Colorize;
use duckpad::commands;
use duckpad::config::{merge_config_with_args, AppConfig, CliArgs, Commands, ConfigFile};
use duckpad::duckpad_engine::{DuckDbEngine, PresentationSink, Workbench};
use duckpad::repl::{run_repl, ReplConfig};
use duckpad::{DuckpadError, Result, TerminalSink};
use std::io::IsTerminal;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{} {}", "✗".red(), e);
            if let Some(hint) = e.hint() {
                eprintln!("  {} {}", "hint:".dimmed(), hint);
            }
            ExitCode::from(1)
        }
    }
}

fn run() -> Result<ExitCode> {
    // Parse command-line arguments (before runtime creation)
    let mut args = CliArgs::parse();

    // Handle --generate-config flag
    if args.generate_config {
        println!("{}", ConfigFile::generate_example());
        return Ok(ExitCode::SUCCESS);
    }

    // Load configuration file if specified or from default locations
    let config_file = match args.config {
        Some(ref path) => Some((path.clone(), ConfigFile::load(path)?)),
        None => ConfigFile::load_default(),
    };

    // Merge config file values with CLI args (CLI takes precedence)
    if let Some((_, ref config)) = config_file {
        config.validate()?;
        args = merge_config_with_args(args, config);
    }

    let config = AppConfig::from_args(&args);
    config.validate()?;

    // Color is enabled if: not disabled via flag AND stdout is a terminal
    if !config.color || !std::io::stdout().is_terminal() {
        colored::control::set_override(false);
    }

    // Logs go to stderr so result output can be piped
    let log_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(log_filter)
        .init();

    if let Some((ref path, _)) = config_file {
        info!(path = %path.display(), "Configuration loaded from file");
    }

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| {
            error!(error = %e, "Failed to create Tokio runtime");
            DuckpadError::Io(e)
        })?;

    let sink = Arc::new(TerminalSink::new(config.format, config.max_rows));
    let workbench = Workbench::new(
        config.extensions.clone(),
        sink.clone() as Arc<dyn PresentationSink>,
    );

    let engine = DuckDbEngine::new(config.engine_options()).map_err(|e| {
        error!(error = %e, "Failed to open database");
        e
    })?;
    workbench.bootstrap(Arc::new(engine))?;

    match args.command.unwrap_or(Commands::Shell) {
        Commands::Shell => {
            run_repl(&workbench, &sink, &runtime, ReplConfig::default())?;
            Ok(ExitCode::SUCCESS)
        }
        command => runtime.block_on(commands::run_command(&workbench, &sink, &command)),
    }
}
