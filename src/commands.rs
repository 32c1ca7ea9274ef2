//! Command handlers shared by the one-shot CLI and the interactive shell.

use duckpad_engine::{
    CatalogView, DataSource, ExtensionRequest, IngestReport, ProvisionOutcome, TableSpec,
    Workbench, WorkbenchError,
};
use std::process::ExitCode;
use tracing::debug;

use crate::config::Commands;
use crate::error::{DuckpadError, Result};
use crate::render::{CatalogMode, TerminalSink};

/// Interpret a command-line source: `http(s)://` URLs are read remotely,
/// anything else is a local file.
pub fn parse_source(arg: &str) -> Result<DataSource> {
    let arg = arg.trim();
    if arg.is_empty() {
        return Err(
            WorkbenchError::invalid_input("Please select a file or enter a file URL.").into(),
        );
    }
    let lower = arg.to_ascii_lowercase();
    if lower.starts_with("http://") || lower.starts_with("https://") {
        Ok(DataSource::remote(arg))
    } else {
        Ok(DataSource::from_path(arg)?)
    }
}

/// Create `table` from `source`, optionally provisioning `extension` first.
pub async fn ingest(
    workbench: &Workbench,
    table: &str,
    source: &str,
    extension: Option<&str>,
) -> Result<IngestReport> {
    if table.trim().is_empty() {
        return Err(WorkbenchError::invalid_input("Please enter a valid table name.").into());
    }
    let mut spec = TableSpec::new(table.trim(), parse_source(source)?);
    if let Some(extension) = extension {
        spec = spec.with_extension(extension);
    }
    debug!(
        table = %spec.table_name,
        kind = %spec.file_kind,
        remote = spec.source.is_remote(),
        "Ingesting"
    );
    Ok(workbench.ingest(spec).await?)
}

/// Install and load an extension by name.
pub async fn load_extension(workbench: &Workbench, name: &str) -> Result<ProvisionOutcome> {
    let request = ExtensionRequest::new(name)?;
    Ok(workbench.load_extension(&request).await?)
}

/// Show the full table listing.
pub async fn list_tables(workbench: &Workbench, sink: &TerminalSink) -> Result<CatalogView> {
    sink.set_catalog_mode(CatalogMode::Full);
    let view = workbench.refresh_catalog().await;
    sink.set_catalog_mode(CatalogMode::Summary);
    Ok(view?)
}

/// Run one non-interactive subcommand.
///
/// A rejected user query has already been shown by the sink, so it only
/// turns into a failing exit code.
pub async fn run_command(
    workbench: &Workbench,
    sink: &TerminalSink,
    command: &Commands,
) -> Result<ExitCode> {
    match command {
        Commands::Ingest {
            table,
            source,
            extension,
        } => {
            ingest(workbench, table, source, extension.as_deref()).await?;
        }
        Commands::Query { sql, loads } => {
            for (table, source) in loads {
                ingest(workbench, table, source, None).await?;
            }
            match workbench.run_query(sql).await {
                Ok(_) => {}
                Err(WorkbenchError::QueryExecution(_)) => return Ok(ExitCode::FAILURE),
                Err(e) => return Err(e.into()),
            }
        }
        Commands::Tables => {
            list_tables(workbench, sink).await?;
        }
        Commands::Extension { name } => {
            load_extension(workbench, name).await?;
        }
        Commands::Shell => {
            return Err(DuckpadError::Config(
                "The interactive shell cannot run as a one-shot command".to_string(),
            ));
        }
    }
    Ok(ExitCode::SUCCESS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_source_remote() {
        let src = parse_source(" https://host/data.csv?x=1 ").unwrap();
        assert_eq!(src, DataSource::remote("https://host/data.csv?x=1"));
        assert!(parse_source("HTTP://host/a.json").unwrap().is_remote());
    }

    #[test]
    fn test_parse_source_local() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("people.csv");
        std::fs::write(&path, "a\n1\n").unwrap();

        let src = parse_source(path.to_str().unwrap()).unwrap();
        assert_eq!(src.file_name(), "people.csv");
        assert!(!src.is_remote());
    }

    #[test]
    fn test_parse_source_errors() {
        assert!(matches!(
            parse_source("  "),
            Err(DuckpadError::Workbench(WorkbenchError::InvalidInput(_)))
        ));
        assert!(matches!(
            parse_source("/definitely/not/here.csv"),
            Err(DuckpadError::Workbench(WorkbenchError::Io(_)))
        ));
    }
}
