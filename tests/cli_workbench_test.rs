//! End-to-end tests for the command handlers against an in-memory DuckDB.
//!
//! Output is captured through `TerminalSink::with_writers` so the stdout /
//! stderr split can be checked.

use std::io::Write;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use duckpad::commands::{self, run_command};
use duckpad::config::{merge_config_with_args, AppConfig, CliArgs, Commands, ConfigFile};
use duckpad::duckpad_engine::{DuckDbEngine, PresentationSink, Workbench, WorkbenchError};
use duckpad::{DuckpadError, OutputFormat, TerminalSink};
use parking_lot::Mutex;
use tempfile::TempDir;

// ── Helpers ─────────────────────────────────────────────────────────────

#[derive(Clone, Default)]
struct Captured(Arc<Mutex<Vec<u8>>>);

impl Write for Captured {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl Captured {
    fn text(&self) -> String {
        String::from_utf8_lossy(&self.0.lock()).into_owned()
    }
}

struct Harness {
    workbench: Workbench,
    sink: Arc<TerminalSink>,
    out: Captured,
    err: Captured,
}

fn harness(format: OutputFormat) -> Harness {
    colored::control::set_override(false);
    let out = Captured::default();
    let err = Captured::default();
    let sink = Arc::new(TerminalSink::with_writers(
        format,
        100,
        Box::new(out.clone()),
        Box::new(err.clone()),
    ));
    let workbench = Workbench::new(
        AppConfig::default().extensions,
        sink.clone() as Arc<dyn PresentationSink>,
    );
    workbench
        .bootstrap(Arc::new(DuckDbEngine::in_memory().unwrap()))
        .unwrap();
    Harness {
        workbench,
        sink,
        out,
        err,
    }
}

fn people_csv(dir: &TempDir) -> String {
    let path = dir.path().join("people.csv");
    std::fs::write(&path, "name,age\nada,36\ngrace,45\n").unwrap();
    path.to_string_lossy().into_owned()
}

// ── Commands ────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_query_with_load_prints_csv() {
    let dir = TempDir::new().unwrap();
    let h = harness(OutputFormat::Csv);

    let command = Commands::Query {
        sql: "SELECT name FROM people ORDER BY age".to_string(),
        loads: vec![("people".to_string(), people_csv(&dir))],
    };
    let code = run_command(&h.workbench, &h.sink, &command).await.unwrap();

    assert_eq!(code, ExitCode::SUCCESS);
    assert_eq!(h.out.text().trim(), "name\nada\ngrace");
    assert!(h.err.text().contains("Table 'people' created"));
    assert!(h.err.text().contains("Tables (1): people"));
}

#[tokio::test]
async fn test_ingest_then_tables() {
    let dir = TempDir::new().unwrap();
    let h = harness(OutputFormat::Csv);

    let ingest = Commands::Ingest {
        table: "people".to_string(),
        source: people_csv(&dir),
        extension: None,
    };
    run_command(&h.workbench, &h.sink, &ingest).await.unwrap();
    assert!(h.out.text().is_empty());

    run_command(&h.workbench, &h.sink, &Commands::Tables)
        .await
        .unwrap();
    assert_eq!(h.out.text().trim(), "TABLES\npeople");
}

#[tokio::test]
async fn test_tables_json_when_empty() {
    let h = harness(OutputFormat::Json);
    run_command(&h.workbench, &h.sink, &Commands::Tables)
        .await
        .unwrap();
    assert_eq!(h.out.text().trim(), r#"{"tables":[]}"#);
}

#[tokio::test]
async fn test_bad_query_fails_exit_code_once() {
    let h = harness(OutputFormat::Text);
    let command = Commands::Query {
        sql: "SELECT * FROM missing_table".to_string(),
        loads: vec![],
    };
    let code = run_command(&h.workbench, &h.sink, &command).await.unwrap();

    assert_eq!(code, ExitCode::FAILURE);
    assert!(h.out.text().is_empty());
    assert!(h.err.text().contains("missing_table"));
    assert_eq!(h.err.text().matches("✗").count(), 1);
}

#[tokio::test]
async fn test_unsupported_file_type_is_not_an_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("notes.txt");
    std::fs::write(&path, "hello").unwrap();
    let h = harness(OutputFormat::Text);

    let report = commands::ingest(&h.workbench, "notes", path.to_str().unwrap(), None)
        .await
        .unwrap();

    assert!(!report.created());
    assert!(h.err.text().contains("txt"));
    assert!(h.out.text().is_empty());
}

#[tokio::test]
async fn test_invalid_table_and_extension_names() {
    let h = harness(OutputFormat::Text);

    let blank = commands::ingest(&h.workbench, "  ", "https://host/a.csv", None).await;
    assert!(matches!(
        blank,
        Err(DuckpadError::Workbench(WorkbenchError::InvalidInput(_)))
    ));

    let bad = commands::load_extension(&h.workbench, "json; DROP TABLE x").await;
    assert!(matches!(
        bad,
        Err(DuckpadError::Workbench(WorkbenchError::InvalidInput(_)))
    ));
}

#[tokio::test]
async fn test_extension_command_loads_builtin() {
    let h = harness(OutputFormat::Text);
    let command = Commands::Extension {
        name: "json".to_string(),
    };
    let code = run_command(&h.workbench, &h.sink, &command).await.unwrap();

    assert_eq!(code, ExitCode::SUCCESS);
    assert!(h.err.text().contains("Extension 'json' loaded"));
}

#[tokio::test]
async fn test_shell_is_not_a_one_shot_command() {
    let h = harness(OutputFormat::Text);
    let result = run_command(&h.workbench, &h.sink, &Commands::Shell).await;
    assert!(matches!(result, Err(DuckpadError::Config(_))));
}

// ── Configuration ───────────────────────────────────────────────────────

#[test]
fn test_config_file_feeds_app_config() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("duckpad.toml");
    std::fs::write(
        &path,
        r#"
[engine]
scratch_dir = "/tmp/duckpad-scratch"

[output]
format = "tsv"
max_rows = 5
"#,
    )
    .unwrap();

    let file = ConfigFile::load(&path).unwrap();
    file.validate().unwrap();
    let args = merge_config_with_args(CliArgs::parse_from(["duckpad", "tables"]), &file);
    let config = AppConfig::from_args(&args);

    assert_eq!(config.format, OutputFormat::Tsv);
    assert_eq!(config.max_rows, 5);
    assert_eq!(
        config.engine_options().scratch_dir.unwrap().to_str(),
        Some("/tmp/duckpad-scratch")
    );
    assert_eq!(args.command, Some(Commands::Tables));
}

#[test]
fn test_generated_example_config_parses() {
    let file: ConfigFile = toml::from_str(&ConfigFile::generate_example()).unwrap();
    file.validate().unwrap();
}
