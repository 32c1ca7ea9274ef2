//! Integration tests for the workbench against a real in-memory DuckDB.
//!
//! Covers:
//!
//! - CSV, Parquet and JSON ingestion from staged local buffers
//! - Buffers staged under the configured scratch directory
//! - Catalog sync after ingestion and after user queries
//! - Unsupported file types leaving the catalog untouched
//! - Engine errors surfacing as `QueryExecution`
//! - Extension provisioning short-circuiting on built-in extensions

use std::sync::Arc;

use duckpad_engine::testing::{RecordingEngine, RecordingSink};
use duckpad_engine::{
    CatalogState, DataSource, DuckDbEngine, Engine, EngineOptions, ExtensionRequest,
    ProvisionerConfig, TableSpec, Tier, Workbench, WorkbenchError,
};
use serde_json::json;
use tempfile::TempDir;

// ── Helpers ─────────────────────────────────────────────────────────────

fn duckdb_workbench() -> (Workbench, Arc<RecordingSink>) {
    let sink = Arc::new(RecordingSink::new());
    let workbench = Workbench::new(ProvisionerConfig::default(), sink.clone());
    workbench
        .bootstrap(Arc::new(DuckDbEngine::in_memory().unwrap()))
        .unwrap();
    (workbench, sink)
}

/// Write a two-row parquet file with DuckDB itself and return its bytes.
async fn parquet_fixture(dir: &TempDir) -> Vec<u8> {
    let path = dir.path().join("fixture.parquet");
    let engine = DuckDbEngine::in_memory().unwrap();
    let mut session = engine.connect().await.unwrap();
    session
        .query(&format!(
            "COPY (SELECT 1 AS id, 19.5 AS amount UNION ALL SELECT 2, 5.25) TO '{}' (FORMAT PARQUET)",
            path.display()
        ))
        .await
        .unwrap();
    session.close().await.unwrap();
    std::fs::read(path).unwrap()
}

// ── Ingestion ───────────────────────────────────────────────────────────

#[tokio::test]
async fn test_ingest_csv_from_disk() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("people.csv");
    std::fs::write(&path, "name,age\nada,36\ngrace,45\n").unwrap();

    let (workbench, sink) = duckdb_workbench();
    let spec = TableSpec::new("people", DataSource::from_path(&path).unwrap());
    let report = workbench.ingest(spec).await.unwrap();

    assert!(report.created());
    assert!(report.source_path.ends_with("people.csv"));
    assert_eq!(sink.last_catalog().unwrap().table_names, vec!["people"]);

    let outcome = workbench
        .run_query("SELECT name FROM people ORDER BY age DESC")
        .await
        .unwrap();
    assert_eq!(outcome.result.columns, vec!["name"]);
    assert_eq!(outcome.result.rows[0].values[0], json!("grace"));
}

#[tokio::test]
async fn test_ingest_parquet_buffer() {
    let dir = TempDir::new().unwrap();
    let bytes = parquet_fixture(&dir).await;

    let (workbench, _) = duckdb_workbench();
    let spec = TableSpec::new("sales", DataSource::local("sales.parquet", bytes));
    let report = workbench.ingest(spec).await.unwrap();
    assert!(report
        .statement()
        .unwrap()
        .starts_with("CREATE TABLE 'sales' AS FROM read_parquet("));

    let outcome = workbench
        .run_query("SELECT COUNT(*) AS n FROM sales")
        .await
        .unwrap();
    assert_eq!(outcome.result.rows[0].values[0], json!(2));

    let catalog = outcome.catalog.unwrap();
    assert_eq!(catalog.table_names, vec!["sales"]);
    assert_eq!(catalog.state(), CatalogState::NonEmpty);
}

#[tokio::test]
async fn test_buffers_are_staged_under_scratch_dir() {
    let scratch = TempDir::new().unwrap();
    let engine = Arc::new(
        DuckDbEngine::new(EngineOptions {
            database: None,
            scratch_dir: Some(scratch.path().to_path_buf()),
        })
        .unwrap(),
    );
    let workbench = Workbench::new(ProvisionerConfig::default(), Arc::new(RecordingSink::new()));
    workbench.bootstrap(engine.clone()).unwrap();

    let spec = TableSpec::new("sales", DataSource::local("sales.csv", b"id\n1\n".to_vec()));
    let report = workbench.ingest(spec).await.unwrap();

    let staged = std::path::Path::new(&report.source_path);
    assert_eq!(engine.scratch_dir(), scratch.path());
    assert!(staged.starts_with(engine.scratch_dir()));
    assert_eq!(staged.file_name().unwrap(), "sales.csv");
    assert_eq!(
        report.statement().unwrap(),
        format!(
            "CREATE TABLE 'sales' AS FROM read_csv_auto('{}', header = true)",
            report.source_path
        )
    );
}

#[tokio::test]
async fn test_ingest_json_buffer() {
    let (workbench, _) = duckdb_workbench();
    let spec = TableSpec::new(
        "events",
        DataSource::local(
            "events.json",
            br#"[{"kind":"click","n":1},{"kind":"view","n":3}]"#.to_vec(),
        ),
    );
    workbench.ingest(spec).await.unwrap();

    let outcome = workbench
        .run_query("SELECT SUM(n) AS total FROM events")
        .await
        .unwrap();
    assert_eq!(outcome.result.column_text("total").unwrap(), vec!["4"]);
}

#[tokio::test]
async fn test_each_table_listed_once() {
    let (workbench, _) = duckdb_workbench();
    for name in ["a", "b"] {
        let spec = TableSpec::new(
            name,
            DataSource::local(format!("{}.csv", name), b"x\n1\n".to_vec()),
        );
        workbench.ingest(spec).await.unwrap();
    }

    let catalog = workbench.refresh_catalog().await.unwrap();
    let mut names = catalog.table_names.clone();
    names.sort();
    assert_eq!(names, vec!["a", "b"]);
}

#[tokio::test]
async fn test_unsupported_file_type_leaves_catalog() {
    let (workbench, _) = duckdb_workbench();
    let spec = TableSpec::new("notes", DataSource::local("notes.txt", b"hello".to_vec()));
    let report = workbench.ingest(spec).await.unwrap();

    assert!(!report.created());
    assert_eq!(workbench.refresh_catalog().await.unwrap().state(), CatalogState::Empty);
}

#[tokio::test]
async fn test_duplicate_table_is_query_error() {
    let (workbench, _) = duckdb_workbench();
    let make = || TableSpec::new("dup", DataSource::local("dup.csv", b"x\n1\n".to_vec()));

    workbench.ingest(make()).await.unwrap();
    let err = workbench.ingest(make()).await.unwrap_err();
    assert!(
        matches!(err, WorkbenchError::QueryExecution(_)),
        "Expected QueryExecution, got: {:?}",
        err
    );
    assert_eq!(workbench.refresh_catalog().await.unwrap().table_names, vec!["dup"]);
}

// ── Queries ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_select_one_with_no_tables() {
    let (workbench, sink) = duckdb_workbench();
    let outcome = workbench.run_query("SELECT 1").await.unwrap();

    assert_eq!(outcome.result.row_count(), 1);
    assert_eq!(outcome.result.column_count(), 1);
    assert_eq!(outcome.catalog.unwrap().state(), CatalogState::Empty);
    assert!(sink.errors().is_empty());
}

#[tokio::test]
async fn test_bad_query_reported_to_sink() {
    let (workbench, sink) = duckdb_workbench();
    let err = workbench
        .run_query("SELECT * FROM does_not_exist")
        .await
        .unwrap_err();

    assert!(matches!(err, WorkbenchError::QueryExecution(_)));
    assert_eq!(sink.errors().len(), 1);
}

// ── Extensions ──────────────────────────────────────────────────────────

#[tokio::test]
async fn test_builtin_extension_needs_no_install() {
    let recording = RecordingEngine::new(Arc::new(DuckDbEngine::in_memory().unwrap()));
    let workbench = Workbench::new(ProvisionerConfig::default(), Arc::new(RecordingSink::new()));
    workbench.bootstrap(Arc::new(recording.clone())).unwrap();

    let outcome = workbench
        .load_extension(&ExtensionRequest::new("json").unwrap())
        .await
        .unwrap();

    assert_eq!(outcome.via(), Some(Tier::AlreadyAvailable));
    assert_eq!(recording.statements(), vec!["LOAD json"]);
}
