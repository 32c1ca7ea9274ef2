//! DuckDB-backed [`Engine`] implementation.
//!
//! One database (in-memory or file-backed) is opened at bootstrap. Each
//! session is a cloned connection to that same database, so tables created
//! by one operation are visible to the next.
//!
//! Uploaded buffers are staged into a private scratch directory: DuckDB's
//! native readers only address real paths, so [`Engine::register_buffer`]
//! writes the bytes there and hands back the staged location.
//!
//! # Stability
//!
//! **Stable** -- Breaking changes only in major versions.
//!
//! # Examples
//!
//! ```no_run
//! use duckpad_engine::duckdb::{DuckDbEngine, EngineOptions};
//!
//! let engine = DuckDbEngine::new(EngineOptions::default()).unwrap();
//! ```

use crate::engine::{Engine, Session};
use crate::error::{Result, WorkbenchError};
use crate::result::{ResultRow, TabularResult};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime};
use duckdb::types::{TimeUnit, Value, ValueRef};
use duckdb::Connection;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// Options used to open the embedded database.
///
/// # Defaults
///
/// | Field | Default |
/// |---|---|
/// | `database` | `None` (in-memory) |
/// | `scratch_dir` | `None` (private temporary directory) |
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineOptions {
    /// Database file; `None` opens an in-memory database.
    pub database: Option<PathBuf>,

    /// Directory for staged upload buffers; `None` uses a temporary
    /// directory removed when the engine is dropped.
    pub scratch_dir: Option<PathBuf>,
}

/// Embedded DuckDB engine.
///
/// Safe to share across threads (`Send + Sync`).
pub struct DuckDbEngine {
    /// Base connection; sessions are cloned from it.
    /// Note: Using Mutex because DuckDB Connection contains RefCell which is not Sync.
    connection: Arc<Mutex<Connection>>,

    /// Where registered buffers are written.
    scratch: ScratchDir,

    /// Label used in logs (`:memory:` or the database path).
    label: String,
}

enum ScratchDir {
    Owned(tempfile::TempDir),
    Configured(PathBuf),
}

impl ScratchDir {
    fn path(&self) -> &Path {
        match self {
            ScratchDir::Owned(dir) => dir.path(),
            ScratchDir::Configured(path) => path,
        }
    }
}

impl DuckDbEngine {
    /// Open the embedded database.
    ///
    /// # Errors
    ///
    /// Returns `WorkbenchError::Config` if DuckDB cannot open the database
    /// and `WorkbenchError::Io` if the scratch directory cannot be created.
    pub fn new(options: EngineOptions) -> Result<Self> {
        let (connection, label) = match &options.database {
            Some(path) => (
                Connection::open(path),
                path.display().to_string(),
            ),
            None => (Connection::open_in_memory(), ":memory:".to_string()),
        };
        let connection = connection.map_err(|e| {
            WorkbenchError::Config(format!("Failed to open DuckDB database {}: {}", label, e))
        })?;

        let scratch = match options.scratch_dir {
            Some(dir) => {
                std::fs::create_dir_all(&dir)?;
                ScratchDir::Configured(dir)
            }
            None => ScratchDir::Owned(tempfile::Builder::new().prefix("duckpad-").tempdir()?),
        };

        info!(
            database = %label,
            scratch_dir = %scratch.path().display(),
            "DuckDB engine initialized"
        );

        Ok(Self {
            connection: Arc::new(Mutex::new(connection)),
            scratch,
            label,
        })
    }

    /// Open an in-memory engine with a temporary scratch directory.
    pub fn in_memory() -> Result<Self> {
        Self::new(EngineOptions::default())
    }

    /// Directory registered buffers are staged into.
    pub fn scratch_dir(&self) -> &Path {
        self.scratch.path()
    }
}

#[async_trait]
impl Engine for DuckDbEngine {
    fn name(&self) -> &str {
        &self.label
    }

    async fn connect(&self) -> Result<Box<dyn Session>> {
        let conn = self.connection.lock().try_clone().map_err(|e| {
            WorkbenchError::QueryExecution(format!("Failed to open DuckDB connection: {}", e))
        })?;
        debug!(database = %self.label, "DuckDB connection established");
        Ok(Box::new(DuckDbSession { conn: Some(conn) }))
    }

    async fn register_buffer(&self, virtual_path: &str, bytes: &[u8]) -> Result<String> {
        let file_name = virtual_path.trim_start_matches('/');
        if file_name.is_empty()
            || file_name == ".."
            || file_name.contains('/')
            || file_name.contains('\\')
        {
            return Err(WorkbenchError::invalid_input(format!(
                "Cannot register buffer under '{}'",
                virtual_path
            )));
        }

        let staged = self.scratch.path().join(file_name);
        std::fs::write(&staged, bytes)?;
        debug!(
            virtual_path = %virtual_path,
            staged = %staged.display(),
            bytes = bytes.len(),
            "Registered file buffer"
        );
        Ok(staged.to_string_lossy().into_owned())
    }
}

/// One cloned DuckDB connection.
struct DuckDbSession {
    conn: Option<Connection>,
}

#[async_trait]
impl Session for DuckDbSession {
    async fn query(&mut self, sql: &str) -> Result<TabularResult> {
        let conn = self
            .conn
            .as_ref()
            .ok_or_else(|| WorkbenchError::QueryExecution("Connection already closed".into()))?;

        let mut stmt = conn
            .prepare(sql)
            .map_err(|e| WorkbenchError::query_failed(sql, e.to_string()))?;

        let mut rows_result = stmt
            .query([])
            .map_err(|e| WorkbenchError::query_failed(sql, e.to_string()))?;

        // Column count is probed per row: Rows holds a mutable borrow on
        // stmt, so names are read after it is dropped.
        let mut rows = Vec::new();
        while let Some(row) = rows_result
            .next()
            .map_err(|e| WorkbenchError::QueryExecution(format!("Failed to fetch row: {}", e)))?
        {
            let mut values = Vec::new();
            for i in 0.. {
                match row.get_ref(i) {
                    Ok(value) => values.push(duckdb_value_to_json(value)),
                    Err(_) => break,
                }
            }
            rows.push(ResultRow { values });
        }

        drop(rows_result);

        let columns: Vec<String> = stmt.column_names().iter().map(|s| s.to_string()).collect();

        Ok(TabularResult { columns, rows })
    }

    async fn close(&mut self) -> Result<()> {
        if let Some(conn) = self.conn.take() {
            conn.close().map_err(|(_, e)| WorkbenchError::from(e))?;
            debug!("DuckDB connection closed");
        }
        Ok(())
    }
}

// ─── Helpers ─────────────────────────────────────────────────────────────────

/// Days between 0001-01-01 (day 1 of the common era) and 1970-01-01.
const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;

/// Convert a DuckDB `ValueRef` to a `serde_json::Value`.
///
/// Strings and blobs are read in place; every other type goes through the
/// owned [`Value`] so nested lists, structs and maps convert recursively.
fn duckdb_value_to_json(value: ValueRef<'_>) -> JsonValue {
    match value {
        ValueRef::Text(s) => JsonValue::String(String::from_utf8_lossy(s).into_owned()),
        ValueRef::Blob(b) => JsonValue::String(encode_blob(b)),
        other => value_to_json(other.to_owned()),
    }
}

fn value_to_json(value: Value) -> JsonValue {
    match value {
        Value::Null => JsonValue::Null,
        Value::Boolean(b) => JsonValue::Bool(b),
        Value::TinyInt(i) => JsonValue::Number(i.into()),
        Value::SmallInt(i) => JsonValue::Number(i.into()),
        Value::Int(i) => JsonValue::Number(i.into()),
        Value::BigInt(i) => JsonValue::Number(i.into()),
        Value::HugeInt(i) => {
            // Fit into i64 when possible; very large values become strings.
            if let Ok(n) = i64::try_from(i) {
                JsonValue::Number(n.into())
            } else {
                JsonValue::String(i.to_string())
            }
        }
        Value::UTinyInt(i) => JsonValue::Number(i.into()),
        Value::USmallInt(i) => JsonValue::Number(i.into()),
        Value::UInt(i) => JsonValue::Number(i.into()),
        Value::UBigInt(i) => JsonValue::Number(i.into()),
        Value::Float(f) => serde_json::Number::from_f64(f as f64)
            .map(JsonValue::Number)
            .unwrap_or(JsonValue::Null),
        Value::Double(f) => serde_json::Number::from_f64(f)
            .map(JsonValue::Number)
            .unwrap_or(JsonValue::Null),
        Value::Decimal(d) => JsonValue::String(d.to_string()),
        Value::Text(s) => JsonValue::String(s),
        Value::Blob(b) => JsonValue::String(encode_blob(&b)),
        Value::Date32(days) => JsonValue::String(format_date(days)),
        Value::Timestamp(unit, v) => JsonValue::String(format_timestamp(unit, v)),
        Value::Time64(unit, v) => JsonValue::String(format_time(to_micros(unit, v))),
        Value::Interval {
            months,
            days,
            nanos,
        } => JsonValue::String(format_interval(months, days, nanos)),
        Value::Enum(label) => JsonValue::String(label),
        Value::List(items) | Value::Array(items) => {
            JsonValue::Array(items.into_iter().map(value_to_json).collect())
        }
        Value::Struct(fields) => JsonValue::Object(
            fields
                .iter()
                .map(|(name, v)| (name.clone(), value_to_json(v.clone())))
                .collect(),
        ),
        Value::Map(entries) => JsonValue::Object(
            entries
                .iter()
                .map(|(k, v)| (map_key(k.clone()), value_to_json(v.clone())))
                .collect(),
        ),
        Value::Union(inner) => value_to_json(*inner),
    }
}

fn encode_blob(bytes: &[u8]) -> String {
    base64::Engine::encode(&base64::engine::general_purpose::STANDARD, bytes)
}

/// JSON object keys must be strings; non-text map keys use their JSON text.
fn map_key(key: Value) -> String {
    match value_to_json(key) {
        JsonValue::String(s) => s,
        other => other.to_string(),
    }
}

/// `YYYY-MM-DD`, or DuckDB's spelling for the infinite dates.
fn format_date(days: i32) -> String {
    match days {
        i32::MAX => "infinity".to_string(),
        d if d == -i32::MAX => "-infinity".to_string(),
        d => d
            .checked_add(UNIX_EPOCH_DAYS_FROM_CE)
            .and_then(NaiveDate::from_num_days_from_ce_opt)
            .map(|date| date.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| format!("{} days since 1970-01-01", d)),
    }
}

fn format_timestamp(unit: TimeUnit, value: i64) -> String {
    match value {
        i64::MAX => "infinity".to_string(),
        v if v == -i64::MAX => "-infinity".to_string(),
        v => DateTime::from_timestamp_micros(to_micros(unit, v))
            .map(|dt| dt.naive_utc().format("%Y-%m-%d %H:%M:%S%.f").to_string())
            .unwrap_or_else(|| v.to_string()),
    }
}

/// `HH:MM:SS[.ffffff]` from microseconds since midnight.
fn format_time(micros: i64) -> String {
    let secs = micros.div_euclid(1_000_000);
    let nanos = micros.rem_euclid(1_000_000) * 1_000;
    u32::try_from(secs)
        .ok()
        .zip(u32::try_from(nanos).ok())
        .and_then(|(secs, nanos)| NaiveTime::from_num_seconds_from_midnight_opt(secs, nanos))
        .map(|t| t.format("%H:%M:%S%.f").to_string())
        // DuckDB allows 24:00:00, which chrono does not.
        .unwrap_or_else(|| clock_text(micros))
}

/// Render an interval the way DuckDB prints it, e.g. `1 year 2 months 3 days 04:05:06`.
fn format_interval(months: i32, days: i32, nanos: i64) -> String {
    let mut parts: Vec<String> = [
        (i64::from(months / 12), "year"),
        (i64::from(months % 12), "month"),
        (i64::from(days), "day"),
    ]
    .into_iter()
    .filter(|(n, _)| *n != 0)
    .map(|(n, unit)| format!("{} {}{}", n, unit, if n.abs() == 1 { "" } else { "s" }))
    .collect();

    let micros = nanos / 1_000;
    if micros != 0 || parts.is_empty() {
        parts.push(clock_text(micros));
    }
    parts.join(" ")
}

/// Signed `HH:MM:SS[.ffffff]` without wrapping at 24 hours.
fn clock_text(micros: i64) -> String {
    let sign = if micros < 0 { "-" } else { "" };
    let abs = micros.unsigned_abs();
    let hours = abs / 3_600_000_000;
    let minutes = abs % 3_600_000_000 / 60_000_000;
    let seconds = abs % 60_000_000 / 1_000_000;
    let fraction = abs % 1_000_000;

    let mut text = format!("{}{:02}:{:02}:{:02}", sign, hours, minutes, seconds);
    if fraction != 0 {
        let digits = format!("{:06}", fraction);
        text.push('.');
        text.push_str(digits.trim_end_matches('0'));
    }
    text
}

fn to_micros(unit: TimeUnit, value: i64) -> i64 {
    match unit {
        TimeUnit::Second => value.saturating_mul(1_000_000),
        TimeUnit::Millisecond => value.saturating_mul(1_000),
        TimeUnit::Microsecond => value,
        TimeUnit::Nanosecond => value / 1_000,
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
