//! Test doubles for the engine seam and the presentation sink.
//!
//! # Stability
//!
//! **⚠️ Experimental** - Intended for tests only.
//!
//! - [`ScriptedEngine`]: an in-memory engine that records every statement,
//!   fails on scripted prefixes and simulates just enough of a catalog for
//!   `CREATE TABLE ... AS` and the catalog query.
//! - [`RecordingEngine`]: wraps a real engine and records statements.
//! - [`RecordingSink`]: a presentation sink that keeps every event.
//!
//! # Example
//!
//! ```
//! use duckpad_engine::testing::ScriptedEngine;
//!
//! // LOAD spatial fails three times, then succeeds.
//! let engine = ScriptedEngine::new().fail_times("LOAD spatial", 3);
//! assert!(engine.statements().is_empty());
//! ```

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::json;

use crate::catalog::CatalogView;
use crate::engine::{Engine, Session};
use crate::error::{Result, WorkbenchError};
use crate::result::TabularResult;
use crate::sink::PresentationSink;
use crate::statements::{CATALOG_COLUMN, CATALOG_QUERY};

/// One statement seen by a test engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutedStatement {
    /// Statement text.
    pub sql: String,
    /// Whether the engine accepted it.
    pub succeeded: bool,
}

struct FailureRule {
    prefix: String,
    remaining: Option<usize>,
}

#[derive(Default)]
struct ScriptState {
    rules: Vec<FailureRule>,
    fail_connect: bool,
    fail_close: bool,
    executed: Vec<ExecutedStatement>,
    connects: usize,
    closes: usize,
    buffers: Vec<(String, usize)>,
    tables: Vec<String>,
}

impl ScriptState {
    fn take_failure(&mut self, sql: &str) -> Option<String> {
        let rule = self
            .rules
            .iter_mut()
            .find(|r| sql.starts_with(&r.prefix) && r.remaining != Some(0))?;
        if let Some(n) = rule.remaining.as_mut() {
            *n -= 1;
        }
        Some(format!("scripted failure for: {}", sql))
    }

    fn simulate(&mut self, sql: &str) -> Result<TabularResult> {
        if let Some(rest) = sql.strip_prefix("CREATE TABLE '") {
            let name = rest
                .split_once("' AS FROM")
                .map(|(name, _)| name.replace("''", "'"))
                .ok_or_else(|| WorkbenchError::QueryExecution(format!("cannot parse: {}", sql)))?;
            if self.tables.contains(&name) {
                return Err(WorkbenchError::QueryExecution(format!(
                    "Catalog Error: Table with name {} already exists!",
                    name
                )));
            }
            self.tables.push(name);
            return Ok(TabularResult::new(vec!["Count".into()], vec![vec![json!(0)]]));
        }

        if sql == CATALOG_QUERY {
            return Ok(TabularResult::new(
                vec![CATALOG_COLUMN.to_string()],
                self.tables.iter().map(|t| vec![json!(t)]).collect(),
            ));
        }

        if sql.trim().eq_ignore_ascii_case("SELECT 1") {
            return Ok(TabularResult::new(vec!["1".into()], vec![vec![json!(1)]]));
        }

        Ok(TabularResult::empty())
    }
}

/// Scripted in-memory engine.
#[derive(Clone, Default)]
pub struct ScriptedEngine {
    state: Arc<Mutex<ScriptState>>,
}

impl ScriptedEngine {
    /// An engine on which every statement succeeds.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail every statement starting with `prefix`.
    pub fn fail_on(self, prefix: impl Into<String>) -> Self {
        self.state.lock().rules.push(FailureRule {
            prefix: prefix.into(),
            remaining: None,
        });
        self
    }

    /// Fail the first `times` statements starting with `prefix`.
    pub fn fail_times(self, prefix: impl Into<String>, times: usize) -> Self {
        self.state.lock().rules.push(FailureRule {
            prefix: prefix.into(),
            remaining: Some(times),
        });
        self
    }

    /// Make `connect` fail.
    pub fn fail_connect(self) -> Self {
        self.state.lock().fail_connect = true;
        self
    }

    /// Make `close` fail (the close is still counted).
    pub fn fail_close(self) -> Self {
        self.state.lock().fail_close = true;
        self
    }

    /// Pre-populate the simulated catalog.
    pub fn with_table(self, name: impl Into<String>) -> Self {
        self.state.lock().tables.push(name.into());
        self
    }

    /// Statement texts in execution order.
    pub fn statements(&self) -> Vec<String> {
        self.state.lock().executed.iter().map(|s| s.sql.clone()).collect()
    }

    /// Statements with their outcome.
    pub fn executed(&self) -> Vec<ExecutedStatement> {
        self.state.lock().executed.clone()
    }

    /// Number of connections opened.
    pub fn connects(&self) -> usize {
        self.state.lock().connects
    }

    /// Number of connections closed.
    pub fn closes(&self) -> usize {
        self.state.lock().closes
    }

    /// Registered buffers as `(virtual path, byte count)`.
    pub fn registered_buffers(&self) -> Vec<(String, usize)> {
        self.state.lock().buffers.clone()
    }

    /// Tables in the simulated catalog.
    pub fn tables(&self) -> Vec<String> {
        self.state.lock().tables.clone()
    }
}

#[async_trait]
impl Engine for ScriptedEngine {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn connect(&self) -> Result<Box<dyn Session>> {
        let mut state = self.state.lock();
        if state.fail_connect {
            return Err(WorkbenchError::QueryExecution("scripted connect failure".into()));
        }
        state.connects += 1;
        Ok(Box::new(ScriptedSession {
            state: self.state.clone(),
        }))
    }

    async fn register_buffer(&self, virtual_path: &str, bytes: &[u8]) -> Result<String> {
        self.state
            .lock()
            .buffers
            .push((virtual_path.to_string(), bytes.len()));
        Ok(virtual_path.to_string())
    }
}

struct ScriptedSession {
    state: Arc<Mutex<ScriptState>>,
}

#[async_trait]
impl Session for ScriptedSession {
    async fn query(&mut self, sql: &str) -> Result<TabularResult> {
        let mut state = self.state.lock();
        let outcome = match state.take_failure(sql) {
            Some(msg) => Err(WorkbenchError::QueryExecution(msg)),
            None => state.simulate(sql),
        };
        state.executed.push(ExecutedStatement {
            sql: sql.to_string(),
            succeeded: outcome.is_ok(),
        });
        outcome
    }

    async fn close(&mut self) -> Result<()> {
        let mut state = self.state.lock();
        state.closes += 1;
        if state.fail_close {
            return Err(WorkbenchError::QueryExecution("scripted close failure".into()));
        }
        Ok(())
    }
}

/// Wraps another engine and records every statement it executes.
#[derive(Clone)]
pub struct RecordingEngine {
    inner: Arc<dyn Engine>,
    journal: Arc<Mutex<Vec<ExecutedStatement>>>,
}

impl RecordingEngine {
    /// Record statements sent to `inner`.
    pub fn new(inner: Arc<dyn Engine>) -> Self {
        Self {
            inner,
            journal: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Statement texts in execution order.
    pub fn statements(&self) -> Vec<String> {
        self.journal.lock().iter().map(|s| s.sql.clone()).collect()
    }

    /// Statements with their outcome.
    pub fn executed(&self) -> Vec<ExecutedStatement> {
        self.journal.lock().clone()
    }
}

#[async_trait]
impl Engine for RecordingEngine {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn connect(&self) -> Result<Box<dyn Session>> {
        let inner = self.inner.connect().await?;
        Ok(Box::new(RecordingSession {
            inner,
            journal: self.journal.clone(),
        }))
    }

    async fn register_buffer(&self, virtual_path: &str, bytes: &[u8]) -> Result<String> {
        self.inner.register_buffer(virtual_path, bytes).await
    }
}

struct RecordingSession {
    inner: Box<dyn Session>,
    journal: Arc<Mutex<Vec<ExecutedStatement>>>,
}

#[async_trait]
impl Session for RecordingSession {
    async fn query(&mut self, sql: &str) -> Result<TabularResult> {
        let outcome = self.inner.query(sql).await;
        self.journal.lock().push(ExecutedStatement {
            sql: sql.to_string(),
            succeeded: outcome.is_ok(),
        });
        outcome
    }

    async fn close(&mut self) -> Result<()> {
        self.inner.close().await
    }
}

/// An event pushed to a [`RecordingSink`].
#[derive(Debug, Clone, PartialEq)]
pub enum SinkEvent {
    /// A query result grid.
    Result {
        /// Query text.
        sql: String,
        /// Rendered result.
        result: TabularResult,
    },
    /// A catalog listing.
    Catalog(CatalogView),
    /// A query error.
    Error {
        /// Query text.
        sql: String,
        /// Error message.
        message: String,
    },
    /// A status message.
    Notice(String),
}

/// Presentation sink that keeps every event for later assertions.
#[derive(Default)]
pub struct RecordingSink {
    events: Mutex<Vec<SinkEvent>>,
}

impl RecordingSink {
    /// An empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// All events in order.
    pub fn events(&self) -> Vec<SinkEvent> {
        self.events.lock().clone()
    }

    /// The most recent catalog pushed, if any.
    pub fn last_catalog(&self) -> Option<CatalogView> {
        self.events.lock().iter().rev().find_map(|e| match e {
            SinkEvent::Catalog(view) => Some(view.clone()),
            _ => None,
        })
    }

    /// Every error message pushed.
    pub fn errors(&self) -> Vec<String> {
        self.events
            .lock()
            .iter()
            .filter_map(|e| match e {
                SinkEvent::Error { message, .. } => Some(message.clone()),
                _ => None,
            })
            .collect()
    }
}

impl PresentationSink for RecordingSink {
    fn render_result(&self, sql: &str, result: &TabularResult) {
        self.events.lock().push(SinkEvent::Result {
            sql: sql.to_string(),
            result: result.clone(),
        });
    }

    fn render_catalog(&self, catalog: &CatalogView) {
        self.events.lock().push(SinkEvent::Catalog(catalog.clone()));
    }

    fn render_error(&self, sql: &str, message: &str) {
        self.events.lock().push(SinkEvent::Error {
            sql: sql.to_string(),
            message: message.to_string(),
        });
    }

    fn notify(&self, message: &str) {
        self.events.lock().push(SinkEvent::Notice(message.to_string()));
    }
}

/// Captures `WARN` and above emitted on the current thread while alive.
///
/// Only usable from single-threaded tests (`#[tokio::test]` defaults to a
/// current-thread runtime).
#[cfg(test)]
pub(crate) struct LogCapture {
    buf: Arc<Mutex<Vec<u8>>>,
    _guard: tracing::subscriber::DefaultGuard,
}

#[cfg(test)]
impl LogCapture {
    pub(crate) fn warnings() -> Self {
        let buf = Arc::new(Mutex::new(Vec::new()));
        let sink = buf.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::WARN)
            .with_ansi(false)
            .with_writer(move || CapturedWriter(sink.clone()))
            .finish();
        Self {
            buf,
            _guard: tracing::subscriber::set_default(subscriber),
        }
    }

    pub(crate) fn text(&self) -> String {
        String::from_utf8_lossy(&self.buf.lock()).into_owned()
    }
}

#[cfg(test)]
struct CapturedWriter(Arc<Mutex<Vec<u8>>>);

#[cfg(test)]
impl std::io::Write for CapturedWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}
