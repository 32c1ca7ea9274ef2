//! The seam between the workbench and an embedded query engine.
//!
//! The workbench never talks to DuckDB directly: it holds an [`Engine`]
//! and opens one [`Session`] per logical operation. [`crate::duckdb`]
//! provides the production implementation; [`crate::testing`] provides a
//! scripted double for protocol tests.
//!
//! # Stability
//!
//! **Stable** -- Breaking changes only in major versions.

use async_trait::async_trait;

use crate::error::Result;
use crate::result::TabularResult;

/// An embedded, query-capable engine.
///
/// Implementations must be safe to share across threads; individual
/// sessions are owned by exactly one operation at a time.
#[async_trait]
pub trait Engine: Send + Sync {
    /// Short human-readable engine identifier for logs.
    fn name(&self) -> &str;

    /// Open a new connection to the engine.
    async fn connect(&self) -> Result<Box<dyn Session>>;

    /// Make `bytes` readable by the engine's path-based readers.
    ///
    /// `virtual_path` is the path the caller would like to use (e.g.
    /// `/sales.parquet`). The returned string is the path statements must
    /// reference; engines backed by a real filesystem may stage the buffer
    /// elsewhere and return that location instead. Registrations are never
    /// removed and live as long as the engine.
    async fn register_buffer(&self, virtual_path: &str, bytes: &[u8]) -> Result<String>;
}

/// One connection to an [`Engine`].
#[async_trait]
pub trait Session: Send {
    /// Execute a single statement and collect its result.
    async fn query(&mut self, sql: &str) -> Result<TabularResult>;

    /// Close the connection. Called exactly once by the session scope.
    async fn close(&mut self) -> Result<()>;
}
