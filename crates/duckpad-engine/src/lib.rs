//! Embedded data workbench core for duckpad (DuckDB-powered ingestion and SQL).
//!
//! This crate is a workspace member that isolates the heavy `duckdb` (bundled C++)
//! dependency into its own compilation unit, preventing recompilation of DuckDB
//! when unrelated CLI code changes.
//!
//! # Stability
//!
//! **Stable** -- Breaking changes only in major versions.
//!
//! # Overview
//!
//! The workbench turns user-supplied files and URLs into queryable tables:
//!
//! 1. A [`TableSpec`] names the table and its [`DataSource`].
//! 2. The [`IngestionResolver`] reduces the source to a readable path and
//!    emits one `CREATE TABLE ... AS FROM <reader>(...)` statement.
//! 3. The [`ExtensionProvisioner`] loads extensions through an ordered
//!    four-tier fallback protocol.
//! 4. Catalog sync re-derives the table list after every mutation and hands
//!    it to a [`PresentationSink`].
//!
//! Every statement runs inside a scoped session that is closed on all exit
//! paths (see [`session::scoped`]).
//!
//! # Modules
//!
//! - [`engine`] -- `Engine` / `Session` traits.
//! - [`duckdb`] -- DuckDB implementation of the engine seam.
//! - [`session`] -- Scoped session acquisition.
//! - [`source`] -- Data sources, table specs and extension requests.
//! - [`statements`] -- The SQL surface issued to the engine.
//! - [`ingest`] -- Ingestion resolver.
//! - [`provision`] -- Extension provisioner.
//! - [`catalog`] -- Catalog sync.
//! - [`sink`] -- Presentation sink trait.
//! - [`workbench`] -- Process-wide context and top-level actions.
//! - [`testing`] -- Scripted engine and recording sink for tests.

#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

pub mod catalog;
pub mod duckdb;
pub mod engine;
pub mod error;
pub mod ingest;
pub mod provision;
pub mod result;
pub mod session;
pub mod sink;
pub mod source;
pub mod statements;
pub mod testing;
pub mod workbench;

pub use catalog::{CatalogState, CatalogView};
pub use duckdb::{DuckDbEngine, EngineOptions};
pub use engine::{Engine, Session};
pub use error::{Result, WorkbenchError};
pub use ingest::{IngestReport, IngestStatus, IngestWarning, IngestionResolver};
pub use provision::{
    ExtensionProvisioner, ProvisionOutcome, ProvisionerConfig, Repository, Tier, TierAttempt,
};
pub use result::{ResultRow, TabularResult};
pub use session::SessionHandle;
pub use sink::{NullSink, PresentationSink};
pub use source::{DataSource, ExtensionRequest, FileKind, TableSpec};
pub use workbench::{QueryOutcome, Workbench};
