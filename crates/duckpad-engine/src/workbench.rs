//! The process-wide workbench context.
//!
//! A [`Workbench`] is created once at startup, bootstrapped with an engine
//! once that engine is open, and then passed by reference to every action.
//! Until [`Workbench::bootstrap`] has run, every action fails with
//! [`WorkbenchError::EngineNotReady`] without touching anything.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use duckpad_engine::{NullSink, ProvisionerConfig, Workbench, WorkbenchError};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let workbench = Workbench::new(ProvisionerConfig::default(), Arc::new(NullSink));
//! assert!(!workbench.is_ready());
//! assert!(matches!(
//!     workbench.run_query("SELECT 1").await,
//!     Err(WorkbenchError::EngineNotReady)
//! ));
//! # }
//! ```

use std::future::Future;
use std::sync::{Arc, OnceLock};

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::catalog::{self, CatalogView};
use crate::engine::Engine;
use crate::error::{Result, WorkbenchError};
use crate::ingest::{IngestReport, IngestStatus, IngestionResolver};
use crate::provision::{ExtensionProvisioner, ProvisionOutcome, ProvisionerConfig};
use crate::result::TabularResult;
use crate::session::{scoped, SessionHandle};
use crate::sink::PresentationSink;
use crate::source::{ExtensionRequest, TableSpec};

/// A successful user query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryOutcome {
    /// The statement as executed (trimmed).
    pub sql: String,
    /// Result grid.
    pub result: TabularResult,
    /// Catalog after the query, `None` if the refresh failed.
    pub catalog: Option<CatalogView>,
}

/// Explicit context shared by every top-level action.
pub struct Workbench {
    engine: OnceLock<Arc<dyn Engine>>,
    provisioner: ExtensionProvisioner,
    resolver: IngestionResolver,
    sink: Arc<dyn PresentationSink>,
}

impl Workbench {
    /// Create a workbench with no engine yet.
    pub fn new(config: ProvisionerConfig, sink: Arc<dyn PresentationSink>) -> Self {
        let provisioner = ExtensionProvisioner::new(config);
        Self {
            engine: OnceLock::new(),
            resolver: IngestionResolver::new(provisioner.clone()),
            provisioner,
            sink,
        }
    }

    /// Install the engine. Only the first call succeeds.
    pub fn bootstrap(&self, engine: Arc<dyn Engine>) -> Result<()> {
        let name = engine.name().to_string();
        self.engine.set(engine).map_err(|_| {
            WorkbenchError::Config("Workbench engine is already initialized".to_string())
        })?;
        info!(engine = %name, "Workbench ready");
        Ok(())
    }

    /// Returns `true` once an engine has been bootstrapped.
    pub fn is_ready(&self) -> bool {
        self.engine.get().is_some()
    }

    /// The bootstrapped engine.
    pub fn engine(&self) -> Result<&Arc<dyn Engine>> {
        self.engine.get().ok_or(WorkbenchError::EngineNotReady)
    }

    /// Run `op` in a fresh session that is closed afterwards.
    pub async fn with_session<T, F, Fut>(&self, op: F) -> Result<T>
    where
        F: FnOnce(SessionHandle) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let engine = self.engine()?;
        scoped(engine.as_ref(), op).await
    }

    /// Create a table from `spec`.
    ///
    /// Input is validated before the engine is consulted. On success the
    /// catalog is refreshed and pushed to the sink; a failed refresh is only
    /// logged.
    pub async fn ingest(&self, spec: TableSpec) -> Result<IngestReport> {
        spec.validate()?;
        let engine = self.engine()?;
        let resolver = &self.resolver;

        let (report, catalog) = self
            .with_session(|session| async move {
                let report = resolver.ingest(engine.as_ref(), &session, &spec).await?;
                let catalog = if report.created() {
                    refresh_quietly(&session).await
                } else {
                    None
                };
                Ok((report, catalog))
            })
            .await?;

        for warning in &report.warnings {
            self.sink.notify(&warning.to_string());
        }
        match &report.status {
            IngestStatus::Created { .. } => {
                self.sink
                    .notify(&format!("Table '{}' created", report.table_name));
            }
            IngestStatus::UnsupportedFileType { extension } => {
                let unsupported = WorkbenchError::UnsupportedFileType(extension.clone());
                self.sink.notify(&unsupported.to_string());
            }
        }
        if let Some(catalog) = &catalog {
            self.sink.render_catalog(catalog);
        }
        Ok(report)
    }

    /// Install and load an extension through the four-tier protocol.
    pub async fn load_extension(&self, request: &ExtensionRequest) -> Result<ProvisionOutcome> {
        let provisioner = &self.provisioner;
        let name = request.name();
        let outcome = self
            .with_session(|session| async move { Ok(provisioner.provision(&session, name).await) })
            .await?
            .into_result(name)?;

        if let Some(via) = outcome.via() {
            self.sink
                .notify(&format!("Extension '{}' loaded ({})", name, via));
        }
        Ok(outcome)
    }

    /// Re-derive the catalog and push it to the sink.
    pub async fn refresh_catalog(&self) -> Result<CatalogView> {
        let view = self
            .with_session(|session| async move { catalog::refresh_catalog(&session).await })
            .await?;
        self.sink.render_catalog(&view);
        Ok(view)
    }

    /// Run a user query, then refresh the catalog.
    ///
    /// The result and the catalog go to the sink. A rejected statement is
    /// pushed to the sink as an error and also returned.
    pub async fn run_query(&self, sql: &str) -> Result<QueryOutcome> {
        let sql = sql.trim();
        if sql.is_empty() {
            return Err(WorkbenchError::invalid_input("Please enter a SQL query."));
        }
        self.engine()?;

        let executed = self
            .with_session(|session| async move {
                let result = session.query(sql).await?;
                let catalog = refresh_quietly(&session).await;
                Ok((result, catalog))
            })
            .await;

        match executed {
            Ok((result, catalog)) => {
                debug!(
                    rows = result.row_count(),
                    columns = result.column_count(),
                    "Query finished"
                );
                self.sink.render_result(sql, &result);
                if let Some(catalog) = &catalog {
                    self.sink.render_catalog(catalog);
                }
                Ok(QueryOutcome {
                    sql: sql.to_string(),
                    result,
                    catalog,
                })
            }
            Err(e) => {
                warn!(sql = %sql, error = %e, "Query failed");
                self.sink.render_error(sql, &e.to_string());
                Err(e)
            }
        }
    }
}

async fn refresh_quietly(session: &SessionHandle) -> Option<CatalogView> {
    match catalog::refresh_catalog(session).await {
        Ok(view) => Some(view),
        Err(e) => {
            warn!(error = %e, "Failed to refresh catalog");
            None
        }
    }
}
