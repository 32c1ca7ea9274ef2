//! Ingestion resolver: turns a [`TableSpec`] into a `CREATE TABLE ... AS`.
//!
//! Local buffers and remote URLs share one path: each source is reduced to
//! a readable path first, so the table-creation statement is built the same
//! way for both.

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, info, warn};

use crate::engine::Engine;
use crate::error::Result;
use crate::provision::{ExtensionProvisioner, ProvisionOutcome};
use crate::session::SessionHandle;
use crate::source::{DataSource, FileKind, TableSpec};
use crate::statements;

/// A best-effort step that failed without stopping the ingestion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IngestWarning {
    /// The extension requested alongside the ingestion could not be loaded.
    ExtensionNotLoaded {
        /// Requested extension.
        name: String,
        /// Last error reported by the provisioner.
        error: String,
    },
    /// The network extension failed to load; the remote read will likely
    /// fail.
    NetworkExtensionUnavailable {
        /// Network extension name.
        extension: String,
        /// Load error.
        error: String,
    },
}

impl fmt::Display for IngestWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IngestWarning::ExtensionNotLoaded { name, error } => {
                write!(f, "Extension '{}' was not loaded: {}", name, error)
            }
            IngestWarning::NetworkExtensionUnavailable { extension, error } => write!(
                f,
                "Network extension '{}' unavailable, remote read may fail: {}",
                extension, error
            ),
        }
    }
}

/// How the ingestion ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum IngestStatus {
    /// The table was created by `statement`.
    Created {
        /// The `CREATE TABLE ... AS` that ran.
        statement: String,
    },
    /// No reader exists for the file; nothing was created.
    UnsupportedFileType {
        /// Extension of the source file name (may be empty).
        extension: String,
    },
}

/// Everything the resolver did for one [`TableSpec`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestReport {
    /// Target table.
    pub table_name: String,
    /// Source file name (derived from the URL for remote sources).
    pub file_name: String,
    /// Reader family.
    pub file_kind: FileKind,
    /// Path handed to the reader.
    pub source_path: String,
    /// Final status.
    pub status: IngestStatus,
    /// Best-effort failures, in the order they happened.
    pub warnings: Vec<IngestWarning>,
}

impl IngestReport {
    /// Returns `true` if a table was created.
    pub fn created(&self) -> bool {
        matches!(self.status, IngestStatus::Created { .. })
    }

    /// The statement that created the table, if any.
    pub fn statement(&self) -> Option<&str> {
        match &self.status {
            IngestStatus::Created { statement } => Some(statement),
            IngestStatus::UnsupportedFileType { .. } => None,
        }
    }
}

/// Virtual path a local buffer is registered under.
pub fn virtual_path(file_name: &str) -> String {
    format!("/{}", file_name)
}

fn file_extension(file_name: &str) -> String {
    file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default()
}

/// Runs the ingestion steps inside an already open session.
#[derive(Debug, Clone, Default)]
pub struct IngestionResolver {
    provisioner: ExtensionProvisioner,
}

impl IngestionResolver {
    /// Create a resolver that provisions extensions with `provisioner`.
    pub fn new(provisioner: ExtensionProvisioner) -> Self {
        Self { provisioner }
    }

    /// Ingest `spec` through `session`.
    ///
    /// `spec` must already be validated. Extension problems become
    /// warnings; only a rejected `CREATE TABLE` fails the call.
    pub async fn ingest(
        &self,
        engine: &dyn Engine,
        session: &SessionHandle,
        spec: &TableSpec,
    ) -> Result<IngestReport> {
        let mut warnings = Vec::new();

        if let Some(extension) = &spec.extension {
            if let ProvisionOutcome::Failed { last_error, .. } =
                self.provisioner.provision(session, extension).await
            {
                warn!(table = %spec.table_name, extension = %extension, "Continuing ingestion without extension");
                warnings.push(IngestWarning::ExtensionNotLoaded {
                    name: extension.clone(),
                    error: last_error,
                });
            }
        }

        let file_name = spec.source.file_name();
        let source_path = match &spec.source {
            DataSource::Remote { url } => {
                if let Err(e) = self.provisioner.load_network_extension(session).await {
                    let extension = self.provisioner.config().network_extension.clone();
                    warn!(url = %url, extension = %extension, error = %e, "Remote read without network extension");
                    warnings.push(IngestWarning::NetworkExtensionUnavailable {
                        extension,
                        error: e.to_string(),
                    });
                }
                url.clone()
            }
            DataSource::Local { bytes, .. } => {
                let path = engine
                    .register_buffer(&virtual_path(&file_name), bytes)
                    .await?;
                debug!(file = %file_name, path = %path, bytes = bytes.len(), "Registered local buffer");
                path
            }
        };

        let Some(statement) =
            statements::create_table_as(&spec.table_name, spec.file_kind, &source_path)
        else {
            let extension = file_extension(&file_name);
            info!(table = %spec.table_name, file = %file_name, "Unsupported file type, no table created");
            return Ok(IngestReport {
                table_name: spec.table_name.clone(),
                file_name,
                file_kind: spec.file_kind,
                source_path,
                status: IngestStatus::UnsupportedFileType { extension },
                warnings,
            });
        };

        if let Err(e) = session.query(&statement).await {
            warn!(
                table = %spec.table_name,
                path = %source_path,
                error = %e,
                "Failed to create table"
            );
            return Err(e);
        }
        info!(table = %spec.table_name, kind = %spec.file_kind, "Table created");

        Ok(IngestReport {
            table_name: spec.table_name.clone(),
            file_name,
            file_kind: spec.file_kind,
            source_path,
            status: IngestStatus::Created { statement },
            warnings,
        })
    }
}
