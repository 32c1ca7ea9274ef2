//! Data sources, table specifications and extension requests.
//!
//! These are the values the user input surface constructs per action and
//! the workbench consumes; none of them outlive the operation they feed.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

use crate::error::{Result, WorkbenchError};

/// File name used when a remote URL has no usable last segment.
pub const REMOTE_FALLBACK_NAME: &str = "remote_file";

/// Where the bytes of a table come from.
#[derive(Clone, PartialEq, Eq)]
pub enum DataSource {
    /// An uploaded buffer and the file name it was uploaded under.
    Local {
        /// Original file name (no directories).
        name: String,
        /// File contents.
        bytes: Vec<u8>,
    },
    /// A URL the engine reads directly.
    Remote {
        /// Full URL, used verbatim in the reader call.
        url: String,
    },
}

impl DataSource {
    /// Create a local source from a file name and its contents.
    pub fn local(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        DataSource::Local {
            name: name.into(),
            bytes: bytes.into(),
        }
    }

    /// Create a remote source.
    pub fn remote(url: impl Into<String>) -> Self {
        DataSource::Remote { url: url.into() }
    }

    /// Read a file from disk into a local source named after its last
    /// path component.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| {
                WorkbenchError::invalid_input(format!("'{}' is not a file", path.display()))
            })?;
        let bytes = std::fs::read(path)?;
        Ok(DataSource::local(name, bytes))
    }

    /// File name used to pick the reader and the virtual path.
    pub fn file_name(&self) -> String {
        match self {
            DataSource::Local { name, .. } => name.clone(),
            DataSource::Remote { url } => remote_file_name(url),
        }
    }

    /// Returns `true` for [`DataSource::Remote`].
    pub fn is_remote(&self) -> bool {
        matches!(self, DataSource::Remote { .. })
    }
}

impl fmt::Debug for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataSource::Local { name, bytes } => f
                .debug_struct("Local")
                .field("name", name)
                .field("bytes", &bytes.len())
                .finish(),
            DataSource::Remote { url } => f.debug_struct("Remote").field("url", url).finish(),
        }
    }
}

/// Derive a file name from a URL.
///
/// The query string and fragment are cut, then the last `/` segment is
/// taken; an empty result falls back to [`REMOTE_FALLBACK_NAME`].
///
/// ```
/// use duckpad_engine::source::remote_file_name;
///
/// assert_eq!(remote_file_name("https://host/data.csv?x=1"), "data.csv");
/// assert_eq!(remote_file_name("https://host/"), "remote_file");
/// ```
pub fn remote_file_name(url: &str) -> String {
    let without_query = url.split(['?', '#']).next().unwrap_or_default();
    let last = without_query.rsplit('/').next().unwrap_or_default();
    if last.is_empty() {
        REMOTE_FALLBACK_NAME.to_string()
    } else {
        last.to_string()
    }
}

/// Reader family chosen from the file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    /// Comma-separated values, read with header inference.
    Csv,
    /// Apache Parquet.
    Parquet,
    /// JSON or newline-delimited JSON, schema inferred.
    Json,
    /// Anything else; ingestion creates no table.
    Unknown,
}

impl FileKind {
    /// Classify a file name by its lowercase extension.
    pub fn from_file_name(name: &str) -> Self {
        match name.rsplit_once('.') {
            Some((_, ext)) => Self::from_extension(ext),
            None => FileKind::Unknown,
        }
    }

    /// Classify a bare extension (without the dot).
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_ascii_lowercase().as_str() {
            "csv" => FileKind::Csv,
            "parquet" => FileKind::Parquet,
            "json" => FileKind::Json,
            _ => FileKind::Unknown,
        }
    }
}

impl fmt::Display for FileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FileKind::Csv => "csv",
            FileKind::Parquet => "parquet",
            FileKind::Json => "json",
            FileKind::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

/// Everything needed to turn a source into a table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSpec {
    /// Name of the table to create.
    pub table_name: String,
    /// Where the data comes from.
    pub source: DataSource,
    /// Reader family, derived from the source file name.
    pub file_kind: FileKind,
    /// Extension to provision before reading, if any.
    pub extension: Option<String>,
}

impl TableSpec {
    /// Build a spec, deriving [`FileKind`] from the source file name.
    pub fn new(table_name: impl Into<String>, source: DataSource) -> Self {
        let file_kind = FileKind::from_file_name(&source.file_name());
        Self {
            table_name: table_name.into(),
            source,
            file_kind,
            extension: None,
        }
    }

    /// Attach an extension to provision alongside the ingestion.
    ///
    /// Blank names are ignored.
    pub fn with_extension(mut self, name: impl AsRef<str>) -> Self {
        let name = name.as_ref().trim();
        self.extension = (!name.is_empty()).then(|| name.to_string());
        self
    }

    /// Check the parts that can be validated without an engine.
    pub fn validate(&self) -> Result<()> {
        if self.table_name.trim().is_empty() {
            return Err(WorkbenchError::invalid_input("Please enter a valid table name."));
        }
        if let Some(extension) = &self.extension {
            ExtensionRequest::new(extension)?;
        }
        match &self.source {
            DataSource::Local { name, .. } if name.trim().is_empty() => Err(
                WorkbenchError::invalid_input("Please select a file or enter a file URL."),
            ),
            DataSource::Remote { url } if url.trim().is_empty() => Err(
                WorkbenchError::invalid_input("Please select a file or enter a file URL."),
            ),
            _ => Ok(()),
        }
    }
}

/// A validated request to install/load an extension.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtensionRequest {
    name: String,
}

impl ExtensionRequest {
    /// Trim and validate an extension name.
    ///
    /// Names are interpolated into `INSTALL`/`LOAD` unquoted, so only ASCII
    /// letters, digits and `_` are accepted.
    pub fn new(name: impl AsRef<str>) -> Result<Self> {
        let name = name.as_ref().trim();
        if name.is_empty() {
            return Err(WorkbenchError::invalid_input(
                "Please enter an extension name to load (e.g. httpfs, h3, icu).",
            ));
        }
        if !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(WorkbenchError::invalid_input(format!(
                "Invalid extension name '{}'",
                name
            )));
        }
        Ok(Self {
            name: name.to_string(),
        })
    }

    /// The trimmed extension name.
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for ExtensionRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}
