//! Tabular results returned by engine sessions.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// The result of executing one statement.
///
/// Column names keep the order the engine declared them in; each row holds
/// one JSON-encoded value per column.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TabularResult {
    /// Column names in the result set.
    pub columns: Vec<String>,

    /// Rows returned by the statement.
    pub rows: Vec<ResultRow>,
}

/// A single row in a result set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultRow {
    /// Column values encoded as JSON.
    pub values: Vec<JsonValue>,
}

impl TabularResult {
    /// Build a result from column names and raw rows.
    pub fn new(columns: Vec<String>, rows: Vec<Vec<JsonValue>>) -> Self {
        Self {
            columns,
            rows: rows.into_iter().map(|values| ResultRow { values }).collect(),
        }
    }

    /// A result with no columns and no rows (DDL-style statements).
    pub fn empty() -> Self {
        Self::default()
    }

    /// Number of rows.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Number of columns.
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Returns `true` when there are no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Collect every value of the named column as display text.
    pub fn column_text(&self, name: &str) -> Option<Vec<String>> {
        let idx = self
            .columns
            .iter()
            .position(|c| c.eq_ignore_ascii_case(name))?;
        Some(
            self.rows
                .iter()
                .map(|row| row.values.get(idx).map(display_value).unwrap_or_default())
                .collect(),
        )
    }
}

impl ResultRow {
    /// Render each value of the row as display text.
    pub fn texts(&self) -> Vec<String> {
        self.values.iter().map(display_value).collect()
    }
}

/// Render a JSON cell the way a grid shows it: strings unquoted,
/// `NULL` for nulls, compact JSON for everything else.
pub fn display_value(value: &JsonValue) -> String {
    match value {
        JsonValue::Null => "NULL".to_string(),
        JsonValue::String(s) => s.clone(),
        other => other.to_string(),
    }
}
