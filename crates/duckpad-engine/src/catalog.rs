//! Catalog sync: the live set of user tables.
//!
//! The catalog is never cached. Every refresh re-queries engine metadata for
//! schema `main` and keeps the engine's own ordering.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Result;
use crate::result::{display_value, TabularResult};
use crate::session::SessionHandle;
use crate::statements::{CATALOG_COLUMN, CATALOG_QUERY};

/// Whether any user table exists.
///
/// This classification, not the raw count, is what the presentation layer
/// keys its visibility on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CatalogState {
    /// No user tables.
    Empty,
    /// At least one user table.
    NonEmpty,
}

/// A snapshot of the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogView {
    /// Table names in engine metadata order.
    pub table_names: Vec<String>,

    /// The raw listing, as rendered in the tables grid.
    pub listing: TabularResult,
}

impl CatalogView {
    /// Build a view from the catalog query result.
    ///
    /// Names come from the `TABLES` column, or the first column when an
    /// engine reports it under another name.
    pub fn from_listing(listing: TabularResult) -> Self {
        let table_names = listing.column_text(CATALOG_COLUMN).unwrap_or_else(|| {
            listing
                .rows
                .iter()
                .filter_map(|row| row.values.first().map(display_value))
                .collect()
        });
        Self {
            table_names,
            listing,
        }
    }

    /// Empty vs non-empty classification.
    pub fn state(&self) -> CatalogState {
        if self.table_names.is_empty() {
            CatalogState::Empty
        } else {
            CatalogState::NonEmpty
        }
    }

    /// Returns `true` if `name` is a known table.
    pub fn contains(&self, name: &str) -> bool {
        self.table_names.iter().any(|t| t == name)
    }

    /// Number of tables.
    pub fn len(&self) -> usize {
        self.table_names.len()
    }

    /// Returns `true` when there are no tables.
    pub fn is_empty(&self) -> bool {
        self.table_names.is_empty()
    }
}

/// Re-derive the catalog through an open session.
pub async fn refresh_catalog(session: &SessionHandle) -> Result<CatalogView> {
    let listing = session.query(CATALOG_QUERY).await?;
    let view = CatalogView::from_listing(listing);
    debug!(tables = view.len(), state = ?view.state(), "Catalog refreshed");
    Ok(view)
}
