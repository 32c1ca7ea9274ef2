//! The presentation sink the workbench pushes data into.
//!
//! The core never inspects rendering state; it only hands over result
//! grids, catalog snapshots and error text.

use crate::catalog::CatalogView;
use crate::result::TabularResult;

/// Receives everything the workbench wants shown to the user.
pub trait PresentationSink: Send + Sync {
    /// Show the result of a user query.
    fn render_result(&self, sql: &str, result: &TabularResult);

    /// Show the current catalog. Implementations decide visibility from
    /// [`CatalogView::state`].
    fn render_catalog(&self, catalog: &CatalogView);

    /// Show a failed user query.
    fn render_error(&self, sql: &str, message: &str);

    /// Show a status message (extension loaded, table created, ...).
    fn notify(&self, _message: &str) {}
}

/// A sink that discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl PresentationSink for NullSink {
    fn render_result(&self, _sql: &str, _result: &TabularResult) {}

    fn render_catalog(&self, _catalog: &CatalogView) {}

    fn render_error(&self, _sql: &str, _message: &str) {}
}
