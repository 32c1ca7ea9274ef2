//! Terminal presentation sink.
//!
//! Result grids go to stdout in the configured [`OutputFormat`]; catalog
//! summaries, notices and errors go to stderr so piped output stays clean.

use colored::Colorize;
use comfy_table::{presets::UTF8_FULL_CONDENSED, Cell, Color, ContentArrangement, Table};
use duckpad_engine::result::display_value;
use duckpad_engine::{CatalogState, CatalogView, PresentationSink, TabularResult};
use parking_lot::Mutex;
use serde_json::{Map, Value as JsonValue};
use std::io::Write;

use crate::cli_format::{format_delimited_row, OutputFormat};

/// How catalog pushes are shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CatalogMode {
    /// One line on stderr listing table names.
    #[default]
    Summary,
    /// The full listing, rendered like a query result on stdout.
    Full,
}

type Output = Box<dyn Write + Send>;

/// [`PresentationSink`] that writes to the terminal.
pub struct TerminalSink {
    format: OutputFormat,
    max_rows: usize,
    catalog_mode: Mutex<CatalogMode>,
    out: Mutex<Output>,
    err: Mutex<Output>,
}

impl TerminalSink {
    /// Write to stdout and stderr.
    pub fn new(format: OutputFormat, max_rows: usize) -> Self {
        Self::with_writers(
            format,
            max_rows,
            Box::new(std::io::stdout()),
            Box::new(std::io::stderr()),
        )
    }

    /// Write to the given streams.
    pub fn with_writers(format: OutputFormat, max_rows: usize, out: Output, err: Output) -> Self {
        Self {
            format,
            max_rows,
            catalog_mode: Mutex::new(CatalogMode::default()),
            out: Mutex::new(out),
            err: Mutex::new(err),
        }
    }

    /// Switch how subsequent catalog pushes are shown.
    pub fn set_catalog_mode(&self, mode: CatalogMode) {
        *self.catalog_mode.lock() = mode;
    }

    /// Print a warning line.
    pub fn warn(&self, message: &str) {
        self.write_err(&format!("{} {}", "⚠".yellow(), message));
    }

    /// Print an error line.
    pub fn error(&self, message: &str) {
        self.write_err(&format!("{} {}", "✗".red(), message));
    }

    fn write_out(&self, text: &str) {
        let mut out = self.out.lock();
        // Broken pipes are not worth failing a query over.
        let _ = writeln!(out, "{}", text);
        let _ = out.flush();
    }

    fn write_err(&self, text: &str) {
        let mut err = self.err.lock();
        let _ = writeln!(err, "{}", text);
        let _ = err.flush();
    }
}

impl PresentationSink for TerminalSink {
    fn render_result(&self, _sql: &str, result: &TabularResult) {
        self.write_out(&format_result(self.format, result, self.max_rows));
    }

    fn render_catalog(&self, catalog: &CatalogView) {
        match *self.catalog_mode.lock() {
            CatalogMode::Full => {
                let text = match (self.format, catalog.state()) {
                    (OutputFormat::Text, CatalogState::Empty) => {
                        self.write_err(&format!("{} {}", "ℹ".blue(), "No tables yet"));
                        return;
                    }
                    (OutputFormat::Json, _) => {
                        serde_json::json!({ "tables": catalog.table_names }).to_string()
                    }
                    _ => format_result(self.format, &catalog.listing, self.max_rows),
                };
                self.write_out(&text);
            }
            CatalogMode::Summary => {
                let line = match catalog.state() {
                    CatalogState::Empty => "Tables: none".to_string(),
                    CatalogState::NonEmpty => format!(
                        "Tables ({}): {}",
                        catalog.len(),
                        catalog.table_names.join(", ")
                    ),
                };
                self.write_err(&line.dimmed().to_string());
            }
        }
    }

    fn render_error(&self, _sql: &str, message: &str) {
        self.error(message);
    }

    fn notify(&self, message: &str) {
        self.write_err(&format!("{} {}", "ℹ".blue(), message));
    }
}

/// Render a result in `format`.
pub fn format_result(format: OutputFormat, result: &TabularResult, max_rows: usize) -> String {
    match format {
        OutputFormat::Json => render_json(result).to_string(),
        f if f.is_delimited() => render_delimited(f, result),
        _ => render_grid(result, max_rows),
    }
}

/// A comfy-table grid with at most `max_rows` rows and a row-count footer.
pub fn render_grid(result: &TabularResult, max_rows: usize) -> String {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(
        result
            .columns
            .iter()
            .map(|c| Cell::new(c).fg(Color::Cyan))
            .collect::<Vec<_>>(),
    );

    for row in result.rows.iter().take(max_rows) {
        table.add_row(row.values.iter().map(display_value).collect::<Vec<_>>());
    }

    let total = result.row_count();
    let footer = if total > max_rows {
        format!("({} rows, showing first {})", total, max_rows)
    } else if total == 1 {
        "(1 row)".to_string()
    } else {
        format!("({} rows)", total)
    };
    format!("{}\n{}", table, footer)
}

/// Rows as an array of `{column: value}` objects.
pub fn render_json(result: &TabularResult) -> JsonValue {
    JsonValue::Array(
        result
            .rows
            .iter()
            .map(|row| {
                let object: Map<String, JsonValue> = result
                    .columns
                    .iter()
                    .cloned()
                    .zip(row.values.iter().cloned())
                    .collect();
                JsonValue::Object(object)
            })
            .collect(),
    )
}

/// Header line plus one line per row.
pub fn render_delimited(format: OutputFormat, result: &TabularResult) -> String {
    let mut lines = Vec::with_capacity(result.row_count() + 1);
    lines.push(format_delimited_row(format, &result.columns));
    for row in &result.rows {
        lines.push(format_delimited_row(format, &row.texts()));
    }
    lines.join("\n")
}
