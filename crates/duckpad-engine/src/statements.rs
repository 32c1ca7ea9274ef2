//! The statement surface issued to the engine.
//!
//! Every SQL string the workbench sends (other than user queries) is built
//! here so its exact shape stays in one place.

use crate::source::FileKind;

/// Lists user tables in engine metadata order.
pub const CATALOG_QUERY: &str =
    "SELECT table_name AS TABLES FROM information_schema.tables WHERE table_schema = 'main'";

/// Column name the catalog query exposes.
pub const CATALOG_COLUMN: &str = "TABLES";

/// Quote a value as a single-quoted SQL literal, doubling embedded quotes.
pub fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// Build the reader call for a file kind, or `None` for [`FileKind::Unknown`].
pub fn reader_call(kind: FileKind, path: &str) -> Option<String> {
    let path = quote_literal(path);
    match kind {
        FileKind::Csv => Some(format!("read_csv_auto({}, header = true)", path)),
        FileKind::Parquet => Some(format!("read_parquet({})", path)),
        FileKind::Json => Some(format!("read_json_auto({})", path)),
        FileKind::Unknown => None,
    }
}

/// `CREATE TABLE '<name>' AS FROM <reader>(<path>, ...)`.
pub fn create_table_as(table_name: &str, kind: FileKind, path: &str) -> Option<String> {
    reader_call(kind, path)
        .map(|reader| format!("CREATE TABLE {} AS FROM {}", quote_literal(table_name), reader))
}

/// `INSTALL <ext> FROM '<repo>'`.
pub fn install_from(extension: &str, repository_url: &str) -> String {
    format!("INSTALL {} FROM {}", extension, quote_literal(repository_url))
}

/// `INSTALL <ext>` using the engine's default repository resolution.
pub fn install(extension: &str) -> String {
    format!("INSTALL {}", extension)
}

/// `LOAD <ext>`.
pub fn load(extension: &str) -> String {
    format!("LOAD {}", extension)
}
