use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Output format for query results and listings
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
    Csv,
    Tsv,
}

impl OutputFormat {
    /// Returns the delimiter for CSV/TSV formats
    pub fn delimiter(&self) -> Option<&'static str> {
        match self {
            Self::Csv => Some(","),
            Self::Tsv => Some("\t"),
            _ => None,
        }
    }

    /// Check if this is a delimited format (CSV or TSV)
    pub fn is_delimited(&self) -> bool {
        matches!(self, Self::Csv | Self::Tsv)
    }

    /// Parse a format name as written in a config file (case-insensitive)
    pub fn parse(s: &str) -> Option<Self> {
        <Self as ValueEnum>::from_str(s.trim(), true).ok()
    }
}

/// Parse a `table=source` pair
pub fn parse_table_source(s: &str) -> std::result::Result<(String, String), String> {
    match s.split_once('=') {
        Some((table, source)) if !table.trim().is_empty() && !source.trim().is_empty() => {
            Ok((table.trim().to_string(), source.trim().to_string()))
        }
        _ => Err(format!(
            "Invalid table source '{}'. Expected table=path_or_url",
            s
        )),
    }
}

/// Escape a field for CSV output (handles commas, quotes, newlines)
pub fn csv_escape(field: &str) -> String {
    if field.contains(',') || field.contains('"') || field.contains('\n') || field.contains('\r') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

/// Escape a field for TSV output (replaces tabs and newlines)
pub fn tsv_escape(field: &str) -> String {
    field
        .replace('\t', "\\t")
        .replace('\n', "\\n")
        .replace('\r', "\\r")
}

/// Format fields as a delimited row (CSV or TSV)
pub fn format_delimited_row<S: AsRef<str>>(format: OutputFormat, fields: &[S]) -> String {
    let escaped: Vec<String> = match format {
        OutputFormat::Csv => fields.iter().map(|f| csv_escape(f.as_ref())).collect(),
        OutputFormat::Tsv => fields.iter().map(|f| tsv_escape(f.as_ref())).collect(),
        _ => fields.iter().map(|s| s.as_ref().to_string()).collect(),
    };
    let delimiter = format.delimiter().unwrap_or(",");
    escaped.join(delimiter)
}
