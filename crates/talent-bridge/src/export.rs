//! CSV rendering of dashboard lists.

use chrono::NaiveDate;
use serde::Serialize;
use serde_json::{Map, Value};

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("row could not be serialized: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("export rows must serialize to JSON objects")]
    NotAnObject,
    #[error("csv writer failed: {0}")]
    Csv(#[from] csv::Error),
    #[error("csv output was not valid UTF-8")]
    Utf8(#[from] std::string::FromUtf8Error),
}

impl<W> From<csv::IntoInnerError<W>> for ExportError {
    fn from(err: csv::IntoInnerError<W>) -> Self {
        ExportError::Csv(csv::Error::from(err.into_error()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CsvExport {
    pub filename: String,
    pub content: String,
    pub rows: usize,
}

pub fn export_filename(stem: &str, date: NaiveDate) -> String {
    format!("{stem}-{}.csv", date.format("%Y-%m-%d"))
}

/// Render `rows` as CSV, or `None` when there is nothing to export.
///
/// The header is the field order of the first row. Quoting follows the JSON
/// type of each value, not how the text looks: strings, lists and nested
/// objects are quoted with embedded quotes doubled, numbers and booleans are
/// written bare, and a missing value is an empty unquoted cell. Lists are
/// joined with `; ` and nested objects are written as JSON.
pub fn export_csv<T: Serialize>(
    rows: &[T],
    stem: &str,
    date: NaiveDate,
) -> Result<Option<CsvExport>, ExportError> {
    let Some(first) = rows.first() else {
        return Ok(None);
    };
    let header: Vec<String> = as_object(serde_json::to_value(first)?)?
        .keys()
        .cloned()
        .collect();

    let mut header_writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .quote_style(csv::QuoteStyle::Necessary)
        .from_writer(Vec::new());
    header_writer.write_record(&header)?;
    let buffer = header_writer.into_inner()?;

    // Cells arrive already quoted, so the writer must not quote again.
    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .quote_style(csv::QuoteStyle::Never)
        .from_writer(buffer);
    for row in rows {
        let fields = as_object(serde_json::to_value(row)?)?;
        let record: Vec<String> = header
            .iter()
            .map(|key| cell(fields.get(key).unwrap_or(&Value::Null)))
            .collect();
        writer.write_record(&record)?;
    }

    let content = String::from_utf8(writer.into_inner()?)?;
    Ok(Some(CsvExport {
        filename: export_filename(stem, date),
        content,
        rows: rows.len(),
    }))
}

fn as_object(value: Value) -> Result<Map<String, Value>, ExportError> {
    match value {
        Value::Object(fields) => Ok(fields),
        _ => Err(ExportError::NotAnObject),
    }
}

fn cell(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(flag) => flag.to_string(),
        Value::Number(number) => number.to_string(),
        Value::String(text) => quoted(text),
        Value::Array(items) => quoted(
            &items
                .iter()
                .map(plain_text)
                .collect::<Vec<_>>()
                .join("; "),
        ),
        Value::Object(_) => quoted(&value.to_string()),
    }
}

fn plain_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

fn quoted(text: &str) -> String {
    format!("\"{}\"", text.replace('"', "\"\""))
}
