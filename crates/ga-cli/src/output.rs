//! Table and JSON renderers for command output.

use clap::ValueEnum;
use serde_json::{Map, Value};

use crate::error::{CliError, CliResult};
use crate::utils::header_label;
use crate::utils::format::NOT_AVAILABLE;

/// Columns are separated by this many spaces
const COLUMN_GAP: usize = 2;

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

/// One rendered resource: ordered `(key, value)` pairs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Record {
    fields: Vec<(&'static str, String)>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(mut self, key: &'static str, value: impl Into<String>) -> Self {
        self.fields.push((key, value.into()));
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn keys(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.fields.iter().map(|(k, _)| *k)
    }

    fn to_json(&self) -> Value {
        let map: Map<String, Value> = self
            .fields
            .iter()
            .map(|(k, v)| (k.to_string(), Value::String(v.clone())))
            .collect();
        Value::Object(map)
    }
}

/// Render a list of records
pub fn render_list(records: &[Record], format: OutputFormat, title: &str) -> CliResult<String> {
    match format {
        OutputFormat::Json => to_json(&Value::Array(records.iter().map(Record::to_json).collect())),
        OutputFormat::Table => Ok(format_table(records, Some(title))),
    }
}

/// Render a single record (an object in JSON, a one-row table otherwise)
pub fn render_one(record: &Record, format: OutputFormat, title: &str) -> CliResult<String> {
    match format {
        OutputFormat::Json => to_json(&record.to_json()),
        OutputFormat::Table => Ok(format_table(std::slice::from_ref(record), Some(title))),
    }
}

fn to_json(value: &Value) -> CliResult<String> {
    serde_json::to_string_pretty(value)
        .map_err(|err| CliError::failure(anyhow::anyhow!("failed to format JSON: {err}")))
}

/// Plain-text table with left-aligned columns.
///
/// Columns are the union of all record keys in first-seen order; a record
/// without a column shows `N/A` there.
pub fn format_table(records: &[Record], title: Option<&str>) -> String {
    if records.is_empty() {
        return "No results found".to_string();
    }

    let mut columns: Vec<&'static str> = Vec::new();
    for key in records.iter().flat_map(Record::keys) {
        if !columns.contains(&key) {
            columns.push(key);
        }
    }

    let headers: Vec<String> = columns.iter().map(|key| header_label(key)).collect();
    let rows: Vec<Vec<&str>> = records
        .iter()
        .map(|record| {
            columns
                .iter()
                .map(|key| record.get(key).unwrap_or(NOT_AVAILABLE))
                .collect()
        })
        .collect();

    let widths: Vec<usize> = headers
        .iter()
        .enumerate()
        .map(|(i, header)| {
            rows.iter()
                .map(|row| row[i].chars().count())
                .chain(std::iter::once(header.chars().count()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let mut lines = Vec::with_capacity(rows.len() + 3);
    if let Some(title) = title {
        lines.push(title.to_string());
    }
    let header_cells: Vec<&str> = headers.iter().map(String::as_str).collect();
    lines.push(format_row(&header_cells, &widths));
    lines.push(
        widths
            .iter()
            .map(|w| "-".repeat(*w))
            .collect::<Vec<_>>()
            .join(&" ".repeat(COLUMN_GAP)),
    );
    for row in &rows {
        lines.push(format_row(row, &widths));
    }

    lines.join("\n")
}

fn format_row(cells: &[&str], widths: &[usize]) -> String {
    let padded: Vec<String> = cells
        .iter()
        .zip(widths)
        .map(|(cell, width)| format!("{:<width$}", cell, width = *width))
        .collect();
    padded.join(&" ".repeat(COLUMN_GAP)).trim_end().to_string()
}
