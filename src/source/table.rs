//! Flat tables with named columns, as read from CSV feeds.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::errors::BoardError;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    /// Parse CSV text. The first record is the header row; ragged rows are
    /// accepted and short rows read as empty cells.
    pub fn from_csv(text: &str) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(text.as_bytes());

        let mut records = reader.records();
        let headers = match records.next() {
            Some(first) => first
                .context("reading header row")?
                .iter()
                .map(|h| h.trim().to_string())
                .collect(),
            None => return Ok(Table::default()),
        };

        let mut rows = Vec::new();
        for (i, record) in records.enumerate() {
            let record = record.with_context(|| format!("reading row {}", i + 2))?;
            rows.push(record.iter().map(str::to_string).collect());
        }

        Ok(Table { headers, rows })
    }

    /// Index of the first header matching any alias, compared trimmed and
    /// case-insensitively.
    pub fn column(&self, aliases: &[&str]) -> Option<usize> {
        let wanted: Vec<String> = aliases.iter().map(|a| normalize_header(a)).collect();
        self.headers
            .iter()
            .position(|h| wanted.contains(&normalize_header(h)))
    }

    pub fn require_column(&self, name: &str, aliases: &[&str]) -> Result<usize, BoardError> {
        self.column(aliases).ok_or_else(|| {
            BoardError::DataSourceUnavailable(format!("missing required column '{}'", name))
        })
    }
}

fn normalize_header(header: &str) -> String {
    header.trim().to_lowercase()
}

/// Cell accessor that treats missing cells and missing columns as empty.
pub fn cell(row: &[String], col: Option<usize>) -> &str {
    col.and_then(|c| row.get(c)).map(String::as_str).unwrap_or("")
}
