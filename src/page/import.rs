//! Tabular data import
//!
//! Two shapes of table feed field values into a page:
//!
//! - key/value rows: every row names a field in its `key` column and the
//!   value in its `value` column
//! - header-aligned rows: each header names a field, and every row's cell
//!   under that header is applied to it
//!
//! Header-aligned import walks headers in the outer loop and rows in the inner
//! loop. With several rows the same field is set once per row, so the last
//! row's value is the one left in the field.

use std::collections::HashMap;

use super::error::PageError;

/// Column naming the target field in key/value imports
pub const IMPORT_KEY: &str = "key";

/// Column holding the value in key/value imports
pub const IMPORT_VALUE: &str = "value";

/// One record of column name to value
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportRow {
    cells: HashMap<String, String>,
}

impl ImportRow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style cell insertion
    #[must_use]
    pub fn with(mut self, column: impl Into<String>, value: impl Into<String>) -> Self {
        self.cells.insert(column.into(), value.into());
        self
    }

    /// A key/value row
    pub fn key_value(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new().with(IMPORT_KEY, key).with(IMPORT_VALUE, value)
    }

    pub fn get(&self, column: &str) -> Option<&str> {
        self.cells.get(column).map(String::as_str)
    }

    /// Value of `column`, or `MissingColumn`
    pub fn require(&self, column: &str) -> Result<&str, PageError> {
        self.get(column).ok_or_else(|| PageError::MissingColumn {
            column: column.to_string(),
        })
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

impl From<HashMap<String, String>> for ImportRow {
    fn from(cells: HashMap<String, String>) -> Self {
        Self { cells }
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for ImportRow {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            cells: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// A `|`-delimited table: one header line followed by data lines
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportTable {
    pub headers: Vec<String>,
    pub rows: Vec<ImportRow>,
}

#[derive(Debug, thiserror::Error)]
pub enum TableError {
    #[error("Table has no header line")]
    MissingHeader,

    #[error("Table line {line} has {found} cells, expected {expected}")]
    CellCount {
        line: usize,
        found: usize,
        expected: usize,
    },
}

impl ImportTable {
    /// Parse table lines such as `| key | value |`.
    ///
    /// The first line holds the headers. Cells are trimmed; the leading and
    /// trailing pipes are optional.
    pub fn parse<'a>(lines: impl IntoIterator<Item = &'a str>) -> Result<Self, TableError> {
        let mut lines = lines.into_iter().map(split_cells);
        let headers = lines.next().ok_or(TableError::MissingHeader)?;

        let mut rows: Vec<ImportRow> = Vec::new();
        for (index, cells) in lines.enumerate() {
            if cells.len() != headers.len() {
                return Err(TableError::CellCount {
                    line: index + 2,
                    found: cells.len(),
                    expected: headers.len(),
                });
            }
            rows.push(headers.iter().cloned().zip(cells).collect());
        }

        Ok(Self { headers, rows })
    }
}

fn split_cells(line: &str) -> Vec<String> {
    let line = line.trim();
    let line = line.strip_prefix('|').unwrap_or(line);
    let line = line.strip_suffix('|').unwrap_or(line);
    line.split('|').map(|cell| cell.trim().to_string()).collect()
}
