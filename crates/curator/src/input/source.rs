//! Data source abstraction and metadata.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A raw row keyed by column name, in column order.
pub type Record = IndexMap<String, Value>;

/// Metadata about the source data file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceMetadata {
    /// File name without path.
    pub file: String,
    /// Full path to the file.
    pub path: PathBuf,
    /// SHA-256 hash of the file contents.
    pub hash: String,
    /// File size in bytes.
    pub size_bytes: u64,
    /// Detected format (csv, tsv, etc.).
    pub format: String,
    /// Number of data rows (excluding header).
    pub row_count: usize,
    /// Number of columns.
    pub column_count: usize,
    /// When the file was read.
    pub loaded_at: DateTime<Utc>,
}

impl SourceMetadata {
    /// Create metadata for a file that has been read.
    pub fn new(
        path: PathBuf,
        hash: String,
        size_bytes: u64,
        format: String,
        row_count: usize,
        column_count: usize,
    ) -> Self {
        let file = path
            .file_name()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();

        Self {
            file,
            path,
            hash,
            size_bytes,
            format,
            row_count,
            column_count,
            loaded_at: Utc::now(),
        }
    }
}

/// Tabular data, addressable by row and by column.
///
/// `DataTable<Value>` holds raw cells; the curator produces
/// `DataTable<TransformResult>`.
#[derive(Debug, Clone, PartialEq)]
pub struct DataTable<T = Value> {
    /// Column headers.
    pub headers: Vec<String>,
    /// Row data (row-major order).
    pub rows: Vec<Vec<T>>,
}

impl<T> DataTable<T> {
    /// Create a new data table.
    pub fn new(headers: Vec<String>, rows: Vec<Vec<T>>) -> Self {
        Self { headers, rows }
    }

    /// Build a table from column vectors of equal length.
    pub fn from_columns(headers: Vec<String>, columns: Vec<Vec<T>>) -> Self {
        let row_count = columns.first().map_or(0, Vec::len);
        let mut rows: Vec<Vec<T>> = (0..row_count)
            .map(|_| Vec::with_capacity(columns.len()))
            .collect();

        for column in columns {
            for (row, cell) in rows.iter_mut().zip(column) {
                row.push(cell);
            }
        }

        Self { headers, rows }
    }

    /// Get the number of columns.
    pub fn column_count(&self) -> usize {
        self.headers.len()
    }

    /// Get the number of rows (excluding header).
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Position of a column by name.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Get all values for a column by index.
    pub fn column_values(&self, index: usize) -> impl Iterator<Item = Option<&T>> {
        self.rows.iter().map(move |row| row.get(index))
    }

    /// Get a specific cell value.
    pub fn get(&self, row: usize, col: usize) -> Option<&T> {
        self.rows.get(row).and_then(|r| r.get(col))
    }

    /// Replace a cell value, returning false if the cell does not exist.
    pub fn set(&mut self, row: usize, col: usize, value: T) -> bool {
        match self.rows.get_mut(row).and_then(|r| r.get_mut(col)) {
            Some(cell) => {
                *cell = value;
                true
            }
            None => false,
        }
    }

    /// Get one row by index.
    pub fn row(&self, index: usize) -> Option<&[T]> {
        self.rows.get(index).map(Vec::as_slice)
    }
}

impl DataTable<Value> {
    /// Build a table from records; headers are the union of keys in first-seen
    /// order, missing cells are null.
    pub fn from_records(records: &[Record]) -> Self {
        let mut headers: Vec<String> = Vec::new();
        for record in records {
            for key in record.keys() {
                if !headers.contains(key) {
                    headers.push(key.clone());
                }
            }
        }

        let rows = records
            .iter()
            .map(|record| {
                headers
                    .iter()
                    .map(|h| record.get(h).cloned().unwrap_or(Value::Null))
                    .collect()
            })
            .collect();

        Self { headers, rows }
    }

    /// One record per row, keyed by header.
    pub fn records(&self) -> Vec<Record> {
        self.rows
            .iter()
            .map(|row| self.headers.iter().cloned().zip(row.iter().cloned()).collect())
            .collect()
    }

    /// Check if a value represents a missing/null value.
    pub fn is_null_value(value: &str) -> bool {
        let trimmed = value.trim();
        trimmed.is_empty()
            || trimmed.eq_ignore_ascii_case("na")
            || trimmed.eq_ignore_ascii_case("n/a")
            || trimmed.eq_ignore_ascii_case("null")
            || trimmed.eq_ignore_ascii_case("none")
            || trimmed.eq_ignore_ascii_case("nil")
            || trimmed == "."
            || trimmed == "-"
    }
}
