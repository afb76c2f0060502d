//! CSV/TSV reader producing raw tables for the curator.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use serde_json::Value;
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::error::{CuratorError, Result};

use super::source::{DataTable, Record, SourceMetadata};

/// Delimiters to try when auto-detecting.
const DELIMITERS: &[u8] = &[b'\t', b',', b';', b'|'];

/// Lines sampled for delimiter detection.
const SAMPLE_LINES: usize = 10;

/// Parser configuration.
#[derive(Debug, Clone)]
pub struct ParserConfig {
    /// Delimiter to use (None = auto-detect).
    pub delimiter: Option<u8>,
    /// Whether the file has a header row.
    pub has_header: bool,
    /// Maximum rows to read (None = all).
    pub max_rows: Option<usize>,
    /// Quote character.
    pub quote: u8,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            delimiter: None,
            has_header: true,
            max_rows: None,
            quote: b'"',
        }
    }
}

/// Reads delimited text into a [`DataTable`] of string cells.
pub struct Parser {
    config: ParserConfig,
}

impl Parser {
    /// Create a new parser with default configuration.
    pub fn new() -> Self {
        Self::with_config(ParserConfig::default())
    }

    /// Create a parser with custom configuration.
    pub fn with_config(config: ParserConfig) -> Self {
        Self { config }
    }

    /// Parse a file and return the data table and metadata.
    pub fn parse_file(&self, path: impl AsRef<Path>) -> Result<(DataTable, SourceMetadata)> {
        let path = path.as_ref();
        let contents = fs::read(path).map_err(|e| CuratorError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        let hash = format!("sha256:{:x}", Sha256::digest(&contents));
        let delimiter = match self.config.delimiter {
            Some(d) => d,
            None => detect_delimiter(&contents)?,
        };
        let table = self.parse_bytes(&contents, delimiter)?;

        let format = match delimiter {
            b'\t' => "tsv",
            b',' => "csv",
            b';' => "csv-semicolon",
            b'|' => "psv",
            _ => "delimited",
        };
        let metadata = SourceMetadata::new(
            path.to_path_buf(),
            hash,
            contents.len() as u64,
            format.to_string(),
            table.row_count(),
            table.column_count(),
        );

        debug!(
            file = %metadata.file,
            rows = metadata.row_count,
            columns = metadata.column_count,
            format = %metadata.format,
            "parsed data file"
        );

        Ok((table, metadata))
    }

    /// Parse a file straight into records keyed by header.
    pub fn parse_records(&self, path: impl AsRef<Path>) -> Result<Vec<Record>> {
        let (table, _) = self.parse_file(path)?;
        Ok(table.records())
    }

    /// Parse bytes with a known delimiter.
    ///
    /// Short rows are padded with empty strings and long rows truncated to the
    /// header width.
    pub fn parse_bytes(&self, bytes: &[u8], delimiter: u8) -> Result<DataTable> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(false)
            .quote(self.config.quote)
            .flexible(true)
            .from_reader(bytes);

        let mut records = reader.records();
        let mut headers: Option<Vec<String>> = None;
        if self.config.has_header {
            match records.next() {
                Some(record) => headers = Some(record?.iter().map(str::to_string).collect()),
                None => return Err(CuratorError::EmptyData("No header row found".to_string())),
            }
        }
        if let Some(names) = &headers {
            let mut seen = HashSet::with_capacity(names.len());
            if let Some(duplicate) = names.iter().find(|name| !seen.insert(name.as_str())) {
                return Err(CuratorError::DuplicateColumn {
                    table: "input".to_string(),
                    column: duplicate.clone(),
                });
            }
        }

        let mut rows: Vec<Vec<Value>> = Vec::new();
        for record in records {
            if self.config.max_rows.is_some_and(|max| rows.len() >= max) {
                break;
            }
            let record = record?;
            let width = headers
                .get_or_insert_with(|| (1..=record.len()).map(|i| format!("column_{}", i)).collect())
                .len();

            let mut row: Vec<Value> = record
                .iter()
                .take(width)
                .map(|cell| Value::String(cell.to_string()))
                .collect();
            row.resize(width, Value::String(String::new()));
            rows.push(row);
        }

        let headers = headers.unwrap_or_default();
        if headers.is_empty() {
            return Err(CuratorError::EmptyData("No columns found".to_string()));
        }
        if rows.is_empty() {
            return Err(CuratorError::EmptyData("No data rows found".to_string()));
        }

        Ok(DataTable::new(headers, rows))
    }
}

impl Default for Parser {
    fn default() -> Self {
        Self::new()
    }
}

/// Pick the delimiter that splits the sampled lines most consistently.
fn detect_delimiter(bytes: &[u8]) -> Result<u8> {
    let text = String::from_utf8_lossy(bytes);
    let lines: Vec<&str> = text
        .lines()
        .filter(|l| !l.trim().is_empty())
        .take(SAMPLE_LINES)
        .collect();

    if lines.is_empty() {
        return Err(CuratorError::EmptyData("No lines to analyze".to_string()));
    }

    let mut best = (b',', 0usize);
    for &delim in DELIMITERS {
        let counts: Vec<usize> = lines.iter().map(|l| count_delimiter_in_line(l, delim)).collect();
        let first = counts[0];
        if first == 0 {
            continue;
        }

        // Consistent splits beat raw counts; tab wins ties
        let score = if counts.iter().all(|&c| c == first) {
            first * 1000 + if delim == b'\t' { 100 } else { 0 }
        } else {
            first
        };
        if score > best.1 {
            best = (delim, score);
        }
    }

    Ok(best.0)
}

/// Count delimiter occurrences in a line, respecting quotes.
fn count_delimiter_in_line(line: &str, delimiter: u8) -> usize {
    let delim = delimiter as char;
    let mut in_quotes = false;
    line.chars()
        .filter(|&ch| {
            if ch == '"' {
                in_quotes = !in_quotes;
            }
            ch == delim && !in_quotes
        })
        .count()
}
