//! Error types for the curator library.

use std::path::PathBuf;
use thiserror::Error;

use crate::transform::TransformFailure;

/// Main error type for curator operations.
#[derive(Debug, Error)]
pub enum CuratorError {
    /// Error reading or accessing a file.
    #[error("IO error for '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A description document is not valid YAML.
    #[error("YAML error in '{document}': {source}")]
    Yaml {
        document: String,
        #[source]
        source: serde_yaml::Error,
    },

    /// A description document does not match the table description schema.
    #[error("Schema error in '{document}' at '{field}': {message}")]
    Schema {
        document: String,
        field: String,
        message: String,
    },

    /// The registry was asked to load an empty set of descriptions.
    #[error("No table descriptions provided")]
    NoDescriptions,

    /// Two columns in one description, or in one input header row, share a name.
    #[error("Duplicate column '{column}' in table '{table}'")]
    DuplicateColumn { table: String, column: String },

    /// Two description documents describe the same table.
    #[error("Table '{0}' is described more than once")]
    DuplicateTable(String),

    /// A transform reference could not be bound to a registered transformer.
    #[error("Unresolved transform '{reference}': {reason}")]
    UnresolvedTransform { reference: String, reason: String },

    /// No table description with this name.
    #[error("No table found with name '{0}'")]
    UnknownTable(String),

    /// The table exists but has no such column.
    #[error("No column found in table '{table}' with name '{column}'")]
    UnknownColumn { table: String, column: String },

    /// No transformer registered under this name.
    #[error("No transformer registered with name '{0}'")]
    UnknownTransformer(String),

    /// A transform failure raised as an error.
    #[error("Transform failed: {0}")]
    Transform(TransformFailure),

    /// Error parsing CSV/TSV data.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Empty file or no data to clean.
    #[error("Empty data: {0}")]
    EmptyData(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Error from the SQLite backing store.
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// The backing store has no relation with this name.
    #[error("Backing store has no relation named '{0}'")]
    UnknownRelation(String),

    /// A batch carrying transform failures was refused before persistence.
    #[error("Refusing to insert {count} failed value(s) into '{table}', first: {first}")]
    FailedRecords {
        table: String,
        count: usize,
        first: String,
    },

    /// The batch insert failed and was rolled back.
    #[error("Failed to insert records into '{table}': {source}")]
    Insertion {
        table: String,
        #[source]
        source: Box<CuratorError>,
    },
}

/// Result type alias for curator operations.
pub type Result<T> = std::result::Result<T, CuratorError>;
