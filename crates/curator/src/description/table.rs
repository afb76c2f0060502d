//! Table and column descriptions with their transforms bound.

use std::fs;
use std::path::Path;

use indexmap::IndexMap;
use serde::Deserialize;
use tracing::debug;

use crate::error::{CuratorError, Result};
use crate::transform::{BoundTransform, TransformerRegistry};

use super::schema::{self, ColumnType};

#[derive(Debug, Deserialize)]
struct RawTable {
    name: String,
    description: Option<String>,
    columns: Vec<RawColumn>,
}

#[derive(Debug, Deserialize)]
struct RawColumn {
    name: String,
    transform: Option<String>,
    #[serde(rename = "type")]
    column_type: Option<ColumnType>,
    description: Option<String>,
}

/// One column of a described table.
#[derive(Debug, Clone)]
pub struct ColumnDescription {
    pub name: String,
    /// The dotted reference as written in the document.
    pub transform_reference: Option<String>,
    pub column_type: Option<ColumnType>,
    pub description: Option<String>,
    /// Bound once at load time; `None` means values pass through unchanged.
    pub transform: Option<BoundTransform>,
}

/// A described table: its name and ordered columns.
#[derive(Debug, Clone)]
pub struct TableDescription {
    pub name: String,
    pub description: Option<String>,
    columns: IndexMap<String, ColumnDescription>,
}

impl TableDescription {
    /// Parse, validate and bind a description from YAML text.
    ///
    /// `document` names the source in error messages.
    pub fn from_yaml_str(source: &str, document: &str, transformers: &TransformerRegistry) -> Result<Self> {
        let doc = load_document(source, document)?;
        let raw: RawTable = serde_yaml::from_value(doc).map_err(|e| CuratorError::Yaml {
            document: document.to_string(),
            source: e,
        })?;
        Self::bind(raw, transformers)
    }

    fn bind(raw: RawTable, transformers: &TransformerRegistry) -> Result<Self> {
        let mut columns = IndexMap::with_capacity(raw.columns.len());

        for column in raw.columns {
            if columns.contains_key(&column.name) {
                return Err(CuratorError::DuplicateColumn {
                    table: raw.name,
                    column: column.name,
                });
            }

            let transform = match &column.transform {
                Some(reference) => Some(transformers.resolve(reference).map_err(|e| match e {
                    CuratorError::UnresolvedTransform { reference, reason } => CuratorError::UnresolvedTransform {
                        reference,
                        reason: format!("{} (column '{}.{}')", reason, raw.name, column.name),
                    },
                    other => other,
                })?),
                None => None,
            };

            columns.insert(
                column.name.clone(),
                ColumnDescription {
                    name: column.name,
                    transform_reference: column.transform,
                    column_type: column.column_type,
                    description: column.description,
                    transform,
                },
            );
        }

        Ok(Self {
            name: raw.name,
            description: raw.description,
            columns,
        })
    }

    pub fn column(&self, name: &str) -> Option<&ColumnDescription> {
        self.columns.get(name)
    }

    /// Columns in document order.
    pub fn columns(&self) -> impl Iterator<Item = &ColumnDescription> {
        self.columns.values()
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(String::as_str)
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }
}

/// Parse YAML text and check it against the description schema.
pub fn load_document(source: &str, document: &str) -> Result<serde_yaml::Value> {
    let doc: serde_yaml::Value = serde_yaml::from_str(source).map_err(|e| CuratorError::Yaml {
        document: document.to_string(),
        source: e,
    })?;
    schema::validate(&doc, document)?;
    Ok(doc)
}

/// Load one description file.
pub fn load_file(path: impl AsRef<Path>, transformers: &TransformerRegistry) -> Result<TableDescription> {
    let path = path.as_ref();
    let source = fs::read_to_string(path).map_err(|e| CuratorError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    let table = TableDescription::from_yaml_str(&source, &path.display().to_string(), transformers)?;
    debug!(path = %path.display(), table = %table.name, columns = table.column_count(), "loaded table description");
    Ok(table)
}
