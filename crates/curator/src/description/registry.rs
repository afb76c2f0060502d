//! The set of loaded table descriptions.

use std::fs;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use tracing::info;

use crate::error::{CuratorError, Result};
use crate::transform::{BoundTransform, TransformerRegistry};

use super::table::{load_file, ColumnDescription, TableDescription};

/// Table descriptions keyed by table name.
#[derive(Debug, Clone, Default)]
pub struct TableRegistry {
    tables: IndexMap<String, TableDescription>,
}

impl TableRegistry {
    /// Load descriptions from files and directories.
    ///
    /// Directories contribute their `.yml` and `.yaml` files in name order.
    pub fn load<P: AsRef<Path>>(paths: &[P], transformers: &TransformerRegistry) -> Result<Self> {
        let files = Self::expand_paths(paths)?;
        if files.is_empty() {
            return Err(CuratorError::NoDescriptions);
        }

        let tables = files
            .iter()
            .map(|file| load_file(file, transformers))
            .collect::<Result<Vec<_>>>()?;
        let registry = Self::from_descriptions(tables)?;

        info!(
            tables = registry.len(),
            files = files.len(),
            "loaded table descriptions"
        );
        Ok(registry)
    }

    /// Load every description in one directory.
    pub fn from_dir(dir: impl AsRef<Path>, transformers: &TransformerRegistry) -> Result<Self> {
        Self::load(&[dir.as_ref()], transformers)
    }

    /// Build a registry from descriptions already in hand.
    pub fn from_descriptions(descriptions: impl IntoIterator<Item = TableDescription>) -> Result<Self> {
        let mut tables = IndexMap::new();
        for table in descriptions {
            if tables.contains_key(&table.name) {
                return Err(CuratorError::DuplicateTable(table.name));
            }
            tables.insert(table.name.clone(), table);
        }
        if tables.is_empty() {
            return Err(CuratorError::NoDescriptions);
        }
        Ok(Self { tables })
    }

    /// Flatten paths into description files.
    pub fn expand_paths<P: AsRef<Path>>(paths: &[P]) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        for path in paths {
            let path = path.as_ref();
            if !path.is_dir() {
                files.push(path.to_path_buf());
                continue;
            }

            let entries = fs::read_dir(path).map_err(|e| CuratorError::Io {
                path: path.to_path_buf(),
                source: e,
            })?;
            let mut found: Vec<PathBuf> = entries
                .filter_map(|entry| entry.ok().map(|e| e.path()))
                .filter(|p| p.is_file() && is_description_file(p))
                .collect();
            found.sort();
            files.extend(found);
        }
        Ok(files)
    }

    pub fn get_table(&self, name: &str) -> Result<&TableDescription> {
        self.tables
            .get(name)
            .ok_or_else(|| CuratorError::UnknownTable(name.to_string()))
    }

    pub fn get_column(&self, table: &str, column: &str) -> Result<&ColumnDescription> {
        self.get_table(table)?
            .column(column)
            .ok_or_else(|| CuratorError::UnknownColumn {
                table: table.to_string(),
                column: column.to_string(),
            })
    }

    /// The bound transform for a column, `None` for pass-through columns.
    pub fn get_transform(&self, table: &str, column: &str) -> Result<Option<&BoundTransform>> {
        Ok(self.get_column(table, column)?.transform.as_ref())
    }

    pub fn table_names(&self) -> impl Iterator<Item = &str> {
        self.tables.keys().map(String::as_str)
    }

    pub fn tables(&self) -> impl Iterator<Item = &TableDescription> {
        self.tables.values()
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

fn is_description_file(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yml") | Some("yaml")
    )
}
