//! Main Curator struct and public API.

use std::path::Path;

use indexmap::IndexMap;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::description::{TableDescription, TableRegistry};
use crate::error::{CuratorError, Result};
use crate::input::{DataTable, Record};
use crate::store::{Store, StoreRow, StoreValue};
use crate::transform::{BoundTransform, TransformFailure, TransformResult, TransformerRegistry};

/// A cleaned row: every field holds a success or a failure.
pub type CleanRecord = IndexMap<String, TransformResult>;

/// What to do with a column the table description does not name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnknownColumnPolicy {
    /// Fail the whole batch with `UnknownColumn`.
    #[default]
    Reject,
    /// Copy the raw value through as a success.
    PassThrough,
}

/// What `insert_records` does with a batch that contains failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Refuse the batch before the store is touched.
    #[default]
    Reject,
    /// Write each failure's message as text.
    Persist,
}

/// Configuration for a Curator.
#[derive(Debug, Clone, Default)]
pub struct CuratorConfig {
    pub unknown_columns: UnknownColumnPolicy,
    pub failures: FailurePolicy,
}

impl CuratorConfig {
    #[must_use]
    pub fn with_unknown_columns(mut self, policy: UnknownColumnPolicy) -> Self {
        self.unknown_columns = policy;
        self
    }

    #[must_use]
    pub fn with_failures(mut self, policy: FailurePolicy) -> Self {
        self.failures = policy;
        self
    }
}

/// Column name to its bound transform, resolved once per call.
type Bindings<'a> = IndexMap<&'a str, Option<&'a BoundTransform>>;

/// Dispatches raw records through the transforms their table describes.
pub struct Curator {
    tables: TableRegistry,
    config: CuratorConfig,
    store: Option<Box<dyn Store>>,
}

impl Curator {
    pub fn new(tables: TableRegistry) -> Self {
        Self::with_config(tables, CuratorConfig::default())
    }

    pub fn with_config(tables: TableRegistry, config: CuratorConfig) -> Self {
        Self {
            tables,
            config,
            store: None,
        }
    }

    /// Load descriptions from files and directories with default configuration.
    pub fn from_paths<P: AsRef<Path>>(paths: &[P], transformers: &TransformerRegistry) -> Result<Self> {
        Ok(Self::new(TableRegistry::load(paths, transformers)?))
    }

    /// Attach the store that `insert_records` writes to.
    pub fn with_store(mut self, store: impl Store + 'static) -> Self {
        self.store = Some(Box::new(store));
        self
    }

    pub fn tables(&self) -> &TableRegistry {
        &self.tables
    }

    pub fn config(&self) -> &CuratorConfig {
        &self.config
    }

    pub fn store(&self) -> Option<&dyn Store> {
        self.store.as_deref()
    }

    /// Clean a batch of raw records for `table`.
    ///
    /// Fields keep the record's own key order. A failing field never stops
    /// the rest of the record or the batch; it is stored in place, stamped
    /// with the table, column and record index.
    pub fn transform_records(&self, table: &str, records: &[Record]) -> Result<Vec<CleanRecord>> {
        let description = self.tables.get_table(table)?;
        let bindings = bindings(description);

        let mut cleaned = Vec::with_capacity(records.len());
        for (index, record) in records.iter().enumerate() {
            let mut clean = CleanRecord::with_capacity(record.len());
            for (column, raw) in record {
                let binding = self.binding(&bindings, table, column)?;
                let result = match binding {
                    Some(transform) => transform.apply(raw, record).in_context(table, column, index),
                    None => TransformResult::Success(raw.clone()),
                };
                clean.insert(column.clone(), result);
            }
            cleaned.push(clean);
        }

        debug!(table, records = cleaned.len(), "transformed records");
        Ok(cleaned)
    }

    /// Clean a whole table column by column.
    ///
    /// Row transforms see each row as it was read, never a partly cleaned one.
    pub fn transform_table(&self, table: &str, data: &DataTable) -> Result<DataTable<TransformResult>> {
        let description = self.tables.get_table(table)?;
        let bindings = bindings(description);

        let resolved = data
            .headers
            .iter()
            .map(|column| self.binding(&bindings, table, column))
            .collect::<Result<Vec<_>>>()?;

        let snapshots: Vec<Record> = if resolved.iter().flatten().any(|t| matches!(t, BoundTransform::Row(_))) {
            data.records()
        } else {
            Vec::new()
        };

        let mut columns = Vec::with_capacity(data.column_count());
        for (index, (column, binding)) in data.headers.iter().zip(&resolved).enumerate() {
            let raw = data.column_values(index).map(|v| v.cloned().unwrap_or(Value::Null));
            let cleaned: Vec<TransformResult> = match binding {
                None => raw.map(TransformResult::Success).collect(),
                Some(BoundTransform::Value(transform)) => raw
                    .enumerate()
                    .map(|(row, value)| transform.clean(&value).in_context(table, column, row))
                    .collect(),
                Some(BoundTransform::Row(transform)) => snapshots
                    .iter()
                    .enumerate()
                    .map(|(row, record)| transform.clean(record).in_context(table, column, row))
                    .collect(),
            };
            columns.push(cleaned);
        }

        debug!(table, rows = data.row_count(), columns = columns.len(), "transformed table");
        Ok(DataTable::from_columns(data.headers.clone(), columns))
    }

    /// Clean a batch and write it to the store in one transaction.
    ///
    /// Returns the number of rows inserted. On any store error nothing from
    /// the batch is kept. The target relation must exist in the store, even
    /// for an empty batch.
    pub fn insert_records(&mut self, table: &str, records: &[Record]) -> Result<usize> {
        let Some(store) = self.store.as_deref() else {
            return Err(CuratorError::Config("no backing store attached".to_string()));
        };
        let relation = store.columns(table)?;
        debug!(table, columns = relation.len(), "reflected relation");

        let cleaned = self.transform_records(table, records)?;

        if self.config.failures == FailurePolicy::Reject {
            let failures = Self::failures(&cleaned);
            if let Some(first) = failures.first() {
                warn!(table, failures = failures.len(), "refusing batch with failed values");
                return Err(CuratorError::FailedRecords {
                    table: table.to_string(),
                    count: failures.len(),
                    first: first.to_string(),
                });
            }
        }

        let rows: Vec<StoreRow> = cleaned
            .iter()
            .map(|record| {
                record
                    .iter()
                    .map(|(column, result)| (column.clone(), StoreValue::from(result)))
                    .collect()
            })
            .collect();

        let Some(store) = self.store.as_mut() else {
            return Err(CuratorError::Config("no backing store attached".to_string()));
        };
        match store.insert_rows(table, &rows) {
            Ok(inserted) => {
                info!(table, rows = inserted, "inserted records");
                Ok(inserted)
            }
            Err(e) => {
                warn!(table, rows = rows.len(), error = %e, "insert rolled back");
                Err(CuratorError::Insertion {
                    table: table.to_string(),
                    source: Box::new(e),
                })
            }
        }
    }

    /// Every failure embedded in a batch of cleaned records, in order.
    pub fn failures(records: &[CleanRecord]) -> Vec<&TransformFailure> {
        records
            .iter()
            .flat_map(|record| record.values())
            .filter_map(TransformResult::failure)
            .collect()
    }

    fn binding<'a>(
        &self,
        bindings: &Bindings<'a>,
        table: &str,
        column: &str,
    ) -> Result<Option<&'a BoundTransform>> {
        match bindings.get(column) {
            Some(binding) => Ok(*binding),
            None => match self.config.unknown_columns {
                UnknownColumnPolicy::PassThrough => Ok(None),
                UnknownColumnPolicy::Reject => Err(CuratorError::UnknownColumn {
                    table: table.to_string(),
                    column: column.to_string(),
                }),
            },
        }
    }
}

fn bindings(description: &TableDescription) -> Bindings<'_> {
    description
        .columns()
        .map(|column| (column.name.as_str(), column.transform.as_ref()))
        .collect()
}
