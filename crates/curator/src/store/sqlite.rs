//! SQLite backing store.

use std::path::Path;

use rusqlite::types::{ToSqlOutput, Value as SqlValue};
use rusqlite::{params_from_iter, Connection, ToSql};
use tracing::debug;

use crate::error::{CuratorError, Result};

use super::{Store, StoreRow, StoreValue};

impl ToSql for StoreValue {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::Owned(match self {
            StoreValue::Null => SqlValue::Null,
            StoreValue::Integer(i) => SqlValue::Integer(*i),
            StoreValue::Real(r) => SqlValue::Real(*r),
            StoreValue::Text(s) => SqlValue::Text(s.clone()),
        }))
    }
}

/// A store over one SQLite connection.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let conn = Connection::open(path)?;
        debug!(path = %path.display(), "opened sqlite store");
        Ok(Self { conn })
    }

    pub fn open_in_memory() -> Result<Self> {
        Ok(Self {
            conn: Connection::open_in_memory()?,
        })
    }

    /// Run one or more SQL statements, e.g. DDL.
    pub fn execute_batch(&self, sql: &str) -> Result<()> {
        self.conn.execute_batch(sql)?;
        Ok(())
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}

impl Store for SqliteStore {
    fn columns(&self, relation: &str) -> Result<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare(&format!("PRAGMA table_info({})", quote_identifier(relation)))?;
        let columns = stmt
            .query_map([], |row| row.get::<_, String>(1))?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        if columns.is_empty() {
            return Err(CuratorError::UnknownRelation(relation.to_string()));
        }
        Ok(columns)
    }

    fn insert_rows(&mut self, relation: &str, rows: &[StoreRow]) -> Result<usize> {
        let tx = self.conn.transaction()?;

        for row in rows {
            let sql = if row.is_empty() {
                format!("INSERT INTO {} DEFAULT VALUES", quote_identifier(relation))
            } else {
                let columns: Vec<String> = row.keys().map(|c| quote_identifier(c)).collect();
                format!(
                    "INSERT INTO {} ({}) VALUES ({})",
                    quote_identifier(relation),
                    columns.join(", "),
                    vec!["?"; columns.len()].join(", ")
                )
            };
            tx.prepare_cached(&sql)?.execute(params_from_iter(row.values()))?;
        }

        // Dropping an uncommitted transaction rolls it back
        tx.commit()?;
        Ok(rows.len())
    }

    fn row_count(&self, relation: &str) -> Result<usize> {
        let count: i64 = self.conn.query_row(
            &format!("SELECT COUNT(*) FROM {}", quote_identifier(relation)),
            [],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }
}

fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> SqliteStore {
        let store = SqliteStore::open_in_memory().unwrap();
        store
            .execute_batch("CREATE TABLE lab (name TEXT NOT NULL, value REAL, patient_mrn INTEGER)")
            .unwrap();
        store
    }

    fn row(pairs: &[(&str, StoreValue)]) -> StoreRow {
        pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
    }

    #[test]
    fn test_columns() {
        assert_eq!(store().columns("lab").unwrap(), vec!["name", "value", "patient_mrn"]);
        assert!(matches!(store().columns("visit"), Err(CuratorError::UnknownRelation(_))));
    }

    #[test]
    fn test_insert_rows() {
        let mut store = store();
        let rows = vec![
            row(&[("name", StoreValue::Text("bp".into())), ("value", StoreValue::Real(1.5))]),
            row(&[("name", StoreValue::Text("hr".into())), ("patient_mrn", StoreValue::Integer(7))]),
        ];
        assert_eq!(store.insert_rows("lab", &rows).unwrap(), 2);
        assert_eq!(store.row_count("lab").unwrap(), 2);
    }

    #[test]
    fn test_insert_rolls_back_on_error() {
        let mut store = store();
        let rows = vec![
            row(&[("name", StoreValue::Text("bp".into()))]),
            row(&[("name", StoreValue::Null)]),
        ];
        assert!(store.insert_rows("lab", &rows).is_err());
        assert_eq!(store.row_count("lab").unwrap(), 0);
    }
}
