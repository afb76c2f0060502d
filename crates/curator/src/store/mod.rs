//! The backing store that cleaned records are written to.

mod sqlite;

pub use sqlite::SqliteStore;

use indexmap::IndexMap;
use serde_json::Value;

use crate::error::Result;
use crate::transform::TransformResult;

/// A scalar the store can persist.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreValue {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
}

/// One row ready for insertion, keyed by column name.
pub type StoreRow = IndexMap<String, StoreValue>;

impl From<&Value> for StoreValue {
    fn from(value: &Value) -> Self {
        match value {
            Value::Null => StoreValue::Null,
            Value::Bool(b) => StoreValue::Integer(i64::from(*b)),
            Value::Number(n) => match n.as_i64() {
                Some(i) => StoreValue::Integer(i),
                None => n.as_f64().map_or(StoreValue::Text(n.to_string()), StoreValue::Real),
            },
            Value::String(s) => StoreValue::Text(s.clone()),
            other => StoreValue::Text(other.to_string()),
        }
    }
}

impl From<&TransformResult> for StoreValue {
    /// Failures are stored as their message.
    fn from(result: &TransformResult) -> Self {
        match result {
            TransformResult::Success(value) => StoreValue::from(value),
            TransformResult::Failure(failure) => StoreValue::Text(failure.message.clone()),
        }
    }
}

/// A relational store accepting batches of rows.
///
/// `insert_rows` is all-or-nothing: either every row lands or none do.
pub trait Store {
    /// Column names of a relation, in declaration order.
    fn columns(&self, relation: &str) -> Result<Vec<String>>;

    /// Insert every row in one transaction, returning the number inserted.
    fn insert_rows(&mut self, relation: &str, rows: &[StoreRow]) -> Result<usize>;

    fn row_count(&self, relation: &str) -> Result<usize>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::failure;
    use serde_json::json;

    #[test]
    fn test_store_value_conversion() {
        assert_eq!(StoreValue::from(&json!(null)), StoreValue::Null);
        assert_eq!(StoreValue::from(&json!(true)), StoreValue::Integer(1));
        assert_eq!(StoreValue::from(&json!(42)), StoreValue::Integer(42));
        assert_eq!(StoreValue::from(&json!(4.5)), StoreValue::Real(4.5));
        assert_eq!(StoreValue::from(&json!("x")), StoreValue::Text("x".to_string()));
        assert_eq!(StoreValue::from(&json!([1, 2])), StoreValue::Text("[1,2]".to_string()));
    }

    #[test]
    fn test_failure_stored_as_message() {
        let result = failure("not a number", "abc");
        assert_eq!(StoreValue::from(&result), StoreValue::Text("not a number".to_string()));
    }
}
