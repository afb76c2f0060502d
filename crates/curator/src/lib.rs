//! Curator: declarative cleaning of tabular records.
//!
//! Each table is described in a YAML document that names its columns and,
//! optionally, the transform that cleans each one. Transforms are plain Rust
//! functions or struct transformers registered under dotted names. A
//! [`Curator`] dispatches raw records through the bound transforms and can
//! write the cleaned batch to a backing store in a single transaction.
//!
//! # Core Principles
//!
//! - **Failures are values**: a bad cell becomes a [`TransformFailure`] in
//!   place; the rest of the record and batch are still cleaned
//! - **Bind once**: transform references are resolved when descriptions load
//! - **All or nothing**: an insert either lands every row or none
//!
//! # Example
//!
//! ```
//! use curator::{Curator, TableDescription, TableRegistry, TransformerRegistry};
//! use curator::input::Record;
//! use serde_json::json;
//!
//! let transformers = TransformerRegistry::with_builtins();
//! let lab = TableDescription::from_yaml_str(
//!     "name: lab\ncolumns:\n  - name: value\n    transform: common.float\n",
//!     "lab.yml",
//!     &transformers,
//! ).unwrap();
//! let curator = Curator::new(TableRegistry::from_descriptions([lab]).unwrap());
//!
//! let record: Record = [("value".to_string(), json!("4.2"))].into_iter().collect();
//! let cleaned = curator.transform_records("lab", &[record]).unwrap();
//! assert_eq!(cleaned[0]["value"].ok(), Some(&json!(4.2)));
//! ```

pub mod description;
pub mod error;
pub mod input;
pub mod store;
pub mod transform;

mod curator;

pub use crate::curator::{CleanRecord, Curator, CuratorConfig, FailurePolicy, UnknownColumnPolicy};
pub use description::{ColumnDescription, ColumnType, TableDescription, TableRegistry};
pub use error::{CuratorError, Result};
pub use input::{DataTable, Record};
pub use store::{SqliteStore, Store, StoreValue};
pub use transform::{failure, TransformFailure, TransformResult, TransformerRegistry};
