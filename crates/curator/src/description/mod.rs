//! Table descriptions: YAML documents naming a table's columns and the
//! transform that cleans each one.

mod registry;
pub mod schema;
mod table;

pub use registry::TableRegistry;
pub use schema::ColumnType;
pub use table::{load_document, load_file, ColumnDescription, TableDescription};
