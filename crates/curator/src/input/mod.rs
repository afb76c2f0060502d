//! Raw data ingestion and the tabular structure the curator consumes.

mod parser;
mod source;

pub use parser::{Parser, ParserConfig};
pub use source::{DataTable, Record, SourceMetadata};
