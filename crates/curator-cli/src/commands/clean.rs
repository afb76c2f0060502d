//! Clean command - transform a data file and write the result as JSON.

use std::fs;
use std::path::PathBuf;

use colored::Colorize;
use curator::input::Parser;
use curator::{Curator, FailurePolicy};
use tracing::info;

use crate::cli::DescriptionArgs;

pub fn run(
    table: String,
    file: PathBuf,
    args: DescriptionArgs,
    output: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    let curator = super::build_curator(&args, FailurePolicy::Reject)?;

    let (data, source) = Parser::new().parse_file(&file)?;
    info!(file = %source.file, rows = source.row_count, "read data file");

    let cleaned = curator.transform_records(&table, &data.records())?;
    let failures = Curator::failures(&cleaned);
    super::report_failures(&failures);

    let json = serde_json::to_string_pretty(&cleaned)?;
    match output {
        Some(path) => {
            fs::write(&path, json)?;
            eprintln!(
                "{} Cleaned {} record(s) from {} into {}",
                "✓".green(),
                cleaned.len().to_string().white().bold(),
                source.file,
                path.display()
            );
        }
        None => println!("{}", json),
    }

    Ok(())
}
