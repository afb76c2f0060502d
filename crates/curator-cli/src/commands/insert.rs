//! Insert command - transform a data file and write it to SQLite atomically.

use std::path::PathBuf;

use colored::Colorize;
use curator::input::Parser;
use curator::{Curator, CuratorError, FailurePolicy, SqliteStore};

use crate::cli::DescriptionArgs;

pub fn run(
    table: String,
    file: PathBuf,
    args: DescriptionArgs,
    database: PathBuf,
    allow_failures: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let policy = if allow_failures {
        FailurePolicy::Persist
    } else {
        FailurePolicy::Reject
    };
    let store = SqliteStore::open(&database)?;
    let mut curator = super::build_curator(&args, policy)?.with_store(store);

    let records = Parser::new().parse_records(&file)?;

    if allow_failures {
        let cleaned = curator.transform_records(&table, &records)?;
        super::report_failures(&Curator::failures(&cleaned));
    }

    match curator.insert_records(&table, &records) {
        Ok(inserted) => {
            println!(
                "{} Inserted {} row(s) into {} ({})",
                "✓".green(),
                inserted.to_string().white().bold(),
                table.cyan(),
                database.display()
            );
            Ok(())
        }
        Err(CuratorError::FailedRecords { count, .. }) => {
            let cleaned = curator.transform_records(&table, &records)?;
            super::report_failures(&Curator::failures(&cleaned));
            Err(format!(
                "{} value(s) failed to clean; nothing was inserted (use --allow-failures to store them)",
                count
            )
            .into())
        }
        Err(e) => Err(e.into()),
    }
}
