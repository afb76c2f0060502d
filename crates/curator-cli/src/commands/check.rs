//! Check command - load descriptions and show how each column is cleaned.

use colored::Colorize;
use curator::transform::CallingConvention;

use crate::cli::DescriptionArgs;

pub fn run(args: DescriptionArgs) -> Result<(), Box<dyn std::error::Error>> {
    let tables = super::load_tables(&args)?;

    for table in tables.tables() {
        print!("{}", table.name.cyan().bold());
        match &table.description {
            Some(description) => println!(" - {}", description),
            None => println!(),
        }

        for column in table.columns() {
            let column_type = column
                .column_type
                .map(|t| format!("{:?}", t).to_lowercase())
                .unwrap_or_else(|| "-".to_string());
            let binding = match (&column.transform_reference, &column.transform) {
                (Some(reference), Some(bound)) => {
                    let convention = match bound.convention() {
                        CallingConvention::Value => "value",
                        CallingConvention::Row => "row",
                    };
                    format!("{} ({})", reference.green(), convention)
                }
                _ => "pass-through".dimmed().to_string(),
            };
            println!("  {:<24} {:<10} {}", column.name, column_type, binding);
        }
        println!();
    }

    println!(
        "{} {} table(s) loaded",
        "✓".green(),
        tables.len().to_string().white().bold()
    );
    Ok(())
}
