//! Curator CLI - declarative record cleaning.

mod cli;
mod commands;
mod logging;

use clap::Parser;
use cli::{Cli, Commands};

fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let result = match cli.command {
        Commands::Check { descriptions } => commands::check::run(descriptions),

        Commands::Clean {
            table,
            file,
            descriptions,
            output,
        } => commands::clean::run(table, file, descriptions, output),

        Commands::Insert {
            table,
            file,
            descriptions,
            database,
            allow_failures,
        } => commands::insert::run(table, file, descriptions, database, allow_failures),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
