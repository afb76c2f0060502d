//! CLI argument definitions using clap.

use clap::{ArgAction, Args, Parser, Subcommand};
use std::path::PathBuf;

/// Curator: declarative cleaning of tabular records
#[derive(Parser)]
#[command(name = "curator")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,
}

/// Where table descriptions come from.
#[derive(Args)]
pub struct DescriptionArgs {
    /// Description files or directories of .yml/.yaml files
    #[arg(short = 'd', long = "descriptions", value_name = "PATH", required = true, num_args = 1..)]
    pub descriptions: Vec<PathBuf>,

    /// Pass columns missing from the description through unchanged
    #[arg(long)]
    pub pass_unknown: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Load table descriptions and show each column's transform
    Check {
        #[command(flatten)]
        descriptions: DescriptionArgs,
    },

    /// Clean a data file and write the cleaned records as JSON
    Clean {
        /// Table the data file belongs to
        #[arg(value_name = "TABLE")]
        table: String,

        /// Path to the data file (CSV/TSV)
        #[arg(value_name = "FILE")]
        file: PathBuf,

        #[command(flatten)]
        descriptions: DescriptionArgs,

        /// Output path for cleaned records (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Clean a data file and insert it into a SQLite table in one transaction
    Insert {
        /// Table the data file belongs to
        #[arg(value_name = "TABLE")]
        table: String,

        /// Path to the data file (CSV/TSV)
        #[arg(value_name = "FILE")]
        file: PathBuf,

        #[command(flatten)]
        descriptions: DescriptionArgs,

        /// SQLite database holding the target table
        #[arg(long, value_name = "DB")]
        database: PathBuf,

        /// Insert failed values as their message instead of refusing the batch
        #[arg(long)]
        allow_failures: bool,
    },
}
