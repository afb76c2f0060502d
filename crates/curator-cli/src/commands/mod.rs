//! CLI command implementations.

pub mod check;
pub mod clean;
pub mod insert;

use colored::Colorize;
use curator::{Curator, CuratorConfig, FailurePolicy, TableRegistry, TransformFailure, TransformerRegistry, UnknownColumnPolicy};

use crate::cli::DescriptionArgs;

/// Failures printed before the rest are summarised.
const MAX_LISTED_FAILURES: usize = 10;

/// Load descriptions against the built-in transforms.
pub fn load_tables(args: &DescriptionArgs) -> curator::Result<TableRegistry> {
    TableRegistry::load(&args.descriptions, &TransformerRegistry::with_builtins())
}

pub fn build_curator(args: &DescriptionArgs, failures: FailurePolicy) -> curator::Result<Curator> {
    let config = CuratorConfig {
        unknown_columns: if args.pass_unknown {
            UnknownColumnPolicy::PassThrough
        } else {
            UnknownColumnPolicy::Reject
        },
        failures,
    };
    Ok(Curator::with_config(load_tables(args)?, config))
}

/// Print failed values to stderr.
pub fn report_failures(failures: &[&TransformFailure]) {
    if failures.is_empty() {
        return;
    }

    eprintln!("{} {}", failures.len().to_string().red().bold(), "failed value(s):".red());
    for failure in failures.iter().take(MAX_LISTED_FAILURES) {
        eprintln!("  {} {}", "✗".red(), failure);
    }
    if failures.len() > MAX_LISTED_FAILURES {
        eprintln!("  ... and {} more", failures.len() - MAX_LISTED_FAILURES);
    }
}
