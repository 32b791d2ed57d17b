//! Command-line interface definitions and handlers for the hyperextract CLI.

pub mod args;
pub mod extract;
pub mod stats;

pub use args::{Cli, Commands, ExtractArgs};
pub use extract::{extract_from_config, run_extract};
pub use stats::print_stats;
