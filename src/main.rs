use anyhow::Result;
use clap::Parser;

use hyperextract::logging::init_logger;
use hyperextract::TableKind;

mod commands;

use commands::{extract_from_config, print_stats, run_extract, Cli, Commands};

fn main() -> Result<()> {
    let args = Cli::parse();
    init_logger(args.verbose);

    match args.command {
        Commands::Pairs(extract) => run_extract(TableKind::Pairs, &extract)?,
        Commands::Porec(extract) => run_extract(TableKind::PoreC, &extract)?,
        Commands::FromConfig { config } => extract_from_config(&config)?,
        Commands::Stats { input } => print_stats(&input)?,
    }
    Ok(())
}
