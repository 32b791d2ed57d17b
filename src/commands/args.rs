//! Command-line argument definitions for the hyperextract CLI.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use hyperextract::constants::{
    DEFAULT_EDGE_LENGTH, DEFAULT_MAX_ORDER, DEFAULT_MIN_ORDER, DEFAULT_MIN_QUALITY,
    DEFAULT_REGION_PROGRAM, DEFAULT_SPLIT, DEFAULT_THREADS,
};

#[derive(Parser)]
#[command(name = "hyperextract")]
#[command(about = "Extract hypergraph incidence models from Hi-C pairs and Pore-C tables")]
#[command(
    long_about = "hyperextract: turn contact tables into a hypergraph where contigs are vertices and reads are hyperedges.

INPUT FORMATS:
  pairs: 4DN pairs (readID chrom1 pos1 chrom2 pos2 strand1 strand2 [mapq]), optionally .gz.
         A directory is treated as a compressed pairs store.
  porec: Pore-C tables (read_idx read_length read_start read_end strand chrom start end
         mapping_quality identity filter_reason), optionally .gz, or .parquet.

OUTPUT:
  <output>             binary hypergraph (row/col/mapq incidences and the vertex table)
  <output>.contigsizes vertex -> length table, in vertex id order

FILTERS (0 disables each one):
  --min-quality   keep contacts with mapq >= value
  --edge-length   keep contacts within value bp of a contig end
  --min-order/--max-order (porec) keep reads touching that many distinct contigs"
)]
#[command(after_help = "EXAMPLES:
  # Hi-C pairs from two runs, 8 threads
  hyperextract pairs -i run1.pairs.gz -i run2.pairs.gz -c contigs.sizes -o sample.hg -t 8

  # Pore-C with every contig split into 4 bins, no edge filter
  hyperextract porec -i sample.porec.gz -c contigs.sizes -o sample.hg -s 4 -e 0

  # Restrict to high-confidence regions first
  hyperextract porec -i sample.porec.gz -c contigs.sizes -o sample.hg --hcr-bed hcr.bed

  # Everything from a TOML file
  hyperextract from-config extract.toml")]
pub struct Cli {
    /// Enable verbose progress output with timestamps
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Extract a hypergraph from Hi-C pairs
    Pairs(ExtractArgs),

    /// Extract a hypergraph from Pore-C tables
    Porec(ExtractArgs),

    /// Run an extraction described by a TOML config file
    FromConfig {
        /// Path to the TOML config
        config: PathBuf,
    },

    /// Print summary counts of a saved hypergraph
    Stats {
        /// Hypergraph file written by `pairs`/`porec`
        #[arg(short, long)]
        input: PathBuf,
    },
}

#[derive(Args, Debug)]
pub struct ExtractArgs {
    /// Input table(s); repeat or list several
    #[arg(short, long = "input", required = true, num_args = 1..)]
    pub inputs: Vec<PathBuf>,

    /// Two-column contig<TAB>length table
    #[arg(short, long)]
    pub contigsizes: PathBuf,

    /// Output hypergraph path
    #[arg(short, long)]
    pub output: PathBuf,

    /// Minimum mapping quality (0 disables)
    #[arg(short = 'q', long, default_value_t = DEFAULT_MIN_QUALITY)]
    pub min_quality: u8,

    /// Keep contacts within this many bp of a contig end (0 disables)
    #[arg(short, long, default_value_t = DEFAULT_EDGE_LENGTH)]
    pub edge_length: u64,

    /// Minimum distinct contigs per read (porec, 0 disables)
    #[arg(long, default_value_t = DEFAULT_MIN_ORDER)]
    pub min_order: usize,

    /// Maximum distinct contigs per read (porec, 0 disables)
    #[arg(long, default_value_t = DEFAULT_MAX_ORDER)]
    pub max_order: usize,

    /// Split every contig into this many equal-width bins
    #[arg(short, long, default_value_t = DEFAULT_SPLIT)]
    pub split: u32,

    /// Worker threads
    #[arg(short, long, default_value_t = DEFAULT_THREADS)]
    pub threads: usize,

    /// Keep contig names as strings while parsing instead of interning them
    #[arg(long)]
    pub no_low_memory: bool,

    /// Region (BED) file for the high-confidence region filter
    #[arg(long)]
    pub hcr_bed: Option<PathBuf>,

    /// Keep contacts outside the regions instead of inside
    #[arg(long, requires = "hcr_bed")]
    pub hcr_invert: bool,

    /// Program providing pairs-intersect/porec-intersect
    #[arg(long, default_value = DEFAULT_REGION_PROGRAM)]
    pub hcr_program: String,

    /// Directory for region filter logs
    #[arg(long)]
    pub log_dir: Option<PathBuf>,
}
