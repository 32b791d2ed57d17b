//! Hypergraph extraction from Hi-C pairs and Pore-C contact tables.
//!
//! Contigs become vertices and reads (or read pairs) become hyperedges. The
//! pipeline reads one or more contact tables, applies quality, edge-length
//! and order filters, optionally splits contigs into equal-width bins, and
//! merges per-input partitions into one `HyperEdges` incidence structure.
//!
//! ```no_run
//! use std::path::{Path, PathBuf};
//! use hyperextract::{ContigIndex, ContigSizes, ExtractOptions, Extractor};
//!
//! # fn main() -> hyperextract::Result<()> {
//! let sizes = ContigSizes::from_path(Path::new("contigs.sizes"))?;
//! let index = ContigIndex::from_sizes(&sizes);
//! let options = ExtractOptions::default().min_quality(1).threads(8);
//! let edges = Extractor::new(vec![PathBuf::from("sample.pairs.gz")], index, sizes, options)?
//!     .generate_edges()?;
//! edges.save(Path::new("sample.hg"))?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod constants;
pub mod contigs;
pub mod encoding;
pub mod error;
pub mod extract;
pub mod filters;
pub mod hyperedges;
pub mod logging;
pub mod region;
pub mod split;
pub mod store;
pub mod table;

pub use contigs::{ContigIndex, ContigSizes, VertexId};
pub use error::{ExtractError, Result};
pub use extract::{ExtractOptions, Extractor, HyperExtractor, Incidences, Partition, ThreadPlan};
pub use filters::FilterStats;
pub use hyperedges::HyperEdges;
pub use region::RegionFilter;
pub use split::SplitIndex;
pub use store::{PairsStore, StoreOpener};
pub use table::{QualitySchema, TableKind};
