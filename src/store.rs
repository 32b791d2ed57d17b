//! Interface to an on-disk compressed pairs store.
//!
//! A store is a directory of chunked pairs with its own query layer. The
//! extractor only needs three operations from it, so stores plug in through
//! the `PairsStore` trait and a `StoreOpener` that opens one from a path
//! (the original input, or the output of the region filter).

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::contigs::{ContigIndex, ContigSizes};
use crate::error::Result;
use crate::extract::Partition;

/// Query interface of a compressed pairs store.
pub trait PairsStore: Send + Sync {
    /// True if the store holds pairs (as opposed to another record type).
    fn is_pairs(&self) -> bool;

    /// Select the chunks holding rows with `mapq >= min_mapq`.
    fn read(&self, min_mapq: u8) -> Result<Vec<PathBuf>>;

    /// Load the selected chunks as a resolved partition (two incidences per pair).
    ///
    /// Rows on contigs outside `index` or below `min_mapq` must be excluded,
    /// as must rows failing the edge-length predicate against `sizes`
    /// (`edge_length` 0 disables it).
    fn to_hg_table(
        &self,
        chunks: &[PathBuf],
        index: &ContigIndex,
        sizes: &ContigSizes,
        min_mapq: u8,
        edge_length: u64,
    ) -> Result<Partition>;
}

/// Opens a `PairsStore` rooted at a directory.
pub type StoreOpener = Arc<dyn Fn(&Path) -> Result<Box<dyn PairsStore>> + Send + Sync>;
