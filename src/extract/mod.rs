//! Extraction pipeline: ingest, filter, resolve, partition and merge.
//!
//! Both extractors follow the same plan:
//!
//! 1. Validate every input (exists, has data rows) before any work starts
//! 2. Fan inputs out over a dedicated pool sized by `ThreadPlan`; each worker
//!    runs region filter -> parse -> filter -> resolve to completion
//! 3. Collect partitions in input order (the first worker error aborts the run)
//! 4. Merge sequentially with hyperedge id offsets and assemble `HyperEdges`
//!
//! The split variants are the same extractors with `ExtractOptions::split > 1`.

pub mod merge;
pub mod pairs;
pub mod porec;

use std::io;
use std::path::{Path, PathBuf};

use rayon::ThreadPool;

use crate::constants::{
    DEFAULT_EDGE_LENGTH, DEFAULT_MAX_ORDER, DEFAULT_MIN_ORDER, DEFAULT_MIN_QUALITY, DEFAULT_SPLIT,
    DEFAULT_THREADS,
};
use crate::contigs::{ContigIndex, ContigLookup, ContigSizes, VertexId};
use crate::error::{ExtractError, Result};
use crate::region::RegionFilter;
use crate::split::SplitIndex;
use crate::table::ensure_not_empty;

pub use merge::{merge_partitions, Incidences, Partition};
pub use pairs::Extractor;
pub use porec::HyperExtractor;

/// Every tunable of an extraction run.
///
/// Thresholds use 0 for "disabled".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractOptions {
    pub min_quality: u8,
    pub edge_length: u64,
    pub min_order: usize,
    pub max_order: usize,
    /// Contig split factor K; 1 keeps whole contigs.
    pub split: u32,
    pub threads: usize,
    /// Intern contig names while parsing instead of keeping strings.
    pub low_memory: bool,
    pub region_filter: Option<RegionFilter>,
    /// Directory for collaborator logs.
    pub log_dir: Option<PathBuf>,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        ExtractOptions {
            min_quality: DEFAULT_MIN_QUALITY,
            edge_length: DEFAULT_EDGE_LENGTH,
            min_order: DEFAULT_MIN_ORDER,
            max_order: DEFAULT_MAX_ORDER,
            split: DEFAULT_SPLIT,
            threads: DEFAULT_THREADS,
            low_memory: true,
            region_filter: None,
            log_dir: None,
        }
    }
}

impl ExtractOptions {
    pub fn min_quality(mut self, min_quality: u8) -> Self {
        self.min_quality = min_quality;
        self
    }

    pub fn edge_length(mut self, edge_length: u64) -> Self {
        self.edge_length = edge_length;
        self
    }

    pub fn order(mut self, min_order: usize, max_order: usize) -> Self {
        self.min_order = min_order;
        self.max_order = max_order;
        self
    }

    pub fn split(mut self, split: u32) -> Self {
        self.split = split;
        self
    }

    pub fn threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }

    pub fn low_memory(mut self, low_memory: bool) -> Self {
        self.low_memory = low_memory;
        self
    }

    pub fn region_filter(mut self, filter: RegionFilter) -> Self {
        self.region_filter = Some(filter);
        self
    }

    pub fn log_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.log_dir = Some(dir.into());
        self
    }

    /// Check option consistency.
    ///
    /// # Errors
    /// `Validation` if `split` is 0 or both order bounds are set and inverted.
    pub fn validate(&self) -> Result<()> {
        if self.split == 0 {
            return Err(ExtractError::validation("split factor must be at least 1"));
        }
        if self.min_order > 0 && self.max_order > 0 && self.min_order > self.max_order {
            return Err(ExtractError::validation(format!(
                "min_order ({}) is larger than max_order ({})",
                self.min_order, self.max_order
            )));
        }
        Ok(())
    }

    /// Region filter with the run's log directory applied.
    pub(crate) fn effective_region_filter(&self) -> Option<RegionFilter> {
        self.region_filter.clone().map(|mut f| {
            if f.log_dir.is_none() {
                f.log_dir = self.log_dir.clone();
            }
            f
        })
    }
}

/// Worker layout for a run over `n_inputs` inputs.
///
/// `per_input = threads / n_inputs + 1` threads serve row chunks inside one
/// input and `workers = threads / per_input` inputs run at once. Neither is
/// ever 0, and `workers` never exceeds the number of inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThreadPlan {
    pub workers: usize,
    pub per_input: usize,
}

impl ThreadPlan {
    pub fn new(threads: usize, n_inputs: usize) -> Self {
        let threads = threads.max(1);
        let n_inputs = n_inputs.max(1);
        let per_input = threads / n_inputs + 1;
        let workers = (threads / per_input).max(1).min(n_inputs);
        ThreadPlan { workers, per_input }
    }

    /// Pool running one input per thread.
    pub fn input_pool(&self) -> Result<ThreadPool> {
        build_pool(self.workers)
    }

    /// Pool serving row chunks of a single input.
    pub fn chunk_pool(&self) -> Result<ThreadPool> {
        build_pool(self.per_input)
    }
}

fn build_pool(threads: usize) -> Result<ThreadPool> {
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build()
        .map_err(|e| ExtractError::validation(format!("failed to build thread pool: {}", e)))
}

/// Read-only vertex space of a run, shared by every worker.
///
/// Resolves a contig id (and position, when splitting) to the output
/// vertex id, and hands back the output index and sizes at the end.
#[derive(Debug)]
pub(crate) struct VertexSpace {
    index: ContigIndex,
    sizes: ContigSizes,
    split: Option<SplitIndex>,
}

impl VertexSpace {
    pub(crate) fn new(index: ContigIndex, sizes: &ContigSizes, split: u32) -> Result<Self> {
        let split = if split > 1 {
            Some(SplitIndex::new(&index, sizes, split)?)
        } else {
            None
        };
        let sizes = sizes.restricted_to(&index);
        if sizes.len() < index.len() {
            log::warn!(
                "{} contigs of the index have no size; the edge-length filter drops their contacts",
                index.len() - sizes.len()
            );
        }
        Ok(VertexSpace { index, sizes, split })
    }

    pub(crate) fn lookup(&self) -> ContigLookup<'_> {
        ContigLookup::new(&self.index, &self.sizes)
    }

    pub(crate) fn is_split(&self) -> bool {
        self.split.is_some()
    }

    /// Output vertex of `contig` at `pos`.
    ///
    /// Without splitting the position is ignored; with splitting a missing
    /// position or a bin past the last sub-vertex does not resolve.
    #[inline]
    pub(crate) fn vertex(&self, contig: VertexId, pos: Option<u64>) -> Option<VertexId> {
        match &self.split {
            None => Some(contig),
            Some(split) => split.resolve(contig, pos?),
        }
    }

    pub(crate) fn into_output(self) -> (ContigIndex, ContigSizes) {
        match self.split {
            Some(split) => split.into_parts(),
            None => (self.index, self.sizes),
        }
    }
}

/// Fail unless `path` exists and, for files, has at least one data row.
pub(crate) fn check_input(path: &Path) -> Result<()> {
    if !path.exists() {
        return Err(ExtractError::io(
            path,
            "open",
            io::Error::new(io::ErrorKind::NotFound, "input does not exist"),
        ));
    }
    if path.is_file() {
        ensure_not_empty(path)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_thread_plan() {
        assert_eq!(ThreadPlan::new(4, 1), ThreadPlan { workers: 1, per_input: 5 });
        assert_eq!(ThreadPlan::new(4, 2), ThreadPlan { workers: 1, per_input: 3 });
        assert_eq!(ThreadPlan::new(8, 3), ThreadPlan { workers: 2, per_input: 3 });
        assert_eq!(ThreadPlan::new(10, 10), ThreadPlan { workers: 5, per_input: 2 });
    }

    #[test]
    fn test_thread_plan_never_zero() {
        for threads in 0..6 {
            for inputs in 0..6 {
                let plan = ThreadPlan::new(threads, inputs);
                assert!(plan.workers >= 1);
                assert!(plan.per_input >= 1);
                assert!(plan.workers <= inputs.max(1));
            }
        }
    }

    #[test]
    fn test_options_validate() {
        assert!(ExtractOptions::default().validate().is_ok());
        assert!(ExtractOptions::default().split(0).validate().is_err());
        assert!(ExtractOptions::default().order(5, 3).validate().is_err());
        // 0 opens the bound
        assert!(ExtractOptions::default().order(5, 0).validate().is_ok());
    }

    #[test]
    fn test_effective_region_filter_inherits_log_dir() {
        let opts = ExtractOptions::default()
            .region_filter(RegionFilter::new("hcr.bed"))
            .log_dir("logs");
        let filter = opts.effective_region_filter().unwrap();
        assert_eq!(filter.log_dir, Some(PathBuf::from("logs")));
    }

    #[test]
    fn test_vertex_space_split() {
        let sizes = ContigSizes::from_pairs([("A", 1000u64), ("B", 400)]).unwrap();
        let index = ContigIndex::from_sizes(&sizes);

        let space = VertexSpace::new(index.clone(), &sizes, 1).unwrap();
        assert_eq!(space.vertex(1, None), Some(1));

        let space = VertexSpace::new(index, &sizes, 4).unwrap();
        assert!(space.is_split());
        // A: width 250, B: width 100
        assert_eq!(space.vertex(0, Some(260)), Some(1));
        assert_eq!(space.vertex(1, Some(399)), Some(7));
        assert_eq!(space.vertex(0, None), None);

        let (idx, sizes) = space.into_output();
        assert_eq!(idx.len(), 8);
        assert_eq!(idx.name(1), Some("A_1"));
        assert_eq!(sizes.get("B_3"), Some(100));
    }

    #[test]
    fn test_check_input() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.pairs");
        assert!(matches!(check_input(&missing), Err(ExtractError::Io { .. })));

        let empty = dir.path().join("empty.pairs");
        std::fs::write(&empty, "## header only\n").unwrap();
        assert!(matches!(check_input(&empty), Err(ExtractError::EmptyInput { .. })));

        assert!(check_input(dir.path()).is_ok());
    }
}
