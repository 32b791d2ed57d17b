//! Contig splitting: K equal-width sub-vertices per contig.
//!
//! Sub-vertex `"{contig}_{bin}"` of the contig with vertex id `c` gets id
//! `c * K + bin`, so the split id space stays dense and follows the order of
//! the original index.

use crate::contigs::{ContigIndex, ContigSizes, VertexId};
use crate::error::{ExtractError, Result};

/// Split-augmented index built from a `ContigIndex`, its sizes and a factor K.
#[derive(Debug, Clone)]
pub struct SplitIndex {
    split: u32,
    /// Bin width per original vertex id.
    widths: Vec<u64>,
    index: ContigIndex,
    sizes: ContigSizes,
}

impl SplitIndex {
    /// Build the split index.
    ///
    /// # Errors
    /// - `Validation` if `split` is 0 or a contig of `index` has no size
    /// - `DegenerateSplit` if a contig is shorter than `split` bp
    pub fn new(index: &ContigIndex, sizes: &ContigSizes, split: u32) -> Result<Self> {
        if split == 0 {
            return Err(ExtractError::validation("split factor must be at least 1"));
        }

        let total = index.len() as u64 * split as u64;
        if total > VertexId::MAX as u64 {
            return Err(ExtractError::overflow(
                "split index",
                VertexId::MAX as usize,
                total as usize,
            ));
        }

        let mut widths = Vec::with_capacity(index.len());
        let mut names = Vec::with_capacity(total as usize);
        let mut split_sizes = Vec::with_capacity(total as usize);

        for (contig, _) in index.iter() {
            let length = sizes.get(contig).ok_or_else(|| {
                ExtractError::validation(format!("contig '{}' has no size", contig))
            })?;
            let width = length / split as u64;
            if width == 0 {
                return Err(ExtractError::DegenerateSplit {
                    contig: contig.to_string(),
                    length,
                    split,
                });
            }
            widths.push(width);
            for bin in 0..split {
                let name = format!("{}_{}", contig, bin);
                split_sizes.push((name.clone(), width));
                names.push(name);
            }
        }

        Ok(SplitIndex {
            split,
            widths,
            index: ContigIndex::from_names(names)?,
            sizes: ContigSizes::from_pairs(split_sizes)?,
        })
    }

    /// Bin index of `pos` on contig `contig`: `floor(pos / floor(len / K))`.
    #[inline]
    pub fn bin(&self, contig: VertexId, pos: u64) -> u64 {
        pos / self.widths[contig as usize]
    }

    /// Split vertex of `pos` on `contig`, or None when the bin falls past
    /// bin K-1 (the `len % K` tail), which has no sub-vertex.
    #[inline]
    pub fn resolve(&self, contig: VertexId, pos: u64) -> Option<VertexId> {
        let bin = self.bin(contig, pos);
        if bin >= self.split as u64 {
            return None;
        }
        Some(contig * self.split + bin as VertexId)
    }

    /// The split-augmented `"{contig}_{bin}"` index.
    pub fn index(&self) -> &ContigIndex {
        &self.index
    }

    /// Sub-vertex lengths, in split vertex id order.
    pub fn sizes(&self) -> &ContigSizes {
        &self.sizes
    }

    pub fn into_parts(self) -> (ContigIndex, ContigSizes) {
        (self.index, self.sizes)
    }
}
