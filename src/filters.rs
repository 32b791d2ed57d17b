//! Row filters applied before assembly.
//!
//! Every threshold uses 0 as "disabled": a quality of 0 keeps every row, an
//! edge length of 0 keeps every position, an order bound of 0 is open.

use std::collections::{HashMap, HashSet};

use crate::contigs::VertexId;

/// Mapping quality filter: `mapq >= min_quality`.
#[inline]
pub fn quality_keep(mapq: u8, min_quality: u8) -> bool {
    min_quality == 0 || mapq >= min_quality
}

/// True if `pos` lies within `edge_length` of either end of a contig of
/// length `length`: `pos < edge_length || pos > length - edge_length`.
#[inline]
pub fn near_terminus(pos: u64, length: u64, edge_length: u64) -> bool {
    if edge_length == 0 {
        return true;
    }
    pos < edge_length || pos > length.saturating_sub(edge_length)
}

/// Edge-length filter for a pairwise row: both ends must be near a terminus.
///
/// A contig without a known length fails the filter when it is enabled.
#[inline]
pub fn pair_edge_keep(
    pos1: u64,
    length1: Option<u64>,
    pos2: u64,
    length2: Option<u64>,
    edge_length: u64,
) -> bool {
    if edge_length == 0 {
        return true;
    }
    match (length1, length2) {
        (Some(l1), Some(l2)) => near_terminus(pos1, l1, edge_length) && near_terminus(pos2, l2, edge_length),
        _ => false,
    }
}

/// Edge-length filter for one multi-way alignment, tested on its midpoint.
#[inline]
pub fn alignment_edge_keep(midpoint: u64, length: Option<u64>, edge_length: u64) -> bool {
    if edge_length == 0 {
        return true;
    }
    match length {
        Some(l) => near_terminus(midpoint, l, edge_length),
        None => false,
    }
}

/// True if `order` is within `min_order..=max_order` (0 opens a bound).
#[inline]
pub fn order_keep(order: usize, min_order: usize, max_order: usize) -> bool {
    (min_order == 0 || order >= min_order) && (max_order == 0 || order <= max_order)
}

/// Deduplicate `(read, vertex)` pairs and apply the order filter.
///
/// Returns the row indices to keep, in input order: the first occurrence of
/// every `(read, vertex)` pair whose read touches between `min_order` and
/// `max_order` distinct vertices. `stats` receives the drop counts.
pub fn dedup_and_filter_order(
    reads: &[u64],
    vertices: &[VertexId],
    min_order: usize,
    max_order: usize,
    stats: &mut FilterStats,
) -> Vec<usize> {
    debug_assert_eq!(reads.len(), vertices.len());

    let mut seen: HashSet<(u64, VertexId)> = HashSet::with_capacity(reads.len());
    let mut orders: HashMap<u64, usize> = HashMap::new();
    let mut unique = Vec::with_capacity(reads.len());

    for (i, (&read, &vertex)) in reads.iter().zip(vertices).enumerate() {
        if seen.insert((read, vertex)) {
            *orders.entry(read).or_insert(0) += 1;
            unique.push(i);
        } else {
            stats.duplicate += 1;
        }
    }

    let kept: Vec<usize> = unique
        .into_iter()
        .filter(|&i| order_keep(orders[&reads[i]], min_order, max_order))
        .collect();

    stats.order_reads += orders
        .values()
        .filter(|&&n| !order_keep(n, min_order, max_order))
        .count();
    kept
}

/// Rows dropped at each filter stage of one partition.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FilterStats {
    pub input: usize,
    /// Data lines skipped by the parser (not part of `input`).
    pub malformed: usize,
    pub quality: usize,
    pub edge: usize,
    /// Contig missing from the index, or a split bin past the last sub-vertex.
    pub unresolved: usize,
    /// Repeated `(read, vertex)` incidences.
    pub duplicate: usize,
    /// Reads (not rows) rejected by the order filter.
    pub order_reads: usize,
    pub kept: usize,
}

impl FilterStats {
    pub fn merge(&mut self, other: &FilterStats) {
        self.input += other.input;
        self.malformed += other.malformed;
        self.quality += other.quality;
        self.edge += other.edge;
        self.unresolved += other.unresolved;
        self.duplicate += other.duplicate;
        self.order_reads += other.order_reads;
        self.kept += other.kept;
    }

    pub fn log(&self, label: &str) {
        log::info!(
            "{}: {} rows in, {} kept (malformed -{}, quality -{}, edge -{}, unresolved -{}, duplicate -{}, order -{} reads)",
            label,
            self.input,
            self.kept,
            self.malformed,
            self.quality,
            self.edge,
            self.unresolved,
            self.duplicate,
            self.order_reads
        );
    }
}
