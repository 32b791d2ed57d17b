//! Multi-way (Pore-C) extraction: one read, one hyperedge of its distinct contigs.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Instant;

use rayon::prelude::*;

use crate::constants::PAIRS_CHUNK_ROWS;
use crate::contigs::{ContigIndex, ContigSizes, VertexId};
use crate::error::{ExtractError, Result};
use crate::filters::{alignment_edge_keep, dedup_and_filter_order, quality_keep, FilterStats};
use crate::hyperedges::HyperEdges;
use crate::table::porec::PoreCColumns;
use crate::table::{read_porec_table, PoreCTable, TableKind};

use super::{check_input, merge_partitions, ExtractOptions, Partition, ThreadPlan, VertexSpace};

/// Builds a hypergraph from one or more Pore-C tables.
///
/// With `split > 1` alignments are placed in the sub-vertex holding their
/// midpoint, and a read's hits on the same sub-vertex count once.
pub struct HyperExtractor {
    inputs: Vec<PathBuf>,
    index: ContigIndex,
    sizes: ContigSizes,
    options: ExtractOptions,
}

/// Resolved alignments of one table before deduplication.
#[derive(Debug, Default)]
struct Alignments {
    reads: Vec<u64>,
    vertices: Vec<VertexId>,
    mapq: Vec<u8>,
}

impl HyperExtractor {
    pub fn new(inputs: Vec<PathBuf>, index: ContigIndex, sizes: ContigSizes, options: ExtractOptions) -> Result<Self> {
        if inputs.is_empty() {
            return Err(ExtractError::validation("no Pore-C input given"));
        }
        options.validate()?;
        Ok(HyperExtractor {
            inputs,
            index,
            sizes,
            options,
        })
    }

    /// Run the whole pipeline and assemble the hypergraph.
    pub fn generate_edges(self) -> Result<HyperEdges> {
        let start = Instant::now();
        log::info!("Processing {} Pore-C table(s) ...", self.inputs.len());

        for input in &self.inputs {
            check_input(input)?;
        }

        let space = VertexSpace::new(self.index.clone(), &self.sizes, self.options.split)?;
        let plan = ThreadPlan::new(self.options.threads, self.inputs.len());
        let pool = plan.input_pool()?;
        let results: Vec<(Partition, FilterStats)> = pool.install(|| {
            self.inputs
                .par_iter()
                .map(|input| self.process_input(input, &space, &plan))
                .collect::<Result<Vec<_>>>()
        })?;

        let mut stats = FilterStats::default();
        let mut parts = Vec::with_capacity(results.len());
        for (part, part_stats) in results {
            stats.merge(&part_stats);
            parts.push(part);
        }
        stats.log("pore-c");

        let incidences = merge_partitions(parts)?;
        let (idx, sizes) = space.into_output();
        let edges = HyperEdges::assemble(idx, sizes, incidences)?;
        log::info!("Pore-C extraction took {:.2}s", start.elapsed().as_secs_f64());
        Ok(edges)
    }

    fn process_input(
        &self,
        input: &Path,
        space: &VertexSpace,
        plan: &ThreadPlan,
    ) -> Result<(Partition, FilterStats)> {
        let filtered = match self.options.effective_region_filter() {
            Some(filter) => Some(filter.apply(input, TableKind::PoreC, self.options.min_quality)?),
            None => None,
        };
        let source = filtered.as_ref().map_or(input, |f| f.path());

        let columns = PoreCColumns {
            with_positions: self.options.edge_length > 0 || space.is_split(),
            low_memory: self.options.low_memory,
            min_quality: self.options.min_quality,
        };
        let table = read_porec_table(source, columns, &space.lookup())?;
        drop(filtered);

        let chunk_pool = plan.chunk_pool()?;
        let starts: Vec<usize> = (0..table.len()).step_by(PAIRS_CHUNK_ROWS).collect();
        let chunks: Vec<(Alignments, FilterStats)> = chunk_pool.install(|| {
            starts
                .par_iter()
                .map(|&start| {
                    let end = (start + PAIRS_CHUNK_ROWS).min(table.len());
                    filter_alignments(&table, start..end, space, &self.options)
                })
                .collect()
        });

        let mut stats = FilterStats {
            malformed: table.malformed,
            ..Default::default()
        };
        let mut alignments = Alignments::default();
        for (chunk, chunk_stats) in chunks {
            stats.merge(&chunk_stats);
            alignments.reads.extend(chunk.reads);
            alignments.vertices.extend(chunk.vertices);
            alignments.mapq.extend(chunk.mapq);
        }

        let part = build_hyperedges(alignments, &self.options, &mut stats);
        stats.kept = part.num_incidences();
        log::debug!(
            "`{}`: {} reads kept as hyperedges",
            input.display(),
            part.n_edges
        );
        Ok((part, stats))
    }
}

/// Quality, edge-length and resolution filters over rows `range`.
fn filter_alignments(
    table: &PoreCTable,
    range: std::ops::Range<usize>,
    space: &VertexSpace,
    options: &ExtractOptions,
) -> (Alignments, FilterStats) {
    let lookup = space.lookup();
    let mut out = Alignments::default();
    let mut stats = FilterStats {
        input: range.len(),
        ..Default::default()
    };

    for i in range {
        if !quality_keep(table.mapq[i], options.min_quality) {
            stats.quality += 1;
            continue;
        }

        let midpoint = table.midpoint(i);
        if options.edge_length > 0 {
            let keep = midpoint
                .map(|m| alignment_edge_keep(m, table.chrom.length(i, &lookup), options.edge_length))
                .unwrap_or(false);
            if !keep {
                stats.edge += 1;
                continue;
            }
        }

        let Some(vertex) = table.chrom.resolve(i, &lookup).and_then(|c| space.vertex(c, midpoint)) else {
            stats.unresolved += 1;
            continue;
        };
        out.reads.push(table.read_idx[i]);
        out.vertices.push(vertex);
        out.mapq.push(table.mapq[i]);
    }

    (out, stats)
}

/// Deduplicate, apply the order filter and renumber reads densely in order
/// of first appearance.
fn build_hyperedges(alignments: Alignments, options: &ExtractOptions, stats: &mut FilterStats) -> Partition {
    let kept = dedup_and_filter_order(
        &alignments.reads,
        &alignments.vertices,
        options.min_order,
        options.max_order,
        stats,
    );

    let mut part = Partition {
        row: Vec::with_capacity(kept.len()),
        col: Vec::with_capacity(kept.len()),
        mapq: Some(Vec::with_capacity(kept.len())),
        n_edges: 0,
    };
    let mut edge_ids: HashMap<u64, u64> = HashMap::new();

    for i in kept {
        let next = edge_ids.len() as u64;
        let id = *edge_ids.entry(alignments.reads[i]).or_insert(next);
        part.row.push(alignments.vertices[i]);
        part.col.push(id);
        if let Some(mapq) = part.mapq.as_mut() {
            mapq.push(alignments.mapq[i]);
        }
    }
    part.n_edges = edge_ids.len() as u64;
    part
}
