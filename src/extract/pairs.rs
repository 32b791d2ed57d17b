//! Pairwise (Hi-C) extraction: one pair, one hyperedge of two vertices.

use std::path::{Path, PathBuf};
use std::time::Instant;

use rayon::prelude::*;

use crate::constants::PAIRS_CHUNK_ROWS;
use crate::contigs::{ContigIndex, ContigSizes};
use crate::error::{ExtractError, Result};
use crate::filters::{pair_edge_keep, quality_keep, FilterStats};
use crate::hyperedges::HyperEdges;
use crate::store::StoreOpener;
use crate::table::pairs::PairsColumns;
use crate::table::{read_pairs_table, sniff_pairs_schema, PairsTable, QualitySchema, TableKind};

use super::{check_input, merge_partitions, ExtractOptions, Partition, ThreadPlan, VertexSpace};

/// Builds a hypergraph from one or more pairs tables (or pairs stores).
///
/// With `split > 1` every contig becomes K sub-vertices and a pair whose two
/// ends land in the same sub-vertex contributes a single incidence.
pub struct Extractor {
    inputs: Vec<PathBuf>,
    index: ContigIndex,
    sizes: ContigSizes,
    options: ExtractOptions,
    store: Option<StoreOpener>,
}

impl Extractor {
    pub fn new(inputs: Vec<PathBuf>, index: ContigIndex, sizes: ContigSizes, options: ExtractOptions) -> Result<Self> {
        if inputs.is_empty() {
            return Err(ExtractError::validation("no pairs input given"));
        }
        options.validate()?;
        Ok(Extractor {
            inputs,
            index,
            sizes,
            options,
            store: None,
        })
    }

    /// Route directory inputs to a compressed pairs store.
    pub fn with_store(mut self, opener: StoreOpener) -> Self {
        self.store = Some(opener);
        self
    }

    /// Run the whole pipeline and assemble the hypergraph.
    pub fn generate_edges(self) -> Result<HyperEdges> {
        let start = Instant::now();
        log::info!("Extract edges from {} pairs input(s).", self.inputs.len());

        for input in &self.inputs {
            check_input(input)?;
        }
        let schema = self.quality_schema()?;
        if schema == QualitySchema::WithoutQuality && self.options.min_quality > 0 {
            log::warn!("Pairs carry no mapping quality column; the quality filter is skipped");
        }

        let space = VertexSpace::new(self.index.clone(), &self.sizes, self.options.split)?;
        if space.is_split() && self.store.is_some() && self.inputs.iter().any(|p| p.is_dir()) {
            return Err(ExtractError::validation(
                "pairs store input can not be combined with contig splitting",
            ));
        }

        let plan = ThreadPlan::new(self.options.threads, self.inputs.len());
        log::debug!(
            "Thread plan: {} input worker(s) x {} chunk thread(s)",
            plan.workers,
            plan.per_input
        );
        let pool = plan.input_pool()?;
        let results: Vec<(Partition, FilterStats)> = pool.install(|| {
            self.inputs
                .par_iter()
                .map(|input| self.process_input(input, schema, &space, &plan))
                .collect::<Result<Vec<_>>>()
        })?;

        let mut stats = FilterStats::default();
        let mut parts = Vec::with_capacity(results.len());
        for (part, part_stats) in results {
            stats.merge(&part_stats);
            parts.push(part);
        }
        stats.log("pairs");

        let incidences = merge_partitions(parts)?;
        let (idx, sizes) = space.into_output();
        let edges = HyperEdges::assemble(idx, sizes, incidences)?;
        log::info!("Pairs extraction took {:.2}s", start.elapsed().as_secs_f64());
        Ok(edges)
    }

    /// Quality schema of the whole run: with quality only if every table has it.
    ///
    /// Stores always carry quality and do not take part in the vote.
    fn quality_schema(&self) -> Result<QualitySchema> {
        let mut schemas = Vec::with_capacity(self.inputs.len());
        for input in self.inputs.iter().filter(|p| p.is_file()) {
            let schema = sniff_pairs_schema(input)?;
            log::debug!("`{}`: {:?}", input.display(), schema);
            schemas.push(schema);
        }
        let combined = QualitySchema::combine(schemas.iter().copied());
        if combined == QualitySchema::WithoutQuality && schemas.contains(&QualitySchema::WithQuality) {
            log::warn!("Inputs disagree on the mapping quality column; proceeding without quality");
        }
        Ok(combined)
    }

    fn process_input(
        &self,
        input: &Path,
        schema: QualitySchema,
        space: &VertexSpace,
        plan: &ThreadPlan,
    ) -> Result<(Partition, FilterStats)> {
        let filtered = match self.options.effective_region_filter() {
            Some(filter) => Some(filter.apply(input, TableKind::Pairs, self.options.min_quality)?),
            None => None,
        };
        let source = filtered.as_ref().map_or(input, |f| f.path());

        if source.is_dir() {
            return self.process_store(source);
        }

        let columns = PairsColumns {
            schema,
            with_positions: self.options.edge_length > 0 || space.is_split(),
            low_memory: self.options.low_memory,
            min_quality: self.options.min_quality,
        };
        let lookup = space.lookup();
        let table = read_pairs_table(source, columns, &lookup)?;
        drop(filtered);

        let chunk_pool = plan.chunk_pool()?;
        let starts: Vec<usize> = (0..table.len()).step_by(PAIRS_CHUNK_ROWS).collect();
        let chunks: Vec<(Partition, FilterStats)> = chunk_pool.install(|| {
            starts
                .par_iter()
                .map(|&start| {
                    let end = (start + PAIRS_CHUNK_ROWS).min(table.len());
                    filter_pairs(&table, start..end, space, &self.options)
                })
                .collect()
        });

        let mut stats = FilterStats::default();
        let mut parts = Vec::with_capacity(chunks.len());
        for (part, chunk_stats) in chunks {
            stats.merge(&chunk_stats);
            parts.push(part);
        }
        // Keep the quality column shape even when the table had no rows
        if parts.is_empty() {
            parts.push(Partition::new(table.mapq.is_some()));
        }
        stats.malformed = table.malformed;
        log::debug!(
            "`{}`: {} of {} pairs kept",
            input.display(),
            stats.kept,
            stats.input
        );
        Ok((merge_partitions(parts)?, stats))
    }

    fn process_store(&self, path: &Path) -> Result<(Partition, FilterStats)> {
        let opener = self.store.as_ref().ok_or_else(|| {
            ExtractError::validation(format!(
                "`{}` is a directory but no pairs store is available",
                path.display()
            ))
        })?;
        let store = opener(path)?;
        if !store.is_pairs() {
            return Err(ExtractError::validation(format!(
                "`{}` is not a pairs store",
                path.display()
            )));
        }

        let chunks = store.read(self.options.min_quality)?;
        let part = store.to_hg_table(
            &chunks,
            &self.index,
            &self.sizes,
            self.options.min_quality,
            self.options.edge_length,
        )?;
        let n = part.n_edges as usize;
        Ok((
            part,
            FilterStats {
                input: n,
                kept: n,
                ..Default::default()
            },
        ))
    }
}

/// Filter and resolve rows `range` of a pairs table.
///
/// Order: quality, edge length, vertex resolution (with splitting).
pub(crate) fn filter_pairs(
    table: &PairsTable,
    range: std::ops::Range<usize>,
    space: &VertexSpace,
    options: &ExtractOptions,
) -> (Partition, FilterStats) {
    let lookup = space.lookup();
    let mut part = Partition::new(table.mapq.is_some());
    let mut stats = FilterStats {
        input: range.len(),
        ..Default::default()
    };

    for i in range {
        let mapq = table.mapq.as_ref().map(|q| q[i]);
        if let Some(q) = mapq {
            if !quality_keep(q, options.min_quality) {
                stats.quality += 1;
                continue;
            }
        }

        let pos1 = table.pos1.as_ref().map(|p| p.get(i));
        let pos2 = table.pos2.as_ref().map(|p| p.get(i));
        if options.edge_length > 0 {
            let (Some(p1), Some(p2)) = (pos1, pos2) else {
                stats.edge += 1;
                continue;
            };
            let keep = pair_edge_keep(
                p1,
                table.chrom1.length(i, &lookup),
                p2,
                table.chrom2.length(i, &lookup),
                options.edge_length,
            );
            if !keep {
                stats.edge += 1;
                continue;
            }
        }

        let v1 = table.chrom1.resolve(i, &lookup).and_then(|c| space.vertex(c, pos1));
        let v2 = table.chrom2.resolve(i, &lookup).and_then(|c| space.vertex(c, pos2));
        let (Some(v1), Some(v2)) = (v1, v2) else {
            stats.unresolved += 1;
            continue;
        };

        if space.is_split() && v1 == v2 {
            stats.duplicate += 1;
            part.push_edge(&[v1], mapq);
        } else {
            part.push_edge(&[v1, v2], mapq);
        }
        stats.kept += 1;
    }

    (part, stats)
}
