//! Summary of a saved hypergraph.

use anyhow::{Context, Result};
use std::collections::HashMap;
use std::path::Path;

use hyperextract::HyperEdges;

/// `hyperextract stats`: print counts and the hyperedge size distribution.
pub fn print_stats(path: &Path) -> Result<()> {
    let edges = HyperEdges::load(path)
        .with_context(|| format!("Failed to load hypergraph: {}", path.display()))?;

    let mut sizes = vec![0usize; edges.num_hyperedges() as usize];
    for &c in &edges.col {
        sizes[c as usize] += 1;
    }
    let mut histogram: HashMap<usize, usize> = HashMap::new();
    for size in sizes {
        *histogram.entry(size).or_insert(0) += 1;
    }
    let mut histogram: Vec<_> = histogram.into_iter().collect();
    histogram.sort_unstable();

    println!("file\t{}", path.display());
    println!("vertices\t{}", edges.num_vertices());
    println!("hyperedges\t{}", edges.num_hyperedges());
    println!("incidences\t{}", edges.num_incidences());
    println!("quality\t{}", if edges.has_quality() { "yes" } else { "no" });
    for (size, count) in histogram {
        println!("order_{}\t{}", size, count);
    }
    Ok(())
}
