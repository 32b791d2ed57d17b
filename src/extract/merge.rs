//! Sequential merge of partition results with hyperedge id offsets.

use crate::contigs::VertexId;
use crate::error::{ExtractError, Result};

/// Incidences produced by one worker (an input file or a row chunk).
///
/// `col` holds partition-local hyperedge ids covering `0..n_edges` densely.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Partition {
    pub row: Vec<VertexId>,
    pub col: Vec<u64>,
    /// Per-incidence quality, None when quality is not tracked.
    pub mapq: Option<Vec<u8>>,
    pub n_edges: u64,
}

impl Partition {
    pub fn new(with_quality: bool) -> Self {
        Partition {
            mapq: with_quality.then(Vec::new),
            ..Default::default()
        }
    }

    pub fn num_incidences(&self) -> usize {
        self.row.len()
    }

    pub fn is_empty(&self) -> bool {
        self.row.is_empty()
    }

    /// Append one hyperedge made of `vertices`, all sharing `mapq`.
    pub fn push_edge(&mut self, vertices: &[VertexId], mapq: Option<u8>) {
        let id = self.n_edges;
        for &v in vertices {
            self.row.push(v);
            self.col.push(id);
            if let (Some(q), Some(col)) = (mapq, self.mapq.as_mut()) {
                col.push(q);
            }
        }
        self.n_edges += 1;
    }
}

/// Merged incidence triples of a whole run.
pub type Incidences = Partition;

/// Concatenate partitions in order, offsetting each partition's hyperedge
/// ids by the number of hyperedges before it.
///
/// Quality is kept only if every partition tracked it.
///
/// # Errors
/// `Validation` if a partition's columns have different lengths.
pub fn merge_partitions(parts: Vec<Partition>) -> Result<Incidences> {
    let with_quality = parts.iter().all(|p| p.mapq.is_some());
    let total: usize = parts.iter().map(Partition::num_incidences).sum();

    let mut merged = Partition {
        row: Vec::with_capacity(total),
        col: Vec::with_capacity(total),
        mapq: with_quality.then(|| Vec::with_capacity(total)),
        n_edges: 0,
    };

    for (i, part) in parts.into_iter().enumerate() {
        if part.col.len() != part.row.len() {
            return Err(ExtractError::validation(format!(
                "partition {} has {} vertices but {} hyperedge ids",
                i,
                part.row.len(),
                part.col.len()
            )));
        }
        let offset = merged.n_edges;
        merged.row.extend_from_slice(&part.row);
        merged.col.extend(part.col.iter().map(|&c| c + offset));
        if let (Some(dst), Some(src)) = (merged.mapq.as_mut(), part.mapq) {
            if src.len() != part.row.len() {
                return Err(ExtractError::validation(format!(
                    "partition {} has {} vertices but {} quality values",
                    i,
                    part.row.len(),
                    src.len()
                )));
            }
            dst.extend_from_slice(&src);
        }
        merged.n_edges += part.n_edges;
    }

    Ok(merged)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn partition(edges: &[&[VertexId]], mapq: Option<u8>) -> Partition {
        let mut p = Partition::new(mapq.is_some());
        for e in edges {
            p.push_edge(e, mapq);
        }
        p
    }

    #[test]
    fn test_push_edge() {
        let p = partition(&[&[0, 1], &[2, 3, 4]], Some(30));
        assert_eq!(p.row, vec![0, 1, 2, 3, 4]);
        assert_eq!(p.col, vec![0, 0, 1, 1, 1]);
        assert_eq!(p.mapq, Some(vec![30; 5]));
        assert_eq!(p.n_edges, 2);
    }

    #[test]
    fn test_merge_offsets_by_edge_count() {
        let a = partition(&[&[0, 1], &[1, 2]], Some(10));
        let b = partition(&[&[3, 4], &[0, 2], &[1, 3]], Some(20));

        let merged = merge_partitions(vec![a, b]).unwrap();

        assert_eq!(merged.n_edges, 5);
        assert_eq!(merged.col, vec![0, 0, 1, 1, 2, 2, 3, 3, 4, 4]);
        assert_eq!(merged.row, vec![0, 1, 1, 2, 3, 4, 0, 2, 1, 3]);
        assert_eq!(merged.mapq.as_ref().map(Vec::len), Some(10));
    }

    #[test]
    fn test_merge_drops_quality_if_any_partition_lacks_it() {
        let a = partition(&[&[0, 1]], Some(10));
        let b = partition(&[&[1, 2]], None);
        let merged = merge_partitions(vec![a, b]).unwrap();
        assert!(merged.mapq.is_none());
    }

    #[test]
    fn test_merge_empty_partitions() {
        let a = partition(&[&[0, 1]], None);
        let merged = merge_partitions(vec![Partition::new(false), a, Partition::new(false)]).unwrap();
        assert_eq!(merged.col, vec![0, 0]);
        assert_eq!(merged.n_edges, 1);

        let merged = merge_partitions(Vec::new()).unwrap();
        assert!(merged.is_empty());
    }

    #[test]
    fn test_merge_rejects_ragged_partition() {
        let mut bad = partition(&[&[0, 1]], None);
        bad.col.pop();
        assert!(matches!(
            merge_partitions(vec![bad]),
            Err(ExtractError::Validation(_))
        ));
    }
}
