//! Hypergraph incidence model and its binary artifact.
//!
//! # File Format (`HGE1`, version 1)
//!
//! Header (uncompressed, little-endian):
//! - magic `HGE1`, version (u32)
//! - vertex count (u32), then per vertex in id order: name length (u64),
//!   name bytes, contig length (u64, 0 when unknown)
//! - incidence count (u64), quality flag (u8)
//!
//! Body (one zstd stream):
//! - `row` as LEB128 varints
//! - `col` as LEB128 varints
//! - `mapq` as raw bytes when the quality flag is set

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use crate::constants::{
    HYPEREDGES_MAGIC, HYPEREDGES_VERSION, MAX_INCIDENCES, MAX_STRING_LENGTH, MAX_VERTICES,
    WRITE_BUF_SIZE, ZSTD_LEVEL,
};
use crate::contigs::{ContigIndex, ContigSizes, VertexId};
use crate::encoding::{extend_varints, read_varints};
use crate::error::{ExtractError, Result};
use crate::extract::Incidences;

/// Hypergraph incidence structure: contigs are vertices, reads are hyperedges.
///
/// `row[i]` is a vertex of hyperedge `col[i]`; `mapq[i]` is its quality, or
/// `mapq` is empty when quality was not tracked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HyperEdges {
    pub idx: ContigIndex,
    pub row: Vec<VertexId>,
    pub col: Vec<u64>,
    pub mapq: Vec<u8>,
    pub contigsizes: ContigSizes,
}

impl HyperEdges {
    /// Assemble the final structure from merged incidences.
    ///
    /// # Errors
    /// - `NoHyperedges` if nothing survived filtering
    /// - `Validation` if the incidences violate the model's invariants
    pub fn assemble(idx: ContigIndex, contigsizes: ContigSizes, incidences: Incidences) -> Result<Self> {
        if incidences.n_edges == 0 || incidences.row.is_empty() {
            return Err(ExtractError::NoHyperedges(
                "every row was removed by the filters; check the thresholds and the contig list".to_string(),
            ));
        }

        let edges = HyperEdges {
            idx,
            row: incidences.row,
            col: incidences.col,
            mapq: incidences.mapq.unwrap_or_default(),
            contigsizes,
        };
        edges.validate()?;

        log::info!(
            "Result of {} raw incidences in {} hyperedges over {} vertices. \
             Note: it's not the final statistics for hypergraph.",
            edges.num_incidences(),
            edges.num_hyperedges(),
            edges.num_vertices()
        );
        Ok(edges)
    }

    pub fn num_incidences(&self) -> usize {
        self.row.len()
    }

    /// Number of hyperedges (`col` ids are dense from 0).
    pub fn num_hyperedges(&self) -> u64 {
        self.col.iter().max().map_or(0, |&m| m + 1)
    }

    pub fn num_vertices(&self) -> usize {
        self.idx.len()
    }

    pub fn has_quality(&self) -> bool {
        !self.mapq.is_empty()
    }

    /// Check the structural invariants:
    /// - `row`, `col` (and `mapq` when present) have equal length
    /// - every `row` value is a vertex of `idx`
    /// - `col` ids cover `0..num_hyperedges` without gaps
    pub fn validate(&self) -> Result<()> {
        if self.row.len() != self.col.len() {
            return Err(ExtractError::validation(format!(
                "row has {} entries but col has {}",
                self.row.len(),
                self.col.len()
            )));
        }
        if !self.mapq.is_empty() && self.mapq.len() != self.row.len() {
            return Err(ExtractError::validation(format!(
                "mapq has {} entries but row has {}",
                self.mapq.len(),
                self.row.len()
            )));
        }
        if let Some(&v) = self.row.iter().find(|&&v| v as usize >= self.idx.len()) {
            return Err(ExtractError::validation(format!(
                "vertex id {} is outside the index of {} vertices",
                v,
                self.idx.len()
            )));
        }

        let n_edges = self.num_hyperedges();
        if n_edges > self.col.len() as u64 {
            return Err(ExtractError::validation(format!(
                "hyperedge ids reach {} with only {} incidences",
                n_edges - 1,
                self.col.len()
            )));
        }
        let mut seen = vec![false; n_edges as usize];
        for &c in &self.col {
            seen[c as usize] = true;
        }
        if let Some(gap) = seen.iter().position(|&s| !s) {
            return Err(ExtractError::validation(format!(
                "hyperedge ids are not contiguous: {} is missing",
                gap
            )));
        }
        Ok(())
    }

    /// Write the vertex -> length side table in vertex id order.
    pub fn write_contigsizes(&self, path: &Path) -> Result<()> {
        self.contigsizes.restricted_to(&self.idx).write(path)
    }

    /// Save to the `HGE1` binary format.
    pub fn save(&self, path: &Path) -> Result<()> {
        let file = File::create(path).map_err(|e| ExtractError::io(path, "create", e))?;
        let mut writer = BufWriter::new(file);
        let io_err = |e| ExtractError::io(path, "write", e);

        writer.write_all(HYPEREDGES_MAGIC).map_err(io_err)?;
        writer.write_all(&HYPEREDGES_VERSION.to_le_bytes()).map_err(io_err)?;

        writer.write_all(&(self.idx.len() as u32).to_le_bytes()).map_err(io_err)?;
        for (name, _) in self.idx.iter() {
            let name_bytes = name.as_bytes();
            writer.write_all(&(name_bytes.len() as u64).to_le_bytes()).map_err(io_err)?;
            writer.write_all(name_bytes).map_err(io_err)?;
            let length = self.contigsizes.get(name).unwrap_or(0);
            writer.write_all(&length.to_le_bytes()).map_err(io_err)?;
        }

        writer.write_all(&(self.row.len() as u64).to_le_bytes()).map_err(io_err)?;
        writer.write_all(&[self.has_quality() as u8]).map_err(io_err)?;

        let mut encoder = zstd::stream::write::Encoder::new(writer, ZSTD_LEVEL).map_err(io_err)?;
        let mut write_buf = Vec::with_capacity(WRITE_BUF_SIZE.min(self.row.len() * 2 + 16));

        for chunk in self.row.chunks(WRITE_BUF_SIZE / 8) {
            extend_varints(&mut write_buf, chunk.iter().map(|&v| v as u64));
            encoder.write_all(&write_buf).map_err(io_err)?;
            write_buf.clear();
        }
        for chunk in self.col.chunks(WRITE_BUF_SIZE / 8) {
            extend_varints(&mut write_buf, chunk.iter().copied());
            encoder.write_all(&write_buf).map_err(io_err)?;
            write_buf.clear();
        }
        encoder.write_all(&self.mapq).map_err(io_err)?;

        let mut writer = encoder.finish().map_err(io_err)?;
        writer.flush().map_err(io_err)?;

        log::info!("Successful output hypergraph into `{}`", path.display());
        Ok(())
    }

    /// Load from the `HGE1` binary format.
    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|e| ExtractError::io(path, "open", e))?;
        let mut reader = BufReader::new(file);
        let io_err = |e| ExtractError::io(path, "read", e);
        let mut buf4 = [0u8; 4];
        let mut buf8 = [0u8; 8];

        reader.read_exact(&mut buf4).map_err(io_err)?;
        if &buf4 != HYPEREDGES_MAGIC {
            return Err(ExtractError::format(path, "not a hypergraph file (bad magic)"));
        }
        reader.read_exact(&mut buf4).map_err(io_err)?;
        let version = u32::from_le_bytes(buf4);
        if version != HYPEREDGES_VERSION {
            return Err(ExtractError::format(
                path,
                format!(
                    "unsupported version {} (expected {})",
                    version, HYPEREDGES_VERSION
                ),
            ));
        }

        reader.read_exact(&mut buf4).map_err(io_err)?;
        let n_vertices = u32::from_le_bytes(buf4) as usize;
        if n_vertices > MAX_VERTICES {
            return Err(ExtractError::overflow("vertex count", MAX_VERTICES, n_vertices));
        }

        let mut names = Vec::with_capacity(n_vertices);
        let mut sizes = Vec::with_capacity(n_vertices);
        for _ in 0..n_vertices {
            reader.read_exact(&mut buf8).map_err(io_err)?;
            let name_len = u64::from_le_bytes(buf8) as usize;
            if name_len > MAX_STRING_LENGTH {
                return Err(ExtractError::overflow("vertex name length", MAX_STRING_LENGTH, name_len));
            }
            let mut nbuf = vec![0u8; name_len];
            reader.read_exact(&mut nbuf).map_err(io_err)?;
            let name = String::from_utf8(nbuf)
                .map_err(|_| ExtractError::format(path, "vertex name is not valid UTF-8"))?;

            reader.read_exact(&mut buf8).map_err(io_err)?;
            let length = u64::from_le_bytes(buf8);
            if length > 0 {
                sizes.push((name.clone(), length));
            }
            names.push(name);
        }

        reader.read_exact(&mut buf8).map_err(io_err)?;
        let n_incidences = u64::from_le_bytes(buf8) as usize;
        if n_incidences > MAX_INCIDENCES {
            return Err(ExtractError::overflow("incidence count", MAX_INCIDENCES, n_incidences));
        }
        let mut flag = [0u8; 1];
        reader.read_exact(&mut flag).map_err(io_err)?;
        let has_quality = match flag[0] {
            0 => false,
            1 => true,
            other => {
                return Err(ExtractError::format(
                    path,
                    format!("invalid quality flag {}", other),
                ))
            }
        };

        let body = zstd::stream::decode_all(reader)
            .map_err(|e| ExtractError::encoding(format!("failed to decompress `{}`: {}", path.display(), e)))?;

        let mut pos = 0usize;
        let row_values = read_varints(&body, &mut pos, n_incidences)?;
        let row = row_values
            .into_iter()
            .map(|v| {
                VertexId::try_from(v)
                    .map_err(|_| ExtractError::encoding(format!("vertex id {} does not fit in u32", v)))
            })
            .collect::<Result<Vec<_>>>()?;
        let col = read_varints(&body, &mut pos, n_incidences)?;

        let mapq = if has_quality {
            let end = pos + n_incidences;
            if end > body.len() {
                return Err(ExtractError::encoding(format!(
                    "quality column truncated: expected {} bytes, found {}",
                    n_incidences,
                    body.len() - pos
                )));
            }
            let mapq = body[pos..end].to_vec();
            pos = end;
            mapq
        } else {
            Vec::new()
        };
        if pos != body.len() {
            return Err(ExtractError::encoding(format!(
                "{} trailing bytes after incidence data",
                body.len() - pos
            )));
        }

        let edges = HyperEdges {
            idx: ContigIndex::from_names(names)?,
            row,
            col,
            mapq,
            contigsizes: ContigSizes::from_pairs(sizes)?,
        };
        edges.validate()?;
        Ok(edges)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::Partition;
    use tempfile::tempdir;

    fn sample() -> HyperEdges {
        let sizes = ContigSizes::from_pairs([("A", 10_000u64), ("B", 20_000), ("C", 300)]).unwrap();
        let idx = ContigIndex::from_sizes(&sizes);
        let mut inc = Partition::new(true);
        inc.push_edge(&[0, 1], Some(30));
        inc.push_edge(&[1, 2, 0], Some(5));
        HyperEdges::assemble(idx, sizes, inc).unwrap()
    }

    #[test]
    fn test_assemble_counts() {
        let edges = sample();
        assert_eq!(edges.num_incidences(), 5);
        assert_eq!(edges.num_hyperedges(), 2);
        assert_eq!(edges.num_vertices(), 3);
        assert_eq!(edges.mapq, vec![30, 30, 5, 5, 5]);
    }

    #[test]
    fn test_assemble_empty_is_error() {
        let sizes = ContigSizes::from_pairs([("A", 10u64)]).unwrap();
        let idx = ContigIndex::from_sizes(&sizes);
        let err = HyperEdges::assemble(idx, sizes, Partition::new(false)).unwrap_err();
        assert!(matches!(err, ExtractError::NoHyperedges(_)));
    }

    #[test]
    fn test_validate_rejects_bad_structures() {
        let mut edges = sample();
        edges.row[0] = 3;
        assert!(edges.validate().is_err());

        let mut edges = sample();
        edges.col = vec![0, 0, 2, 2, 2];
        assert!(edges.validate().is_err());

        let mut edges = sample();
        edges.mapq.pop();
        assert!(edges.validate().is_err());

        let mut edges = sample();
        edges.mapq.clear();
        assert!(edges.validate().is_ok());
    }

    #[test]
    fn test_save_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.hg");

        let edges = sample();
        edges.save(&path).unwrap();
        let loaded = HyperEdges::load(&path).unwrap();
        assert_eq!(loaded, edges);

        let mut no_q = sample();
        no_q.mapq.clear();
        no_q.save(&path).unwrap();
        assert_eq!(HyperEdges::load(&path).unwrap(), no_q);
    }

    #[test]
    fn test_load_rejects_bad_magic() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.hg");
        std::fs::write(&path, b"NOPE\x01\x00\x00\x00").unwrap();
        assert!(matches!(
            HyperEdges::load(&path),
            Err(ExtractError::Format { .. })
        ));
    }

    #[test]
    fn test_write_contigsizes() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.contigsizes");
        sample().write_contigsizes(&path).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content, "A\t10000\nB\t20000\nC\t300\n");
    }
}
