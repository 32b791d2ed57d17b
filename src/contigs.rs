//! Contig interning table and contig lengths.
//!
//! `ContigIndex` maps contig names to dense, 0-based vertex ids and is built
//! once per run; `ContigSizes` carries contig lengths used by the positional
//! filter and by contig splitting. Both are read-only once constructed and
//! shared by reference across worker threads.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use csv::ByteRecord;

use crate::constants::NARROW_POSITION_LIMIT;
use crate::error::{ExtractError, Result};
use crate::table::{field, table_error, tsv_reader};

/// Dense vertex id of a contig (or split bin).
pub type VertexId = u32;

/// Contig name -> dense vertex id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContigIndex {
    names: Vec<String>,
    ids: HashMap<String, VertexId>,
}

impl ContigIndex {
    /// Build an index assigning ids in iteration order.
    ///
    /// Duplicate names are rejected since they would leave a gap in the id space.
    pub fn from_names<I, S>(names: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut index = ContigIndex::default();
        for name in names {
            let name = name.into();
            if index.ids.contains_key(&name) {
                return Err(ExtractError::validation(format!(
                    "duplicate contig name '{}' in contig index",
                    name
                )));
            }
            let id = VertexId::try_from(index.names.len()).map_err(|_| {
                ExtractError::overflow("contig index", VertexId::MAX as usize, index.names.len())
            })?;
            index.ids.insert(name.clone(), id);
            index.names.push(name);
        }
        Ok(index)
    }

    /// Build an index over every contig of `sizes`, in file order.
    pub fn from_sizes(sizes: &ContigSizes) -> Self {
        let names: Vec<String> = sizes.iter().map(|(name, _)| name.to_string()).collect();
        let ids = names
            .iter()
            .enumerate()
            .map(|(i, name)| (name.clone(), i as VertexId))
            .collect();
        ContigIndex { names, ids }
    }

    #[inline]
    pub fn get(&self, name: &str) -> Option<VertexId> {
        self.ids.get(name).copied()
    }

    pub fn name(&self, id: VertexId) -> Option<&str> {
        self.names.get(id as usize).map(|s| s.as_str())
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Iterate `(name, id)` in id order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, VertexId)> + '_ {
        self.names
            .iter()
            .enumerate()
            .map(|(i, name)| (name.as_str(), i as VertexId))
    }
}

/// Contig name -> length in bp, kept in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContigSizes {
    order: Vec<String>,
    lengths: HashMap<String, u64>,
}

impl ContigSizes {
    /// Build from `(name, length)` pairs. Lengths must be positive and names unique.
    pub fn from_pairs<I, S>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, u64)>,
        S: Into<String>,
    {
        let mut sizes = ContigSizes::default();
        for (name, length) in pairs {
            sizes.insert(name.into(), length)?;
        }
        Ok(sizes)
    }

    /// Read a two-column `contig<TAB>length` table.
    ///
    /// Blank lines and `#` comments are skipped; extra columns are ignored.
    pub fn from_path(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|e| ExtractError::io(path, "open", e))?;
        let mut reader = tsv_reader(file);
        let mut record = ByteRecord::new();
        let mut sizes = ContigSizes::default();

        while reader
            .read_byte_record(&mut record)
            .map_err(|e| table_error(path, e))?
        {
            let lineno = record.position().map_or(0, |p| p.line());
            let (Some(name), Some(length)) = (field(&record, 0), field(&record, 1)) else {
                return Err(ExtractError::format(
                    path,
                    format!("line {}: expected 'contig<TAB>length'", lineno),
                ));
            };
            let length: u64 = length.trim().parse().map_err(|_| {
                ExtractError::format(
                    path,
                    format!("line {}: invalid contig length '{}'", lineno, length),
                )
            })?;

            sizes.insert(name.to_string(), length).map_err(|e| match e {
                ExtractError::Validation(msg) => {
                    ExtractError::format(path, format!("line {}: {}", lineno, msg))
                }
                other => other,
            })?;
        }

        if sizes.is_empty() {
            return Err(ExtractError::empty_input(path));
        }
        Ok(sizes)
    }

    fn insert(&mut self, name: String, length: u64) -> Result<()> {
        if length == 0 {
            return Err(ExtractError::validation(format!(
                "contig '{}' has length 0",
                name
            )));
        }
        if self.lengths.contains_key(&name) {
            return Err(ExtractError::validation(format!(
                "duplicate contig '{}'",
                name
            )));
        }
        self.lengths.insert(name.clone(), length);
        self.order.push(name);
        Ok(())
    }

    #[inline]
    pub fn get(&self, name: &str) -> Option<u64> {
        self.lengths.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn max_length(&self) -> u64 {
        self.lengths.values().copied().max().unwrap_or(0)
    }

    /// Iterate `(name, length)` in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> + '_ {
        self.order
            .iter()
            .map(move |name| (name.as_str(), self.lengths[name]))
    }

    /// Lengths aligned to the vertex ids of `index` (None for contigs without a size).
    pub fn aligned_to(&self, index: &ContigIndex) -> Vec<Option<u64>> {
        index.iter().map(|(name, _)| self.get(name)).collect()
    }

    /// Restrict to the contigs of `index`, ordered by vertex id.
    pub fn restricted_to(&self, index: &ContigIndex) -> ContigSizes {
        let mut out = ContigSizes::default();
        for (name, _) in index.iter() {
            if let Some(length) = self.get(name) {
                out.lengths.insert(name.to_string(), length);
                out.order.push(name.to_string());
            }
        }
        out
    }

    /// Write the `contig<TAB>length` side table in insertion order.
    pub fn write(&self, path: &Path) -> Result<()> {
        let file = File::create(path).map_err(|e| ExtractError::io(path, "create", e))?;
        let mut writer = BufWriter::new(file);
        for (name, length) in self.iter() {
            writeln!(writer, "{}\t{}", name, length)
                .map_err(|e| ExtractError::io(path, "write", e))?;
        }
        writer.flush().map_err(|e| ExtractError::io(path, "write", e))?;
        Ok(())
    }
}

/// Storage width for genomic positions, decided once per run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PositionWidth {
    U32,
    U64,
}

impl PositionWidth {
    /// Narrow storage suffices unless some contig reaches 2^31 bp.
    pub fn for_sizes(sizes: &ContigSizes) -> Self {
        if sizes.max_length() < NARROW_POSITION_LIMIT {
            PositionWidth::U32
        } else {
            PositionWidth::U64
        }
    }
}

/// A column of positions stored at the run's `PositionWidth`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Positions {
    Narrow(Vec<u32>),
    Wide(Vec<u64>),
}

impl Positions {
    pub fn with_capacity(width: PositionWidth, capacity: usize) -> Self {
        match width {
            PositionWidth::U32 => Positions::Narrow(Vec::with_capacity(capacity)),
            PositionWidth::U64 => Positions::Wide(Vec::with_capacity(capacity)),
        }
    }

    /// Append a position. Values that do not fit the narrow width saturate,
    /// which keeps them beyond every contig end when all contigs are < 2^31 bp.
    #[inline]
    pub fn push(&mut self, pos: u64) {
        match self {
            Positions::Narrow(v) => v.push(u32::try_from(pos).unwrap_or(u32::MAX)),
            Positions::Wide(v) => v.push(pos),
        }
    }

    #[inline]
    pub fn get(&self, i: usize) -> u64 {
        match self {
            Positions::Narrow(v) => v[i] as u64,
            Positions::Wide(v) => v[i],
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Positions::Narrow(v) => v.len(),
            Positions::Wide(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Read-only view over the run's contig tables, shared by every worker.
///
/// Holds the lengths aligned to vertex ids so interned columns can look up
/// a contig length without hashing its name again.
#[derive(Debug)]
pub struct ContigLookup<'a> {
    pub index: &'a ContigIndex,
    pub sizes: &'a ContigSizes,
    lengths: Vec<Option<u64>>,
    width: PositionWidth,
}

impl<'a> ContigLookup<'a> {
    pub fn new(index: &'a ContigIndex, sizes: &'a ContigSizes) -> Self {
        ContigLookup {
            index,
            sizes,
            lengths: sizes.aligned_to(index),
            width: PositionWidth::for_sizes(sizes),
        }
    }

    #[inline]
    pub fn length_of(&self, id: VertexId) -> Option<u64> {
        self.lengths.get(id as usize).copied().flatten()
    }

    pub fn width(&self) -> PositionWidth {
        self.width
    }
}
