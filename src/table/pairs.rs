//! Pairs (Hi-C) table parsing.

use std::io::Read;
use std::path::Path;

use csv::ByteRecord;

use crate::constants::{PAIRS_MAPQ_COLUMN, PAIRS_MIN_COLUMNS};
use crate::contigs::{ContigLookup, Positions};
use crate::error::Result;

use super::{field, open_table, parse_field, parse_mapq, table_error, tsv_reader, ChromColumn, QualitySchema};

/// Columnar pairs table restricted to the columns the active filters need.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PairsTable {
    pub chrom1: ChromColumn,
    pub chrom2: ChromColumn,
    /// Present when positions were requested (edge-length filter or splitting).
    pub pos1: Option<Positions>,
    pub pos2: Option<Positions>,
    /// Present for `QualitySchema::WithQuality` tables.
    pub mapq: Option<Vec<u8>>,
    /// Data lines skipped because they could not be parsed.
    pub malformed: usize,
}

impl PairsTable {
    fn new(schema: QualitySchema, with_positions: bool, low_memory: bool, lookup: &ContigLookup) -> Self {
        let width = lookup.width();
        PairsTable {
            chrom1: ChromColumn::new(low_memory, 0),
            chrom2: ChromColumn::new(low_memory, 0),
            pos1: with_positions.then(|| Positions::with_capacity(width, 0)),
            pos2: with_positions.then(|| Positions::with_capacity(width, 0)),
            mapq: (schema == QualitySchema::WithQuality).then(Vec::new),
            malformed: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.chrom1.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Column projection used while reading a pairs table.
#[derive(Debug, Clone, Copy)]
pub struct PairsColumns {
    pub schema: QualitySchema,
    pub with_positions: bool,
    pub low_memory: bool,
    /// Quality threshold of the run; 0 accepts rows without a usable quality.
    pub min_quality: u8,
}

/// Read a pairs table from disk.
pub fn read_pairs_table(path: &Path, columns: PairsColumns, lookup: &ContigLookup) -> Result<PairsTable> {
    let reader = open_table(path)?;
    let table = parse_pairs(reader, path, columns, lookup)?;
    if table.malformed > 0 {
        log::warn!(
            "Skipped {} malformed lines in `{}`",
            table.malformed,
            path.display()
        );
    }
    log::debug!("Loaded {} pairs from `{}`", table.len(), path.display());
    Ok(table)
}

/// Parse pairs rows from a reader. `path` is only used for error context.
pub fn parse_pairs<R: Read>(
    reader: R,
    path: &Path,
    columns: PairsColumns,
    lookup: &ContigLookup,
) -> Result<PairsTable> {
    let mut table = PairsTable::new(columns.schema, columns.with_positions, columns.low_memory, lookup);
    let mut reader = tsv_reader(reader);
    let mut record = ByteRecord::new();

    while reader
        .read_byte_record(&mut record)
        .map_err(|e| table_error(path, e))?
    {
        match parse_pairs_record(&record, &mut table, columns, lookup) {
            RowOutcome::Kept | RowOutcome::Unknown => {}
            RowOutcome::Malformed => table.malformed += 1,
        }
    }

    Ok(table)
}

enum RowOutcome {
    Kept,
    /// Row references a contig outside the index (interned columns only).
    Unknown,
    Malformed,
}

fn parse_pairs_record(
    record: &ByteRecord,
    table: &mut PairsTable,
    columns: PairsColumns,
    lookup: &ContigLookup,
) -> RowOutcome {
    if record.len() < PAIRS_MIN_COLUMNS {
        return RowOutcome::Malformed;
    }
    let (Some(chrom1), Some(chrom2)) = (field(record, 1), field(record, 3)) else {
        return RowOutcome::Malformed;
    };

    let mapq = match columns.schema {
        QualitySchema::WithQuality => match parse_mapq(record, PAIRS_MAPQ_COLUMN, columns.min_quality) {
            Some(q) => Some(q),
            None => return RowOutcome::Malformed,
        },
        QualitySchema::WithoutQuality => None,
    };

    let positions = if columns.with_positions {
        match (parse_field::<u64>(record, 2), parse_field::<u64>(record, 4)) {
            (Some(p1), Some(p2)) => Some((p1, p2)),
            _ => return RowOutcome::Malformed,
        }
    } else {
        None
    };

    let (Some(c1), Some(c2)) = (
        table.chrom1.encode(chrom1, lookup),
        table.chrom2.encode(chrom2, lookup),
    ) else {
        return RowOutcome::Unknown;
    };

    table.chrom1.push(c1);
    table.chrom2.push(c2);
    if let (Some((p1, p2)), Some(pos1), Some(pos2)) = (positions, table.pos1.as_mut(), table.pos2.as_mut()) {
        pos1.push(p1);
        pos2.push(p2);
    }
    if let (Some(q), Some(mapq)) = (mapq, table.mapq.as_mut()) {
        mapq.push(q);
    }
    RowOutcome::Kept
}
