//! Pore-C table parsing (tab-separated text or Parquet).
//!
//! # Text Layout
//!
//! `read_idx read_length read_start read_end strand chrom start end
//! mapping_quality identity filter_reason`; only `read_idx`, `chrom`,
//! `start`, `end` and `mapping_quality` are consumed.
//!
//! # Parquet Schema
//!
//! | Column | Arrow Type |
//! |--------|-----------|
//! | `read_idx` | any integer |
//! | `chrom` | Utf8, LargeUtf8 or dictionary of Utf8 |
//! | `start`, `end` | any integer (only read when positions are needed) |
//! | `mapping_quality` | any integer |

use std::io::Read;
use std::path::Path;

use csv::ByteRecord;

use crate::constants::{MISSING_MAPQ, POREC_MIN_COLUMNS};
use crate::contigs::{ContigLookup, Positions};
use crate::error::{ExtractError, Result};

use super::{field, is_parquet_input, open_table, parse_field, parse_mapq, table_error, tsv_reader, ChromColumn};

/// Columnar Pore-C alignment table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoreCTable {
    pub read_idx: Vec<u64>,
    pub chrom: ChromColumn,
    /// Present when positions were requested (edge-length filter or splitting).
    pub start: Option<Positions>,
    pub end: Option<Positions>,
    pub mapq: Vec<u8>,
    /// Data lines skipped because they could not be parsed.
    pub malformed: usize,
}

impl PoreCTable {
    fn new(with_positions: bool, low_memory: bool, lookup: &ContigLookup) -> Self {
        let width = lookup.width();
        PoreCTable {
            read_idx: Vec::new(),
            chrom: ChromColumn::new(low_memory, 0),
            start: with_positions.then(|| Positions::with_capacity(width, 0)),
            end: with_positions.then(|| Positions::with_capacity(width, 0)),
            mapq: Vec::new(),
            malformed: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.read_idx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.read_idx.is_empty()
    }

    /// Alignment midpoint `start + (end - start) / 2`, if positions were loaded.
    #[inline]
    pub fn midpoint(&self, i: usize) -> Option<u64> {
        match (&self.start, &self.end) {
            (Some(start), Some(end)) => {
                let (s, e) = (start.get(i), end.get(i));
                Some(s + e.saturating_sub(s) / 2)
            }
            _ => None,
        }
    }

    fn push(&mut self, read_idx: u64, chrom: super::ChromValue, span: Option<(u64, u64)>, mapq: u8) {
        self.read_idx.push(read_idx);
        self.chrom.push(chrom);
        if let (Some((s, e)), Some(start), Some(end)) = (span, self.start.as_mut(), self.end.as_mut()) {
            start.push(s);
            end.push(e);
        }
        self.mapq.push(mapq);
    }
}

/// Column projection used while reading a Pore-C table.
#[derive(Debug, Clone, Copy)]
pub struct PoreCColumns {
    pub with_positions: bool,
    pub low_memory: bool,
    /// Quality threshold of the run; 0 accepts alignments without a usable quality.
    pub min_quality: u8,
}

/// Read a Pore-C table from a text or Parquet file.
pub fn read_porec_table(path: &Path, columns: PoreCColumns, lookup: &ContigLookup) -> Result<PoreCTable> {
    let table = if is_parquet_input(path) {
        read_porec_parquet(path, columns, lookup)?
    } else {
        let reader = open_table(path)?;
        parse_porec(reader, path, columns, lookup)?
    };

    if table.malformed > 0 {
        log::warn!(
            "Skipped {} malformed lines in `{}`",
            table.malformed,
            path.display()
        );
    }
    log::debug!("Loaded {} alignments from `{}`", table.len(), path.display());
    Ok(table)
}

/// Parse Pore-C rows from a text reader. `path` is only used for error context.
pub fn parse_porec<R: Read>(
    reader: R,
    path: &Path,
    columns: PoreCColumns,
    lookup: &ContigLookup,
) -> Result<PoreCTable> {
    let mut table = PoreCTable::new(columns.with_positions, columns.low_memory, lookup);
    let mut reader = tsv_reader(reader);
    let mut record = ByteRecord::new();

    while reader
        .read_byte_record(&mut record)
        .map_err(|e| table_error(path, e))?
    {
        if record.len() < POREC_MIN_COLUMNS {
            table.malformed += 1;
            continue;
        }

        let (Some(read_idx), Some(mapq), Some(chrom)) = (
            parse_field::<u64>(&record, 0),
            parse_mapq(&record, 8, columns.min_quality),
            field(&record, 5),
        ) else {
            table.malformed += 1;
            continue;
        };
        let span = if columns.with_positions {
            match (parse_field::<u64>(&record, 6), parse_field::<u64>(&record, 7)) {
                (Some(s), Some(e)) => Some((s, e)),
                _ => {
                    table.malformed += 1;
                    continue;
                }
            }
        } else {
            None
        };

        let Some(chrom) = table.chrom.encode(chrom, lookup) else {
            continue;
        };
        table.push(read_idx, chrom, span, mapq);
    }

    Ok(table)
}

#[cfg(not(feature = "parquet"))]
fn read_porec_parquet(path: &Path, _columns: PoreCColumns, _lookup: &ContigLookup) -> Result<PoreCTable> {
    Err(ExtractError::format(
        path,
        "Parquet input requires the `parquet` feature",
    ))
}

#[cfg(feature = "parquet")]
pub(crate) fn is_parquet_empty(path: &Path) -> Result<bool> {
    use parquet::file::reader::{FileReader, SerializedFileReader};

    let file = std::fs::File::open(path).map_err(|e| ExtractError::io(path, "open", e))?;
    let reader = SerializedFileReader::new(file)?;
    Ok(reader.metadata().file_metadata().num_rows() == 0)
}

#[cfg(feature = "parquet")]
fn read_porec_parquet(path: &Path, columns: PoreCColumns, lookup: &ContigLookup) -> Result<PoreCTable> {
    use arrow::array::{Array, ArrayRef, StringArray, UInt64Array, UInt8Array};
    use arrow::compute::cast;
    use arrow::datatypes::DataType;
    use arrow::record_batch::RecordBatch;
    use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
    use std::fs::File;

    fn column(batch: &RecordBatch, name: &str, to: &DataType, path: &Path) -> Result<ArrayRef> {
        let array = batch.column_by_name(name).ok_or_else(|| {
            ExtractError::format(path, format!("Parquet input missing required column '{}'", name))
        })?;
        Ok(cast(array, to)?)
    }

    let file = File::open(path).map_err(|e| ExtractError::io(path, "open", e))?;
    let reader = ParquetRecordBatchReaderBuilder::try_new(file)?.build()?;

    let mut table = PoreCTable::new(columns.with_positions, columns.low_memory, lookup);

    for batch in reader {
        let batch = batch?;

        let read_idx = column(&batch, "read_idx", &DataType::UInt64, path)?;
        let read_idx = read_idx
            .as_any()
            .downcast_ref::<UInt64Array>()
            .ok_or_else(|| ExtractError::parquet("Expected UInt64Array for read_idx"))?;
        let chrom = column(&batch, "chrom", &DataType::Utf8, path)?;
        let chrom = chrom
            .as_any()
            .downcast_ref::<StringArray>()
            .ok_or_else(|| ExtractError::parquet("Expected StringArray for chrom"))?;
        let mapq = column(&batch, "mapping_quality", &DataType::UInt8, path)?;
        let mapq = mapq
            .as_any()
            .downcast_ref::<UInt8Array>()
            .ok_or_else(|| ExtractError::parquet("Expected UInt8Array for mapping_quality"))?;

        let spans = if columns.with_positions {
            Some((
                column(&batch, "start", &DataType::UInt64, path)?,
                column(&batch, "end", &DataType::UInt64, path)?,
            ))
        } else {
            None
        };
        let spans = match &spans {
            Some((s, e)) => Some((
                s.as_any()
                    .downcast_ref::<UInt64Array>()
                    .ok_or_else(|| ExtractError::parquet("Expected UInt64Array for start"))?,
                e.as_any()
                    .downcast_ref::<UInt64Array>()
                    .ok_or_else(|| ExtractError::parquet("Expected UInt64Array for end"))?,
            )),
            None => None,
        };

        for i in 0..batch.num_rows() {
            // Values that failed the cast (negative, > u8::MAX) arrive as nulls
            if read_idx.is_null(i) || chrom.is_null(i) {
                table.malformed += 1;
                continue;
            }
            let quality = if mapq.is_valid(i) {
                mapq.value(i)
            } else if columns.min_quality == 0 {
                MISSING_MAPQ
            } else {
                table.malformed += 1;
                continue;
            };
            let span = match spans {
                Some((s, e)) if s.is_null(i) || e.is_null(i) => {
                    table.malformed += 1;
                    continue;
                }
                Some((s, e)) => Some((s.value(i), e.value(i))),
                None => None,
            };
            let Some(value) = table.chrom.encode(chrom.value(i), lookup) else {
                continue;
            };
            table.push(read_idx.value(i), value, span, quality);
        }
    }

    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contigs::{ContigIndex, ContigSizes};
    use std::io::Cursor;

    const POREC: &str = "0\t5000\t0\t900\t+\tX\t100\t1000\t40\t0.98\tpass\n\
0\t5000\t950\t2000\t-\tY\t5000\t6000\t40\t0.97\tpass\n\
0\t5000\t2100\t3000\t+\tX\t7000\t7900\t5\t0.91\tpass\n\
1\t3000\t0\t800\t+\tQ\t10\t500\t60\t0.99\tpass\n\
bad\t3000\t0\t800\t+\tX\t10\t500\t60\t0.99\tpass\n\
2\t3000\t0\t800\t+\tX\n";

    fn fixtures() -> (ContigIndex, ContigSizes) {
        let sizes = ContigSizes::from_pairs([("X", 10_000u64), ("Y", 10_000)]).unwrap();
        (ContigIndex::from_sizes(&sizes), sizes)
    }

    #[test]
    fn test_parse_porec_interned() {
        let (index, sizes) = fixtures();
        let lookup = ContigLookup::new(&index, &sizes);
        let columns = PoreCColumns {
            with_positions: true,
            low_memory: true,
            min_quality: 1,
        };

        let table = parse_porec(Cursor::new(POREC), Path::new("t.porec"), columns, &lookup).unwrap();
        // Q is not in the index; "bad" and the truncated line are malformed
        assert_eq!(table.len(), 3);
        assert_eq!(table.malformed, 2);
        assert_eq!(table.read_idx, vec![0, 0, 0]);
        assert_eq!(table.mapq, vec![40, 40, 5]);
        assert_eq!(table.chrom, ChromColumn::Interned(vec![0, 1, 0]));
        assert_eq!(table.midpoint(0), Some(550));
    }

    #[test]
    fn test_parse_porec_named_without_positions() {
        let (index, sizes) = fixtures();
        let lookup = ContigLookup::new(&index, &sizes);
        let columns = PoreCColumns {
            with_positions: false,
            low_memory: false,
            min_quality: 1,
        };

        let table = parse_porec(Cursor::new(POREC), Path::new("t.porec"), columns, &lookup).unwrap();
        assert_eq!(table.len(), 4);
        assert!(table.start.is_none());
        assert_eq!(table.midpoint(0), None);
        assert_eq!(table.chrom.resolve(3, &lookup), None);
    }

    #[test]
    fn test_parse_porec_unusable_quality_when_filter_disabled() {
        let (index, sizes) = fixtures();
        let lookup = ContigLookup::new(&index, &sizes);
        let input = "0\t5000\t0\t900\t+\tX\t100\t1000\t40\t0.98\tpass\n\
0\t5000\t950\t2000\t-\tY\t5000\t6000\t-1\t0.97\tpass\n\
1\t3000\t0\t800\t+\tX\t10\t500\t.\t0.99\tpass\n\
1\t3000\t0\t800\t+\tY\t10\t500\t300\t0.99\tpass\n";

        let mut columns = PoreCColumns {
            with_positions: false,
            low_memory: true,
            min_quality: 0,
        };
        let table = parse_porec(Cursor::new(input), Path::new("t.porec"), columns, &lookup).unwrap();
        assert_eq!(table.len(), 4);
        assert_eq!(table.malformed, 0);
        assert_eq!(table.mapq, vec![40, 0, 0, 0]);

        columns.min_quality = 1;
        let table = parse_porec(Cursor::new(input), Path::new("t.porec"), columns, &lookup).unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.malformed, 3);
    }

    #[cfg(feature = "parquet")]
    #[test]
    fn test_read_porec_parquet() {
        use arrow::array::{ArrayRef, Int64Array, StringArray, UInt32Array};
        use arrow::datatypes::{DataType, Field, Schema};
        use arrow::record_batch::RecordBatch;
        use parquet::arrow::ArrowWriter;
        use std::sync::Arc;
        use tempfile::tempdir;

        let dir = tempdir().unwrap();
        let path = dir.path().join("sample.porec.parquet");

        let schema = Arc::new(Schema::new(vec![
            Field::new("read_idx", DataType::UInt32, false),
            Field::new("chrom", DataType::Utf8, false),
            Field::new("start", DataType::Int64, false),
            Field::new("end", DataType::Int64, false),
            Field::new("mapping_quality", DataType::Int64, false),
        ]));
        let batch = RecordBatch::try_new(
            schema.clone(),
            vec![
                Arc::new(UInt32Array::from(vec![7, 7, 8])) as ArrayRef,
                Arc::new(StringArray::from(vec!["X", "Y", "X"])) as ArrayRef,
                Arc::new(Int64Array::from(vec![10, 20, 30])) as ArrayRef,
                Arc::new(Int64Array::from(vec![110, 220, 330])) as ArrayRef,
                Arc::new(Int64Array::from(vec![30, 1000, 12])) as ArrayRef,
            ],
        )
        .unwrap();
        let mut writer = ArrowWriter::try_new(std::fs::File::create(&path).unwrap(), schema, None).unwrap();
        writer.write(&batch).unwrap();
        writer.close().unwrap();

        let (index, sizes) = fixtures();
        let lookup = ContigLookup::new(&index, &sizes);
        let columns = PoreCColumns {
            with_positions: true,
            low_memory: true,
            min_quality: 1,
        };
        let table = read_porec_table(&path, columns, &lookup).unwrap();

        // mapping_quality 1000 does not fit u8 and is counted as malformed
        assert_eq!(table.len(), 2);
        assert_eq!(table.malformed, 1);
        assert_eq!(table.read_idx, vec![7, 8]);
        assert_eq!(table.mapq, vec![30, 12]);
        assert_eq!(table.midpoint(1), Some(180));
        assert!(!crate::table::is_table_empty(&path).unwrap());
    }
}
