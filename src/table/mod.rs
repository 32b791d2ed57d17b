//! Contact table ingestion.
//!
//! Two table shapes are supported:
//!
//! | Kind | Columns consumed (0-based) |
//! |------|----------------------------|
//! | pairs | 1 `chrom1`, 2 `pos1`, 3 `chrom2`, 4 `pos2`, 7 `mapq` (optional) |
//! | pore-c | 0 `read_idx`, 5 `chrom`, 6 `start`, 7 `end`, 8 `mapping_quality` |
//!
//! Text tables are tab-separated, optionally gzip-compressed, with `#`
//! comment lines. Pore-C tables may also be Parquet files.

pub mod pairs;
pub mod porec;

use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use csv::ByteRecord;
use flate2::read::MultiGzDecoder;

use crate::constants::{MAX_MAPQ, MISSING_MAPQ, PAIRS_MAPQ_COLUMN, READ_BUF_SIZE};
use crate::contigs::{ContigLookup, VertexId};
use crate::error::{ExtractError, Result};

pub use pairs::{read_pairs_table, PairsTable};
pub use porec::{read_porec_table, PoreCTable};

/// Shape of a contact table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableKind {
    Pairs,
    PoreC,
}

impl TableKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TableKind::Pairs => "pairs",
            TableKind::PoreC => "porec",
        }
    }
}

/// Whether a pairs table carries a usable mapping quality column.
///
/// Resolved once per input before any worker starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QualitySchema {
    WithQuality,
    WithoutQuality,
}

impl QualitySchema {
    /// Combine the schemas of several inputs: quality is only tracked when every input has it.
    pub fn combine<I: IntoIterator<Item = QualitySchema>>(schemas: I) -> QualitySchema {
        if schemas
            .into_iter()
            .all(|s| s == QualitySchema::WithQuality)
        {
            QualitySchema::WithQuality
        } else {
            QualitySchema::WithoutQuality
        }
    }
}

/// Check if a file path indicates gzip input.
pub fn is_gzip_input(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.eq_ignore_ascii_case("gz"))
        .unwrap_or(false)
}

/// Check if a file path indicates Parquet input.
pub fn is_parquet_input(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.eq_ignore_ascii_case("parquet"))
        .unwrap_or(false)
}

/// Open a text table, transparently decompressing `.gz` input.
pub fn open_table(path: &Path) -> Result<Box<dyn BufRead + Send>> {
    if path.is_dir() {
        return Err(ExtractError::format(
            path,
            "expected a table file but found a directory",
        ));
    }
    let file = File::open(path).map_err(|e| ExtractError::io(path, "open", e))?;
    if is_gzip_input(path) {
        Ok(Box::new(BufReader::with_capacity(
            READ_BUF_SIZE,
            MultiGzDecoder::new(file),
        )))
    } else {
        Ok(Box::new(BufReader::with_capacity(READ_BUF_SIZE, file)))
    }
}

/// Tab-separated reader used for every text table.
///
/// `#` lines are comments, there is no header row and rows may have any
/// number of fields; the parsers check the columns they consume.
pub(crate) fn tsv_reader<R: Read>(reader: R) -> csv::Reader<R> {
    csv::ReaderBuilder::new()
        .has_headers(false)
        .delimiter(b'\t')
        .comment(Some(b'#'))
        .flexible(true)
        .quoting(false)
        .from_reader(reader)
}

/// Convert a reader error, keeping I/O failures as `Io`.
pub(crate) fn table_error(path: &Path, err: csv::Error) -> ExtractError {
    match err.into_kind() {
        csv::ErrorKind::Io(e) => ExtractError::io(path, "read", e),
        other => ExtractError::format(path, format!("{:?}", other)),
    }
}

/// Field `i` of a record as text, None when absent or not UTF-8.
#[inline]
pub(crate) fn field(record: &ByteRecord, i: usize) -> Option<&str> {
    record.get(i).and_then(|f| std::str::from_utf8(f).ok())
}

/// Parse field `i` as a number.
#[inline]
pub(crate) fn parse_field<T: std::str::FromStr>(record: &ByteRecord, i: usize) -> Option<T> {
    field(record, i).and_then(|f| f.trim().parse().ok())
}

/// Mapping quality of field `i`.
///
/// A missing or unparsable value is only a problem when the quality filter
/// is on; with `min_quality == 0` the row is kept with `MISSING_MAPQ`.
#[inline]
pub(crate) fn parse_mapq(record: &ByteRecord, i: usize, min_quality: u8) -> Option<u8> {
    match parse_field::<u8>(record, i) {
        Some(q) => Some(q),
        None if min_quality == 0 => Some(MISSING_MAPQ),
        None => None,
    }
}

/// Returns the first data row (non-blank, non-comment) of a text table.
pub fn first_data_record(path: &Path) -> Result<Option<ByteRecord>> {
    let mut reader = tsv_reader(open_table(path)?);
    let mut record = ByteRecord::new();
    if reader
        .read_byte_record(&mut record)
        .map_err(|e| table_error(path, e))?
    {
        Ok(Some(record))
    } else {
        Ok(None)
    }
}

/// True if the table has no data rows.
pub fn is_table_empty(path: &Path) -> Result<bool> {
    #[cfg(feature = "parquet")]
    if is_parquet_input(path) {
        return porec::is_parquet_empty(path);
    }
    Ok(first_data_record(path)?.is_none())
}

/// Fail with `EmptyInput` unless the table has at least one data row.
pub fn ensure_not_empty(path: &Path) -> Result<()> {
    if is_table_empty(path)? {
        log::error!(
            "The table `{}` is empty, can not load anything, please check it.",
            path.display()
        );
        return Err(ExtractError::empty_input(path));
    }
    Ok(())
}

/// Decide the quality schema of a pairs table from its first data row.
///
/// The table has quality when the row has at least 8 columns and the 8th is
/// an integer within `0..=MAX_MAPQ`.
pub fn sniff_pairs_schema(path: &Path) -> Result<QualitySchema> {
    let record = first_data_record(path)?.ok_or_else(|| ExtractError::empty_input(path))?;
    Ok(schema_of_record(&record))
}

pub(crate) fn schema_of_record(record: &ByteRecord) -> QualitySchema {
    let quality = parse_field::<i64>(record, PAIRS_MAPQ_COLUMN).filter(|q| (0..=MAX_MAPQ).contains(q));
    if quality.is_some() {
        QualitySchema::WithQuality
    } else {
        QualitySchema::WithoutQuality
    }
}

/// Contig name column of a parsed table.
///
/// In low-memory mode names are interned through the `ContigIndex` while
/// parsing, so alignments on unknown contigs never materialise. Otherwise
/// names are kept as strings and resolved after filtering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChromColumn {
    Interned(Vec<VertexId>),
    Named(Vec<String>),
}

impl ChromColumn {
    pub fn new(low_memory: bool, capacity: usize) -> Self {
        if low_memory {
            ChromColumn::Interned(Vec::with_capacity(capacity))
        } else {
            ChromColumn::Named(Vec::with_capacity(capacity))
        }
    }

    /// Convert a raw name into the column's representation.
    ///
    /// Returns None for interned columns when the name is unknown.
    #[inline]
    pub fn encode(&self, name: &str, lookup: &ContigLookup) -> Option<ChromValue> {
        match self {
            ChromColumn::Interned(_) => lookup.index.get(name).map(ChromValue::Id),
            ChromColumn::Named(_) => Some(ChromValue::Name(name.to_string())),
        }
    }

    /// Append a value produced by `encode` on this column.
    #[inline]
    pub fn push(&mut self, value: ChromValue) {
        match (self, value) {
            (ChromColumn::Interned(v), ChromValue::Id(id)) => v.push(id),
            (ChromColumn::Named(v), ChromValue::Name(name)) => v.push(name),
            (ChromColumn::Interned(_), ChromValue::Name(_))
            | (ChromColumn::Named(_), ChromValue::Id(_)) => {
                unreachable!("chrom value pushed into a column of the other representation")
            }
        }
    }

    pub fn len(&self) -> usize {
        match self {
            ChromColumn::Interned(v) => v.len(),
            ChromColumn::Named(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Vertex id of row `i`, or None when the contig is not in the index.
    #[inline]
    pub fn resolve(&self, i: usize, lookup: &ContigLookup) -> Option<VertexId> {
        match self {
            ChromColumn::Interned(v) => Some(v[i]),
            ChromColumn::Named(v) => lookup.index.get(&v[i]),
        }
    }

    /// Contig length of row `i`, or None when the contig has no size.
    #[inline]
    pub fn length(&self, i: usize, lookup: &ContigLookup) -> Option<u64> {
        match self {
            ChromColumn::Interned(v) => lookup.length_of(v[i]),
            ChromColumn::Named(v) => lookup.sizes.get(&v[i]),
        }
    }
}

/// A single parsed contig value, see `ChromColumn::encode`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChromValue {
    Id(VertexId),
    Name(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contigs::{ContigIndex, ContigSizes};
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;
    use tempfile::tempdir;

    fn record(line: &str) -> ByteRecord {
        ByteRecord::from(line.split('\t').collect::<Vec<_>>())
    }

    #[test]
    fn test_schema_of_record() {
        let with_q = record("r1\tA\t100\tB\t200\t+\t-\t30");
        assert_eq!(schema_of_record(&with_q), QualitySchema::WithQuality);

        let without = record("r1\tA\t100\tB\t200\t+\t-");
        assert_eq!(schema_of_record(&without), QualitySchema::WithoutQuality);

        // Out of range or non-integer 8th column is not a quality
        let big = record("r1\tA\t100\tB\t200\t+\t-\t255");
        assert_eq!(schema_of_record(&big), QualitySchema::WithoutQuality);
        let text = record("r1\tA\t100\tB\t200\t+\t-\tUU");
        assert_eq!(schema_of_record(&text), QualitySchema::WithoutQuality);
    }

    #[test]
    fn test_parse_mapq_when_filter_disabled() {
        let row = record("r1\tA\t100\tB\t200\t+\t-\t.");
        assert_eq!(parse_mapq(&row, 7, 1), None);
        assert_eq!(parse_mapq(&row, 7, 0), Some(MISSING_MAPQ));
        // Missing column
        assert_eq!(parse_mapq(&row, 9, 0), Some(MISSING_MAPQ));
        assert_eq!(parse_mapq(&record("-1"), 0, 0), Some(MISSING_MAPQ));
        assert_eq!(parse_mapq(&record("42"), 0, 30), Some(42));
    }

    #[test]
    fn test_tsv_reader_skips_comments_and_blank_lines() {
        let text = "## pairs format v1.0\n#columns: readID\n\nr1\tA\n\nr2\tB\t7\n";
        let mut reader = tsv_reader(text.as_bytes());
        let mut row = ByteRecord::new();
        let mut rows = Vec::new();
        while reader.read_byte_record(&mut row).unwrap() {
            rows.push((field(&row, 0).unwrap().to_string(), row.len()));
        }
        assert_eq!(rows, vec![("r1".to_string(), 2), ("r2".to_string(), 3)]);
    }

    #[test]
    fn test_combine_schemas() {
        use QualitySchema::*;
        assert_eq!(QualitySchema::combine([WithQuality, WithQuality]), WithQuality);
        assert_eq!(QualitySchema::combine([WithQuality, WithoutQuality]), WithoutQuality);
    }

    #[test]
    fn test_sniff_skips_comments_and_gz() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("sample.pairs.gz");
        let mut enc = GzEncoder::new(std::fs::File::create(&path).unwrap(), Compression::default());
        writeln!(enc, "## pairs format v1.0").unwrap();
        writeln!(enc, "#columns: readID chrom1 pos1 chrom2 pos2 strand1 strand2 mapq").unwrap();
        writeln!(enc, "r1\tA\t100\tB\t200\t+\t-\t30").unwrap();
        enc.finish().unwrap();

        assert_eq!(sniff_pairs_schema(&path).unwrap(), QualitySchema::WithQuality);
        assert!(!is_table_empty(&path).unwrap());
    }

    #[test]
    fn test_empty_table_detection() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("empty.pairs");
        std::fs::write(&path, "## pairs format v1.0\n#columns: readID\n").unwrap();

        assert!(is_table_empty(&path).unwrap());
        assert!(matches!(
            ensure_not_empty(&path),
            Err(ExtractError::EmptyInput { .. })
        ));
        assert!(matches!(
            sniff_pairs_schema(&path),
            Err(ExtractError::EmptyInput { .. })
        ));
    }

    #[test]
    fn test_missing_and_directory_input() {
        let dir = tempdir().unwrap();
        assert!(matches!(
            open_table(&dir.path().join("missing.pairs")),
            Err(ExtractError::Io { .. })
        ));
        assert!(matches!(
            open_table(dir.path()),
            Err(ExtractError::Format { .. })
        ));
    }

    #[test]
    fn test_chrom_column_modes() {
        let sizes = ContigSizes::from_pairs([("A", 1000u64), ("B", 2000)]).unwrap();
        let index = ContigIndex::from_names(["A"]).unwrap();
        let lookup = ContigLookup::new(&index, &sizes);

        let mut interned = ChromColumn::new(true, 2);
        assert!(interned.encode("B", &lookup).is_none());
        let value = interned.encode("A", &lookup).unwrap();
        interned.push(value);
        assert_eq!(interned.resolve(0, &lookup), Some(0));
        assert_eq!(interned.length(0, &lookup), Some(1000));

        let mut named = ChromColumn::new(false, 2);
        for name in ["A", "B"] {
            let value = named.encode(name, &lookup).unwrap();
            named.push(value);
        }
        assert_eq!(named.len(), 2);
        assert_eq!(named.resolve(1, &lookup), None);
        assert_eq!(named.length(1, &lookup), Some(2000));
    }
}
