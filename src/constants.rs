//! Constants used throughout the hyperextract library for defaults, safety
//! limits, performance tuning, and the binary artifact layout.

// ============================================================================
// Extraction Defaults
// ============================================================================

/// Default minimum mapping quality (0 disables the quality filter).
pub const DEFAULT_MIN_QUALITY: u8 = 1;

/// Default terminal-region width in bp (0 disables the edge-length filter).
pub const DEFAULT_EDGE_LENGTH: u64 = 2_000_000;

/// Default minimum Pore-C read order.
pub const DEFAULT_MIN_ORDER: usize = 2;

/// Default maximum Pore-C read order.
pub const DEFAULT_MAX_ORDER: usize = 50;

/// Default contig split factor (1 = no splitting).
pub const DEFAULT_SPLIT: u32 = 1;

/// Default worker thread count.
pub const DEFAULT_THREADS: usize = 4;

/// Default external region-intersection program.
pub const DEFAULT_REGION_PROGRAM: &str = "cphasing-rs";

/// Upper bound for a value in the optional pairs quality column.
/// An 8th column outside 0..=MAX_MAPQ is not treated as mapping quality.
pub const MAX_MAPQ: i64 = 60;

/// Quality stored for a row whose quality field is missing or unparsable
/// while the quality filter is disabled.
pub const MISSING_MAPQ: u8 = 0;

// ============================================================================
// Table Layout
// ============================================================================

/// Minimum number of columns of a pairs row (readID chrom1 pos1 chrom2 pos2).
pub(crate) const PAIRS_MIN_COLUMNS: usize = 5;

/// Zero-based index of the mapping quality column of a pairs row.
pub(crate) const PAIRS_MAPQ_COLUMN: usize = 7;

/// Minimum number of columns of a Pore-C row (through mapping_quality).
pub(crate) const POREC_MIN_COLUMNS: usize = 9;

// ============================================================================
// Parallelism
// ============================================================================

/// Rows per chunk when filtering and resolving a single pairs partition in parallel.
pub(crate) const PAIRS_CHUNK_ROWS: usize = 1 << 18;

/// Contig lengths below this bound store positions as u32.
pub(crate) const NARROW_POSITION_LIMIT: u64 = 1 << 31;

// ============================================================================
// I/O Buffer Sizes
// ============================================================================

/// Buffer size for reading contact tables (8MB).
pub(crate) const READ_BUF_SIZE: usize = 8 * 1024 * 1024;

/// Buffer size for writing the hypergraph artifact (8MB).
pub(crate) const WRITE_BUF_SIZE: usize = 8 * 1024 * 1024;

/// Number of trailing stderr bytes kept in a failed command's error message.
pub(crate) const STDERR_TAIL_BYTES: usize = 2048;

// ============================================================================
// Binary Artifact
// ============================================================================

/// Magic bytes for hypergraph artifacts (.hg).
pub(crate) const HYPEREDGES_MAGIC: &[u8; 4] = b"HGE1";

/// Current version of the hypergraph artifact layout.
pub(crate) const HYPEREDGES_VERSION: u32 = 1;

/// zstd level used for the incidence stream.
pub(crate) const ZSTD_LEVEL: i32 = 3;

// ============================================================================
// Safety Limits for Loading Artifacts
// ============================================================================

/// Maximum number of vertices in a hypergraph artifact.
pub(crate) const MAX_VERTICES: usize = 100_000_000;

/// Maximum length of a vertex name (10KB).
pub(crate) const MAX_STRING_LENGTH: usize = 10_000;

/// Maximum number of incidences in a hypergraph artifact.
pub(crate) const MAX_INCIDENCES: usize = 100_000_000_000;
