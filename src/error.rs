//! Unified error type for the hyperextract library.
//!
//! Library code returns `ExtractError`; the CLI layer wraps it in
//! `anyhow::Result` for convenience.
//!
//! # Error Categories
//!
//! - **Io**: File system operations (open, read, write)
//! - **Format**: Malformed tables, contig size files or hypergraph artifacts
//! - **Validation**: Invalid options or inconsistent inputs
//! - **EmptyInput**: A required contact table holds no data rows
//! - **Command**: An external collaborator exited unsuccessfully
//! - **DegenerateSplit**: A contig too short for the requested split factor
//! - **NoHyperedges**: Every row was removed by the filters
//! - **Parquet**: Parquet/Arrow errors while reading Pore-C tables
//! - **Encoding**: Varint or artifact encoding errors
//! - **Overflow**: Size limits exceeded while decoding

use std::fmt;
use std::path::PathBuf;

use crate::encoding::VarIntError;

/// Unified error type for the hyperextract library.
#[derive(Debug)]
pub enum ExtractError {
    /// I/O error with path context.
    Io {
        path: PathBuf,
        operation: &'static str,
        source: std::io::Error,
    },

    /// Invalid file contents.
    Format { path: PathBuf, detail: String },

    /// Validation error (invalid parameters, inconsistent inputs).
    Validation(String),

    /// A contact table without a single data row.
    EmptyInput { path: PathBuf },

    /// External command failed or could not be started.
    Command {
        program: String,
        status: Option<i32>,
        detail: String,
    },

    /// Split factor exceeds a contig's length, so its bins would be 0 bp wide.
    DegenerateSplit {
        contig: String,
        length: u64,
        split: u32,
    },

    /// Filtering removed every hyperedge.
    NoHyperedges(String),

    /// Parquet-specific error.
    Parquet {
        context: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Encoding/decoding error (varint, artifact layout).
    Encoding(String),

    /// Numeric overflow or size limit exceeded.
    Overflow {
        context: String,
        limit: usize,
        actual: usize,
    },
}

impl fmt::Display for ExtractError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExtractError::Io {
                path,
                operation,
                source,
            } => {
                write!(
                    f,
                    "I/O error during {} on '{}': {}",
                    operation,
                    path.display(),
                    source
                )
            }
            ExtractError::Format { path, detail } => {
                write!(f, "Invalid format in '{}': {}", path.display(), detail)
            }
            ExtractError::Validation(msg) => write!(f, "Validation error: {}", msg),
            ExtractError::EmptyInput { path } => {
                write!(
                    f,
                    "The table '{}' is empty, can not load anything",
                    path.display()
                )
            }
            ExtractError::Command {
                program,
                status,
                detail,
            } => match status {
                Some(code) => write!(
                    f,
                    "Command '{}' failed with exit code {}: {}",
                    program, code, detail
                ),
                None => write!(f, "Command '{}' failed: {}", program, detail),
            },
            ExtractError::DegenerateSplit {
                contig,
                length,
                split,
            } => {
                write!(
                    f,
                    "Cannot split contig '{}' ({} bp) into {} bins: bin width would be 0",
                    contig, length, split
                )
            }
            ExtractError::NoHyperedges(msg) => write!(f, "No hyperedges retained: {}", msg),
            ExtractError::Parquet { context, source } => {
                if let Some(src) = source {
                    write!(f, "Parquet error ({}): {}", context, src)
                } else {
                    write!(f, "Parquet error: {}", context)
                }
            }
            ExtractError::Encoding(msg) => write!(f, "Encoding error: {}", msg),
            ExtractError::Overflow {
                context,
                limit,
                actual,
            } => {
                write!(
                    f,
                    "Overflow in {}: limit is {}, got {}",
                    context, limit, actual
                )
            }
        }
    }
}

impl std::error::Error for ExtractError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ExtractError::Io { source, .. } => Some(source),
            ExtractError::Parquet {
                source: Some(s), ..
            } => Some(s.as_ref()),
            _ => None,
        }
    }
}

// ============================================================================
// Conversion traits
// ============================================================================

impl From<std::io::Error> for ExtractError {
    fn from(err: std::io::Error) -> Self {
        ExtractError::Io {
            path: PathBuf::new(),
            operation: "unknown",
            source: err,
        }
    }
}

impl From<VarIntError> for ExtractError {
    fn from(err: VarIntError) -> Self {
        ExtractError::Encoding(err.to_string())
    }
}

#[cfg(feature = "parquet")]
impl From<parquet::errors::ParquetError> for ExtractError {
    fn from(err: parquet::errors::ParquetError) -> Self {
        ExtractError::Parquet {
            context: "parquet operation".to_string(),
            source: Some(Box::new(err)),
        }
    }
}

#[cfg(feature = "parquet")]
impl From<arrow::error::ArrowError> for ExtractError {
    fn from(err: arrow::error::ArrowError) -> Self {
        ExtractError::Parquet {
            context: "arrow operation".to_string(),
            source: Some(Box::new(err)),
        }
    }
}

/// Convenience type alias for Results using ExtractError.
pub type Result<T> = std::result::Result<T, ExtractError>;

// ============================================================================
// Helper constructors
// ============================================================================

impl ExtractError {
    /// Create an I/O error with path context.
    pub fn io(path: impl Into<PathBuf>, operation: &'static str, source: std::io::Error) -> Self {
        ExtractError::Io {
            path: path.into(),
            operation,
            source,
        }
    }

    /// Create a format error.
    pub fn format(path: impl Into<PathBuf>, detail: impl Into<String>) -> Self {
        ExtractError::Format {
            path: path.into(),
            detail: detail.into(),
        }
    }

    /// Create a validation error.
    pub fn validation(msg: impl Into<String>) -> Self {
        ExtractError::Validation(msg.into())
    }

    /// Create an empty-input error.
    pub fn empty_input(path: impl Into<PathBuf>) -> Self {
        ExtractError::EmptyInput { path: path.into() }
    }

    /// Create an external command error.
    pub fn command(program: impl Into<String>, status: Option<i32>, detail: impl Into<String>) -> Self {
        ExtractError::Command {
            program: program.into(),
            status,
            detail: detail.into(),
        }
    }

    /// Create a Parquet error without source.
    pub fn parquet(context: impl Into<String>) -> Self {
        ExtractError::Parquet {
            context: context.into(),
            source: None,
        }
    }

    /// Create an encoding error.
    pub fn encoding(msg: impl Into<String>) -> Self {
        ExtractError::Encoding(msg.into())
    }

    /// Create an overflow error.
    pub fn overflow(context: impl Into<String>, limit: usize, actual: usize) -> Self {
        ExtractError::Overflow {
            context: context.into(),
            limit,
            actual,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_display() {
        let err = ExtractError::io(
            "/path/to/sample.pairs.gz",
            "read",
            std::io::Error::new(std::io::ErrorKind::NotFound, "file not found"),
        );
        let msg = err.to_string();
        assert!(msg.contains("/path/to/sample.pairs.gz"));
        assert!(msg.contains("read"));
        assert!(msg.contains("file not found"));
    }

    #[test]
    fn test_empty_input_display() {
        let err = ExtractError::empty_input("/data/empty.porec.gz");
        assert!(err.to_string().contains("/data/empty.porec.gz"));
        assert!(err.to_string().contains("empty"));
    }

    #[test]
    fn test_command_error_display() {
        let err = ExtractError::command("cphasing-rs", Some(2), "bed not found");
        assert_eq!(
            err.to_string(),
            "Command 'cphasing-rs' failed with exit code 2: bed not found"
        );

        let err = ExtractError::command("cphasing-rs", None, "killed by signal");
        assert_eq!(err.to_string(), "Command 'cphasing-rs' failed: killed by signal");
    }

    #[test]
    fn test_degenerate_split_display() {
        let err = ExtractError::DegenerateSplit {
            contig: "ctg7".into(),
            length: 3,
            split: 5,
        };
        let msg = err.to_string();
        assert!(msg.contains("ctg7"));
        assert!(msg.contains("3 bp"));
        assert!(msg.contains("5 bins"));
    }

    #[test]
    fn test_overflow_error_display() {
        let err = ExtractError::overflow("vertex count", 100_000, 150_000);
        let msg = err.to_string();
        assert!(msg.contains("vertex count"));
        assert!(msg.contains("100000"));
        assert!(msg.contains("150000"));
    }

    #[test]
    fn test_error_source_chain() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "not found");
        let err = ExtractError::io("/path", "open", io_err);
        assert!(std::error::Error::source(&err).is_some());

        let err = ExtractError::validation("no source");
        assert!(std::error::Error::source(&err).is_none());
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "access denied");
        let err: ExtractError = io_err.into();

        match err {
            ExtractError::Io { operation, .. } => assert_eq!(operation, "unknown"),
            _ => panic!("Expected Io variant"),
        }
    }

    #[test]
    fn test_from_varint_error() {
        let err: ExtractError = VarIntError::Truncated(3).into();
        assert!(matches!(err, ExtractError::Encoding(_)));
        assert!(err.to_string().contains("Truncated"));
    }
}
