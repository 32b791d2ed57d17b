//! High-confidence region filtering through an external intersection tool.
//!
//! The tool is a black box invoked as
//! `<program> pairs-intersect|porec-intersect <table> <bed> [-q <min_quality>] [--invert] -o <out>`.
//! Its output lands in a temporary directory owned by the returned
//! `FilteredTable`, so it is removed on every exit path.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use tempfile::TempDir;

use crate::constants::{DEFAULT_REGION_PROGRAM, STDERR_TAIL_BYTES};
use crate::error::{ExtractError, Result};
use crate::table::TableKind;

/// Configuration of the region-intersection collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionFilter {
    /// Region set (BED-like) passed to the tool.
    pub bed: PathBuf,
    /// Keep rows outside the regions instead of inside.
    pub invert: bool,
    /// Executable to run.
    pub program: String,
    /// Arguments placed before the subcommand (e.g. a wrapper script path).
    pub program_args: Vec<String>,
    /// Directory receiving the tool's stderr logs.
    pub log_dir: Option<PathBuf>,
    /// Parent directory for the temporary output (system temp dir if None).
    pub temp_dir: Option<PathBuf>,
}

impl RegionFilter {
    pub fn new(bed: impl Into<PathBuf>) -> Self {
        RegionFilter {
            bed: bed.into(),
            invert: false,
            program: DEFAULT_REGION_PROGRAM.to_string(),
            program_args: Vec::new(),
            log_dir: None,
            temp_dir: None,
        }
    }

    pub fn invert(mut self, invert: bool) -> Self {
        self.invert = invert;
        self
    }

    pub fn program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    pub fn program_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.program_args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn log_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.log_dir = Some(dir.into());
        self
    }

    /// Build the argument list for one invocation.
    pub(crate) fn args(&self, input: &Path, kind: TableKind, min_quality: u8, output: &Path) -> Vec<String> {
        let mut args = self.program_args.clone();
        args.push(format!("{}-intersect", kind.as_str()));
        args.push(input.display().to_string());
        args.push(self.bed.display().to_string());
        if kind == TableKind::Pairs {
            args.push("-q".to_string());
            args.push(min_quality.to_string());
        }
        if self.invert {
            args.push("--invert".to_string());
        }
        args.push("-o".to_string());
        args.push(output.display().to_string());
        args
    }

    /// Run the tool on `input` and return the filtered table.
    ///
    /// # Errors
    /// `Command` if the program cannot be started or exits non-zero.
    pub fn apply(&self, input: &Path, kind: TableKind, min_quality: u8) -> Result<FilteredTable> {
        let dir = match &self.temp_dir {
            Some(parent) => tempfile::Builder::new()
                .prefix("hyperextract.")
                .tempdir_in(parent),
            None => tempfile::Builder::new().prefix("hyperextract.").tempdir(),
        }
        .map_err(|e| ExtractError::io(self.temp_dir.clone().unwrap_or_default(), "create temp dir", e))?;

        let prefix = table_prefix(input);
        let output = dir.path().join(format!("{}.hcr.{}", prefix, kind.as_str()));
        let args = self.args(input, kind, min_quality, &output);

        log::info!(
            "Filtering `{}` by {} ...",
            input.display(),
            self.bed.display()
        );
        log::debug!("Running {} {}", self.program, args.join(" "));

        let result = Command::new(&self.program)
            .args(&args)
            .output()
            .map_err(|e| ExtractError::command(&self.program, None, e.to_string()))?;

        if let Some(log_dir) = &self.log_dir {
            let log_path = log_dir.join(format!("{}.{}.intersect.log", prefix, kind.as_str()));
            fs::create_dir_all(log_dir).map_err(|e| ExtractError::io(log_dir, "create", e))?;
            fs::write(&log_path, &result.stderr).map_err(|e| ExtractError::io(&log_path, "write", e))?;
        }

        if !result.status.success() {
            return Err(ExtractError::command(
                &self.program,
                result.status.code(),
                stderr_tail(&result.stderr),
            ));
        }
        if !output.exists() {
            return Err(ExtractError::command(
                &self.program,
                result.status.code(),
                format!("expected output `{}` was not created", output.display()),
            ));
        }

        Ok(FilteredTable { _dir: dir, path: output })
    }
}

/// A region-filtered table living in a temporary directory.
///
/// The directory (and the table) is deleted when this value is dropped.
#[derive(Debug)]
pub struct FilteredTable {
    _dir: TempDir,
    path: PathBuf,
}

impl FilteredTable {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// File name with table suffixes (`.gz`, `.pairs`, `.porec`, `.pqs`, ...) removed.
pub(crate) fn table_prefix(path: &Path) -> String {
    let mut name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "table".to_string());
    for suffix in [".gz", ".pqs", ".pairs", ".porec", ".parquet", ".tsv", ".txt"] {
        if let Some(stripped) = name.strip_suffix(suffix) {
            if !stripped.is_empty() {
                name = stripped.to_string();
            }
        }
    }
    name
}

fn stderr_tail(stderr: &[u8]) -> String {
    let start = stderr.len().saturating_sub(STDERR_TAIL_BYTES);
    let tail = String::from_utf8_lossy(&stderr[start..]).trim().to_string();
    if tail.is_empty() {
        "no stderr output".to_string()
    } else {
        tail
    }
}
