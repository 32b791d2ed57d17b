use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::constants::{
    DEFAULT_EDGE_LENGTH, DEFAULT_MAX_ORDER, DEFAULT_MIN_ORDER, DEFAULT_MIN_QUALITY,
    DEFAULT_REGION_PROGRAM, DEFAULT_SPLIT, DEFAULT_THREADS,
};
use crate::extract::ExtractOptions;
use crate::region::RegionFilter;
use crate::table::TableKind;

#[derive(Debug, Deserialize)]
pub struct ConfigFile {
    pub extract: ExtractSettings,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExtractSettings {
    pub kind: InputKind,
    pub inputs: Vec<PathBuf>,
    pub contigsizes: PathBuf,
    pub output: PathBuf,
    #[serde(default = "default_min_quality")]
    pub min_quality: u8,
    #[serde(default = "default_edge_length")]
    pub edge_length: u64,
    #[serde(default = "default_min_order")]
    pub min_order: usize,
    #[serde(default = "default_max_order")]
    pub max_order: usize,
    #[serde(default = "default_split")]
    pub split: u32,
    #[serde(default = "default_threads")]
    pub threads: usize,
    #[serde(default = "default_low_memory")]
    pub low_memory: bool,
    pub log_dir: Option<PathBuf>,
    pub region_filter: Option<RegionFilterSettings>,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum InputKind {
    Pairs,
    Porec,
}

impl From<InputKind> for TableKind {
    fn from(kind: InputKind) -> Self {
        match kind {
            InputKind::Pairs => TableKind::Pairs,
            InputKind::Porec => TableKind::PoreC,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegionFilterSettings {
    pub bed: PathBuf,
    #[serde(default)]
    pub invert: bool,
    #[serde(default = "default_region_program")]
    pub program: String,
}

fn default_min_quality() -> u8 {
    DEFAULT_MIN_QUALITY
}

fn default_edge_length() -> u64 {
    DEFAULT_EDGE_LENGTH
}

fn default_min_order() -> usize {
    DEFAULT_MIN_ORDER
}

fn default_max_order() -> usize {
    DEFAULT_MAX_ORDER
}

fn default_split() -> u32 {
    DEFAULT_SPLIT
}

fn default_threads() -> usize {
    DEFAULT_THREADS
}

fn default_low_memory() -> bool {
    true
}

fn default_region_program() -> String {
    DEFAULT_REGION_PROGRAM.to_string()
}

pub fn parse_config(path: &Path) -> Result<ConfigFile> {
    let contents = fs::read_to_string(path)
        .context(format!("Failed to read config file: {}", path.display()))?;

    let config: ConfigFile = toml::from_str(&contents)
        .context("Failed to parse TOML config")?;

    if config.extract.inputs.is_empty() {
        return Err(anyhow!("Config must list at least one input in [extract].inputs"));
    }

    if config.extract.split == 0 {
        return Err(anyhow!("Config error: split must be at least 1"));
    }

    Ok(config)
}

pub fn validate_config(config: &ConfigFile, config_dir: &Path) -> Result<()> {
    let settings = &config.extract;

    for input in &settings.inputs {
        let abs_path = resolve_path(config_dir, input);
        if !abs_path.exists() {
            return Err(anyhow!("Input not found: {}", abs_path.display()));
        }
    }

    let sizes_path = resolve_path(config_dir, &settings.contigsizes);
    if !sizes_path.is_file() {
        return Err(anyhow!("Contig sizes file not found: {}", sizes_path.display()));
    }

    if let Some(region) = &settings.region_filter {
        let bed = resolve_path(config_dir, &region.bed);
        if !bed.is_file() {
            return Err(anyhow!("Region file not found: {}", bed.display()));
        }
    }

    if settings.kind == InputKind::Porec
        && settings.min_order > 0
        && settings.max_order > 0
        && settings.min_order > settings.max_order
    {
        return Err(anyhow!(
            "Config error: min_order ({}) is larger than max_order ({})",
            settings.min_order,
            settings.max_order
        ));
    }

    Ok(())
}

pub fn resolve_path(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

impl ExtractSettings {
    /// Options for the extractors, with paths resolved against `config_dir`.
    pub fn to_options(&self, config_dir: &Path) -> ExtractOptions {
        let mut options = ExtractOptions::default()
            .min_quality(self.min_quality)
            .edge_length(self.edge_length)
            .order(self.min_order, self.max_order)
            .split(self.split)
            .threads(self.threads)
            .low_memory(self.low_memory);

        if let Some(dir) = &self.log_dir {
            options = options.log_dir(resolve_path(config_dir, dir));
        }
        if let Some(region) = &self.region_filter {
            options = options.region_filter(
                RegionFilter::new(resolve_path(config_dir, &region.bed))
                    .invert(region.invert)
                    .program(region.program.clone()),
            );
        }
        options
    }

    pub fn input_paths(&self, config_dir: &Path) -> Vec<PathBuf> {
        self.inputs
            .iter()
            .map(|p| resolve_path(config_dir, p))
            .collect()
    }
}
