//! Extraction command handlers.

use anyhow::{anyhow, Context, Result};
use std::path::{Path, PathBuf};

use hyperextract::config::{parse_config, resolve_path, validate_config};
use hyperextract::{
    ContigIndex, ContigSizes, ExtractOptions, Extractor, HyperEdges, HyperExtractor, RegionFilter,
    TableKind,
};

use super::args::ExtractArgs;

impl ExtractArgs {
    pub fn to_options(&self) -> ExtractOptions {
        let mut options = ExtractOptions::default()
            .min_quality(self.min_quality)
            .edge_length(self.edge_length)
            .order(self.min_order, self.max_order)
            .split(self.split)
            .threads(self.threads)
            .low_memory(!self.no_low_memory);

        if let Some(dir) = &self.log_dir {
            options = options.log_dir(dir);
        }
        if let Some(bed) = &self.hcr_bed {
            options = options.region_filter(
                RegionFilter::new(bed)
                    .invert(self.hcr_invert)
                    .program(self.hcr_program.clone()),
            );
        }
        options
    }
}

/// `hyperextract pairs|porec`
pub fn run_extract(kind: TableKind, args: &ExtractArgs) -> Result<()> {
    extract_and_save(
        kind,
        args.inputs.clone(),
        &args.contigsizes,
        &args.output,
        args.to_options(),
    )
}

/// `hyperextract from-config`
pub fn extract_from_config(config_path: &Path) -> Result<()> {
    log::info!("Extracting from config: {}", config_path.display());

    let cfg = parse_config(config_path)?;
    let config_dir = config_path
        .parent()
        .ok_or_else(|| anyhow!("Invalid config path"))?;

    log::info!("Validating file paths...");
    validate_config(&cfg, config_dir)?;
    log::info!("Validation successful.");

    let settings = &cfg.extract;
    extract_and_save(
        settings.kind.into(),
        settings.input_paths(config_dir),
        &resolve_path(config_dir, &settings.contigsizes),
        &resolve_path(config_dir, &settings.output),
        settings.to_options(config_dir),
    )
}

fn extract_and_save(
    kind: TableKind,
    inputs: Vec<PathBuf>,
    contigsizes: &Path,
    output: &Path,
    options: ExtractOptions,
) -> Result<()> {
    let side_table = side_table_path(output)?;
    let sizes = ContigSizes::from_path(contigsizes)
        .with_context(|| format!("Failed to load contig sizes: {}", contigsizes.display()))?;
    let index = ContigIndex::from_sizes(&sizes);
    log::info!("Loaded {} contigs from {}", index.len(), contigsizes.display());

    let edges: HyperEdges = match kind {
        TableKind::Pairs => Extractor::new(inputs, index, sizes, options)?.generate_edges()?,
        TableKind::PoreC => HyperExtractor::new(inputs, index, sizes, options)?.generate_edges()?,
    };

    edges
        .save(output)
        .with_context(|| format!("Failed to write hypergraph: {}", output.display()))?;
    edges
        .write_contigsizes(&side_table)
        .with_context(|| format!("Failed to write contig sizes: {}", side_table.display()))?;
    log::info!("Wrote vertex lengths to {}", side_table.display());
    Ok(())
}

/// Vertex length table written next to `output`.
fn side_table_path(output: &Path) -> Result<PathBuf> {
    let side_table = output.with_extension("contigsizes");
    if side_table == output {
        return Err(anyhow!(
            "Output {} would be overwritten by its contig sizes table; choose another extension",
            output.display()
        ));
    }
    Ok(side_table)
}
