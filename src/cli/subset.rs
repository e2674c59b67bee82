use anyhow::{Context, Result};
use log::info;
use std::path::PathBuf;

use snapsub::container::{BundleConfig, BundleContainer, BundleWriter, CompressionType};
use snapsub::spatial::{BoxRegion, FilterMode};
use snapsub::subset::{full_mask, SubsetWriter};

use super::config::Config;

/// Arguments of the subset command after flag parsing
pub struct SubsetArgs {
    pub input: PathBuf,
    pub output: PathBuf,
    pub config: Option<PathBuf>,
    pub lower: Option<Vec<f64>>,
    pub upper: Option<Vec<f64>>,
    pub mode: Option<FilterMode>,
    pub bundle: BundleConfig,
    pub threads: Option<usize>,
    pub sequential: bool,
    pub compression_level: Option<i32>,
    pub row_group_size: Option<usize>,
}

/// Subset a snapshot bundle into a new bundle
pub fn run(args: SubsetArgs) -> Result<()> {
    if !args.input.exists() {
        anyhow::bail!("Input bundle does not exist: {}", args.input.display());
    }

    let file_config = match &args.config {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };

    let lower = corner(args.lower, "--lower")?.or(file_config.region.lower);
    let upper = corner(args.upper, "--upper")?.or(file_config.region.upper);
    let region = match (lower, upper) {
        (Some(lower), Some(upper)) => Some(BoxRegion::new(lower, upper)?),
        (None, None) => None,
        _ => anyhow::bail!("A region needs both a lower and an upper corner"),
    };
    let mode = args.mode.or(file_config.region.mode).unwrap_or_default();

    let mut subset_config = file_config.subset;
    if let Some(threads) = args.threads {
        subset_config = subset_config.with_threads(threads);
    }
    if args.sequential {
        subset_config.parallel = false;
    }

    let mut bundle_config = args.bundle;
    if let Some(level) = args.compression_level.or(file_config.output.compression_level) {
        bundle_config.compression = CompressionType::Zstd(level);
    }
    if let Some(rows) = args.row_group_size.or(file_config.output.row_group_size) {
        bundle_config.row_group_size = rows;
    }

    info!("snapsub - Snapshot Subset");
    info!("=========================");
    info!("Input:  {}", args.input.display());
    info!("Output: {}", args.output.display());
    match &region {
        Some(region) => info!(
            "Region: {:?} to {:?} ({} mode)",
            region.lower, region.upper, mode
        ),
        None => info!("Region: everything"),
    }
    info!("Compression: {:?}", bundle_config.compression);
    info!("Row group size: {}", bundle_config.row_group_size);

    let source = BundleContainer::open(&args.input)
        .with_context(|| format!("Failed to open bundle: {}", args.input.display()))?;
    let mut dest = BundleWriter::create(&args.output, bundle_config)
        .with_context(|| format!("Failed to create bundle: {}", args.output.display()))?;

    let writer = SubsetWriter::with_config(&subset_config)?;
    let start = std::time::Instant::now();
    let stats = match region {
        Some(region) => writer.write_region(&source, &mut dest, &region, mode),
        None => {
            let mask = full_mask(&source)?;
            writer.write_subset(&source, &mut dest, &mask)
        }
    }
    .context("Subset failed; the output bundle is incomplete and should be removed")?;
    let elapsed = start.elapsed();

    println!("Subset complete in {:.2}s", elapsed.as_secs_f64());
    println!("  {stats}");
    for (index, count) in stats.particles.iter().enumerate() {
        if *count > 0 {
            println!("  PartType{index}: {count} particles");
        }
    }
    println!("  Datasets written: {}", dest.datasets_written());

    Ok(())
}

fn corner(values: Option<Vec<f64>>, flag: &str) -> Result<Option<[f64; 3]>> {
    values
        .map(|values| {
            <[f64; 3]>::try_from(values)
                .map_err(|values| anyhow::anyhow!("{flag} takes 3 values, got {}", values.len()))
        })
        .transpose()
}
