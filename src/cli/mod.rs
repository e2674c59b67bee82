use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use snapsub::container::BundleConfig;
use snapsub::spatial::FilterMode;

mod config;
mod info;
mod subset;

/// snapsub - Spatial particle subsetting for simulation snapshots
#[derive(Parser)]
#[command(name = "snapsub")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Verbosity level (-v for info, -vv for debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

/// How exactly the region is applied
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum ModeArg {
    /// Whole cells touching the region
    Coarse,
    /// Only particles inside the region
    Fine,
}

impl From<ModeArg> for FilterMode {
    fn from(arg: ModeArg) -> Self {
        match arg {
            ModeArg::Coarse => FilterMode::Coarse,
            ModeArg::Fine => FilterMode::Fine,
        }
    }
}

/// Output storage profile
#[derive(Clone, Copy, Debug, Default, ValueEnum)]
pub enum ProfileArg {
    /// Prioritize write speed over size
    Fast,
    /// Balance between speed and size
    #[default]
    Balanced,
    /// Smallest output, slower writes
    MaxCompression,
}

impl From<ProfileArg> for BundleConfig {
    fn from(arg: ProfileArg) -> Self {
        match arg {
            ProfileArg::Fast => BundleConfig::fast_write(),
            ProfileArg::Balanced => BundleConfig::balanced(),
            ProfileArg::MaxCompression => BundleConfig::max_compression(),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Write the particles inside a box (or all of them) to a new bundle
    Subset {
        /// Input snapshot bundle
        #[arg(value_name = "INPUT")]
        input: PathBuf,

        /// Output bundle directory (must not exist or be empty)
        #[arg(value_name = "OUTPUT")]
        output: PathBuf,

        /// Load settings from a TOML config file
        #[arg(long, value_name = "FILE")]
        config: Option<PathBuf>,

        /// Lower corner of the region
        #[arg(long, num_args = 3, value_names = ["X", "Y", "Z"], allow_negative_numbers = true)]
        lower: Option<Vec<f64>>,

        /// Upper corner of the region
        #[arg(long, num_args = 3, value_names = ["X", "Y", "Z"], allow_negative_numbers = true)]
        upper: Option<Vec<f64>>,

        /// Coarse keeps whole cells, fine keeps only particles inside the region
        #[arg(short = 'm', long, value_enum)]
        mode: Option<ModeArg>,

        /// Output storage profile (fast, balanced, max-compression)
        #[arg(short = 'p', long, default_value = "balanced", value_enum)]
        profile: ProfileArg,

        /// Size of the worker pool (defaults to one worker per core)
        #[arg(short = 't', long)]
        threads: Option<usize>,

        /// Run every read on the main thread
        #[arg(long, default_value_t = false)]
        sequential: bool,

        // === Advanced tuning flags (hidden from --help) ===
        /// Compression level for ZSTD (1-22, default: profile-dependent)
        #[arg(short = 'c', long, hide = true)]
        compression_level: Option<i32>,

        /// Rows per output row group
        #[arg(short = 'r', long, hide = true)]
        row_group_size: Option<usize>,
    },

    /// Display the group and dataset tree of a snapshot bundle
    Info {
        /// Input snapshot bundle
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
}

impl Cli {
    pub fn verbosity(&self) -> u8 {
        self.verbose
    }
}

pub fn init_logging(verbosity: u8) {
    let log_level = match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();
}

pub fn dispatch(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Subset {
            input,
            output,
            config,
            lower,
            upper,
            mode,
            profile,
            threads,
            sequential,
            compression_level,
            row_group_size,
        } => subset::run(subset::SubsetArgs {
            input,
            output,
            config,
            lower,
            upper,
            mode: mode.map(FilterMode::from),
            bundle: BundleConfig::from(profile),
            threads,
            sequential,
            compression_level,
            row_group_size,
        }),
        Commands::Info { file } => info::run(file),
    }
}
