//! # snapsub
//!
//! A command-line tool for cutting spatial subsets out of simulation
//! snapshot bundles.
//!
//! ## Usage
//!
//! ```bash
//! # Particles inside a box, exact
//! snapsub subset snapshot.bundle region.bundle --lower 0 0 0 --upper 50 50 50 --mode fine
//!
//! # Settings from a file
//! snapsub subset snapshot.bundle region.bundle --config snapsub.toml
//!
//! # Inspect a bundle
//! snapsub info snapshot.bundle
//! ```

use anyhow::Result;
use clap::Parser;

mod cli;

use cli::Cli;

fn main() -> Result<()> {
    let cli = Cli::parse();
    cli::init_logging(cli.verbosity());
    cli::dispatch(cli)
}
