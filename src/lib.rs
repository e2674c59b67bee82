//! # snapsub - Particle Subsetting for Simulation Snapshots
//!
//! `snapsub` extracts spatial (or otherwise selected) subsets of particles from
//! large simulation snapshots stored in chunked, hierarchical containers, and
//! writes them to a new container of the same layout.
//!
//! ## Key Features
//!
//! - **Range Compression**: per-species row selections are reduced to the
//!   minimal list of contiguous row ranges, so a subset costs one storage read
//!   per range instead of one per particle.
//!
//! - **Spatial Selection**: a coarse pass picks every grid cell touching an
//!   axis-aligned box without reading particle data; an optional fine pass
//!   re-tests the coordinates of the surviving rows for an exact result.
//!
//! - **Species Routing**: dataset paths are mapped to particle species through
//!   a fixed, ordered tag table. Anything that is not particle data is copied
//!   through untouched.
//!
//! - **Chunked Storage**: the bundled on-disk backend keeps every dataset in a
//!   Parquet file whose row groups are the chunk unit, with ZSTD compression
//!   and page-level row selection.
//!
//! - **Parallel Reads**: range reads and fine filtering fan out over a rayon
//!   pool (the `parallel` feature) and merge deterministically.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use snapsub::container::{BundleConfig, BundleContainer, BundleWriter};
//! use snapsub::spatial::{BoxRegion, FilterMode};
//! use snapsub::subset::SubsetWriter;
//!
//! let source = BundleContainer::open("snapshot.bundle")?;
//! let mut dest = BundleWriter::create("region.bundle", BundleConfig::default())?;
//!
//! let region = BoxRegion::new([0.0, 0.0, 0.0], [50.0, 50.0, 50.0])?;
//! let stats = SubsetWriter::new().write_region(&source, &mut dest, &region, FilterMode::Fine)?;
//! println!("{stats}");
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Architecture
//!
//! The library is organized into the following modules:
//!
//! - [`selection`]: row selections and their compression into range sets
//! - [`container`]: the container abstraction with memory and bundle backends
//! - [`reader`]: range and fancy-index reads into single output buffers
//! - [`spatial`]: cell grids, box regions and the spatial selector
//! - [`species`]: the species enumeration, path routing and per-species masks
//! - [`subset`]: the full-container subsetting pass
//! - [`observe`]: lifecycle events reported by a pass
//! - [`pool`]: the worker pool behind the parallel paths
//!
//! Control flows from [`subset::SubsetWriter`] through
//! [`species::SpeciesRouter`] and [`reader::RangeReader`] to the destination
//! container; [`spatial::SpatialSelector`] produces the selections that drive
//! it.

#![deny(rustdoc::missing_crate_level_docs)]

pub mod container;
pub mod observe;
pub mod pool;
pub mod reader;
pub mod selection;
pub mod spatial;
pub mod species;
pub mod subset;

#[cfg(test)]
mod testing;

/// Re-export commonly used types for convenience
pub mod prelude {
    pub use crate::container::{
        BundleConfig, BundleContainer, BundleWriter, CompressionType, Container,
        ContainerError, ContainerWriter, DatasetHandle, MemoryContainer,
    };
    pub use crate::observe::{LogObserver, SubsetEvent, SubsetObserver};
    pub use crate::reader::{read_masked, OutputShape, RangeReader, RowSource};
    pub use crate::selection::{compress, RangeSet, RowRange, Selection, SelectionError};
    pub use crate::spatial::{BoxRegion, CoarseGrid, FilterMode, SpatialSelector};
    pub use crate::species::{ParticleMask, Route, Species, SpeciesRouter};
    pub use crate::subset::{
        full_mask, write_subset, SubsetConfig, SubsetError, SubsetStats, SubsetWriter,
    };
}
