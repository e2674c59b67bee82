//! # Spatial Module
//!
//! Particle selection by axis-aligned box.
//!
//! Snapshots are sorted into a regular grid of cells, and each cell owns one
//! contiguous block of rows per species. Selecting by cell gives a cheap,
//! conservative selection without reading any particle data; re-testing the
//! coordinates of the surviving rows gives the exact one.
//!
//! ## Modes
//!
//! - [`FilterMode::Coarse`]: every row of every cell whose bounds touch the
//!   region. Always a superset of the particles inside the region.
//! - [`FilterMode::Fine`]: the coarse candidates filtered row by row with
//!   `lower <= x < upper` on every axis.
//!
//! ## Example
//!
//! ```rust
//! use snapsub::container::MemoryContainer;
//! use snapsub::reader::RangeReader;
//! use snapsub::spatial::{BoxRegion, CoarseGrid, FilterMode, SpatialSelector};
//! use snapsub::species::Species;
//!
//! // Two cells along x, each owning five gas rows
//! let grid = CoarseGrid::new(vec![[0.5, 0.5, 0.5], [1.5, 0.5, 0.5]], [1.0; 3])?
//!     .with_species(Species::Gas, vec![5, 5], vec![0, 5], 10)?;
//!
//! let mut selector = SpatialSelector::new(&grid, FilterMode::Coarse);
//! let region = BoxRegion::new([1.2, 0.0, 0.0], [2.0, 1.0, 1.0])?;
//! selector.constrain(&MemoryContainer::new(), &region, &RangeReader::new())?;
//!
//! let gas = selector.selection(Species::Gas).unwrap();
//! assert_eq!(gas.ranges().to_pairs(), vec![(5, 9)]);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod fine;
mod grid;
mod region;
mod selector;


pub use fine::{fine_mask, region_mask};
pub use grid::{CoarseGrid, CENTRES_PATH, META_DATA_PATH, SIZE_ATTRIBUTE};
pub use region::{BoxRegion, FilterMode};
pub use selector::SpatialSelector;
