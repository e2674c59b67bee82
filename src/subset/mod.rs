//! # Subset Module
//!
//! Writes a subset of a snapshot into a fresh container.
//!
//! A pass walks the source tree once. Every top-level subtree that holds no
//! particle data (`Header`, `Units`, `Cells`, ...) is deep-copied verbatim.
//! Inside the species groups, groups and their attributes are recreated and
//! every dataset is rewritten with exactly the rows its species' selection
//! picks, in their original order.
//!
//! ## Guarantees
//!
//! - Non-particle content in the destination equals the source's.
//! - A species without selected rows still gets every dataset, with zero rows
//!   and the source's element type and per-row shape.
//! - Any failure aborts the pass; a partially written destination must be
//!   discarded by the caller.
//!
//! Peak memory is one dataset's selected rows: each dataset is read and
//! flushed before the next one is touched.
//!
//! ## Example
//!
//! ```rust
//! use snapsub::container::{Container, ContainerWriter, DatasetHandle, MemoryContainer, Attributes};
//! use snapsub::selection::Selection;
//! use snapsub::species::{ParticleMask, Species};
//! use snapsub::subset::SubsetWriter;
//! use std::sync::Arc;
//! use arrow::array::{Array, Float32Array};
//!
//! let mut source = MemoryContainer::new();
//! source.write_dataset(
//!     "/PartType0/Masses",
//!     Arc::new(Float32Array::from(vec![1.0, 2.0, 3.0, 4.0])),
//!     &Attributes::new(),
//! )?;
//!
//! let mask = ParticleMask::new().with(Species::Gas, Selection::from_indices(4, &[1, 3])?)?;
//! let mut dest = MemoryContainer::new();
//! let stats = SubsetWriter::new().write_subset(&source, &mut dest, &mask)?;
//!
//! assert_eq!(stats.rows_written, 2);
//! assert_eq!(dest.dataset("/PartType0/Masses")?.rows(), 2);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod config;
mod error;
mod stats;


pub use config::{SubsetConfig, DEFAULT_PARTITION_ROWS};
pub use error::SubsetError;
pub use stats::SubsetStats;

use std::sync::Arc;

use arrow::array::Array;

use crate::container::{
    copy_subtree, join_path, walk, Container, ContainerWriter, DatasetHandle, LeafNode, Node, ROOT,
};
use crate::observe::{LogObserver, SubsetEvent, SubsetObserver};
use crate::pool::WorkerPool;
use crate::reader::{planned_ranges, OutputShape, RangeReader, RowSource};
use crate::selection::{RangeSet, Selection};
use crate::spatial::{BoxRegion, CoarseGrid, FilterMode, SpatialSelector};
use crate::species::{ParticleMask, Route, Species, SpeciesRouter};

/// Writes subsets of one container into another
#[derive(Debug, Clone)]
pub struct SubsetWriter<O: SubsetObserver = LogObserver> {
    router: SpeciesRouter,
    reader: RangeReader,
    partition_rows: usize,
    observer: O,
}

impl Default for SubsetWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl SubsetWriter {
    /// A sequential writer reporting to the log
    pub fn new() -> Self {
        Self {
            router: SpeciesRouter::new(),
            reader: RangeReader::new(),
            partition_rows: DEFAULT_PARTITION_ROWS,
            observer: LogObserver,
        }
    }

    /// A writer whose reads run on the pool described by `config`
    pub fn with_config(config: &SubsetConfig) -> Result<Self, SubsetError> {
        let pool = WorkerPool::from_config(config)?;
        Ok(Self {
            reader: RangeReader::with_pool(Arc::new(pool)),
            partition_rows: config.partition_rows.max(1),
            ..Self::new()
        })
    }
}

impl<O: SubsetObserver> SubsetWriter<O> {
    /// Report events to `observer` instead
    pub fn with_observer<P: SubsetObserver>(self, observer: P) -> SubsetWriter<P> {
        SubsetWriter {
            router: self.router,
            reader: self.reader,
            partition_rows: self.partition_rows,
            observer,
        }
    }

    pub fn reader(&self) -> &RangeReader {
        &self.reader
    }

    pub fn observer(&self) -> &O {
        &self.observer
    }

    /// Copy `source` into `dest`, keeping only the rows `mask` selects.
    ///
    /// Species the mask does not mention get zero-row datasets.
    pub fn write_subset<C, W>(
        &self,
        source: &C,
        dest: &mut W,
        mask: &ParticleMask,
    ) -> Result<SubsetStats, SubsetError>
    where
        C: Container + ?Sized,
        W: ContainerWriter + ?Sized,
    {
        let mut stats = SubsetStats::default();
        for species in Species::ALL {
            stats.particles[species.index()] = mask.size(species);
        }

        let root = source.root()?;
        dest.create_group(ROOT, root.attributes())?;

        for child in root.children() {
            let path = join_path(ROOT, child);
            match self.router.route(&path) {
                Route::Unfiltered => self.copy_verbatim(source, &mut *dest, &path, &mut stats)?,
                Route::Species(_) => {
                    walk(source, &path, &mut |node: &Node| -> Result<(), SubsetError> {
                        match node {
                            Node::Group(group) => {
                                dest.create_group(&group.path, &group.attributes)?
                            }
                            Node::Leaf(leaf) => {
                                self.write_filtered(source, &mut *dest, leaf, mask, &mut stats)?
                            }
                        }
                        Ok(())
                    })?;
                }
            }
        }

        Ok(stats)
    }

    /// Select the particles inside `region` using the source's cell grid and
    /// write them to `dest`
    pub fn write_region<C, W>(
        &self,
        source: &C,
        dest: &mut W,
        region: &BoxRegion,
        mode: FilterMode,
    ) -> Result<SubsetStats, SubsetError>
    where
        C: Container + ?Sized,
        W: ContainerWriter + ?Sized,
    {
        region.validate()?;
        let grid = CoarseGrid::load(source)?;
        let mut selector =
            SpatialSelector::new(&grid, mode).with_partition_rows(self.partition_rows);
        selector.constrain(source, region, &self.reader)?;
        let mask = selector.into_mask()?;
        self.write_subset(source, dest, &mask)
    }

    fn copy_verbatim<C, W>(
        &self,
        source: &C,
        dest: &mut W,
        path: &str,
        stats: &mut SubsetStats,
    ) -> Result<(), SubsetError>
    where
        C: Container + ?Sized,
        W: ContainerWriter + ?Sized,
    {
        let bytes = copy_subtree(source, path, dest)?;
        stats.subtrees_copied += 1;
        stats.bytes_copied += bytes;
        self.observer.on_event(&SubsetEvent::SubtreeCopied {
            path: path.to_string(),
            bytes,
        });
        Ok(())
    }

    fn write_filtered<C, W>(
        &self,
        source: &C,
        dest: &mut W,
        leaf: &LeafNode,
        mask: &ParticleMask,
        stats: &mut SubsetStats,
    ) -> Result<(), SubsetError>
    where
        C: Container + ?Sized,
        W: ContainerWriter + ?Sized,
    {
        let path = leaf.descriptor.path.as_str();
        let resolution = self.router.resolve(path, mask);
        let species = match resolution.route {
            Route::Species(species) => species,
            // e.g. a "Cells" dataset stored under a species group
            Route::Unfiltered => return self.copy_verbatim(source, dest, path, stats),
        };

        self.observer.on_event(&SubsetEvent::DatasetStarted {
            path: path.to_string(),
            species,
        });

        let dataset = source.dataset(path)?;
        let ranges =
            planned_ranges(path, &resolution, dataset.rows())?.unwrap_or_else(RangeSet::new);
        self.observer.on_event(&SubsetEvent::RangesPlanned {
            path: path.to_string(),
            ranges: ranges.range_count(),
            rows: ranges.row_count(),
        });

        let shape = OutputShape::rows_of(&dataset, resolution.size);
        let values = self.reader.read(
            &dataset,
            RowSource::Ranges(&ranges),
            &shape,
            Some(&leaf.descriptor.dtype),
        )?;

        let rows = values.len();
        let bytes = leaf.descriptor.bytes_for(rows);
        dest.write_dataset(path, values, &leaf.attributes)?;

        stats.datasets_filtered += 1;
        stats.rows_written += rows;
        stats.bytes_written += bytes;
        self.observer.on_event(&SubsetEvent::DatasetFinished {
            path: path.to_string(),
            rows,
            bytes,
        });
        Ok(())
    }
}

/// Subset `source` into `dest` with a default [`SubsetWriter`]
pub fn write_subset<C, W>(
    source: &C,
    dest: &mut W,
    mask: &ParticleMask,
) -> Result<SubsetStats, SubsetError>
where
    C: Container + ?Sized,
    W: ContainerWriter + ?Sized,
{
    SubsetWriter::new().write_subset(source, dest, mask)
}

/// A mask selecting every row of every species present in `container`.
///
/// A species' row count is taken from its `Coordinates` dataset, falling back
/// to the first dataset of its group. Species groups without datasets are
/// left out and so get zero-row output.
pub fn full_mask<C>(container: &C) -> Result<ParticleMask, SubsetError>
where
    C: Container + ?Sized,
{
    let mut mask = ParticleMask::new();
    for species in Species::REAL {
        let group = join_path(ROOT, species.group_name());
        if !container.exists(&group)? {
            continue;
        }

        let coordinates = species.coordinates_path();
        let rows = if container.exists(&coordinates)? {
            Some(container.dataset(&coordinates)?.rows())
        } else {
            first_dataset_rows(container, &group)?
        };
        if let Some(rows) = rows {
            mask = mask.with(species, Selection::all(rows))?;
        }
    }
    Ok(mask)
}

fn first_dataset_rows<C>(container: &C, group: &str) -> Result<Option<usize>, SubsetError>
where
    C: Container + ?Sized,
{
    let mut rows = None;
    walk(container, group, &mut |node: &Node| -> Result<(), SubsetError> {
        if let (None, Node::Leaf(leaf)) = (rows, node) {
            rows = Some(leaf.descriptor.rows);
        }
        Ok(())
    })?;
    Ok(rows)
}
