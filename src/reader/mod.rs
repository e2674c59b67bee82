//! # Range Reader Module
//!
//! Turns a selection into a single output buffer with the fewest possible
//! storage reads.
//!
//! ## Features
//!
//! - **Range Reads**: one contiguous read per range of a [`RangeSet`], results
//!   concatenated in range order so overall row order is preserved.
//! - **Fancy Indexing**: an arbitrary index list (unsorted, duplicates allowed)
//!   is read as-is, preserving the caller's order exactly.
//! - **Shape Checks**: the requested row count and per-row shape are checked
//!   against the selection and the dataset before any read is issued.
//! - **Fan-out**: ranges are independent, so they may be spread over a
//!   [`WorkerPool`]; each worker returns a disjoint block.
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use arrow::array::{Array, ArrayRef, Int64Array};
//! use snapsub::container::{Attributes, Container, ContainerWriter, MemoryContainer};
//! use snapsub::reader::{OutputShape, RangeReader, RowSource};
//! use snapsub::selection::RangeSet;
//!
//! let mut container = MemoryContainer::new();
//! let values: ArrayRef = Arc::new(Int64Array::from_iter_values(0..1000));
//! container.write_dataset("/PartType0/ParticleIDs", values, &Attributes::new())?;
//!
//! let dataset = container.dataset("/PartType0/ParticleIDs")?;
//! let ranges = RangeSet::from_pairs([(77, 79), (88, 98), (204, 204)])?;
//! let shape = OutputShape::rows_of(&dataset, ranges.row_count());
//!
//! let buffer = RangeReader::new().read(&dataset, RowSource::Ranges(&ranges), &shape, None)?;
//! assert_eq!(buffer.len(), 15);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#[cfg(test)]
mod tests;

use std::sync::Arc;

use arrow::array::{new_empty_array, ArrayRef};
use arrow::compute::cast;
use arrow::datatypes::DataType;
use log::debug;

use crate::container::{array_type, concat_rows, Container, DatasetHandle};
use crate::pool::WorkerPool;
use crate::selection::{RangeSet, Selection};
use crate::species::{ParticleMask, Resolution, Route, SpeciesRouter};
use crate::subset::SubsetError;

/// The rows a read should produce
#[derive(Debug, Clone, Copy)]
pub enum RowSource<'a> {
    /// Canonical ranges; one contiguous read each
    Ranges(&'a RangeSet),
    /// Fancy index list, read in the given order, duplicates included
    Indices(&'a [usize]),
}

impl RowSource<'_> {
    /// Number of rows the source yields
    pub fn row_count(&self) -> usize {
        match self {
            RowSource::Ranges(ranges) => ranges.row_count(),
            RowSource::Indices(indices) => indices.len(),
        }
    }
}

/// Shape of the buffer a read must produce
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputShape {
    /// Leading dimension
    pub rows: usize,
    /// Per-row shape; empty for scalar rows
    pub trailing: Vec<usize>,
}

impl OutputShape {
    pub fn new(rows: usize, trailing: Vec<usize>) -> Self {
        Self { rows, trailing }
    }

    /// `rows` rows shaped like the rows of `dataset`
    pub fn rows_of<D: DatasetHandle + ?Sized>(dataset: &D, rows: usize) -> Self {
        Self {
            rows,
            trailing: dataset.descriptor().trailing_shape.clone(),
        }
    }

    /// Full shape, rows first
    pub fn dims(&self) -> Vec<usize> {
        let mut dims = vec![self.rows];
        dims.extend_from_slice(&self.trailing);
        dims
    }
}

/// Reads selections out of datasets
#[derive(Debug, Clone, Default)]
pub struct RangeReader {
    pool: Arc<WorkerPool>,
}

impl RangeReader {
    /// A reader issuing every read on the calling thread
    pub fn new() -> Self {
        Self::default()
    }

    /// A reader that spreads range reads over `pool`
    pub fn with_pool(pool: Arc<WorkerPool>) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &WorkerPool {
        &self.pool
    }

    /// Read `source` from `dataset` into a buffer of `shape`.
    ///
    /// When `dtype` differs from the dataset's element type the values are
    /// cast. The row count and per-row shape are verified before any read.
    pub fn read<D>(
        &self,
        dataset: &D,
        source: RowSource<'_>,
        shape: &OutputShape,
        dtype: Option<&DataType>,
    ) -> Result<ArrayRef, SubsetError>
    where
        D: DatasetHandle + ?Sized,
    {
        let descriptor = dataset.descriptor();

        let actual = source.row_count();
        if actual != shape.rows {
            return Err(SubsetError::SizeMismatch {
                path: descriptor.path.clone(),
                expected: shape.rows,
                actual,
            });
        }
        if shape.trailing != descriptor.trailing_shape {
            return Err(SubsetError::ShapeMismatch {
                path: descriptor.path.clone(),
                expected: shape.trailing.clone(),
                actual: descriptor.trailing_shape.clone(),
            });
        }

        let values = match source {
            RowSource::Ranges(ranges) => self.read_ranges(dataset, ranges)?,
            RowSource::Indices(indices) => dataset.take_rows(indices)?,
        };

        match dtype {
            Some(dtype) if *dtype != descriptor.dtype => {
                Ok(cast(&values, &array_type(dtype, &shape.trailing))?)
            }
            _ => Ok(values),
        }
    }

    fn read_ranges<D>(&self, dataset: &D, ranges: &RangeSet) -> Result<ArrayRef, SubsetError>
    where
        D: DatasetHandle + ?Sized,
    {
        let data_type = dataset.descriptor().array_type();
        if ranges.is_empty() {
            return Ok(new_empty_array(&data_type));
        }

        debug!(
            "Reading {} rows of {} in {} ranges",
            ranges.row_count(),
            dataset.descriptor().path,
            ranges.range_count()
        );
        let blocks = self
            .pool
            .map(ranges.ranges(), |range| dataset.read_rows(range.to_half_open()))?;
        Ok(concat_rows(&blocks, &data_type)?)
    }
}

/// The ranges a routed dataset must be read with; `None` means every row.
///
/// Species without a selection (placeholders included) yield an empty set.
pub(crate) fn planned_ranges(
    path: &str,
    resolution: &Resolution<'_>,
    dataset_rows: usize,
) -> Result<Option<RangeSet>, SubsetError> {
    match (resolution.route, resolution.selection) {
        (Route::Unfiltered, _) => Ok(None),
        (Route::Species(_), None) => Ok(Some(RangeSet::new())),
        (Route::Species(_), Some(selection)) => {
            check_total(path, selection, dataset_rows)?;
            Ok(Some(selection.ranges().clone()))
        }
    }
}

fn check_total(path: &str, selection: &Selection, dataset_rows: usize) -> Result<(), SubsetError> {
    if selection.total_rows() != dataset_rows {
        return Err(SubsetError::SelectionTotalMismatch {
            path: path.to_string(),
            selection: selection.total_rows(),
            dataset: dataset_rows,
        });
    }
    Ok(())
}

/// Materialise the rows of one dataset selected by `mask` as an in-memory
/// buffer, routing the path the same way a subsetting pass would.
pub fn read_masked<C>(
    container: &C,
    path: &str,
    mask: &ParticleMask,
    reader: &RangeReader,
) -> Result<ArrayRef, SubsetError>
where
    C: Container + ?Sized,
{
    let dataset = container.dataset(path)?;
    let resolution = SpeciesRouter::new().resolve(path, mask);

    match planned_ranges(path, &resolution, dataset.rows())? {
        None => Ok(dataset.read_all()?),
        Some(ranges) => {
            let shape = OutputShape::rows_of(&dataset, ranges.row_count());
            reader.read(&dataset, RowSource::Ranges(&ranges), &shape, None)
        }
    }
}
