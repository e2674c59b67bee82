use arrow::array::ArrayRef;

use super::grid::read_f64;
use super::BoxRegion;
use crate::container::DatasetHandle;
use crate::reader::{OutputShape, RangeReader, RowSource};
use crate::selection::RangeSet;
use crate::subset::SubsetError;

/// Per-row membership of 3-vector `coordinates` in `region`
pub fn region_mask(coordinates: &ArrayRef, region: &BoxRegion) -> Result<Vec<bool>, SubsetError> {
    let flat = read_f64(coordinates)?;
    Ok(flat
        .chunks_exact(3)
        .map(|p| region.contains([p[0], p[1], p[2]]))
        .collect())
}

/// Exact membership of every row of `candidates`, ordered like
/// `candidates.rows()`.
///
/// Only the candidate rows of the coordinate dataset are read. Candidates are
/// cut into partitions of at most `partition_rows` rows; each partition is
/// read and tested independently on the reader's pool and the partial masks
/// are concatenated in order.
pub fn fine_mask<D>(
    coordinates: &D,
    candidates: &RangeSet,
    region: &BoxRegion,
    reader: &RangeReader,
    partition_rows: usize,
) -> Result<Vec<bool>, SubsetError>
where
    D: DatasetHandle + ?Sized,
{
    let descriptor = coordinates.descriptor();
    if descriptor.trailing_shape != [3] {
        return Err(SubsetError::ShapeMismatch {
            path: descriptor.path.clone(),
            expected: vec![3],
            actual: descriptor.trailing_shape.clone(),
        });
    }

    let partitions = candidates.chunks(partition_rows);
    let partial = reader.pool().map(&partitions, |partition| {
        let shape = OutputShape::new(partition.row_count(), vec![3]);
        let values = RangeReader::new().read(coordinates, RowSource::Ranges(partition), &shape, None)?;
        region_mask(&values, region)
    })?;

    Ok(partial.concat())
}
