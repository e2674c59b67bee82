use super::{RangeCompressor, RangeSet, RowRange, SelectionError};

/// The rows chosen out of a species' `total` rows.
///
/// Masks, index lists and range pairs are all accepted at the boundary, but
/// the selection is always held as a canonical [`RangeSet`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    total: usize,
    ranges: RangeSet,
}

impl Selection {
    /// Every row
    pub fn all(total: usize) -> Self {
        Self {
            total,
            ranges: RangeSet::full(total),
        }
    }

    /// No rows
    pub fn none(total: usize) -> Self {
        Self {
            total,
            ranges: RangeSet::new(),
        }
    }

    /// Wrap an existing range set
    pub fn from_ranges(total: usize, ranges: RangeSet) -> Result<Self, SelectionError> {
        if let Some(row) = ranges.last_row() {
            if row >= total {
                return Err(SelectionError::OutOfBounds { row, total });
            }
        }
        Ok(Self { total, ranges })
    }

    /// From inclusive `(start, end)` pairs
    pub fn from_pairs<I>(total: usize, pairs: I) -> Result<Self, SelectionError>
    where
        I: IntoIterator<Item = (usize, usize)>,
    {
        Self::from_ranges(total, RangeSet::from_pairs(pairs)?)
    }

    /// From a strictly ascending index list
    pub fn from_indices(total: usize, indices: &[usize]) -> Result<Self, SelectionError> {
        Self::from_ranges(total, super::compress(indices.iter().copied())?)
    }

    /// From a boolean mask with one entry per row
    pub fn from_mask(mask: &[bool]) -> Self {
        Self {
            total: mask.len(),
            ranges: runs_of(mask, 0),
        }
    }

    /// Row count of the species this selection indexes into
    pub fn total_rows(&self) -> usize {
        self.total
    }

    /// Number of selected rows
    pub fn len(&self) -> usize {
        self.ranges.row_count()
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    pub fn ranges(&self) -> &RangeSet {
        &self.ranges
    }

    pub fn into_ranges(self) -> RangeSet {
        self.ranges
    }

    pub fn contains(&self, row: usize) -> bool {
        self.ranges.contains(row)
    }

    /// Expand to a boolean mask of length `total_rows()`
    pub fn to_mask(&self) -> Vec<bool> {
        let mut mask = vec![false; self.total];
        for range in &self.ranges {
            mask[range.start..=range.end].fill(true);
        }
        mask
    }

    /// Expand to the ascending list of selected rows
    pub fn to_indices(&self) -> Vec<usize> {
        self.ranges.rows().collect()
    }

    /// Rows selected by both; successive constraints only ever narrow
    pub fn intersect(&self, other: &Selection) -> Result<Selection, SelectionError> {
        if self.total != other.total {
            return Err(SelectionError::TotalMismatch {
                left: self.total,
                right: other.total,
            });
        }
        Ok(self.restrict(&other.ranges))
    }

    /// Keep only rows that also lie in `ranges`
    pub fn restrict(&self, ranges: &RangeSet) -> Selection {
        Self {
            total: self.total,
            ranges: self.ranges.intersect(ranges),
        }
    }

    /// Keep the rows of `candidates` whose entry in `keep` is true.
    ///
    /// `keep` is ordered like `candidates.rows()`. The result is further
    /// intersected with this selection.
    pub fn refine(&self, candidates: &RangeSet, keep: &[bool]) -> Result<Selection, SelectionError> {
        let expected = candidates.row_count();
        if keep.len() != expected {
            return Err(SelectionError::MaskLength {
                expected,
                actual: keep.len(),
            });
        }

        let mut compressor = RangeCompressor::new();
        let mut cursor = 0;
        for range in candidates {
            let flags = &keep[cursor..cursor + range.len()];
            for run in runs_of(flags, range.start).iter() {
                compressor.push_range(run.start, run.end)?;
            }
            cursor += range.len();
        }

        Ok(self.restrict(&compressor.finish()))
    }
}

/// Maximal runs of `true` in `flags`, with row numbers shifted by `base`
fn runs_of(flags: &[bool], base: usize) -> RangeSet {
    let mut ranges = Vec::new();
    let mut open: Option<usize> = None;

    for (offset, &flag) in flags.iter().enumerate() {
        match (flag, open) {
            (true, None) => open = Some(offset),
            (false, Some(start)) => {
                ranges.push(RowRange {
                    start: base + start,
                    end: base + offset - 1,
                });
                open = None;
            }
            _ => {}
        }
    }
    if let Some(start) = open {
        ranges.push(RowRange {
            start: base + start,
            end: base + flags.len() - 1,
        });
    }

    RangeSet::from_canonical(ranges)
}
