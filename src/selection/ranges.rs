use std::ops::Range;

use super::SelectionError;

/// An inclusive run of rows `[start, end]`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RowRange {
    /// First row of the run
    pub start: usize,
    /// Last row of the run (inclusive)
    pub end: usize,
}

impl RowRange {
    /// Create a range, rejecting `start > end`
    pub fn new(start: usize, end: usize) -> Result<Self, SelectionError> {
        if start > end {
            return Err(SelectionError::InvalidRange { start, end });
        }
        Ok(Self { start, end })
    }

    /// A range covering a single row
    pub fn single(row: usize) -> Self {
        Self {
            start: row,
            end: row,
        }
    }

    /// Number of rows covered
    #[inline]
    pub fn len(&self) -> usize {
        self.end - self.start + 1
    }

    /// Always false: a range covers at least one row
    #[inline]
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Whether `row` lies inside the range
    #[inline]
    pub fn contains(&self, row: usize) -> bool {
        self.start <= row && row <= self.end
    }

    /// The half-open equivalent used by storage reads
    #[inline]
    pub fn to_half_open(&self) -> Range<usize> {
        self.start..self.end + 1
    }
}

/// An ascending, non-overlapping, non-adjacent sequence of [`RowRange`]s.
///
/// This is the canonical selection form consumed by the I/O layer: every
/// run is maximal, so the number of ranges equals the number of contiguous
/// reads needed to materialise the selection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RangeSet {
    ranges: Vec<RowRange>,
}

impl RangeSet {
    /// An empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// A single range covering rows `0..rows`, or an empty set when `rows == 0`
    pub fn full(rows: usize) -> Self {
        if rows == 0 {
            Self::new()
        } else {
            Self {
                ranges: vec![RowRange {
                    start: 0,
                    end: rows - 1,
                }],
            }
        }
    }

    /// Build a set from inclusive `(start, end)` pairs.
    ///
    /// Pairs must be ascending and must not overlap; adjacent pairs are merged.
    pub fn from_pairs<I>(pairs: I) -> Result<Self, SelectionError>
    where
        I: IntoIterator<Item = (usize, usize)>,
    {
        let mut compressor = RangeCompressor::new();
        for (start, end) in pairs {
            compressor.push_range(start, end)?;
        }
        Ok(compressor.finish())
    }

    /// The ranges, in ascending order
    pub fn ranges(&self) -> &[RowRange] {
        &self.ranges
    }

    /// Iterate over the ranges
    pub fn iter(&self) -> std::slice::Iter<'_, RowRange> {
        self.ranges.iter()
    }

    /// Number of ranges (contiguous reads)
    pub fn range_count(&self) -> usize {
        self.ranges.len()
    }

    /// Number of rows covered by all ranges
    pub fn row_count(&self) -> usize {
        self.ranges.iter().map(RowRange::len).sum()
    }

    /// True when no rows are covered
    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    /// The highest covered row
    pub fn last_row(&self) -> Option<usize> {
        self.ranges.last().map(|r| r.end)
    }

    /// Whether `row` is covered
    pub fn contains(&self, row: usize) -> bool {
        let idx = self.ranges.partition_point(|r| r.end < row);
        self.ranges.get(idx).is_some_and(|r| r.contains(row))
    }

    /// Iterate over every covered row in ascending order
    pub fn rows(&self) -> impl Iterator<Item = usize> + '_ {
        self.ranges.iter().flat_map(|r| r.start..=r.end)
    }

    /// The ranges as inclusive `(start, end)` pairs
    pub fn to_pairs(&self) -> Vec<(usize, usize)> {
        self.ranges.iter().map(|r| (r.start, r.end)).collect()
    }

    /// Rows covered by both sets
    pub fn intersect(&self, other: &RangeSet) -> RangeSet {
        let (left, right) = (&self.ranges, &other.ranges);
        let mut compressor = RangeCompressor::new();
        let (mut i, mut j) = (0, 0);

        while i < left.len() && j < right.len() {
            let start = left[i].start.max(right[j].start);
            let end = left[i].end.min(right[j].end);
            if start <= end {
                // Both inputs are canonical so the overlaps arrive ascending
                compressor.extend_unchecked(start, end);
            }
            if left[i].end < right[j].end {
                i += 1;
            } else {
                j += 1;
            }
        }

        compressor.finish()
    }

    /// Split into consecutive sets of at most `max_rows` rows each, cutting
    /// ranges where a chunk fills up
    pub fn chunks(&self, max_rows: usize) -> Vec<RangeSet> {
        let max_rows = max_rows.max(1);
        let mut chunks = Vec::new();
        let mut current = Vec::new();
        let mut filled = 0;

        for range in &self.ranges {
            let mut start = range.start;
            while start <= range.end {
                let take = (range.end - start + 1).min(max_rows - filled);
                current.push(RowRange {
                    start,
                    end: start + take - 1,
                });
                filled += take;
                start += take;

                if filled == max_rows {
                    chunks.push(RangeSet::from_canonical(std::mem::take(&mut current)));
                    filled = 0;
                }
            }
        }
        if !current.is_empty() {
            chunks.push(RangeSet::from_canonical(current));
        }
        chunks
    }

    /// Wrap ranges already known to be canonical
    pub(crate) fn from_canonical(ranges: Vec<RowRange>) -> Self {
        debug_assert!(ranges.windows(2).all(|w| w[0].end + 1 < w[1].start));
        Self { ranges }
    }
}

impl<'a> IntoIterator for &'a RangeSet {
    type Item = &'a RowRange;
    type IntoIter = std::slice::Iter<'a, RowRange>;

    fn into_iter(self) -> Self::IntoIter {
        self.ranges.iter()
    }
}

/// Incrementally folds strictly ascending rows (or row ranges) into a
/// canonical [`RangeSet`] with a single linear scan.
#[derive(Debug, Default)]
pub struct RangeCompressor {
    ranges: Vec<RowRange>,
    current: Option<RowRange>,
}

impl RangeCompressor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one row; it must be greater than every row pushed so far
    #[inline]
    pub fn push(&mut self, row: usize) -> Result<(), SelectionError> {
        self.push_range(row, row)
    }

    /// Append an inclusive run; it must start after every row pushed so far
    pub fn push_range(&mut self, start: usize, end: usize) -> Result<(), SelectionError> {
        if start > end {
            return Err(SelectionError::InvalidRange { start, end });
        }
        if let Some(current) = self.current {
            if start <= current.end {
                return Err(SelectionError::Unordered {
                    previous: current.end,
                    next: start,
                });
            }
        }
        self.extend_unchecked(start, end);
        Ok(())
    }

    /// Caller guarantees `start <= end` and `start` beyond the current run
    fn extend_unchecked(&mut self, start: usize, end: usize) {
        match &mut self.current {
            Some(current) if start - current.end == 1 => current.end = end,
            Some(current) => {
                self.ranges.push(*current);
                *current = RowRange { start, end };
            }
            None => self.current = Some(RowRange { start, end }),
        }
    }

    /// Close the open run and return the set
    pub fn finish(mut self) -> RangeSet {
        if let Some(current) = self.current.take() {
            self.ranges.push(current);
        }
        RangeSet::from_canonical(self.ranges)
    }
}

/// Compress a strictly ascending sequence of row indices into maximal ranges.
///
/// ```
/// use snapsub::selection::compress;
///
/// let ranges = compress([0, 1, 2, 3, 5, 6, 7, 9, 11, 12, 13]).unwrap();
/// assert_eq!(ranges.to_pairs(), vec![(0, 3), (5, 7), (9, 9), (11, 13)]);
/// ```
pub fn compress<I>(indices: I) -> Result<RangeSet, SelectionError>
where
    I: IntoIterator<Item = usize>,
{
    let mut compressor = RangeCompressor::new();
    for row in indices {
        compressor.push(row)?;
    }
    Ok(compressor.finish())
}
