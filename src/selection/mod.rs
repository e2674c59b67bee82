//! # Selection Module
//!
//! Row selections for a single particle species and their compression into
//! contiguous row ranges.
//!
//! A selection can arrive as a boolean mask, a sorted index list or a list of
//! inclusive `(start, end)` pairs. All three are folded into a [`RangeSet`]:
//! an ascending list of maximal, non-adjacent [`RowRange`]s. The range set is
//! what the I/O layer consumes, one contiguous read per range.
//!
//! ## Example
//!
//! ```rust
//! use snapsub::selection::Selection;
//!
//! let selection = Selection::from_mask(&[false, true, true, false, true]);
//! assert_eq!(selection.len(), 3);
//! assert_eq!(selection.ranges().to_pairs(), vec![(1, 2), (4, 4)]);
//! # Ok::<(), snapsub::selection::SelectionError>(())
//! ```

mod error;
mod ranges;
mod row_selection;


pub use error::SelectionError;
pub use ranges::{compress, RangeCompressor, RangeSet, RowRange};
pub use row_selection::Selection;
