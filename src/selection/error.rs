/// Errors raised when a selection or one of its inputs violates a precondition
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SelectionError {
    /// A range whose start lies after its end
    #[error("Invalid range: start {start} is greater than end {end}")]
    InvalidRange { start: usize, end: usize },

    /// Rows (or ranges) were not strictly ascending: a duplicate or an overlap
    #[error("Rows must be strictly ascending: {next} follows {previous}")]
    Unordered { previous: usize, next: usize },

    /// A row index at or beyond the total row count
    #[error("Row {row} is out of bounds for {total} rows")]
    OutOfBounds { row: usize, total: usize },

    /// Two selections over different row counts were combined
    #[error("Selections cover different row counts ({left} vs {right})")]
    TotalMismatch { left: usize, right: usize },

    /// A boolean mask whose length does not match the rows it filters
    #[error("Mask length {actual} does not match {expected} candidate rows")]
    MaskLength { expected: usize, actual: usize },

    /// Placeholder species never carry a selection
    #[error("Species {0} is a placeholder and cannot carry a selection")]
    PlaceholderSpecies(&'static str),

    /// A spatial region with non-finite or inverted bounds
    #[error("Invalid region: {0}")]
    InvalidRegion(String),
}
