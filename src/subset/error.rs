use crate::container::ContainerError;
use crate::selection::SelectionError;

/// Errors that abort a subsetting pass
#[derive(Debug, thiserror::Error)]
pub enum SubsetError {
    /// Failure reading from or writing to a container
    #[error("Container error: {0}")]
    ContainerError(#[from] ContainerError),

    /// Invalid selection or region
    #[error("Selection error: {0}")]
    SelectionError(#[from] SelectionError),

    /// Error from the Arrow library while assembling buffers
    #[error("Arrow error: {0}")]
    ArrowError(#[from] arrow::error::ArrowError),

    /// The rows a read would produce disagree with the requested output size
    #[error("Size mismatch for {path}: output expects {expected} rows, selection yields {actual}")]
    SizeMismatch {
        path: String,
        expected: usize,
        actual: usize,
    },

    /// The requested per-row shape disagrees with the dataset's own
    #[error("Shape mismatch for {path}: requested rows of shape {expected:?}, dataset has {actual:?}")]
    ShapeMismatch {
        path: String,
        expected: Vec<usize>,
        actual: Vec<usize>,
    },

    /// A species selection indexes a different number of rows than the dataset holds
    #[error("Selection for {path} covers {selection} rows but the dataset has {dataset}")]
    SelectionTotalMismatch {
        path: String,
        selection: usize,
        dataset: usize,
    },

    /// The spatial cell metadata is missing or inconsistent
    #[error("Invalid cell grid: {0}")]
    InvalidGrid(String),

    /// The worker pool could not be built
    #[error("Thread pool error: {0}")]
    ThreadPool(String),
}
