use crate::selection::SelectionError;

/// Errors raised by container backends
#[derive(Debug, thiserror::Error)]
pub enum ContainerError {
    /// I/O error during file operations
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Error from the Arrow library during array operations
    #[error("Arrow error: {0}")]
    ArrowError(#[from] arrow::error::ArrowError),

    /// Error from the Parquet library while reading or writing a dataset
    #[error("Parquet error: {0}")]
    ParquetError(#[from] parquet::errors::ParquetError),

    /// Error serializing or deserializing attributes and manifests
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Invalid row selection handed to a backend
    #[error("Selection error: {0}")]
    SelectionError(#[from] SelectionError),

    /// No node exists at the path
    #[error("Not found: {0}")]
    NotFound(String),

    /// The node at the path is a group where a dataset was expected
    #[error("Not a dataset: {0}")]
    NotADataset(String),

    /// The node at the path is a dataset where a group was expected
    #[error("Not a group: {0}")]
    NotAGroup(String),

    /// A dataset (or a conflicting node) already exists at the path
    #[error("Already exists: {0}")]
    AlreadyExists(String),

    /// Malformed container path
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// The on-disk layout is not a valid container
    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    /// An Arrow type that cannot be stored as a dataset
    #[error("Unsupported data type: {0}")]
    UnsupportedType(String),

    /// A read past the end of a dataset
    #[error("Rows out of bounds for {path}: requested up to row {row}, dataset has {rows} rows")]
    OutOfBounds { path: String, row: usize, rows: usize },
}
