use std::ops::Range;
use std::sync::Arc;

use arrow::array::{new_empty_array, Array, ArrayRef, AsArray, FixedSizeListArray};
use arrow::compute::concat;
use arrow::datatypes::{DataType, Field};
use arrow::error::ArrowError;

use super::ContainerError;

/// Name of the inner field of every fixed-size list row
const ITEM_FIELD: &str = "item";

/// Shape and element type of a dataset.
///
/// Rows are the leading dimension; every row has the same `trailing_shape`
/// (empty for scalar rows, `[3]` for 3-vectors, and so on).
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetDescriptor {
    /// Absolute path of the dataset within its container
    pub path: String,
    /// Element type of a single value
    pub dtype: DataType,
    /// Per-row shape
    pub trailing_shape: Vec<usize>,
    /// Number of rows
    pub rows: usize,
}

impl DatasetDescriptor {
    /// Describe a dataset stored with Arrow type `data_type`
    pub fn from_array_type(
        path: impl Into<String>,
        data_type: &DataType,
        rows: usize,
    ) -> Result<Self, ContainerError> {
        let (dtype, trailing_shape) = split_array_type(data_type)?;
        Ok(Self {
            path: path.into(),
            dtype,
            trailing_shape,
            rows,
        })
    }

    /// Describe an in-memory buffer
    pub fn of_array(path: impl Into<String>, values: &dyn Array) -> Result<Self, ContainerError> {
        Self::from_array_type(path, values.data_type(), values.len())
    }

    /// Values per row
    pub fn row_width(&self) -> usize {
        self.trailing_shape.iter().product()
    }

    /// Full shape, rows first
    pub fn shape(&self) -> Vec<usize> {
        let mut shape = Vec::with_capacity(self.trailing_shape.len() + 1);
        shape.push(self.rows);
        shape.extend_from_slice(&self.trailing_shape);
        shape
    }

    pub fn is_scalar(&self) -> bool {
        self.trailing_shape.is_empty()
    }

    /// Arrow type of the whole dataset column
    pub fn array_type(&self) -> DataType {
        array_type(&self.dtype, &self.trailing_shape)
    }

    /// Size of one row in bytes, if the element type has a fixed width
    pub fn row_bytes(&self) -> Option<usize> {
        self.dtype.primitive_width().map(|w| w * self.row_width())
    }

    /// Bytes held by `rows` rows of this dataset's values
    pub fn bytes_for(&self, rows: usize) -> usize {
        rows * self.row_width() * self.dtype.primitive_width().unwrap_or(1)
    }

    pub(crate) fn check_rows(&self, rows: &Range<usize>) -> Result<(), ContainerError> {
        if rows.start > rows.end || rows.end > self.rows {
            return Err(ContainerError::OutOfBounds {
                path: self.path.clone(),
                row: rows.end.saturating_sub(1).max(rows.start),
                rows: self.rows,
            });
        }
        Ok(())
    }

    pub(crate) fn check_indices(&self, indices: &[usize]) -> Result<(), ContainerError> {
        match indices.iter().copied().find(|&row| row >= self.rows) {
            Some(row) => Err(ContainerError::OutOfBounds {
                path: self.path.clone(),
                row,
                rows: self.rows,
            }),
            None => Ok(()),
        }
    }
}

/// Peel fixed-size list layers off `data_type`, returning the element type and
/// the per-row shape
pub fn split_array_type(data_type: &DataType) -> Result<(DataType, Vec<usize>), ContainerError> {
    let mut trailing = Vec::new();
    let mut current = data_type;
    loop {
        match current {
            DataType::FixedSizeList(field, size) => {
                trailing.push(*size as usize);
                current = field.data_type();
            }
            dt if dt.is_primitive() || matches!(dt, DataType::Boolean) => {
                return Ok((dt.clone(), trailing));
            }
            other => return Err(ContainerError::UnsupportedType(other.to_string())),
        }
    }
}

/// Arrow type for rows of `trailing` shape holding `dtype` elements
pub fn array_type(dtype: &DataType, trailing: &[usize]) -> DataType {
    trailing.iter().rev().fold(dtype.clone(), |inner, &size| {
        DataType::FixedSizeList(Arc::new(Field::new(ITEM_FIELD, inner, false)), size as i32)
    })
}

/// Group a flat array of elements into rows of `trailing` shape
pub fn with_trailing_shape(flat: ArrayRef, trailing: &[usize]) -> Result<ArrayRef, ContainerError> {
    let width: usize = trailing.iter().product();
    if width == 0 || flat.len() % width != 0 {
        return Err(ContainerError::InvalidFormat(format!(
            "{} values cannot be split into rows of shape {:?}",
            flat.len(),
            trailing
        )));
    }

    trailing.iter().rev().try_fold(flat, |values, &size| {
        let field = Arc::new(Field::new(ITEM_FIELD, values.data_type().clone(), false));
        let rows = FixedSizeListArray::try_new(field, size as i32, values, None)?;
        Ok(Arc::new(rows) as ArrayRef)
    })
}

/// The flat element array underneath any number of fixed-size list layers
pub fn flatten_rows(values: &ArrayRef) -> ArrayRef {
    let mut current = values.clone();
    while let DataType::FixedSizeList(_, _) = current.data_type() {
        let next = current.as_fixed_size_list().values().clone();
        current = next;
    }
    current
}

/// Concatenate row blocks in order; an empty list yields an empty array of `data_type`
pub fn concat_rows(parts: &[ArrayRef], data_type: &DataType) -> Result<ArrayRef, ArrowError> {
    match parts {
        [] => Ok(new_empty_array(data_type)),
        [single] => Ok(single.clone()),
        _ => {
            let refs: Vec<&dyn Array> = parts.iter().map(|part| part.as_ref()).collect();
            concat(&refs)
        }
    }
}
