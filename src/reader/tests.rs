use std::sync::Arc;

use arrow::array::{Array, ArrayRef, AsArray, Float64Array, Int64Array};
use arrow::datatypes::{DataType, Float32Type, Float64Type, Int64Type};

use super::*;
use crate::container::{
    flatten_rows, with_trailing_shape, Attributes, ContainerWriter, MemoryContainer,
};
use crate::selection::Selection;
use crate::species::Species;
use crate::subset::SubsetConfig;

fn arange_container(n: i64) -> MemoryContainer {
    let mut container = MemoryContainer::new();
    let values: ArrayRef = Arc::new(Int64Array::from_iter_values(0..n));
    container
        .write_dataset("/PartType0/ParticleIDs", values, &Attributes::new())
        .unwrap();

    let flat: ArrayRef = Arc::new(Float64Array::from_iter_values(
        (0..n * 3).map(|v| v as f64),
    ));
    container
        .write_dataset(
            "/PartType0/Coordinates",
            with_trailing_shape(flat, &[3]).unwrap(),
            &Attributes::new(),
        )
        .unwrap();
    container
}

fn ints(values: &ArrayRef) -> Vec<i64> {
    values.as_primitive::<Int64Type>().values().to_vec()
}

#[test]
fn test_read_ranges_in_order() {
    let container = arange_container(1000);
    let dataset = container.dataset("/PartType0/ParticleIDs").unwrap();

    let ranges = RangeSet::from_pairs([(77, 79), (88, 98), (204, 204)]).unwrap();
    let shape = OutputShape::rows_of(&dataset, 15);
    let buffer = RangeReader::new()
        .read(&dataset, RowSource::Ranges(&ranges), &shape, None)
        .unwrap();

    let mut expected = vec![77, 78, 79];
    expected.extend(88..=98);
    expected.push(204);
    assert_eq!(ints(&buffer), expected);

    // One contiguous read per range
    assert_eq!(dataset.read_calls(), 3);
}

#[test]
fn test_read_vector_rows() {
    let container = arange_container(10);
    let dataset = container.dataset("/PartType0/Coordinates").unwrap();

    let ranges = RangeSet::from_pairs([(1, 2), (9, 9)]).unwrap();
    let shape = OutputShape::rows_of(&dataset, 3);
    assert_eq!(shape.dims(), vec![3, 3]);

    let buffer = RangeReader::new()
        .read(&dataset, RowSource::Ranges(&ranges), &shape, None)
        .unwrap();
    assert_eq!(buffer.len(), 3);
    assert_eq!(
        flatten_rows(&buffer)
            .as_primitive::<Float64Type>()
            .values()
            .to_vec(),
        vec![3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 27.0, 28.0, 29.0]
    );
}

#[test]
fn test_fancy_indexing_preserves_order_and_duplicates() {
    let container = arange_container(100);
    let dataset = container.dataset("/PartType0/ParticleIDs").unwrap();

    let indices = [42, 3, 3, 99, 0, 42];
    let shape = OutputShape::rows_of(&dataset, indices.len());
    let buffer = RangeReader::new()
        .read(&dataset, RowSource::Indices(&indices), &shape, None)
        .unwrap();

    assert_eq!(ints(&buffer), vec![42, 3, 3, 99, 0, 42]);
}

#[test]
fn test_size_mismatch_fails_before_reading() {
    let container = arange_container(100);
    let dataset = container.dataset("/PartType0/ParticleIDs").unwrap();

    let ranges = RangeSet::from_pairs([(0, 9)]).unwrap();
    let shape = OutputShape::rows_of(&dataset, 11);
    let result = RangeReader::new().read(&dataset, RowSource::Ranges(&ranges), &shape, None);

    assert!(matches!(
        result,
        Err(SubsetError::SizeMismatch {
            expected: 11,
            actual: 10,
            ..
        })
    ));
    assert_eq!(dataset.read_calls(), 0);

    let result = RangeReader::new().read(&dataset, RowSource::Indices(&[1, 2]), &shape, None);
    assert!(matches!(result, Err(SubsetError::SizeMismatch { actual: 2, .. })));
}

#[test]
fn test_shape_mismatch() {
    let container = arange_container(10);
    let dataset = container.dataset("/PartType0/Coordinates").unwrap();

    let ranges = RangeSet::full(10);
    let shape = OutputShape::new(10, vec![]);
    let result = RangeReader::new().read(&dataset, RowSource::Ranges(&ranges), &shape, None);
    assert!(matches!(result, Err(SubsetError::ShapeMismatch { .. })));
}

#[test]
fn test_empty_selection_keeps_type() {
    let container = arange_container(10);
    let dataset = container.dataset("/PartType0/Coordinates").unwrap();

    let ranges = RangeSet::new();
    let shape = OutputShape::rows_of(&dataset, 0);
    let buffer = RangeReader::new()
        .read(&dataset, RowSource::Ranges(&ranges), &shape, None)
        .unwrap();

    assert_eq!(buffer.len(), 0);
    assert_eq!(buffer.data_type(), &dataset.descriptor().array_type());
    assert_eq!(dataset.read_calls(), 0);
}

#[test]
fn test_output_dtype_cast() {
    let container = arange_container(10);
    let dataset = container.dataset("/PartType0/Coordinates").unwrap();

    let ranges = RangeSet::from_pairs([(0, 1)]).unwrap();
    let shape = OutputShape::rows_of(&dataset, 2);
    let buffer = RangeReader::new()
        .read(
            &dataset,
            RowSource::Ranges(&ranges),
            &shape,
            Some(&DataType::Float32),
        )
        .unwrap();

    let flat = flatten_rows(&buffer);
    assert_eq!(flat.data_type(), &DataType::Float32);
    assert_eq!(
        flat.as_primitive::<Float32Type>().values().to_vec(),
        vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0]
    );
}

#[test]
fn test_parallel_reader_matches_sequential() {
    let container = arange_container(5000);
    let dataset = container.dataset("/PartType0/ParticleIDs").unwrap();

    let indices: Vec<usize> = (0..5000).filter(|i| i % 7 < 3).collect();
    let ranges = crate::selection::compress(indices.iter().copied()).unwrap();
    let shape = OutputShape::rows_of(&dataset, indices.len());

    let pool = WorkerPool::from_config(&SubsetConfig::default().with_threads(4)).unwrap();
    let parallel = RangeReader::with_pool(Arc::new(pool))
        .read(&dataset, RowSource::Ranges(&ranges), &shape, None)
        .unwrap();

    let expected: Vec<i64> = indices.iter().map(|&i| i as i64).collect();
    assert_eq!(ints(&parallel), expected);
}

#[test]
fn test_read_masked_routes_by_path() {
    let container = arange_container(20);
    let mask = ParticleMask::new()
        .with(
            Species::Gas,
            Selection::from_indices(20, &[1, 2, 3, 10]).unwrap(),
        )
        .unwrap();
    let reader = RangeReader::new();

    let ids = read_masked(&container, "/PartType0/ParticleIDs", &mask, &reader).unwrap();
    assert_eq!(ints(&ids), vec![1, 2, 3, 10]);

    let coords = read_masked(&container, "/PartType0/Coordinates", &mask, &reader).unwrap();
    assert_eq!(coords.len(), 4);

    // No selection for the species: zero rows of the right type
    let none = read_masked(&container, "/PartType0/ParticleIDs", &ParticleMask::new(), &reader)
        .unwrap();
    assert_eq!(none.len(), 0);
    assert_eq!(none.data_type(), &DataType::Int64);
}

#[test]
fn test_read_masked_total_mismatch() {
    let container = arange_container(20);
    let mask = ParticleMask::new()
        .with(Species::Gas, Selection::all(21))
        .unwrap();

    let result = read_masked(
        &container,
        "/PartType0/ParticleIDs",
        &mask,
        &RangeReader::new(),
    );
    assert!(matches!(
        result,
        Err(SubsetError::SelectionTotalMismatch {
            selection: 21,
            dataset: 20,
            ..
        })
    ));
}
