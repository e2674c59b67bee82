use std::sync::Arc;

use arrow::array::{Array, ArrayRef, AsArray, Float64Array, Int64Array};
use arrow::datatypes::{DataType, Float64Type, Int64Type};
use serde_json::json;
use tempfile::tempdir;

use super::*;

fn attrs(pairs: &[(&str, serde_json::Value)]) -> Attributes {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}

fn arange(n: i64) -> ArrayRef {
    Arc::new(Int64Array::from_iter_values(0..n))
}

fn vectors(rows: usize) -> ArrayRef {
    let flat: ArrayRef = Arc::new(Float64Array::from_iter_values(
        (0..rows * 3).map(|v| v as f64),
    ));
    with_trailing_shape(flat, &[3]).unwrap()
}

fn ints(values: &ArrayRef) -> Vec<i64> {
    values.as_primitive::<Int64Type>().values().to_vec()
}

fn sample_tree<W: ContainerWriter>(writer: &mut W) {
    writer
        .create_group("/", &attrs(&[("Code", json!("test"))]))
        .unwrap();
    writer
        .create_group("/Header", &attrs(&[("BoxSize", json!(100.0))]))
        .unwrap();
    writer
        .write_dataset(
            "/PartType0/Masses",
            arange(10),
            &attrs(&[("units", json!("Msun"))]),
        )
        .unwrap();
    writer
        .write_dataset("/PartType0/Coordinates", vectors(10), &Attributes::new())
        .unwrap();
}

#[test]
fn test_split_and_join_paths() {
    assert_eq!(split_path("/").unwrap(), Vec::<&str>::new());
    assert_eq!(split_path("/a/b/").unwrap(), vec!["a", "b"]);
    assert!(matches!(
        split_path("relative/path"),
        Err(ContainerError::InvalidPath(_))
    ));
    assert!(matches!(
        split_path("/a/../b"),
        Err(ContainerError::InvalidPath(_))
    ));

    assert_eq!(join_path("/", "Cells"), "/Cells");
    assert_eq!(join_path("/Cells", "Counts"), "/Cells/Counts");
}

#[test]
fn test_descriptor_shapes() {
    let desc = DatasetDescriptor::of_array("/PartType0/Coordinates", vectors(4).as_ref()).unwrap();
    assert_eq!(desc.dtype, DataType::Float64);
    assert_eq!(desc.trailing_shape, vec![3]);
    assert_eq!(desc.shape(), vec![4, 3]);
    assert_eq!(desc.row_bytes(), Some(24));
    assert_eq!(desc.bytes_for(2), 48);
    assert!(!desc.is_scalar());
    assert_eq!(desc.array_type(), vectors(1).data_type().clone());
}

#[test]
fn test_nested_trailing_shape() {
    let flat: ArrayRef = Arc::new(Float64Array::from_iter_values((0..24).map(|v| v as f64)));
    let tensors = with_trailing_shape(flat.clone(), &[3, 4]).unwrap();
    assert_eq!(tensors.len(), 2);

    let (dtype, trailing) = split_array_type(tensors.data_type()).unwrap();
    assert_eq!(dtype, DataType::Float64);
    assert_eq!(trailing, vec![3, 4]);
    assert_eq!(flatten_rows(&tensors).len(), 24);

    assert!(matches!(
        with_trailing_shape(flat, &[5]),
        Err(ContainerError::InvalidFormat(_))
    ));
}

#[test]
fn test_unsupported_type() {
    assert!(matches!(
        split_array_type(&DataType::Utf8),
        Err(ContainerError::UnsupportedType(_))
    ));
}

#[test]
fn test_memory_tree() {
    let mut container = MemoryContainer::new();
    sample_tree(&mut container);

    let root = container.root().unwrap();
    assert_eq!(root.children(), ["Header", "PartType0"]);
    assert_eq!(root.attributes()["Code"], json!("test"));

    let group = container.node("/PartType0").unwrap();
    assert_eq!(group.children(), ["Coordinates", "Masses"]);

    let masses = container.dataset("/PartType0/Masses").unwrap();
    assert_eq!(masses.rows(), 10);
    assert_eq!(masses.attributes()["units"], json!("Msun"));
    assert_eq!(ints(&masses.read_rows(2..5).unwrap()), vec![2, 3, 4]);
    assert_eq!(ints(&masses.take_rows(&[7, 1, 1]).unwrap()), vec![7, 1, 1]);
    assert_eq!(masses.read_calls(), 2);

    assert!(container.exists("/Header").unwrap());
    assert!(!container.exists("/PartType1").unwrap());
}

#[test]
fn test_memory_errors() {
    let mut container = MemoryContainer::new();
    sample_tree(&mut container);

    assert!(matches!(
        container.dataset("/PartType0"),
        Err(ContainerError::NotADataset(_))
    ));
    assert!(matches!(
        container.node("/PartType0/Masses/Nested"),
        Err(ContainerError::NotAGroup(_))
    ));
    assert!(matches!(
        container.write_dataset("/PartType0/Masses", arange(3), &Attributes::new()),
        Err(ContainerError::AlreadyExists(_))
    ));
    assert!(matches!(
        container.write_dataset("/", arange(3), &Attributes::new()),
        Err(ContainerError::InvalidPath(_))
    ));

    let masses = container.dataset("/PartType0/Masses").unwrap();
    assert!(matches!(
        masses.read_rows(5..11),
        Err(ContainerError::OutOfBounds { rows: 10, .. })
    ));
    assert!(matches!(
        masses.take_rows(&[10]),
        Err(ContainerError::OutOfBounds { row: 10, .. })
    ));
}

#[test]
fn test_leaf_paths_and_copy_subtree() {
    let mut source = MemoryContainer::new();
    sample_tree(&mut source);

    assert_eq!(
        leaf_paths(&source).unwrap(),
        vec!["/PartType0/Coordinates", "/PartType0/Masses"]
    );

    let mut dest = MemoryContainer::new();
    let bytes = copy_subtree(&source, "/PartType0", &mut dest).unwrap();
    assert_eq!(bytes, 10 * 8 + 10 * 3 * 8);
    assert_eq!(
        dest.node("/PartType0/Masses").unwrap(),
        source.node("/PartType0/Masses").unwrap()
    );
    assert!(!dest.exists("/Header").unwrap());
}

#[test]
fn test_bundle_round_trip() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("snap.bundle");

    let config = BundleConfig {
        row_group_size: 4,
        ..BundleConfig::default()
    };
    let mut writer = BundleWriter::create(&path, config).unwrap();
    sample_tree(&mut writer);
    assert_eq!(writer.datasets_written(), 2);

    let bundle = BundleContainer::open(&path).unwrap();
    assert_eq!(bundle.manifest(), &BundleManifest::default());

    let root = bundle.root().unwrap();
    assert_eq!(root.children(), ["Header", "PartType0"]);
    assert_eq!(root.attributes()["Code"], json!("test"));
    assert_eq!(
        bundle.node("/Header").unwrap().attributes()["BoxSize"],
        json!(100.0)
    );

    let masses = bundle.dataset("/PartType0/Masses").unwrap();
    assert_eq!(masses.rows(), 10);
    assert_eq!(masses.row_group_count(), 3);
    assert_eq!(masses.attributes()["units"], json!("Msun"));
    assert_eq!(ints(&masses.read_all().unwrap()), (0..10).collect::<Vec<_>>());
    assert_eq!(ints(&masses.read_rows(3..9).unwrap()), vec![3, 4, 5, 6, 7, 8]);
    assert_eq!(ints(&masses.take_rows(&[9, 0, 4, 4]).unwrap()), vec![9, 0, 4, 4]);

    let coords = bundle.dataset("/PartType0/Coordinates").unwrap();
    assert_eq!(coords.descriptor().shape(), vec![10, 3]);
    let rows = coords.read_selection(&[1..2, 8..10]).unwrap();
    assert_eq!(rows.len(), 3);
    let flat = flatten_rows(&rows);
    assert_eq!(
        flat.as_primitive::<Float64Type>().values().to_vec(),
        vec![3.0, 4.0, 5.0, 24.0, 25.0, 26.0, 27.0, 28.0, 29.0]
    );
}

#[test]
fn test_bundle_zero_row_dataset() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("empty.bundle");

    let mut writer = BundleWriter::create(&path, BundleConfig::default()).unwrap();
    writer
        .write_dataset("/PartType1/Coordinates", vectors(0), &Attributes::new())
        .unwrap();

    let bundle = BundleContainer::open(&path).unwrap();
    let coords = bundle.dataset("/PartType1/Coordinates").unwrap();
    assert_eq!(coords.descriptor().shape(), vec![0, 3]);
    assert_eq!(coords.read_all().unwrap().len(), 0);
}

#[test]
fn test_bundle_rejects_bad_input() {
    let dir = tempdir().unwrap();

    assert!(matches!(
        BundleContainer::open(dir.path()),
        Err(ContainerError::InvalidFormat(_))
    ));

    let path = dir.path().join("snap.bundle");
    let mut writer = BundleWriter::create(&path, BundleConfig::fast_write()).unwrap();
    sample_tree(&mut writer);
    assert!(matches!(
        writer.write_dataset("/PartType0/Masses", arange(2), &Attributes::new()),
        Err(ContainerError::AlreadyExists(_))
    ));
    assert!(matches!(
        BundleWriter::create(&path, BundleConfig::default()),
        Err(ContainerError::AlreadyExists(_))
    ));

    let bundle = BundleContainer::open(&path).unwrap();
    assert!(matches!(
        bundle.node("/PartType9"),
        Err(ContainerError::NotFound(_))
    ));
    let masses = bundle.dataset("/PartType0/Masses").unwrap();
    assert!(matches!(
        masses.read_selection(&[4..6, 2..3]),
        Err(ContainerError::SelectionError(_))
    ));
}

#[test]
fn test_copy_subtree_between_backends() {
    let mut source = MemoryContainer::new();
    sample_tree(&mut source);

    let dir = tempdir().unwrap();
    let path = dir.path().join("copy.bundle");
    let mut writer = BundleWriter::create(&path, BundleConfig::default()).unwrap();
    copy_subtree(&source, ROOT, &mut writer).unwrap();

    let bundle = BundleContainer::open(&path).unwrap();
    assert_eq!(
        leaf_paths(&bundle).unwrap(),
        leaf_paths(&source).unwrap()
    );
    assert_eq!(
        bundle.node("/PartType0/Coordinates").unwrap(),
        source.node("/PartType0/Coordinates").unwrap()
    );
}
