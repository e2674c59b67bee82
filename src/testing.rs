//! Synthetic snapshots shared by the unit tests

use std::sync::Arc;

use arrow::array::{ArrayRef, Float32Array, Float64Array, Int32Array, Int64Array};
use serde_json::json;

use crate::container::{with_trailing_shape, Attributes, ContainerWriter, MemoryContainer};
use crate::species::Species;

/// Deterministic uniform numbers in `[0, 1)`
pub(crate) struct Lcg(u64);

impl Lcg {
    pub(crate) fn new(seed: u64) -> Self {
        Self(seed)
    }

    pub(crate) fn next_u64(&mut self) -> u64 {
        self.0 = self
            .0
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);
        self.0 >> 11
    }

    pub(crate) fn next_f64(&mut self) -> f64 {
        self.next_u64() as f64 / (1u64 << 53) as f64
    }
}

pub(crate) fn vectors(points: &[[f64; 3]]) -> ArrayRef {
    let flat: ArrayRef = Arc::new(Float64Array::from_iter_values(
        points.iter().flat_map(|p| p.iter().copied()),
    ));
    with_trailing_shape(flat, &[3]).expect("3-vectors")
}

pub(crate) fn attrs(pairs: &[(&str, serde_json::Value)]) -> Attributes {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}

/// A snapshot on a `cells_per_axis`³ grid of unit cells.
///
/// Gas, dark matter and stars are present; stars have no particles. Rows of
/// each species are sorted by cell and lie inside their cell.
pub(crate) fn synthetic_snapshot(cells_per_axis: usize, seed: u64) -> MemoryContainer {
    let mut rng = Lcg::new(seed);
    let mut container = MemoryContainer::new();
    let n = cells_per_axis;

    let mut centres = Vec::with_capacity(n * n * n);
    for ix in 0..n {
        for iy in 0..n {
            for iz in 0..n {
                centres.push([ix as f64 + 0.5, iy as f64 + 0.5, iz as f64 + 0.5]);
            }
        }
    }

    container
        .create_group(
            "/",
            &attrs(&[("Code", json!("synthetic")), ("Seed", json!(seed))]),
        )
        .unwrap();
    container
        .create_group(
            "/Header",
            &attrs(&[("BoxSize", json!([n, n, n])), ("Dimension", json!(3))]),
        )
        .unwrap();
    container
        .create_group("/Units", &attrs(&[("Unit length in cgs (U_L)", json!(3.08e24))]))
        .unwrap();
    container
        .create_group("/Cells/Meta-data", &attrs(&[("size", json!([1.0, 1.0, 1.0]))]))
        .unwrap();
    container
        .write_dataset("/Cells/Centres", vectors(&centres), &Attributes::new())
        .unwrap();

    for (species, max_per_cell) in [
        (Species::Gas, 4u64),
        (Species::DarkMatter, 3),
        (Species::Stars, 0),
    ] {
        let mut counts = Vec::with_capacity(centres.len());
        let mut offsets = Vec::with_capacity(centres.len());
        let mut coordinates = Vec::new();

        for centre in &centres {
            let count = if max_per_cell == 0 {
                0
            } else {
                (rng.next_u64() % max_per_cell) as usize
            };
            offsets.push(coordinates.len() as i64);
            counts.push(count as i32);
            for _ in 0..count {
                coordinates.push([
                    centre[0] - 0.5 + rng.next_f64(),
                    centre[1] - 0.5 + rng.next_f64(),
                    centre[2] - 0.5 + rng.next_f64(),
                ]);
            }
        }

        let group = species.group_name();
        let rows = coordinates.len();
        container
            .create_group(
                &format!("/{group}"),
                &attrs(&[("Species", json!(species.name()))]),
            )
            .unwrap();
        container
            .write_dataset(
                &format!("/{group}/Coordinates"),
                vectors(&coordinates),
                &attrs(&[("Units", json!("Mpc"))]),
            )
            .unwrap();
        container
            .write_dataset(
                &format!("/{group}/Masses"),
                Arc::new(Float32Array::from_iter_values((0..rows).map(|r| r as f32 * 0.5))),
                &Attributes::new(),
            )
            .unwrap();
        container
            .write_dataset(
                &format!("/{group}/ParticleIDs"),
                Arc::new(Int64Array::from_iter_values(
                    (0..rows as i64).map(|r| r + 1_000 * species.index() as i64),
                )),
                &Attributes::new(),
            )
            .unwrap();
        container
            .write_dataset(
                &format!("/Cells/Counts/{group}"),
                Arc::new(Int32Array::from(counts)),
                &Attributes::new(),
            )
            .unwrap();
        container
            .write_dataset(
                &format!("/Cells/OffsetsInFile/{group}"),
                Arc::new(Int64Array::from(offsets)),
                &Attributes::new(),
            )
            .unwrap();
    }

    container
}
