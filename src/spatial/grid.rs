use arrow::array::{Array, ArrayRef, AsArray};
use arrow::compute::cast;
use arrow::datatypes::{DataType, Float64Type, Int64Type};
use log::debug;

use super::BoxRegion;
use crate::container::{flatten_rows, Container, DatasetHandle};
use crate::selection::{RangeCompressor, RangeSet};
use crate::species::Species;
use crate::subset::SubsetError;

pub const CENTRES_PATH: &str = "/Cells/Centres";
pub const META_DATA_PATH: &str = "/Cells/Meta-data";
pub const SIZE_ATTRIBUTE: &str = "size";

fn counts_path(species: Species) -> String {
    format!("/Cells/Counts/{}", species.group_name())
}

fn offsets_path(species: Species) -> String {
    format!("/Cells/OffsetsInFile/{}", species.group_name())
}

/// Per-cell row blocks of one species
#[derive(Debug, Clone, PartialEq)]
struct SpeciesCells {
    counts: Vec<usize>,
    offsets: Vec<usize>,
    total: usize,
}

/// A regular partition of the domain into cells, each owning one contiguous
/// block of rows per species.
#[derive(Debug, Clone, PartialEq)]
pub struct CoarseGrid {
    centres: Vec<[f64; 3]>,
    cell_size: [f64; 3],
    species: [Option<SpeciesCells>; 6],
}

impl CoarseGrid {
    /// A grid of cells with the given centres and edge lengths
    pub fn new(centres: Vec<[f64; 3]>, cell_size: [f64; 3]) -> Result<Self, SubsetError> {
        if cell_size.iter().any(|s| !s.is_finite() || *s <= 0.0) {
            return Err(SubsetError::InvalidGrid(format!(
                "cell size {cell_size:?} must be positive and finite"
            )));
        }
        Ok(Self {
            centres,
            cell_size,
            species: Default::default(),
        })
    }

    /// Attach the row blocks of `species`: cell `i` owns rows
    /// `offsets[i]..offsets[i] + counts[i]` out of `total`
    pub fn with_species(
        mut self,
        species: Species,
        counts: Vec<usize>,
        offsets: Vec<usize>,
        total: usize,
    ) -> Result<Self, SubsetError> {
        if species.is_placeholder() {
            return Err(SubsetError::InvalidGrid(format!(
                "placeholder species {} cannot own rows",
                species.group_name()
            )));
        }
        if counts.len() != self.centres.len() || offsets.len() != self.centres.len() {
            return Err(SubsetError::InvalidGrid(format!(
                "{} has {} counts and {} offsets for {} cells",
                species.group_name(),
                counts.len(),
                offsets.len(),
                self.centres.len()
            )));
        }
        if let Some(cell) = (0..counts.len()).find(|&i| offsets[i] + counts[i] > total) {
            return Err(SubsetError::InvalidGrid(format!(
                "cell {cell} of {} ends past row {total}",
                species.group_name()
            )));
        }

        self.species[species.index()] = Some(SpeciesCells {
            counts,
            offsets,
            total,
        });
        Ok(self)
    }

    /// Read the cell metadata stored under `/Cells` in a snapshot
    pub fn load<C: Container + ?Sized>(container: &C) -> Result<Self, SubsetError> {
        let centres = read_f64(&container.dataset(CENTRES_PATH)?.read_all()?)?;
        if centres.len() % 3 != 0 {
            return Err(SubsetError::InvalidGrid(format!(
                "{CENTRES_PATH} does not hold 3-vectors"
            )));
        }
        let centres: Vec<[f64; 3]> = centres.chunks_exact(3).map(|c| [c[0], c[1], c[2]]).collect();

        let meta = container.node(META_DATA_PATH)?;
        let cell_size = parse_cell_size(meta.attributes().get(SIZE_ATTRIBUTE))?;

        let mut grid = Self::new(centres, cell_size)?;
        for species in Species::REAL {
            let (counts, offsets) = (counts_path(species), offsets_path(species));
            if !container.exists(&counts)? || !container.exists(&offsets)? {
                continue;
            }

            let counts = read_rows_usize(&container.dataset(&counts)?.read_all()?, &counts)?;
            let offsets = read_rows_usize(&container.dataset(&offsets)?.read_all()?, &offsets)?;
            let coordinates = species.coordinates_path();
            let total = if container.exists(&coordinates)? {
                container.dataset(&coordinates)?.rows()
            } else {
                counts.iter().sum()
            };
            grid = grid.with_species(species, counts, offsets, total)?;
        }

        debug!(
            "Loaded grid of {} cells (size {:?}), species {:?}",
            grid.cell_count(),
            grid.cell_size,
            grid.species().collect::<Vec<_>>()
        );
        Ok(grid)
    }

    pub fn cell_count(&self) -> usize {
        self.centres.len()
    }

    pub fn cell_size(&self) -> [f64; 3] {
        self.cell_size
    }

    /// Closed bounds `(lower, upper)` of cell `cell`
    pub fn cell_bounds(&self, cell: usize) -> ([f64; 3], [f64; 3]) {
        let centre = self.centres[cell];
        let half = self.cell_size.map(|s| s / 2.0);
        (
            [centre[0] - half[0], centre[1] - half[1], centre[2] - half[2]],
            [centre[0] + half[0], centre[1] + half[1], centre[2] + half[2]],
        )
    }

    /// Cells whose bounds intersect `region`, ascending
    pub fn cells_in(&self, region: &BoxRegion) -> Vec<usize> {
        (0..self.cell_count())
            .filter(|&cell| {
                let (lo, hi) = self.cell_bounds(cell);
                region.overlaps(lo, hi)
            })
            .collect()
    }

    /// Species with row blocks on this grid
    pub fn species(&self) -> impl Iterator<Item = Species> + '_ {
        Species::ALL
            .into_iter()
            .filter(|species| self.species[species.index()].is_some())
    }

    /// Total rows of `species`, if the grid covers it
    pub fn species_total(&self, species: Species) -> Option<usize> {
        self.species[species.index()].as_ref().map(|cells| cells.total)
    }

    /// Union of the row blocks `cells` own for `species`, merged into
    /// maximal ranges. Empty when the grid does not cover the species.
    pub fn cell_ranges(&self, species: Species, cells: &[usize]) -> Result<RangeSet, SubsetError> {
        let Some(blocks) = &self.species[species.index()] else {
            return Ok(RangeSet::new());
        };

        let mut spans: Vec<(usize, usize)> = cells
            .iter()
            .filter(|&&cell| blocks.counts.get(cell).is_some_and(|&count| count > 0))
            .map(|&cell| (blocks.offsets[cell], blocks.offsets[cell] + blocks.counts[cell] - 1))
            .collect();
        spans.sort_unstable();

        let mut compressor = RangeCompressor::new();
        for (start, end) in spans {
            compressor.push_range(start, end).map_err(|e| {
                SubsetError::InvalidGrid(format!(
                    "cells of {} own overlapping rows: {e}",
                    species.group_name()
                ))
            })?;
        }
        Ok(compressor.finish())
    }
}

fn parse_cell_size(value: Option<&serde_json::Value>) -> Result<[f64; 3], SubsetError> {
    let invalid = || {
        SubsetError::InvalidGrid(format!(
            "{META_DATA_PATH} needs a numeric {SIZE_ATTRIBUTE:?} attribute"
        ))
    };
    match value {
        Some(serde_json::Value::Number(n)) => {
            let size = n.as_f64().ok_or_else(invalid)?;
            Ok([size; 3])
        }
        Some(serde_json::Value::Array(items)) if items.len() == 3 => {
            let mut size = [0.0; 3];
            for (slot, item) in size.iter_mut().zip(items) {
                *slot = item.as_f64().ok_or_else(invalid)?;
            }
            Ok(size)
        }
        _ => Err(invalid()),
    }
}

/// Flat element values of a floating-point dataset as `f64`
pub(crate) fn read_f64(values: &ArrayRef) -> Result<Vec<f64>, SubsetError> {
    let flat = flatten_rows(values);
    let flat = cast(&flat, &DataType::Float64)?;
    Ok(flat.as_primitive::<Float64Type>().values().to_vec())
}

fn read_rows_usize(values: &ArrayRef, path: &str) -> Result<Vec<usize>, SubsetError> {
    if !values.data_type().is_integer() {
        return Err(SubsetError::InvalidGrid(format!(
            "{path} must hold integers, found {}",
            values.data_type()
        )));
    }
    let values = cast(values, &DataType::Int64)?;
    values
        .as_primitive::<Int64Type>()
        .values()
        .iter()
        .map(|&v| {
            usize::try_from(v)
                .map_err(|_| SubsetError::InvalidGrid(format!("{path} holds negative value {v}")))
        })
        .collect()
}
