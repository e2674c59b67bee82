use log::debug;

use super::fine::fine_mask;
use super::{BoxRegion, CoarseGrid, FilterMode};
use crate::container::{Container, DatasetHandle};
use crate::reader::RangeReader;
use crate::selection::{Selection, SelectionError};
use crate::species::{ParticleMask, Species};
use crate::subset::{SubsetError, DEFAULT_PARTITION_ROWS};

/// Builds per-species selections from spatial constraints.
///
/// Every species the grid covers starts with all of its rows selected. Each
/// constraint narrows the current selections by intersection.
#[derive(Debug, Clone)]
pub struct SpatialSelector<'g> {
    grid: &'g CoarseGrid,
    mode: FilterMode,
    partition_rows: usize,
    selections: [Option<Selection>; 6],
}

impl<'g> SpatialSelector<'g> {
    pub fn new(grid: &'g CoarseGrid, mode: FilterMode) -> Self {
        let mut selections: [Option<Selection>; 6] = Default::default();
        for species in grid.species() {
            if let Some(total) = grid.species_total(species) {
                selections[species.index()] = Some(Selection::all(total));
            }
        }
        Self {
            grid,
            mode,
            partition_rows: DEFAULT_PARTITION_ROWS,
            selections,
        }
    }

    /// Candidate rows per fine-filter partition
    pub fn with_partition_rows(mut self, rows: usize) -> Self {
        self.partition_rows = rows.max(1);
        self
    }

    pub fn mode(&self) -> FilterMode {
        self.mode
    }

    pub fn grid(&self) -> &CoarseGrid {
        self.grid
    }

    /// Current selection of `species`; `None` if the grid does not cover it
    pub fn selection(&self, species: Species) -> Option<&Selection> {
        self.selections[species.index()].as_ref()
    }

    /// Apply `region` with this selector's mode: coarse always, then fine
    /// when exactness was requested
    pub fn constrain<C>(
        &mut self,
        container: &C,
        region: &BoxRegion,
        reader: &RangeReader,
    ) -> Result<(), SubsetError>
    where
        C: Container + ?Sized,
    {
        self.constrain_coarse(region)?;
        if self.mode == FilterMode::Fine {
            self.constrain_fine(container, region, reader)?;
        }
        Ok(())
    }

    /// Keep only rows owned by cells intersecting `region`.
    ///
    /// The result is a superset of the particles inside the region.
    pub fn constrain_coarse(&mut self, region: &BoxRegion) -> Result<(), SubsetError> {
        let cells = self.grid.cells_in(region);
        debug!(
            "Region {:?}..{:?} intersects {} of {} cells",
            region.lower,
            region.upper,
            cells.len(),
            self.grid.cell_count()
        );

        for species in Species::REAL {
            let Some(current) = &self.selections[species.index()] else {
                continue;
            };
            let ranges = self.grid.cell_ranges(species, &cells)?;
            let narrowed = current.restrict(&ranges);
            self.selections[species.index()] = Some(narrowed);
        }
        Ok(())
    }

    /// Keep only rows whose coordinates lie inside `region`, reading the
    /// coordinates of currently selected rows only
    pub fn constrain_fine<C>(
        &mut self,
        container: &C,
        region: &BoxRegion,
        reader: &RangeReader,
    ) -> Result<(), SubsetError>
    where
        C: Container + ?Sized,
    {
        for species in Species::REAL {
            let Some(current) = &self.selections[species.index()] else {
                continue;
            };
            if current.is_empty() {
                continue;
            }

            let coordinates = container.dataset(&species.coordinates_path())?;
            if coordinates.rows() != current.total_rows() {
                return Err(SubsetError::SelectionTotalMismatch {
                    path: species.coordinates_path(),
                    selection: current.total_rows(),
                    dataset: coordinates.rows(),
                });
            }

            let candidates = current.ranges();
            let keep = fine_mask(&coordinates, candidates, region, reader, self.partition_rows)?;
            let refined = current.refine(candidates, &keep)?;
            debug!(
                "Fine filter kept {} of {} {} candidates",
                refined.len(),
                current.len(),
                species
            );
            self.selections[species.index()] = Some(refined);
        }
        Ok(())
    }

    /// Freeze the selections into the lookup table used by a subsetting pass
    pub fn into_mask(self) -> Result<ParticleMask, SelectionError> {
        let mut mask = ParticleMask::new();
        for (species, selection) in Species::ALL.into_iter().zip(self.selections) {
            if let Some(selection) = selection {
                mask = mask.with(species, selection)?;
            }
        }
        Ok(mask)
    }
}
