use super::Species;
use crate::selection::{Selection, SelectionError};

/// Per-species selection table for one subsetting pass.
///
/// Built once and then only read; sizes are precomputed so lookups during the
/// pass are a single array index.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParticleMask {
    selections: [Option<Selection>; 6],
    sizes: [usize; 6],
}

impl ParticleMask {
    /// A mask where no species participates
    pub fn new() -> Self {
        Self::default()
    }

    /// Select every row of each listed species
    pub fn all<I>(totals: I) -> Result<Self, SelectionError>
    where
        I: IntoIterator<Item = (Species, usize)>,
    {
        totals
            .into_iter()
            .try_fold(Self::new(), |mask, (species, total)| {
                mask.with(species, Selection::all(total))
            })
    }

    /// Attach a selection for `species`, replacing any previous one
    pub fn with(mut self, species: Species, selection: Selection) -> Result<Self, SelectionError> {
        if species.is_placeholder() {
            return Err(SelectionError::PlaceholderSpecies(species.group_name()));
        }
        let idx = species.index();
        self.sizes[idx] = selection.len();
        self.selections[idx] = Some(selection);
        Ok(self)
    }

    /// The selection for `species`, if it participates
    pub fn selection(&self, species: Species) -> Option<&Selection> {
        self.selections[species.index()].as_ref()
    }

    /// Number of selected rows; zero for species that do not participate
    pub fn size(&self, species: Species) -> usize {
        self.sizes[species.index()]
    }

    /// Participating species and their selections
    pub fn iter(&self) -> impl Iterator<Item = (Species, &Selection)> + '_ {
        Species::ALL
            .iter()
            .filter_map(|&species| self.selection(species).map(|sel| (species, sel)))
    }

    /// Total selected rows over all species
    pub fn total_selected(&self) -> usize {
        self.sizes.iter().sum()
    }
}
