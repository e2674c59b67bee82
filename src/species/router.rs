use super::{ParticleMask, Species};
use crate::selection::Selection;

/// Where a dataset path is routed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// Structural or ancillary data, copied through untouched
    Unfiltered,
    /// Particle data indexed by the species' rows
    Species(Species),
}

/// Ordered (tag, route) table. The first tag found in a path wins, so the
/// order here decides paths that contain more than one tag.
pub const TAG_TABLE: [(&str, Route); 7] = [
    ("Cells", Route::Unfiltered),
    ("PartType0", Route::Species(Species::Gas)),
    ("PartType1", Route::Species(Species::DarkMatter)),
    ("PartType2", Route::Species(Species::Reserved2)),
    ("PartType3", Route::Species(Species::Reserved3)),
    ("PartType4", Route::Species(Species::Stars)),
    ("PartType5", Route::Species(Species::BlackHoles)),
];

/// A routed path together with the selection it must be read with
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Resolution<'m> {
    pub route: Route,
    /// Rows the output dataset will hold
    pub size: usize,
    /// `None` for unfiltered paths and species without a selection
    pub selection: Option<&'m Selection>,
}

/// Maps container paths to species with first-match-wins substring tags
#[derive(Debug, Clone, Copy)]
pub struct SpeciesRouter {
    table: &'static [(&'static str, Route)],
}

impl Default for SpeciesRouter {
    fn default() -> Self {
        Self::new()
    }
}

impl SpeciesRouter {
    pub fn new() -> Self {
        Self { table: &TAG_TABLE }
    }

    /// Route a path; paths matching no tag are unfiltered
    pub fn route(&self, path: &str) -> Route {
        self.table
            .iter()
            .find(|(tag, _)| path.contains(tag))
            .map(|(_, route)| *route)
            .unwrap_or(Route::Unfiltered)
    }

    /// Route a path and look up its size and selection in `mask`
    pub fn resolve<'m>(&self, path: &str, mask: &'m ParticleMask) -> Resolution<'m> {
        match self.route(path) {
            Route::Unfiltered => Resolution {
                route: Route::Unfiltered,
                size: 0,
                selection: None,
            },
            Route::Species(species) => Resolution {
                route: Route::Species(species),
                size: mask.size(species),
                selection: mask.selection(species),
            },
        }
    }
}
