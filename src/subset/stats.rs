use std::fmt;

use crate::species::Species;

/// Statistics from a completed subsetting pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubsetStats {
    /// Particle datasets written with a selection applied
    pub datasets_filtered: usize,
    /// Subtrees without particle data copied verbatim
    pub subtrees_copied: usize,
    /// Rows written to filtered datasets
    pub rows_written: usize,
    /// Value bytes written to filtered datasets
    pub bytes_written: usize,
    /// Value bytes copied verbatim
    pub bytes_copied: usize,
    /// Selected particles per species, indexed by particle type
    pub particles: [usize; 6],
}

impl SubsetStats {
    /// Selected particles of `species`
    pub fn particles(&self, species: Species) -> usize {
        self.particles[species.index()]
    }
}

impl fmt::Display for SubsetStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Filtered {} datasets ({} rows, {} bytes), copied {} subtrees ({} bytes)",
            self.datasets_filtered,
            self.rows_written,
            self.bytes_written,
            self.subtrees_copied,
            self.bytes_copied
        )
    }
}
