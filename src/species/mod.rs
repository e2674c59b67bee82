//! # Species Module
//!
//! Particle species, the ordered tag table that routes container paths to a
//! species, and the per-species selection table used during one subsetting
//! pass.

mod mask;
mod router;


pub use mask::ParticleMask;
pub use router::{Resolution, Route, SpeciesRouter, TAG_TABLE};

use std::fmt;

/// The fixed set of particle species stored in a snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Species {
    Gas,
    DarkMatter,
    /// Structurally present, never populated
    Reserved2,
    /// Structurally present, never populated
    Reserved3,
    Stars,
    BlackHoles,
}

impl Species {
    /// Every species, in particle-type order
    pub const ALL: [Species; 6] = [
        Species::Gas,
        Species::DarkMatter,
        Species::Reserved2,
        Species::Reserved3,
        Species::Stars,
        Species::BlackHoles,
    ];

    /// Species that can carry particles
    pub const REAL: [Species; 4] = [
        Species::Gas,
        Species::DarkMatter,
        Species::Stars,
        Species::BlackHoles,
    ];

    /// Particle type number, 0 to 5
    pub fn index(self) -> usize {
        match self {
            Species::Gas => 0,
            Species::DarkMatter => 1,
            Species::Reserved2 => 2,
            Species::Reserved3 => 3,
            Species::Stars => 4,
            Species::BlackHoles => 5,
        }
    }

    /// Name of the top-level group holding this species' datasets
    pub fn group_name(self) -> &'static str {
        match self {
            Species::Gas => "PartType0",
            Species::DarkMatter => "PartType1",
            Species::Reserved2 => "PartType2",
            Species::Reserved3 => "PartType3",
            Species::Stars => "PartType4",
            Species::BlackHoles => "PartType5",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Species::Gas => "gas",
            Species::DarkMatter => "dark_matter",
            Species::Reserved2 => "reserved_2",
            Species::Reserved3 => "reserved_3",
            Species::Stars => "stars",
            Species::BlackHoles => "black_holes",
        }
    }

    pub fn is_placeholder(self) -> bool {
        matches!(self, Species::Reserved2 | Species::Reserved3)
    }

    /// Absolute path of this species' coordinate dataset
    pub fn coordinates_path(self) -> String {
        format!("/{}/Coordinates", self.group_name())
    }
}

impl fmt::Display for Species {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
