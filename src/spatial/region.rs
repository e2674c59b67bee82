use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::selection::SelectionError;

/// An axis-aligned box in simulation coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoxRegion {
    pub lower: [f64; 3],
    pub upper: [f64; 3],
}

impl BoxRegion {
    /// Create a region, rejecting non-finite bounds and `lower > upper`
    pub fn new(lower: [f64; 3], upper: [f64; 3]) -> Result<Self, SelectionError> {
        for axis in 0..3 {
            let (lo, hi) = (lower[axis], upper[axis]);
            if !lo.is_finite() || !hi.is_finite() {
                return Err(SelectionError::InvalidRegion(format!(
                    "axis {axis} has non-finite bounds [{lo}, {hi}]"
                )));
            }
            if lo > hi {
                return Err(SelectionError::InvalidRegion(format!(
                    "axis {axis} lower bound {lo} exceeds upper bound {hi}"
                )));
            }
        }
        Ok(Self { lower, upper })
    }

    /// Exact membership: `lower <= x < upper` on every axis
    #[inline]
    pub fn contains(&self, point: [f64; 3]) -> bool {
        (0..3).all(|axis| self.lower[axis] <= point[axis] && point[axis] < self.upper[axis])
    }

    /// Whether the closed box `[lo, hi]` overlaps this region's closure
    #[inline]
    pub fn overlaps(&self, lo: [f64; 3], hi: [f64; 3]) -> bool {
        (0..3).all(|axis| lo[axis] <= self.upper[axis] && hi[axis] >= self.lower[axis])
    }

    /// Check the invariants of a region built from deserialized bounds
    pub fn validate(&self) -> Result<(), SelectionError> {
        Self::new(self.lower, self.upper).map(|_| ())
    }
}

/// How exact a spatial selection is
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterMode {
    /// Whole cells intersecting the region; a superset of the particles inside
    #[default]
    Coarse,
    /// Coarse cells re-checked particle by particle against their coordinates
    Fine,
}

impl FromStr for FilterMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "coarse" => Ok(FilterMode::Coarse),
            "fine" => Ok(FilterMode::Fine),
            other => Err(format!("unknown filter mode {other:?} (expected coarse or fine)")),
        }
    }
}

impl fmt::Display for FilterMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterMode::Coarse => f.write_str("coarse"),
            FilterMode::Fine => f.write_str("fine"),
        }
    }
}
