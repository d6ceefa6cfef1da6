//! Allocation outcomes reported to the orchestrator
//!
//! Shortfalls are outcomes, not errors: everything the landscape could not
//! supply ends up here.

use super::mask::DegreeOfLimitation;
use crate::core_types::{Demand, LandUseType, Megagrams};
use serde::Serialize;

/// What the allocator did with a type's demand
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Grow,
    Shrink,
    /// Demand met already, or surplus of a type that never shrinks
    Unchanged,
}

/// Result of one tier of the cascade
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TierOutcome {
    pub degree: DegreeOfLimitation,
    pub cells_added: usize,
    /// Yield added by these cells (0 for footprint types)
    pub yield_added: f64,
    /// The tier's candidate pool ran empty
    pub exhausted: bool,
}

/// Allocation of one land-use type in one time step
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AllocationReport {
    pub land_use: LandUseType,
    pub demand: Demand,
    pub direction: Direction,
    pub tiers: Vec<TierOutcome>,
    pub cells_added: usize,
    pub cells_removed: usize,
    /// Cells allocated inside legally restricted zones
    pub conflicts: Vec<usize>,
    /// Unmet demand after growth, or remaining surplus after shrink
    /// (cells or yield units)
    pub residual: f64,
    /// Iterations of the yield loop (0 in footprint mode)
    pub iterations: u32,
    /// False if the yield loop stopped at the iteration cap
    pub converged: bool,
}

impl AllocationReport {
    pub(crate) fn new(land_use: LandUseType, demand: Demand) -> Self {
        Self {
            land_use,
            demand,
            direction: Direction::Unchanged,
            tiers: Vec::new(),
            cells_added: 0,
            cells_removed: 0,
            conflicts: Vec::new(),
            residual: 0.0,
            iterations: 0,
            converged: true,
        }
    }

    /// Growth ended with unmet demand
    pub fn is_leakage(&self) -> bool {
        self.direction == Direction::Grow && self.residual > 0.0
    }
}

/// Result of the biomass extraction pass
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct HarvestReport {
    pub demand: Megagrams,
    pub harvested: Megagrams,
    /// Part of `harvested` taken inside the local consumption buffer
    pub harvested_locally: Megagrams,
    /// Cells converted to net forest deforested
    pub cells_deforested: usize,
    /// Cells partially depleted and left as disturbed forest
    pub cells_depleted: usize,
    pub unmet: Megagrams,
    pub iterations: u32,
}
