//! Per-time-step demand record consumed by the allocator.

use super::land_use::LandUseType;
use super::units::{Megagrams, YieldUnits};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Required quantity for one land-use type in one time step
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Demand {
    /// Footprint approach: number of cells the type must occupy
    Cells(usize),
    /// Yield approach: production the type's cells must deliver
    Yield(YieldUnits),
}

/// Demand quantities for a single time step.
///
/// Created fresh by a [`DemandProvider`](crate::demand::DemandProvider) every
/// step and consumed exactly once by `Simulation::advance`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DemandRecord {
    /// Demand per active land-use type
    #[serde(default)]
    pub quantities: BTreeMap<LandUseType, Demand>,
    /// Above-ground biomass to extract from net forest
    #[serde(default)]
    pub agb: Megagrams,
}

impl DemandRecord {
    /// Empty record (no demand, no harvest)
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert of a footprint demand
    pub fn with_cells(mut self, land_use: LandUseType, cells: usize) -> Self {
        self.quantities.insert(land_use, Demand::Cells(cells));
        self
    }

    /// Builder-style insert of a yield demand
    pub fn with_yield(mut self, land_use: LandUseType, target: f64) -> Self {
        self.quantities
            .insert(land_use, Demand::Yield(YieldUnits::new(target)));
        self
    }

    /// Builder-style biomass extraction demand
    pub fn with_agb(mut self, mass: Megagrams) -> Self {
        self.agb = mass;
        self
    }

    /// Demand for a type, if any was issued this step
    pub fn get(&self, land_use: LandUseType) -> Option<Demand> {
        self.quantities.get(&land_use).copied()
    }
}
