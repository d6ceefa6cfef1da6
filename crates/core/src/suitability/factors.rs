//! Suitability factor definitions and their per-cell score functions.
//!
//! Each factor turns one aspect of a cell (distance to a feature,
//! neighbourhood composition, current class, potential yield, ...) into a
//! score in [0, 1] where higher means more suitable, so weights express
//! relative importance. Population density is scaled by its peak value and
//! current-class preferences are bounded to [0, 1] when the config is
//! validated.

use crate::core_types::LandUseType;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Decay rate of the exponential distance relation over the cut-off distance
pub const EXPONENTIAL_DECAY: f32 = 3.0;

/// Shape of the distance-to-preference relation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistanceRelation {
    /// `1 - d / max`
    Linear,
    /// `exp(-3 d / max)`
    Exponential,
    /// `1 / (1 + d / cell_size)`
    InverseProportional,
}

impl DistanceRelation {
    /// Score of a distance under this relation.
    ///
    /// Distances beyond `max_distance` (and unreachable features) score 0.
    ///
    /// # Arguments
    ///
    /// * `distance` - Distance to the feature in meters
    /// * `max_distance` - Cut-off distance in meters
    /// * `cell_size` - Cell edge length in meters
    #[must_use]
    pub fn score(self, distance: f32, max_distance: f32, cell_size: f32) -> f32 {
        if !distance.is_finite() || distance > max_distance {
            return 0.0;
        }
        let relative = if max_distance > 0.0 {
            distance / max_distance
        } else {
            0.0
        };
        match self {
            DistanceRelation::Linear => 1.0 - relative,
            DistanceRelation::Exponential => (-EXPONENTIAL_DECAY * relative).exp(),
            DistanceRelation::InverseProportional => 1.0 / (1.0 + distance / cell_size),
        }
    }
}

/// One suitability factor, selected per land-use type in the configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SuitabilityFactor {
    /// Share of the type (and its related types) in a square window
    NeighborDensity {
        /// Window side in cells (odd, at least 3)
        window: usize,
        /// Per-run random change of the window side by up to this many
        /// steps of 2 cells
        #[serde(default)]
        window_jitter: usize,
    },
    DistanceToStreets {
        relation: DistanceRelation,
        max_distance: f32,
    },
    DistanceToFreshwater {
        relation: DistanceRelation,
        max_distance: f32,
    },
    DistanceToCities {
        relation: DistanceRelation,
        max_distance: f32,
    },
    /// Distance to built-up cells, recomputed every step
    DistanceToSettlements {
        relation: DistanceRelation,
        max_distance: f32,
        /// When set, the cut-off is resampled per run from this range
        #[serde(default)]
        max_distance_range: Option<(f32, f32)>,
    },
    /// Linear scaling of the population raster
    PopulationDensity,
    /// Inverse distance to the net-forest edge
    DistanceToForestEdge,
    /// Fixed preference in [0, 1] per current class (unlisted classes score 0)
    CurrentLandUse {
        preferences: BTreeMap<LandUseType, f32>,
    },
    /// Climate-period potential yield, `exp(-friction * (1 - yield_fraction))`
    PotentialYield { friction: f32 },
}

impl SuitabilityFactor {
    /// Short name used in logs and validation errors
    pub fn name(&self) -> &'static str {
        match self {
            SuitabilityFactor::NeighborDensity { .. } => "neighbor_density",
            SuitabilityFactor::DistanceToStreets { .. } => "distance_to_streets",
            SuitabilityFactor::DistanceToFreshwater { .. } => "distance_to_freshwater",
            SuitabilityFactor::DistanceToCities { .. } => "distance_to_cities",
            SuitabilityFactor::DistanceToSettlements { .. } => "distance_to_settlements",
            SuitabilityFactor::PopulationDensity => "population_density",
            SuitabilityFactor::DistanceToForestEdge => "distance_to_forest_edge",
            SuitabilityFactor::CurrentLandUse { .. } => "current_land_use",
            SuitabilityFactor::PotentialYield { .. } => "potential_yield",
        }
    }

    /// Static factors depend only on static layers and are computed once
    pub fn is_static(&self) -> bool {
        matches!(
            self,
            SuitabilityFactor::DistanceToStreets { .. }
                | SuitabilityFactor::DistanceToFreshwater { .. }
                | SuitabilityFactor::DistanceToCities { .. }
                | SuitabilityFactor::PopulationDensity
        )
    }
}

/// A factor with its weight in the combined suitability
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightedFactor {
    pub weight: f32,
    pub factor: SuitabilityFactor,
}

impl WeightedFactor {
    pub fn new(weight: f32, factor: SuitabilityFactor) -> Self {
        Self { weight, factor }
    }
}

/// Score of a potential-yield fraction under a friction coefficient
#[inline]
pub fn yield_score(yield_fraction: f32, friction: f32) -> f32 {
    (-friction * (1.0 - yield_fraction.clamp(0.0, 1.0))).exp()
}
