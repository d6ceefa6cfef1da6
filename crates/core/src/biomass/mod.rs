//! Above-ground biomass (AGB) ledger
//!
//! Supplies annual increments (climate-period rasters or per-run stochastic
//! draws), the seed AGB of cells entering a forest-bearing class, and the
//! yearly growth pass.

use crate::config::{BiomassConfig, ConfigError, IncrementMode};
use crate::core_types::{LandUseType, Megagrams};
use crate::grid::{Landscape, StaticLayers};
use rand::Rng;
use serde::Serialize;

/// Per-run increments drawn once from the configured ranges
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DrawnIncrements {
    pub undisturbed_forest: f32,
    pub disturbed_forest: f32,
    pub plantation: f32,
    pub agroforestry: f32,
}

/// Summary of one growth pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct GrowthSummary {
    pub cells_grown: usize,
    pub cells_at_potential: usize,
    pub total_increment: f64,
}

#[derive(Debug, Clone)]
pub struct BiomassLedger {
    mode: IncrementMode,
    drawn: DrawnIncrements,
    years_to_disturbed_forest: f32,
}

impl BiomassLedger {
    /// Create the ledger of one sample.
    ///
    /// Stochastic increments are drawn here even in spatially explicit
    /// mode so that the random stream does not depend on the mode.
    ///
    /// # Errors
    ///
    /// [`ConfigError::MissingIncrementLayers`] if spatially explicit
    /// increments are selected and a climate period lacks increment rasters.
    pub fn new(
        config: &BiomassConfig,
        layers: &StaticLayers,
        rng: &mut impl Rng,
    ) -> Result<Self, ConfigError> {
        if config.increment_mode == IncrementMode::SpatiallyExplicit {
            if let Some(period) = layers
                .climate_periods()
                .iter()
                .find(|period| period.agb_increment.is_none())
            {
                return Err(ConfigError::MissingIncrementLayers {
                    start_step: period.start_step,
                });
            }
        }

        let ranges = &config.stochastic_increments;
        let mut draw = |(min, max): (f32, f32)| {
            if max > min {
                rng.random_range(min..=max)
            } else {
                min
            }
        };
        let drawn = DrawnIncrements {
            undisturbed_forest: draw(ranges.undisturbed_forest),
            disturbed_forest: draw(ranges.disturbed_forest),
            plantation: draw(ranges.plantation),
            agroforestry: draw(ranges.agroforestry),
        };

        Ok(Self {
            mode: config.increment_mode,
            drawn,
            years_to_disturbed_forest: config.years_to_disturbed_forest,
        })
    }

    /// Increments drawn for this run
    pub fn drawn_increments(&self) -> DrawnIncrements {
        self.drawn
    }

    /// Annual AGB increment of a cell in a class (0 for classes that do
    /// not accumulate biomass)
    pub fn increment(&self, land_use: LandUseType, idx: usize, layers: &StaticLayers, step: u32) -> f32 {
        let spatial = match self.mode {
            IncrementMode::SpatiallyExplicit => layers.climate_period(step).agb_increment.as_ref(),
            IncrementMode::Stochastic => None,
        };
        match (land_use, spatial) {
            (LandUseType::UndisturbedForest, Some(inc)) => inc.undisturbed_forest[idx],
            (LandUseType::DisturbedForest, Some(inc)) => inc.disturbed_forest[idx],
            (LandUseType::Plantation, Some(inc)) => inc.plantation[idx],
            (LandUseType::Agroforestry, Some(inc)) => inc.agroforestry[idx],
            (LandUseType::UndisturbedForest, None) => self.drawn.undisturbed_forest,
            (LandUseType::DisturbedForest, None) => self.drawn.disturbed_forest,
            (LandUseType::Plantation, None) => self.drawn.plantation,
            (LandUseType::Agroforestry, None) => self.drawn.agroforestry,
            _ => 0.0,
        }
        .max(0.0)
    }

    /// AGB of a cell newly entering `land_use`.
    ///
    /// Agroforestry and plantation start with one year's increment;
    /// disturbed forest with its increment times the mean years needed to
    /// reach that state, bounded by the potential maximum. Other classes
    /// start at 0.
    pub fn seed_value(&self, land_use: LandUseType, idx: usize, layers: &StaticLayers, step: u32) -> f32 {
        match land_use {
            LandUseType::Agroforestry | LandUseType::Plantation => {
                self.increment(land_use, idx, layers, step)
            }
            LandUseType::DisturbedForest => {
                let seed = self.increment(land_use, idx, layers, step) * self.years_to_disturbed_forest;
                seed.min(layers.climate_period(step).potential_agb[idx].max(0.0))
            }
            _ => 0.0,
        }
    }

    /// Add one year of growth to every forest-bearing cell.
    ///
    /// Cells converted during this step keep their seed value; cells at or
    /// above the climate-period potential maximum are at climax and do not
    /// grow.
    pub fn grow(&self, landscape: &mut Landscape, layers: &StaticLayers, step: u32) -> GrowthSummary {
        let potential = &layers.climate_period(step).potential_agb;
        let mut summary = GrowthSummary::default();

        for idx in 0..landscape.len() {
            let land_use = landscape.land_use_at(idx);
            if !land_use.is_forest_bearing() || landscape.was_converted(idx) {
                continue;
            }
            let agb = landscape.agb()[idx];
            if agb >= potential[idx] {
                summary.cells_at_potential += 1;
                continue;
            }
            let increment = self.increment(land_use, idx, layers, step);
            if increment > 0.0 {
                landscape.set_agb(idx, agb + increment);
                summary.cells_grown += 1;
                summary.total_increment += f64::from(increment);
            }
        }
        summary
    }
}

/// Total AGB of the landscape
pub fn total_agb(landscape: &Landscape) -> Megagrams {
    Megagrams::new(landscape.agb().iter().map(|&v| f64::from(v)).sum())
}
