//! Static landscape layers
//!
//! Layers that never change during a run: slope, distances to streets,
//! freshwater and cities, legal-restriction zones, potential natural
//! vegetation, population density and the climate-period-dependent
//! potential biomass / yield / increment rasters.
//!
//! Distance layers are derived once from feature masks when the layers are
//! built, so suitability evaluation never recomputes them.

use super::ops::distance_to;
use super::raster::{Raster, RasterError};
use super::terrain::slope_degrees;
use crate::core_types::PnvClass;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failure while deriving static layers
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LayerError {
    #[error("layer `{layer}` has the wrong shape: {source}")]
    Shape {
        layer: &'static str,
        #[source]
        source: RasterError,
    },
    #[error("at least one climate period is required")]
    NoClimatePeriods,
    #[error("climate periods must start at strictly increasing steps, got {previous} then {next}")]
    UnorderedClimatePeriods { previous: u32, next: u32 },
    #[error("cell size must be finite and positive, got {0}")]
    InvalidCellSize(f32),
}

/// Annual AGB increments per growth class (Mg per cell per year)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IncrementLayers {
    pub undisturbed_forest: Raster<f32>,
    pub disturbed_forest: Raster<f32>,
    pub plantation: Raster<f32>,
    pub agroforestry: Raster<f32>,
}

/// Rasters valid for one climate period
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClimateLayers {
    /// First time step (1-based) this period applies to
    pub start_step: u32,
    /// Potential maximum AGB per cell (Mg)
    pub potential_agb: Raster<f32>,
    /// Fraction (0-1) of the maximum yield a cell can deliver
    pub potential_yield: Raster<f32>,
    /// Spatially explicit AGB increments, if provided
    pub agb_increment: Option<IncrementLayers>,
}

/// Raw inputs from which [`StaticLayers`] are derived
#[derive(Debug, Clone)]
pub struct StaticInputs {
    /// Elevation in meters
    pub elevation: Raster<f32>,
    pub streets: Raster<bool>,
    pub freshwater: Raster<bool>,
    pub cities: Raster<bool>,
    /// Legally restricted (protected) zones
    pub restricted: Raster<bool>,
    pub pnv: Raster<PnvClass>,
    /// People per cell
    pub population_density: Raster<f32>,
    pub climate_periods: Vec<ClimateLayers>,
}

/// Immutable per-cell attributes shared by every sample of a run
#[derive(Debug, Clone)]
pub struct StaticLayers {
    pub width: usize,
    pub height: usize,
    /// Cell edge length in meters
    pub cell_size: f32,
    /// Slope in degrees
    pub slope: Raster<f32>,
    /// Distance to the nearest street cell (m)
    pub distance_to_streets: Raster<f32>,
    /// Distance to the nearest freshwater cell (m)
    pub distance_to_freshwater: Raster<f32>,
    /// Distance to the nearest city cell (m)
    pub distance_to_cities: Raster<f32>,
    pub restricted: Raster<bool>,
    pub pnv: Raster<PnvClass>,
    pub population_density: Raster<f32>,
    climate_periods: Vec<ClimateLayers>,
}

fn check<T, U>(reference: &Raster<T>, layer: &'static str, raster: &Raster<U>) -> Result<(), LayerError> {
    reference
        .ensure_same_shape(raster)
        .map_err(|source| LayerError::Shape { layer, source })
}

impl StaticLayers {
    /// Derive slope and distance layers from raw inputs.
    ///
    /// # Arguments
    ///
    /// * `inputs` - Raw rasters, all of the elevation raster's shape
    /// * `cell_size` - Cell edge length in meters
    ///
    /// # Errors
    ///
    /// Fails when a raster shape differs from the elevation raster, when no
    /// climate period is given or periods are not ordered by start step.
    pub fn derive(inputs: StaticInputs, cell_size: f32) -> Result<Self, LayerError> {
        if !(cell_size.is_finite() && cell_size > 0.0) {
            return Err(LayerError::InvalidCellSize(cell_size));
        }
        let reference = &inputs.elevation;
        check(reference, "streets", &inputs.streets)?;
        check(reference, "freshwater", &inputs.freshwater)?;
        check(reference, "cities", &inputs.cities)?;
        check(reference, "restricted", &inputs.restricted)?;
        check(reference, "pnv", &inputs.pnv)?;
        check(reference, "population_density", &inputs.population_density)?;

        if inputs.climate_periods.is_empty() {
            return Err(LayerError::NoClimatePeriods);
        }
        for pair in inputs.climate_periods.windows(2) {
            if pair[1].start_step <= pair[0].start_step {
                return Err(LayerError::UnorderedClimatePeriods {
                    previous: pair[0].start_step,
                    next: pair[1].start_step,
                });
            }
        }
        for period in &inputs.climate_periods {
            check(reference, "potential_agb", &period.potential_agb)?;
            check(reference, "potential_yield", &period.potential_yield)?;
            if let Some(increments) = &period.agb_increment {
                check(reference, "undisturbed_forest_increment", &increments.undisturbed_forest)?;
                check(reference, "disturbed_forest_increment", &increments.disturbed_forest)?;
                check(reference, "plantation_increment", &increments.plantation)?;
                check(reference, "agroforestry_increment", &increments.agroforestry)?;
            }
        }

        Ok(Self {
            width: reference.width(),
            height: reference.height(),
            cell_size,
            slope: slope_degrees(&inputs.elevation, cell_size),
            distance_to_streets: distance_to(&inputs.streets, cell_size),
            distance_to_freshwater: distance_to(&inputs.freshwater, cell_size),
            distance_to_cities: distance_to(&inputs.cities, cell_size),
            restricted: inputs.restricted,
            pnv: inputs.pnv,
            population_density: inputs.population_density,
            climate_periods: inputs.climate_periods,
        })
    }

    /// Number of cells in the study area
    pub fn cell_count(&self) -> usize {
        self.width * self.height
    }

    /// Climate layers active at a (1-based) time step.
    ///
    /// The latest period whose start step is not after `step` applies; steps
    /// before the first period use the first period.
    pub fn climate_period(&self, step: u32) -> &ClimateLayers {
        self.climate_periods
            .iter()
            .rev()
            .find(|period| period.start_step <= step)
            .unwrap_or(&self.climate_periods[0])
    }

    /// All configured climate periods, ordered by start step
    pub fn climate_periods(&self) -> &[ClimateLayers] {
        &self.climate_periods
    }
}
