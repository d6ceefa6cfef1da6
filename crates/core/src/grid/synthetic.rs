//! Synthetic study regions for demos and tests
//!
//! Builds a plausible region without any map input: noise-based elevation and
//! potential natural vegetation, one east-west and one north-south street
//! crossing at a city, a meandering river, a circular protected zone and a
//! forest-dominated initial land cover with agriculture around the city.

use super::layers::{ClimateLayers, IncrementLayers, StaticInputs};
use super::noise::NoiseGenerator;
use super::ops::distance_to;
use super::raster::Raster;
use crate::core_types::{LandUseType, PnvClass};

/// Initial conditions of a synthetic region
#[derive(Debug, Clone)]
pub struct SyntheticRegion {
    pub inputs: StaticInputs,
    pub land_use: Raster<LandUseType>,
    /// Initial AGB (Mg per cell)
    pub agb: Raster<f32>,
}

impl SyntheticRegion {
    /// Generate a region of `width`×`height` cells.
    ///
    /// # Arguments
    ///
    /// * `width` - Grid width in cells (at least 8)
    /// * `height` - Grid height in cells (at least 8)
    /// * `seed` - Seed for all noise layers
    #[must_use]
    pub fn generate(width: usize, height: usize, seed: u64) -> Self {
        let width = width.max(8);
        let height = height.max(8);

        let elevation = NoiseGenerator::new(seed).field(width, height, 50.0, 900.0);
        let pnv_noise = NoiseGenerator::new(seed.wrapping_add(1)).field(width, height, -1.0, 1.0);
        let cover_noise = NoiseGenerator::new(seed.wrapping_add(2)).field(width, height, -1.0, 1.0);
        let agb_noise = NoiseGenerator::new(seed.wrapping_add(3)).field(width, height, 150.0, 350.0);
        let yield_noise = NoiseGenerator::new(seed.wrapping_add(4)).field(width, height, 0.3, 1.0);

        let street_row = height / 2;
        let street_col = width / 3;
        let streets = Raster::from_fn(width, height, |x, y| y == street_row || x == street_col);

        let river_base = (2 * width / 3) as f32;
        let freshwater = Raster::from_fn(width, height, |x, y| {
            let meander = river_base + (y as f32 / 5.0).sin() * 2.0;
            (x as f32 - meander).abs() < 0.5
        });

        let cities = Raster::from_fn(width, height, |x, y| {
            x.abs_diff(street_col) <= 1 && y.abs_diff(street_row) <= 1
        });

        let zone_x = 3.0 * width as f32 / 4.0;
        let zone_y = height as f32 / 4.0;
        let zone_r = width.min(height) as f32 / 5.0;
        let restricted = Raster::from_fn(width, height, |x, y| {
            let dx = x as f32 - zone_x;
            let dy = y as f32 - zone_y;
            (dx * dx + dy * dy).sqrt() <= zone_r
        });

        let pnv = pnv_noise.map(|&n| {
            if n < -0.5 {
                PnvClass::Grassland
            } else if n < -0.3 {
                PnvClass::Shrubland
            } else {
                PnvClass::Forest
            }
        });

        let city_distance = distance_to(&cities, 1.0);
        let population_density = city_distance.map(|&d| 500.0 / (1.0 + d));

        let increments = IncrementLayers {
            undisturbed_forest: Raster::filled(width, height, 2.0),
            disturbed_forest: Raster::filled(width, height, 4.0),
            plantation: Raster::filled(width, height, 8.0),
            agroforestry: Raster::filled(width, height, 3.0),
        };
        let climate_periods = vec![
            ClimateLayers {
                start_step: 1,
                potential_agb: agb_noise.clone(),
                potential_yield: yield_noise.clone(),
                agb_increment: Some(increments.clone()),
            },
            ClimateLayers {
                start_step: 21,
                potential_agb: agb_noise.map(|&v| v * 0.9),
                potential_yield: yield_noise.map(|&v| v * 0.9),
                agb_increment: Some(increments),
            },
        ];

        let land_use = Raster::from_fn(width, height, |x, y| {
            let idx = y * width + x;
            if freshwater[idx] {
                return LandUseType::Water;
            }
            if cities[idx] {
                return LandUseType::BuiltUp;
            }
            let natural_ceiling = pnv[idx].succession_ceiling();
            if restricted[idx] {
                return natural_ceiling;
            }
            let n = cover_noise[idx] - 0.08 * (4.0 - city_distance[idx]).max(0.0);
            let class = if n > 0.15 {
                LandUseType::UndisturbedForest
            } else if n > 0.05 {
                if x < width / 2 && n < 0.07 {
                    LandUseType::Plantation
                } else {
                    LandUseType::DisturbedForest
                }
            } else if n > -0.2 {
                LandUseType::CroplandAnnual
            } else if n > -0.35 {
                LandUseType::Pasture
            } else if n > -0.45 {
                LandUseType::Shrubs
            } else {
                LandUseType::HerbaceousVegetation
            };
            cap_to_pnv(class, natural_ceiling)
        });

        let agb = Raster::from_fn(width, height, |x, y| {
            let idx = y * width + x;
            let potential = climate_periods[0].potential_agb[idx];
            match land_use[idx] {
                LandUseType::UndisturbedForest => potential * 0.9,
                LandUseType::DisturbedForest => potential * 0.5,
                LandUseType::Plantation => 40.0,
                LandUseType::Agroforestry => 30.0,
                _ => 0.0,
            }
        });

        Self {
            inputs: StaticInputs {
                elevation,
                streets,
                freshwater,
                cities,
                restricted,
                pnv,
                population_density,
                climate_periods,
            },
            land_use,
            agb,
        }
    }
}

/// Natural vegetation classes cannot exceed the PNV ceiling
fn cap_to_pnv(class: LandUseType, ceiling: LandUseType) -> LandUseType {
    let natural_rank = |lut: LandUseType| match lut {
        LandUseType::HerbaceousVegetation => Some(0),
        LandUseType::Shrubs => Some(1),
        LandUseType::DisturbedForest | LandUseType::UndisturbedForest => Some(2),
        _ => None,
    };
    match (natural_rank(class), natural_rank(ceiling)) {
        (Some(rank), Some(limit)) if rank > limit => ceiling,
        _ => class,
    }
}
