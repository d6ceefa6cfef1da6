//! Shared fixtures for the integration tests
#![allow(dead_code)]

use lulcc_core::config::{LandUseTypeConfig, Scenario, SimulationConfig};
use lulcc_core::grid::{ClimateLayers, Raster, StaticInputs, StaticLayers};
use lulcc_core::suitability::{DistanceRelation, SuitabilityFactor, WeightedFactor};
use lulcc_core::{LandUseType, PnvClass};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Route `tracing` output to the test harness (`RUST_LOG=debug cargo test`)
#[ctor::ctor]
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub const POTENTIAL_AGB: f32 = 300.0;

/// Flat region without features; every cell on `pnv`, nothing restricted
pub fn flat_inputs(width: usize, height: usize, pnv: PnvClass) -> StaticInputs {
    StaticInputs {
        elevation: Raster::filled(width, height, 0.0),
        streets: Raster::filled(width, height, false),
        freshwater: Raster::filled(width, height, false),
        cities: Raster::filled(width, height, false),
        restricted: Raster::filled(width, height, false),
        pnv: Raster::filled(width, height, pnv),
        population_density: Raster::filled(width, height, 0.0),
        climate_periods: vec![ClimateLayers {
            start_step: 1,
            potential_agb: Raster::filled(width, height, POTENTIAL_AGB),
            potential_yield: Raster::filled(width, height, 1.0),
            agb_increment: None,
        }],
    }
}

pub fn layers(inputs: StaticInputs) -> Arc<StaticLayers> {
    Arc::new(StaticLayers::derive(inputs, 100.0).unwrap())
}

/// Factor list that scores every cell of `land_use` as fully suitable
pub fn prefer(land_use: LandUseType) -> Vec<WeightedFactor> {
    vec![WeightedFactor::new(
        1.0,
        SuitabilityFactor::CurrentLandUse {
            preferences: BTreeMap::from([(land_use, 1.0)]),
        },
    )]
}

/// Factor list that prefers cells close to streets
pub fn near_streets() -> Vec<WeightedFactor> {
    vec![WeightedFactor::new(
        1.0,
        SuitabilityFactor::DistanceToStreets {
            relation: DistanceRelation::Linear,
            max_distance: 2000.0,
        },
    )]
}

/// Configuration with the given active types, each without slope
/// restriction and with the given factors
pub fn config_for(
    scenario: Scenario,
    active: &[(LandUseType, Vec<WeightedFactor>)],
) -> SimulationConfig {
    let mut config = SimulationConfig {
        scenario,
        active_land_use_types: active.iter().map(|(lut, _)| *lut).collect(),
        ..SimulationConfig::default()
    };
    for (land_use, factors) in active {
        let entry: &mut LandUseTypeConfig = config.land_use_type_mut(*land_use).unwrap();
        entry.factors = factors.clone();
        entry.slope = None;
    }
    config
}

/// Zero AGB raster
pub fn bare(width: usize, height: usize) -> Raster<f32> {
    Raster::filled(width, height, 0.0)
}

/// Cells of a class in the landscape's land-use raster
pub fn cells_of(land_use: &Raster<LandUseType>, class: LandUseType) -> Vec<usize> {
    (0..land_use.len()).filter(|&idx| land_use[idx] == class).collect()
}
