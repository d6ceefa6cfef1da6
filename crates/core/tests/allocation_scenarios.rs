//! End-to-end allocation behaviour through `Simulation::advance`
mod common;

use common::{bare, cells_of, config_for, flat_inputs, layers, near_streets, prefer};
use lulcc_core::allocation::{DegreeOfLimitation, Direction};
use lulcc_core::config::{Scenario, SlopeRange};
use lulcc_core::grid::Raster;
use lulcc_core::{DemandRecord, LandUseType, PnvClass, Simulation, SimulationError};

const H: LandUseType = LandUseType::HerbaceousVegetation;

/// 10x10 grid whose first two rows are water, the rest herbaceous
fn water_margin() -> Raster<LandUseType> {
    Raster::from_fn(10, 10, |_, y| if y < 2 { LandUseType::Water } else { H })
}

fn agroforestry_sim(scenario: Scenario, land_use: Raster<LandUseType>) -> Simulation {
    let config = config_for(scenario, &[(LandUseType::Agroforestry, prefer(H))]);
    let layers = layers(flat_inputs(10, 10, PnvClass::Grassland));
    let agb = bare(10, 10);
    Simulation::new(&config, layers, land_use, agb, 0).unwrap()
}

#[test]
fn test_satisfiable_demand_allocates_exactly() {
    let mut sim = agroforestry_sim(Scenario::WeakConservation, water_margin());
    let demand = DemandRecord::new().with_cells(LandUseType::Agroforestry, 5);

    let diagnostics = sim.advance(&demand).unwrap();
    let report = &diagnostics.allocations[0];

    assert_eq!(report.direction, Direction::Grow);
    assert_eq!(report.cells_added, 5);
    assert_eq!(report.residual, 0.0);
    assert!(!report.is_leakage());
    assert_eq!(sim.landscape().area(LandUseType::Agroforestry), 5);
    assert_eq!(sim.landscape().area(LandUseType::Water), 20);

    for idx in cells_of(sim.landscape().land_use(), LandUseType::Agroforestry) {
        assert!(idx >= 20, "water cell {idx} allocated");
        assert!(sim.landscape().was_converted(idx));
        assert!(sim.landscape().agb()[idx] > 0.0, "agroforestry enters with seed AGB");
    }
}

#[test]
fn test_unsatisfiable_demand_cascades_all_tiers() {
    let mut sim = agroforestry_sim(Scenario::WeakConservation, water_margin());
    let demand = DemandRecord::new().with_cells(LandUseType::Agroforestry, 200);

    let diagnostics = sim.advance(&demand).unwrap();
    let report = &diagnostics.allocations[0];

    assert_eq!(report.cells_added, 80);
    assert_eq!(report.tiers.len(), 4);
    assert!(report.tiers.iter().skip(1).all(|tier| tier.exhausted));
    assert!(report.residual >= 120.0);
    assert!(report.is_leakage());
    assert_eq!(sim.landscape().area(LandUseType::Agroforestry), 80);
    assert_eq!(diagnostics.summary(sim.landscape()).leakage().len(), 1);
}

#[test]
fn test_shrink_abandons_least_suitable_cells() {
    // Agroforestry along the west edge, a street along the north edge
    let land_use = Raster::from_fn(10, 10, |x, _| if x == 0 { LandUseType::Agroforestry } else { H });
    let mut inputs = flat_inputs(10, 10, PnvClass::Grassland);
    inputs.streets = Raster::from_fn(10, 10, |_, y| y == 0);
    let config = config_for(
        Scenario::WeakConservation,
        &[(LandUseType::Agroforestry, near_streets())],
    );
    let agb = Raster::filled(10, 10, 50.0);
    let mut sim = Simulation::new(&config, layers(inputs), land_use, agb, 0).unwrap();

    let demand = DemandRecord::new().with_cells(LandUseType::Agroforestry, 3);
    let diagnostics = sim.advance(&demand).unwrap();
    let report = &diagnostics.allocations[0];

    assert_eq!(report.direction, Direction::Shrink);
    assert_eq!(report.cells_removed, 7);
    let landscape = sim.landscape();
    assert_eq!(landscape.area(LandUseType::Agroforestry), 3);
    assert_eq!(landscape.area(LandUseType::AgroforestryAbandoned), 7);

    for y in 0..10 {
        let idx = y * 10;
        if y < 3 {
            assert_eq!(landscape.land_use_at(idx), LandUseType::Agroforestry);
        } else {
            assert_eq!(landscape.land_use_at(idx), LandUseType::AgroforestryAbandoned);
            assert_eq!(landscape.succession_age()[idx], 1);
            assert_eq!(landscape.agb()[idx], 0.0);
        }
    }
}

#[test]
fn test_yield_demand_terminates_and_reports_residual() {
    let mut config = config_for(
        Scenario::WeakConservation,
        &[(LandUseType::CroplandAnnual, prefer(H))],
    );
    config
        .land_use_type_mut(LandUseType::CroplandAnnual)
        .unwrap()
        .max_yield_per_cell = Some(10.0);
    let layers = layers(flat_inputs(10, 10, PnvClass::Grassland));
    let mut sim = Simulation::new(&config, layers, water_margin(), bare(10, 10), 0).unwrap();

    let target = 1.0e9;
    let demand = DemandRecord::new().with_yield(LandUseType::CroplandAnnual, target);
    let diagnostics = sim.advance(&demand).unwrap();
    let report = &diagnostics.allocations[0];

    assert!(report.iterations <= lulcc_core::allocation::MAX_YIELD_ITERATIONS);
    assert_eq!(report.cells_added, 80);
    // 80 cells at full potential yield deliver 800 units
    assert!((report.residual - (target - 800.0)).abs() < 1e-3);
    assert!(report.is_leakage());
}

#[test]
fn test_yield_demand_for_footprint_type_is_an_error() {
    let mut sim = agroforestry_sim(Scenario::WeakConservation, water_margin());
    let demand = DemandRecord::new().with_yield(LandUseType::Agroforestry, 10.0);

    let err = sim.advance(&demand).unwrap_err();
    assert!(matches!(err, SimulationError::Allocation { step: 1, sample: 0, .. }));
}

#[test]
fn test_cells_claimed_earlier_in_step_are_immutable() {
    let config = config_for(
        Scenario::WeakConservation,
        &[(LandUseType::Pasture, prefer(H)), (LandUseType::Agroforestry, prefer(H))],
    );
    let layers = layers(flat_inputs(10, 10, PnvClass::Grassland));
    let mut sim = Simulation::new(&config, layers, water_margin(), bare(10, 10), 0).unwrap();

    let demand = DemandRecord::new()
        .with_cells(LandUseType::Pasture, 60)
        .with_cells(LandUseType::Agroforestry, 30);
    let diagnostics = sim.advance(&demand).unwrap();

    assert_eq!(sim.landscape().area(LandUseType::Pasture), 60);
    assert_eq!(sim.landscape().area(LandUseType::Agroforestry), 20);
    assert_eq!(diagnostics.allocations[1].residual, 10.0);
}

fn restricted_north(scenario: Scenario) -> (Simulation, DemandRecord) {
    let mut inputs = flat_inputs(10, 10, PnvClass::Grassland);
    inputs.restricted = Raster::from_fn(10, 10, |_, y| y < 5);
    let config = config_for(scenario, &[(LandUseType::Pasture, prefer(H))]);
    let sim = Simulation::new(&config, layers(inputs), Raster::filled(10, 10, H), bare(10, 10), 0)
        .unwrap();
    (sim, DemandRecord::new().with_cells(LandUseType::Pasture, 70))
}

#[test]
fn test_weak_conservation_records_conflicts() {
    let (mut sim, demand) = restricted_north(Scenario::WeakConservation);
    let diagnostics = sim.advance(&demand).unwrap();

    assert_eq!(sim.landscape().area(LandUseType::Pasture), 70);
    assert_eq!(diagnostics.conflicts(), 20);
    assert!(diagnostics.allocations[0].conflicts.iter().all(|&idx| idx < 50));
}

#[test]
fn test_enforced_conservation_never_enters_restricted_zone() {
    let (mut sim, demand) = restricted_north(Scenario::EnforcedConservation);
    let diagnostics = sim.advance(&demand).unwrap();

    assert_eq!(sim.landscape().area(LandUseType::Pasture), 50);
    assert_eq!(diagnostics.conflicts(), 0);
    assert_eq!(diagnostics.allocations[0].residual, 20.0);
    for idx in cells_of(sim.landscape().land_use(), LandUseType::Pasture) {
        assert!(idx >= 50);
    }
}

#[test]
fn test_no_conservation_ignores_restriction_without_conflicts() {
    let (mut sim, demand) = restricted_north(Scenario::NoConservation);
    let diagnostics = sim.advance(&demand).unwrap();

    assert_eq!(sim.landscape().area(LandUseType::Pasture), 70);
    assert_eq!(diagnostics.conflicts(), 0);
    assert_eq!(diagnostics.allocations[0].tiers.len(), 1);
}

#[test]
fn test_slope_at_difficult_max_is_reached_in_restricted_tier() {
    // Flat land with a zero-width difficult range: no unrestricted tier admits it
    let mut config = config_for(Scenario::WeakConservation, &[(LandUseType::Pasture, prefer(H))]);
    config.land_use_type_mut(LandUseType::Pasture).unwrap().slope = Some(SlopeRange {
        difficult_min: 0.0,
        difficult_max: 0.0,
    });
    let layers = layers(flat_inputs(5, 5, PnvClass::Grassland));
    let mut sim = Simulation::new(&config, layers, Raster::filled(5, 5, H), bare(5, 5), 0).unwrap();

    let demand = DemandRecord::new().with_cells(LandUseType::Pasture, 5);
    let diagnostics = sim.advance(&demand).unwrap();
    let report = &diagnostics.allocations[0];

    assert_eq!(report.cells_added, 5);
    assert_eq!(report.residual, 0.0);
    assert_eq!(diagnostics.conflicts(), 0);
    assert_eq!(sim.landscape().area(LandUseType::Pasture), 5);
    let admitting = report.tiers.iter().find(|tier| tier.cells_added > 0).unwrap();
    assert_eq!(admitting.degree, DegreeOfLimitation::FavorableTerrainInRestrictedAreas);
}
