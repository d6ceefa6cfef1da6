//! Biomass extraction from net forest
//!
//! Demand is expressed in AGB mass. Forest-fringe cells are ranked by an
//! inverse-neighbour-count suitability (the more exposed, the earlier they
//! are cut) and taken in order with a running sum until the demand is met.
//! With a local consumption radius, the buffer around settlements is
//! harvested first. Each round exposes a new fringe, so rounds repeat until
//! the demand is met, no fringe remains or the iteration cap is reached.

use super::allocator::{AllocationContext, MAX_YIELD_ITERATIONS};
use super::diagnostics::HarvestReport;
use super::ranking::{RankOrder, Ranking};
use crate::config::{HarvestConfig, HarvestMode};
use crate::core_types::{LandUseType, Megagrams};
use crate::grid::{distance_to, fringe_mask, neighbor_count, Raster};
use tracing::{debug, info};

/// Extract `demand` AGB from the landscape.
///
/// # Arguments
///
/// * `demand` - Biomass to extract this step
/// * `config` - Threshold mode and local consumption radius
/// * `allow_restricted` - Whether forest in restricted zones may be cut
/// * `ctx` - Landscape and immutable mask of the step
pub fn harvest_biomass(
    demand: Megagrams,
    config: &HarvestConfig,
    allow_restricted: bool,
    ctx: &mut AllocationContext<'_>,
) -> HarvestReport {
    let mut report = HarvestReport {
        demand,
        ..HarvestReport::default()
    };
    let mut remaining = *demand;
    if remaining <= 0.0 {
        return report;
    }

    if let Some(radius) = config.local_consumption_radius {
        let settlements = ctx.landscape.mask_where(|lut| lut == LandUseType::BuiltUp);
        let local = distance_to(&settlements, ctx.layers.cell_size).map(|&d| d <= radius);
        let taken = harvest_zone(Some(&local), &mut remaining, config.mode, allow_restricted, ctx, &mut report);
        report.harvested_locally = Megagrams::new(taken);
    }
    harvest_zone(None, &mut remaining, config.mode, allow_restricted, ctx, &mut report);

    report.unmet = Megagrams::new(remaining.max(0.0));
    if remaining > 0.0 {
        info!(
            step = ctx.step,
            unmet = remaining,
            "Biomass demand not satisfiable from the forest fringe, {:.1} Mg left",
            remaining
        );
    }
    report
}

/// Harvest fringe cells inside `zone` (whole landscape if `None`).
///
/// Returns the mass taken.
fn harvest_zone(
    zone: Option<&Raster<bool>>,
    remaining: &mut f64,
    mode: HarvestMode,
    allow_restricted: bool,
    ctx: &mut AllocationContext<'_>,
    report: &mut HarvestReport,
) -> f64 {
    let mut taken = 0.0;

    while *remaining > 0.0 && report.iterations < MAX_YIELD_ITERATIONS {
        let forest = ctx.landscape.mask_where(LandUseType::is_net_forest);
        let fringe = fringe_mask(&forest);
        let tie_break = ctx.landscape.tie_break();
        let suitability = Raster::from_fn(forest.width(), forest.height(), |x, y| {
            let idx = y * forest.width() + x;
            1.0 / (1.0 + neighbor_count(&forest, idx) as f32) + tie_break[idx]
        });

        let agb = ctx.landscape.agb();
        let ranking = Ranking::new(&suitability, RankOrder::MostSuitableFirst, |idx| {
            fringe[idx]
                && !ctx.immutable[idx]
                && agb[idx] > 0.0
                && zone.is_none_or(|z| z[idx])
                && (allow_restricted || !ctx.layers.restricted[idx])
        });
        let Some(ranking) = ranking else {
            debug!(
                step = ctx.step,
                local = zone.is_some(),
                "No harvestable forest fringe left"
            );
            break;
        };
        report.iterations += 1;

        for &idx in ranking.as_slice() {
            if *remaining <= 0.0 {
                break;
            }
            let cell_agb = f64::from(ctx.landscape.agb()[idx]);
            let cut = match mode {
                HarvestMode::PartialDepletion if cell_agb > *remaining => {
                    let left = (cell_agb - *remaining) as f32;
                    ctx.landscape.convert(idx, LandUseType::DisturbedForest, left);
                    report.cells_depleted += 1;
                    *remaining
                }
                _ => {
                    ctx.landscape.convert(idx, LandUseType::NetForestDeforested, 0.0);
                    report.cells_deforested += 1;
                    cell_agb
                }
            };
            ctx.immutable[idx] = true;
            *remaining -= cut;
            taken += cut;
        }
    }

    report.harvested = Megagrams::new(*report.harvested + taken);
    taken
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::biomass::BiomassLedger;
    use crate::config::SimulationConfig;
    use crate::core_types::PnvClass;
    use crate::grid::{ClimateLayers, Landscape, StaticInputs, StaticLayers};
    use approx::assert_relative_eq;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn layers(width: usize, height: usize) -> StaticLayers {
        let inputs = StaticInputs {
            elevation: Raster::filled(width, height, 0.0),
            streets: Raster::filled(width, height, false),
            freshwater: Raster::filled(width, height, false),
            cities: Raster::filled(width, height, false),
            restricted: Raster::filled(width, height, false),
            pnv: Raster::filled(width, height, PnvClass::Forest),
            population_density: Raster::filled(width, height, 0.0),
            climate_periods: vec![ClimateLayers {
                start_step: 1,
                potential_agb: Raster::filled(width, height, 300.0),
                potential_yield: Raster::filled(width, height, 1.0),
                agb_increment: None,
            }],
        };
        StaticLayers::derive(inputs, 100.0).unwrap()
    }

    /// Left half pasture, right half undisturbed forest with 100 Mg per cell
    fn half_forest(width: usize, height: usize) -> Landscape {
        let land_use = Raster::from_fn(width, height, |x, _| {
            if x < width / 2 {
                LandUseType::Pasture
            } else {
                LandUseType::UndisturbedForest
            }
        });
        Landscape::new(land_use, Raster::filled(width, height, 100.0), 3).unwrap()
    }

    fn run(demand: f64, mode: HarvestMode, landscape: &mut Landscape) -> (HarvestReport, Raster<bool>) {
        run_with_radius(demand, mode, None, landscape)
    }

    fn run_with_radius(
        demand: f64,
        mode: HarvestMode,
        local_consumption_radius: Option<f32>,
        landscape: &mut Landscape,
    ) -> (HarvestReport, Raster<bool>) {
        let (w, h) = (landscape.width(), landscape.height());
        let layers = layers(w, h);
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let biomass = BiomassLedger::new(&SimulationConfig::default().biomass, &layers, &mut rng).unwrap();
        let mut immutable = Raster::filled(w, h, false);
        let config = HarvestConfig {
            mode,
            local_consumption_radius,
        };
        let mut ctx = AllocationContext {
            landscape,
            layers: &layers,
            biomass: &biomass,
            immutable: &mut immutable,
            step: 1,
        };
        let report = harvest_biomass(Megagrams::new(demand), &config, false, &mut ctx);
        (report, immutable)
    }

    #[test]
    fn test_whole_cell_may_overshoot_by_one_cell() {
        let mut landscape = half_forest(6, 4);
        let (report, immutable) = run(250.0, HarvestMode::WholeCell, &mut landscape);

        assert_eq!(report.cells_deforested, 3);
        assert_relative_eq!(*report.harvested, 300.0);
        assert_eq!(*report.unmet, 0.0);
        assert_eq!(landscape.area(LandUseType::NetForestDeforested), 3);
        // Corners have the fewest forest neighbours and go first
        for idx in 0..landscape.len() {
            if landscape.land_use_at(idx) == LandUseType::NetForestDeforested {
                assert!([3, 5, 21, 23].contains(&idx), "cell {idx} is not a corner");
                assert!(immutable[idx]);
                assert_eq!(landscape.agb()[idx], 0.0);
            }
        }
    }

    #[test]
    fn test_partial_depletion_meets_demand_exactly() {
        let mut landscape = half_forest(6, 4);
        let (report, _) = run(250.0, HarvestMode::PartialDepletion, &mut landscape);

        assert_eq!(report.cells_deforested, 2);
        assert_eq!(report.cells_depleted, 1);
        assert_relative_eq!(*report.harvested, 250.0);
        assert_eq!(landscape.area(LandUseType::DisturbedForest), 1);
        let depleted = (0..landscape.len())
            .find(|&i| landscape.land_use_at(i) == LandUseType::DisturbedForest)
            .unwrap();
        assert_relative_eq!(landscape.agb()[depleted], 50.0);
    }

    #[test]
    fn test_harvest_proceeds_inward_and_reports_unmet() {
        let mut landscape = half_forest(6, 4);
        let (report, _) = run(5000.0, HarvestMode::WholeCell, &mut landscape);

        // 12 forest cells, 100 Mg each, all reachable round by round
        assert_eq!(report.cells_deforested, 12);
        assert_relative_eq!(*report.harvested, 1200.0);
        assert_relative_eq!(*report.unmet, 3800.0);
        assert!(report.iterations >= 2);
    }

    #[test]
    fn test_forest_reaching_map_edge_is_harvestable() {
        let mut landscape = Landscape::new(
            Raster::filled(5, 5, LandUseType::UndisturbedForest),
            Raster::filled(5, 5, 100.0),
            3,
        )
        .unwrap();
        let (report, _) = run(100.0, HarvestMode::WholeCell, &mut landscape);

        assert_eq!(report.cells_deforested, 1);
        assert_relative_eq!(*report.harvested, 100.0);
        assert_eq!(*report.unmet, 0.0);
        let cut = (0..landscape.len())
            .find(|&i| landscape.land_use_at(i) == LandUseType::NetForestDeforested)
            .unwrap();
        assert!([0, 4, 20, 24].contains(&cut));
    }

    /// Settlement at (0, 2) of a 9x5 forest
    fn settled_forest() -> Landscape {
        let land_use = Raster::from_fn(9, 5, |x, y| {
            if (x, y) == (0, 2) {
                LandUseType::BuiltUp
            } else {
                LandUseType::UndisturbedForest
            }
        });
        Landscape::new(land_use, Raster::filled(9, 5, 100.0), 3).unwrap()
    }

    #[test]
    fn test_settlement_buffer_is_cut_before_exposed_corners() {
        let mut landscape = settled_forest();
        let (report, _) = run_with_radius(200.0, HarvestMode::WholeCell, Some(100.0), &mut landscape);

        assert_relative_eq!(*report.harvested_locally, 200.0);
        assert_relative_eq!(*report.harvested, 200.0);
        // (0, 1) and (0, 3) lie one cell from the settlement
        assert_eq!(landscape.land_use_at(9), LandUseType::NetForestDeforested);
        assert_eq!(landscape.land_use_at(27), LandUseType::NetForestDeforested);
        for corner in [0, 8, 36, 44] {
            assert_eq!(landscape.land_use_at(corner), LandUseType::UndisturbedForest);
        }
    }

    #[test]
    fn test_without_buffer_exposed_corners_go_first() {
        let mut landscape = settled_forest();
        let (report, _) = run(200.0, HarvestMode::WholeCell, &mut landscape);

        assert_eq!(*report.harvested_locally, 0.0);
        assert_relative_eq!(*report.harvested, 200.0);
        for idx in 0..landscape.len() {
            if landscape.land_use_at(idx) == LandUseType::NetForestDeforested {
                assert!([0, 8, 36, 44].contains(&idx), "cell {idx} is not a corner");
            }
        }
    }

    #[test]
    fn test_buffer_shortfall_continues_across_landscape() {
        let mut landscape = settled_forest();
        let (report, _) = run_with_radius(500.0, HarvestMode::WholeCell, Some(100.0), &mut landscape);

        // Three forest cells lie within 100 m of the settlement
        assert_relative_eq!(*report.harvested_locally, 300.0);
        assert_relative_eq!(*report.harvested, 500.0);
        assert_eq!(*report.unmet, 0.0);
    }
}
