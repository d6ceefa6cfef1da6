//! Per-type suitability rasters
//!
//! Static factors (distances to streets, freshwater and cities, population
//! density) are evaluated once per type when the calculator is built and
//! cached as a weighted base raster. Dynamic factors are evaluated against
//! the current landscape on every call and added to that base. The
//! landscape's tie-break perturbation is added last, then the sum is
//! normalized to [0, 1].

use super::factors::{yield_score, DistanceRelation, SuitabilityFactor};
use crate::config::{LandUseStrategy, StrategyTable};
use crate::core_types::LandUseType;
use crate::grid::{distance_to, fringe_mask, window_count, Landscape, Raster, StaticLayers};
use rand::Rng;
use rayon::prelude::*;
use rustc_hash::FxHashMap;
use std::collections::BTreeMap;

/// Guard against division by a near-zero range in [`normalize`]
pub const NORMALIZATION_EPSILON: f32 = 1e-6;

/// Min-max normalize a raster to [0, 1].
///
/// `(x - min) / max(max - min, ε)`; non-finite cells are ignored when
/// finding the range and map to 0.
#[must_use]
pub fn normalize(raster: &Raster<f32>) -> Raster<f32> {
    let (min, max) = raster
        .iter()
        .filter(|v| v.is_finite())
        .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });
    if min > max {
        return raster.map(|_| 0.0);
    }
    let range = (max - min).max(NORMALIZATION_EPSILON);
    raster.map(|&v| if v.is_finite() { (v - min) / range } else { 0.0 })
}

/// A dynamic factor with its per-run parameters fixed
#[derive(Debug, Clone)]
enum DynamicFactor {
    NeighborDensity {
        window: usize,
    },
    Settlements {
        relation: DistanceRelation,
        max_distance: f32,
    },
    ForestEdge,
    CurrentLandUse {
        preferences: BTreeMap<LandUseType, f32>,
    },
    PotentialYield {
        friction: f32,
    },
}

#[derive(Debug, Clone)]
struct TypeModel {
    static_base: Raster<f32>,
    dynamic: Vec<(f32, DynamicFactor)>,
    related_types: Vec<LandUseType>,
}

/// Suitability model for every active type of one sample
#[derive(Debug, Clone)]
pub struct SuitabilityCalculator {
    models: FxHashMap<LandUseType, TypeModel>,
}

impl SuitabilityCalculator {
    /// Build the per-type models and cache their static parts.
    ///
    /// Stochastic per-run parameters (neighbourhood window jitter,
    /// settlement max-distance resampling) are drawn from `rng` here and
    /// stay fixed for the lifetime of the calculator.
    ///
    /// # Arguments
    ///
    /// * `table` - Resolved strategy table
    /// * `layers` - Static layers of the study area
    /// * `rng` - Per-sample random number generator
    pub fn new(table: &StrategyTable, layers: &StaticLayers, rng: &mut impl Rng) -> Self {
        let models = table
            .iter()
            .map(|strategy| (strategy.land_use, build_model(strategy, layers, rng)))
            .collect();
        Self { models }
    }

    /// Suitability of every cell for `land_use` in the current landscape.
    ///
    /// Returns `None` if the type has no model (not an active type).
    ///
    /// # Arguments
    ///
    /// * `land_use` - Type to evaluate
    /// * `landscape` - Current landscape state
    /// * `layers` - Static layers
    /// * `step` - Current time step (selects the climate period)
    #[must_use]
    pub fn compute(
        &self,
        land_use: LandUseType,
        landscape: &Landscape,
        layers: &StaticLayers,
        step: u32,
    ) -> Option<Raster<f32>> {
        let model = self.models.get(&land_use)?;
        let width = landscape.width();
        let mut combined = model.static_base.clone();

        for (weight, factor) in &model.dynamic {
            let scores = dynamic_scores(factor, &model.related_types, landscape, layers, step);
            combined
                .as_mut_slice()
                .par_chunks_mut(width)
                .zip(scores.as_slice().par_chunks(width))
                .for_each(|(row, score_row)| {
                    for (cell, score) in row.iter_mut().zip(score_row) {
                        *cell += weight * score;
                    }
                });
        }

        combined
            .as_mut_slice()
            .par_iter_mut()
            .zip(landscape.tie_break().as_slice().par_iter())
            .for_each(|(cell, noise)| *cell += noise);

        Some(normalize(&combined))
    }

    /// Window side used for neighbour density of a type in this sample
    pub fn neighbor_window(&self, land_use: LandUseType) -> Option<usize> {
        self.models.get(&land_use)?.dynamic.iter().find_map(|(_, f)| match f {
            DynamicFactor::NeighborDensity { window } => Some(*window),
            _ => None,
        })
    }
}

fn build_model(strategy: &LandUseStrategy, layers: &StaticLayers, rng: &mut impl Rng) -> TypeModel {
    let mut static_base = Raster::filled(layers.width, layers.height, 0.0_f32);
    let mut dynamic = Vec::new();
    let cell_size = layers.cell_size;

    for weighted in &strategy.factors {
        let weight = weighted.weight;
        let distance_scores = |distances: &Raster<f32>, relation: DistanceRelation, max: f32| {
            distances.map(|&d| relation.score(d, max, cell_size))
        };
        let static_scores = match &weighted.factor {
            SuitabilityFactor::DistanceToStreets {
                relation,
                max_distance,
            } => Some(distance_scores(&layers.distance_to_streets, *relation, *max_distance)),
            SuitabilityFactor::DistanceToFreshwater {
                relation,
                max_distance,
            } => Some(distance_scores(&layers.distance_to_freshwater, *relation, *max_distance)),
            SuitabilityFactor::DistanceToCities {
                relation,
                max_distance,
            } => Some(distance_scores(&layers.distance_to_cities, *relation, *max_distance)),
            SuitabilityFactor::PopulationDensity => {
                let peak = layers
                    .population_density
                    .iter()
                    .copied()
                    .filter(|v| v.is_finite())
                    .fold(0.0_f32, f32::max);
                Some(layers.population_density.map(|&p| {
                    if peak > 0.0 && p.is_finite() {
                        (p / peak).max(0.0)
                    } else {
                        0.0
                    }
                }))
            }
            SuitabilityFactor::NeighborDensity {
                window,
                window_jitter,
            } => {
                let jitter = *window_jitter as i64;
                let offset = if jitter > 0 {
                    rng.random_range(-jitter..=jitter)
                } else {
                    0
                };
                let side = (*window as i64 + 2 * offset).max(3) as usize;
                dynamic.push((weight, DynamicFactor::NeighborDensity { window: side }));
                None
            }
            SuitabilityFactor::DistanceToSettlements {
                relation,
                max_distance,
                max_distance_range,
            } => {
                let max_distance = match max_distance_range {
                    Some((low, high)) if low < high => rng.random_range(*low..=*high),
                    _ => *max_distance,
                };
                dynamic.push((
                    weight,
                    DynamicFactor::Settlements {
                        relation: *relation,
                        max_distance,
                    },
                ));
                None
            }
            SuitabilityFactor::DistanceToForestEdge => {
                dynamic.push((weight, DynamicFactor::ForestEdge));
                None
            }
            SuitabilityFactor::CurrentLandUse { preferences } => {
                dynamic.push((
                    weight,
                    DynamicFactor::CurrentLandUse {
                        preferences: preferences.clone(),
                    },
                ));
                None
            }
            SuitabilityFactor::PotentialYield { friction } => {
                dynamic.push((weight, DynamicFactor::PotentialYield { friction: *friction }));
                None
            }
        };

        if let Some(scores) = static_scores {
            for (cell, score) in static_base.as_mut_slice().iter_mut().zip(scores.iter()) {
                *cell += weight * score;
            }
        }
    }

    TypeModel {
        static_base,
        dynamic,
        related_types: strategy.related_types.clone(),
    }
}

fn dynamic_scores(
    factor: &DynamicFactor,
    related_types: &[LandUseType],
    landscape: &Landscape,
    layers: &StaticLayers,
    step: u32,
) -> Raster<f32> {
    let cell_size = layers.cell_size;
    match factor {
        DynamicFactor::NeighborDensity { window } => {
            let related = landscape.mask_where(|lut| related_types.contains(&lut));
            let counts = window_count(&related, *window);
            let neighbours = (window * window - 1) as f32;
            Raster::from_fn(landscape.width(), landscape.height(), |x, y| {
                let idx = y * landscape.width() + x;
                let own = u32::from(related[idx]);
                (counts[idx] - own) as f32 / neighbours
            })
        }
        DynamicFactor::Settlements {
            relation,
            max_distance,
        } => {
            let settlements = landscape.mask_where(|lut| lut == LandUseType::BuiltUp);
            distance_to(&settlements, cell_size).map(|&d| relation.score(d, *max_distance, cell_size))
        }
        DynamicFactor::ForestEdge => {
            let forest = landscape.mask_where(LandUseType::is_net_forest);
            let edge = fringe_mask(&forest);
            distance_to(&edge, cell_size).map(|&d| {
                if d.is_finite() {
                    1.0 / (1.0 + d / cell_size)
                } else {
                    0.0
                }
            })
        }
        DynamicFactor::CurrentLandUse { preferences } => landscape
            .land_use()
            .map(|lut| preferences.get(lut).copied().unwrap_or(0.0)),
        DynamicFactor::PotentialYield { friction } => layers
            .climate_period(step)
            .potential_yield
            .map(|&fraction| yield_score(fraction, *friction)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SimulationConfig;
    use crate::grid::{ClimateLayers, StaticInputs};
    use crate::core_types::PnvClass;
    use crate::suitability::WeightedFactor;
    use approx::assert_relative_eq;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn flat_layers(width: usize, height: usize) -> StaticLayers {
        let inputs = StaticInputs {
            elevation: Raster::filled(width, height, 0.0),
            streets: Raster::from_fn(width, height, |x, _| x == 0),
            freshwater: Raster::filled(width, height, false),
            cities: Raster::filled(width, height, false),
            restricted: Raster::filled(width, height, false),
            pnv: Raster::filled(width, height, PnvClass::Forest),
            population_density: Raster::filled(width, height, 0.0),
            climate_periods: vec![ClimateLayers {
                start_step: 1,
                potential_agb: Raster::filled(width, height, 100.0),
                potential_yield: Raster::filled(width, height, 1.0),
                agb_increment: None,
            }],
        };
        StaticLayers::derive(inputs, 100.0).unwrap()
    }

    fn single_factor_table(factor: SuitabilityFactor) -> StrategyTable {
        let mut config = SimulationConfig::default();
        config.active_land_use_types = vec![LandUseType::BuiltUp];
        config.land_use_type_mut(LandUseType::BuiltUp).unwrap().factors =
            vec![WeightedFactor::new(1.0, factor)];
        config.validate().unwrap()
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let raster = Raster::from_vec(2, 2, vec![3.0, 7.0, 5.0, 4.0]).unwrap();
        let once = normalize(&raster);
        let twice = normalize(&once);
        for (a, b) in once.iter().zip(twice.iter()) {
            assert_relative_eq!(a, b);
        }
        assert_relative_eq!(once[0], 0.0);
        assert_relative_eq!(once[1], 1.0);
    }

    #[test]
    fn test_normalize_degenerate_range() {
        let raster = Raster::filled(3, 3, 0.5);
        assert!(normalize(&raster).iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_street_distance_prefers_near_cells() {
        let layers = flat_layers(6, 2);
        let table = single_factor_table(SuitabilityFactor::DistanceToStreets {
            relation: DistanceRelation::Linear,
            max_distance: 1000.0,
        });
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let calculator = SuitabilityCalculator::new(&table, &layers, &mut rng);
        let landscape = Landscape::without_biomass(Raster::filled(6, 2, LandUseType::Pasture), 1);

        let suitability = calculator
            .compute(LandUseType::BuiltUp, &landscape, &layers, 1)
            .unwrap();
        assert!(suitability.iter().all(|v| (0.0..=1.0).contains(v)));
        assert!(suitability[0] > suitability[3]);
        assert!(suitability[3] > suitability[5]);
        assert!(calculator
            .compute(LandUseType::Pasture, &landscape, &layers, 1)
            .is_none());
    }

    #[test]
    fn test_neighbor_density_counts_related_cells() {
        let layers = flat_layers(5, 5);
        let table = single_factor_table(SuitabilityFactor::NeighborDensity {
            window: 3,
            window_jitter: 0,
        });
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let calculator = SuitabilityCalculator::new(&table, &layers, &mut rng);
        assert_eq!(calculator.neighbor_window(LandUseType::BuiltUp), Some(3));

        let land_use = Raster::from_fn(5, 5, |x, y| {
            if x <= 1 && y <= 1 {
                LandUseType::BuiltUp
            } else {
                LandUseType::Pasture
            }
        });
        let landscape = Landscape::without_biomass(land_use, 2);
        let suitability = calculator
            .compute(LandUseType::BuiltUp, &landscape, &layers, 1)
            .unwrap();

        // (2, 2) touches one built-up cell, (4, 4) none
        assert!(suitability.get(2, 2).unwrap() > suitability.get(4, 4).unwrap());
    }

    #[test]
    fn test_window_jitter_stays_odd() {
        let layers = flat_layers(4, 4);
        let table = single_factor_table(SuitabilityFactor::NeighborDensity {
            window: 5,
            window_jitter: 2,
        });
        for seed in 0..20 {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let calculator = SuitabilityCalculator::new(&table, &layers, &mut rng);
            let window = calculator.neighbor_window(LandUseType::BuiltUp).unwrap();
            assert!(window >= 3 && window % 2 == 1 && window <= 9);
        }
    }
}
