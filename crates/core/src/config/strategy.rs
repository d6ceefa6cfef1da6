//! Per-type allocation strategy, resolved once from the configuration
//!
//! The allocator never branches on class codes: everything that differs
//! between active types (factors, slope range, demand mode, shrink behavior,
//! plantation rotation) is looked up here.

use super::{ConfigError, SimulationConfig, SlopeRange, WEIGHT_SUM_TOLERANCE};
use crate::core_types::LandUseType;
use crate::suitability::{SuitabilityFactor, WeightedFactor};
use rustc_hash::FxHashMap;

/// How demand for a type is expressed
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DemandMode {
    /// Demand is a cell count
    Footprint,
    /// Demand is in yield units; a cell delivers
    /// `max_yield_per_cell * potential_yield_fraction`
    Yield { max_yield_per_cell: f64 },
}

/// What happens to surplus cells when demand drops
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShrinkRule {
    AbandonTo(LandUseType),
    /// Terminal land use, surplus is kept
    Never,
}

/// Everything the allocator needs to know about one active type
#[derive(Debug, Clone, PartialEq)]
pub struct LandUseStrategy {
    pub land_use: LandUseType,
    pub factors: Vec<WeightedFactor>,
    /// Classes counted as the same type for neighbour density (includes the
    /// type itself)
    pub related_types: Vec<LandUseType>,
    pub slope: Option<SlopeRange>,
    pub demand_mode: DemandMode,
    pub shrink: ShrinkRule,
    pub protected_types: Vec<LandUseType>,
    pub rotation_period: Option<u32>,
}

/// Strategies of all active types in allocation priority order
#[derive(Debug, Clone, Default)]
pub struct StrategyTable {
    order: Vec<LandUseType>,
    strategies: FxHashMap<LandUseType, LandUseStrategy>,
}

impl StrategyTable {
    pub(super) fn resolve(config: &SimulationConfig) -> Result<Self, ConfigError> {
        let mut table = StrategyTable::default();

        for &land_use in &config.active_land_use_types {
            if !land_use.is_active() {
                return Err(ConfigError::NotAllocatable(land_use));
            }
            if table.strategies.contains_key(&land_use) {
                return Err(ConfigError::DuplicateLandUseType(land_use));
            }
            let entry = config
                .land_use_type(land_use)
                .ok_or(ConfigError::MissingLandUseTypeConfig(land_use))?;

            let demand_mode = match entry.max_yield_per_cell {
                None => DemandMode::Footprint,
                Some(value) if value.is_finite() && value > 0.0 => DemandMode::Yield {
                    max_yield_per_cell: value,
                },
                Some(value) => return Err(ConfigError::InvalidYield { land_use, value }),
            };

            validate_factors(land_use, &entry.factors, demand_mode)?;

            if let Some(slope) = entry.slope {
                let SlopeRange {
                    difficult_min: min,
                    difficult_max: max,
                } = slope;
                if !(0.0 <= min && min <= max && max <= 90.0) {
                    return Err(ConfigError::InvalidSlopeRange { land_use, min, max });
                }
            }

            let rotation_period = if land_use == LandUseType::Plantation {
                match entry.rotation_period {
                    Some(period) if period > 0 => Some(period),
                    _ => return Err(ConfigError::MissingRotationPeriod),
                }
            } else {
                None
            };

            let shrink = land_use
                .abandoned_class()
                .map_or(ShrinkRule::Never, ShrinkRule::AbandonTo);

            let mut related_types = vec![land_use];
            related_types.extend(entry.related_types.iter().filter(|&&lut| lut != land_use));

            table.order.push(land_use);
            table.strategies.insert(
                land_use,
                LandUseStrategy {
                    land_use,
                    factors: entry.factors.clone(),
                    related_types,
                    slope: entry.slope,
                    demand_mode,
                    shrink,
                    protected_types: entry.protected_types.clone(),
                    rotation_period,
                },
            );
        }

        Ok(table)
    }

    /// Active types in allocation priority order
    pub fn order(&self) -> &[LandUseType] {
        &self.order
    }

    pub fn get(&self, land_use: LandUseType) -> Option<&LandUseStrategy> {
        self.strategies.get(&land_use)
    }

    /// Strategies in allocation priority order
    pub fn iter(&self) -> impl Iterator<Item = &LandUseStrategy> {
        self.order.iter().filter_map(|lut| self.strategies.get(lut))
    }
}

fn validate_factors(
    land_use: LandUseType,
    factors: &[WeightedFactor],
    demand_mode: DemandMode,
) -> Result<(), ConfigError> {
    if factors.is_empty() {
        return Err(ConfigError::NoFactors(land_use));
    }

    let sum: f32 = factors.iter().map(|f| f.weight).sum();
    if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
        return Err(ConfigError::WeightsDoNotSum { land_use, sum });
    }

    for weighted in factors {
        let invalid = |reason: String| ConfigError::InvalidFactor {
            land_use,
            factor: weighted.factor.name(),
            reason,
        };
        if !(weighted.weight.is_finite() && weighted.weight >= 0.0) {
            return Err(invalid(format!("weight {} is negative", weighted.weight)));
        }
        match &weighted.factor {
            SuitabilityFactor::NeighborDensity { window, .. } => {
                if *window < 3 || window % 2 == 0 {
                    return Err(invalid(format!("window {window} must be odd and at least 3")));
                }
            }
            SuitabilityFactor::DistanceToStreets { max_distance, .. }
            | SuitabilityFactor::DistanceToFreshwater { max_distance, .. }
            | SuitabilityFactor::DistanceToCities { max_distance, .. } => {
                if !(max_distance.is_finite() && *max_distance > 0.0) {
                    return Err(invalid(format!("max distance {max_distance} must be positive")));
                }
            }
            SuitabilityFactor::DistanceToSettlements {
                max_distance,
                max_distance_range,
                ..
            } => {
                if !(max_distance.is_finite() && *max_distance > 0.0) {
                    return Err(invalid(format!("max distance {max_distance} must be positive")));
                }
                if let Some((low, high)) = max_distance_range {
                    if !(low.is_finite() && high.is_finite() && 0.0 < *low && low <= high) {
                        return Err(invalid(format!("max distance range [{low}, {high}] is invalid")));
                    }
                }
            }
            SuitabilityFactor::CurrentLandUse { preferences } => {
                if let Some((class, value)) = preferences.iter().find(|(_, v)| !(0.0..=1.0).contains(*v)) {
                    return Err(invalid(format!("preference {value} for {class} is outside [0, 1]")));
                }
            }
            SuitabilityFactor::PotentialYield { friction } => {
                if !matches!(demand_mode, DemandMode::Yield { .. }) {
                    return Err(invalid(
                        "only available to types with a maximum yield per cell".to_string(),
                    ));
                }
                if !(friction.is_finite() && *friction >= 0.0) {
                    return Err(invalid(format!("friction {friction} must be non-negative")));
                }
            }
            SuitabilityFactor::PopulationDensity | SuitabilityFactor::DistanceToForestEdge => {}
        }
    }
    Ok(())
}
