//! Simulation configuration
//!
//! Loaded from JSON (`serde_json`) with `#[serde(default)]` fallbacks, then
//! validated once by [`SimulationConfig::validate`], which resolves the
//! per-type [`StrategyTable`]. Invalid configuration fails here, before any
//! time step runs.

mod strategy;

pub use strategy::{DemandMode, LandUseStrategy, ShrinkRule, StrategyTable};

use crate::core_types::{LandUseType, PnvClass};
use crate::suitability::{DistanceRelation, SuitabilityFactor, WeightedFactor};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Built-in demo configuration
pub const BUILTIN_SIMULATION_CONFIG: &str = include_str!("../data/simulation_config.json");

/// Tolerance on the sum of factor weights
const WEIGHT_SUM_TOLERANCE: f32 = 1e-3;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse simulation config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("failed to read simulation config from {path:?}: {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("land-use type {0} is listed more than once")]
    DuplicateLandUseType(LandUseType),
    #[error("land-use type {0} cannot receive demand")]
    NotAllocatable(LandUseType),
    #[error("active land-use type {0} has no configuration entry")]
    MissingLandUseTypeConfig(LandUseType),
    #[error("land-use type {0} has no suitability factors")]
    NoFactors(LandUseType),
    #[error("factor weights of {land_use} sum to {sum}, expected 1")]
    WeightsDoNotSum { land_use: LandUseType, sum: f32 },
    #[error("factor `{factor}` of {land_use} is invalid: {reason}")]
    InvalidFactor {
        land_use: LandUseType,
        factor: &'static str,
        reason: String,
    },
    #[error("slope range of {land_use} is invalid: difficult_min={min}, difficult_max={max}")]
    InvalidSlopeRange {
        land_use: LandUseType,
        min: f32,
        max: f32,
    },
    #[error("maximum yield per cell of {land_use} must be finite and positive, got {value}")]
    InvalidYield { land_use: LandUseType, value: f64 },
    #[error("plantation needs a rotation period of at least one year")]
    MissingRotationPeriod,
    #[error("succession rule {from} -> {to} is invalid: {reason}")]
    InvalidSuccessionRule {
        from: LandUseType,
        to: LandUseType,
        reason: String,
    },
    #[error("more than one succession rule leaves {from} on {pnv:?} potential vegetation")]
    DuplicateSuccessionRule { from: LandUseType, pnv: PnvClass },
    #[error("degradation thresholds must satisfy 0 < lower < upper < 1, got lower={lower}, upper={upper}")]
    InvalidDegradationThresholds { lower: f32, upper: f32 },
    #[error("AGB increment range for {class} is invalid: [{min}, {max}]")]
    InvalidIncrementRange {
        class: &'static str,
        min: f32,
        max: f32,
    },
    #[error("spatially explicit AGB increments selected but climate period starting at step {start_step} has no increment rasters")]
    MissingIncrementLayers { start_step: u32 },
    #[error("`{name}` must be finite and positive, got {value}")]
    InvalidScalar { name: &'static str, value: f64 },
}

/// Policy scenario controlling access to legally restricted zones
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scenario {
    /// Restricted zones are a last resort; using them is a recorded conflict
    #[default]
    WeakConservation,
    /// Restricted zones are never allocated
    EnforcedConservation,
    /// Restrictions are ignored ("worst case")
    NoConservation,
}

/// Whether biomass extraction runs before or after active-type allocation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeforestationOrder {
    BeforeActiveTypes,
    #[default]
    AfterActiveTypes,
}

/// Difficult-terrain slope range of a land-use type (degrees)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SlopeRange {
    pub difficult_min: f32,
    pub difficult_max: f32,
}

/// Configuration of one active land-use type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LandUseTypeConfig {
    pub land_use: LandUseType,
    #[serde(default)]
    pub factors: Vec<WeightedFactor>,
    /// Classes counted together with this type by the neighbour-density factor
    #[serde(default)]
    pub related_types: Vec<LandUseType>,
    /// No slope restriction when absent
    #[serde(default)]
    pub slope: Option<SlopeRange>,
    /// Enables the yield approach for this type
    #[serde(default)]
    pub max_yield_per_cell: Option<f64>,
    /// Classes this type may not convert
    #[serde(default = "default_protected_types")]
    pub protected_types: Vec<LandUseType>,
    /// Mean plantation rotation in years (plantation only)
    #[serde(default)]
    pub rotation_period: Option<u32>,
}

fn default_protected_types() -> Vec<LandUseType> {
    vec![LandUseType::BuiltUp]
}

impl LandUseTypeConfig {
    fn footprint(land_use: LandUseType, factors: Vec<WeightedFactor>, slope: Option<SlopeRange>) -> Self {
        Self {
            land_use,
            factors,
            related_types: Vec::new(),
            slope,
            max_yield_per_cell: None,
            protected_types: default_protected_types(),
            rotation_period: None,
        }
    }
}

/// Age-driven succession transition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuccessionRule {
    pub from: LandUseType,
    pub to: LandUseType,
    /// Potential natural vegetation classes the rule applies on
    pub pnv: Vec<PnvClass>,
    /// Age (years in `from`) at which the transition happens
    pub age_threshold: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SuccessionConfig {
    pub rules: Vec<SuccessionRule>,
}

impl Default for SuccessionConfig {
    fn default() -> Self {
        use LandUseType as L;
        let all = vec![PnvClass::Grassland, PnvClass::Shrubland, PnvClass::Forest];
        let mut rules: Vec<SuccessionRule> = [
            (L::CroplandAnnualAbandoned, 3),
            (L::PastureAbandoned, 2),
            (L::AgroforestryAbandoned, 3),
            (L::NetForestDeforested, 2),
            (L::PlantationDeforested, 2),
        ]
        .into_iter()
        .map(|(from, age_threshold)| SuccessionRule {
            from,
            to: L::HerbaceousVegetation,
            pnv: all.clone(),
            age_threshold,
        })
        .collect();
        rules.push(SuccessionRule {
            from: L::HerbaceousVegetation,
            to: L::Shrubs,
            pnv: vec![PnvClass::Shrubland, PnvClass::Forest],
            age_threshold: 5,
        });
        rules.push(SuccessionRule {
            from: L::Shrubs,
            to: L::DisturbedForest,
            pnv: vec![PnvClass::Forest],
            age_threshold: 10,
        });
        rules.push(SuccessionRule {
            from: L::DisturbedForest,
            to: L::UndisturbedForest,
            pnv: vec![PnvClass::Forest],
            age_threshold: 40,
        });
        Self { rules }
    }
}

/// Source of annual AGB increments
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IncrementMode {
    /// Climate-period increment rasters from the static layers
    SpatiallyExplicit,
    /// One increment per class drawn per run from a configured range
    #[default]
    Stochastic,
}

/// `[min, max]` AGB increment ranges (Mg per cell per year)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StochasticIncrements {
    pub undisturbed_forest: (f32, f32),
    pub disturbed_forest: (f32, f32),
    pub plantation: (f32, f32),
    pub agroforestry: (f32, f32),
}

impl Default for StochasticIncrements {
    fn default() -> Self {
        Self {
            undisturbed_forest: (1.0, 3.0),
            disturbed_forest: (2.5, 5.0),
            plantation: (6.0, 10.0),
            agroforestry: (2.0, 4.0),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BiomassConfig {
    pub increment_mode: IncrementMode,
    pub stochastic_increments: StochasticIncrements,
    /// Mean years for regrowth to reach the disturbed-forest state; scales
    /// the AGB seed of cells entering disturbed forest
    pub years_to_disturbed_forest: f32,
}

impl Default for BiomassConfig {
    fn default() -> Self {
        Self {
            increment_mode: IncrementMode::default(),
            stochastic_increments: StochasticIncrements::default(),
            years_to_disturbed_forest: 10.0,
        }
    }
}

/// How a biomass demand maps onto selected cells
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HarvestMode {
    /// Every cell selected by the running sum is fully deforested; may
    /// overshoot demand by up to one cell's AGB
    #[default]
    WholeCell,
    /// The cell crossing the threshold only loses the remainder
    PartialDepletion,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HarvestConfig {
    pub mode: HarvestMode,
    /// Radius (m) around settlements harvested first; disabled when absent
    pub local_consumption_radius: Option<f32>,
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self {
            mode: HarvestMode::WholeCell,
            local_consumption_radius: Some(1000.0),
        }
    }
}

/// Fractions of potential AGB separating degradation/regeneration classes
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DegradationThresholds {
    pub lower: f32,
    pub upper: f32,
}

impl Default for DegradationThresholds {
    fn default() -> Self {
        Self {
            lower: 0.33,
            upper: 0.66,
        }
    }
}

/// Complete configuration of a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub seed: u64,
    /// Monte Carlo samples
    pub samples: u32,
    /// Annual time steps per sample
    pub time_steps: u32,
    /// Cell edge length in meters
    pub cell_size: f32,
    pub scenario: Scenario,
    /// Allocation priority order within a time step
    pub active_land_use_types: Vec<LandUseType>,
    pub land_use_types: Vec<LandUseTypeConfig>,
    pub succession: SuccessionConfig,
    pub biomass: BiomassConfig,
    pub harvest: HarvestConfig,
    pub degradation: DegradationThresholds,
    pub deforestation_order: DeforestationOrder,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        use DistanceRelation as R;
        use LandUseType as L;
        use SuitabilityFactor as F;

        let neighbor = |window| F::NeighborDensity {
            window,
            window_jitter: 0,
        };

        let land_use_types = vec![
            LandUseTypeConfig::footprint(
                L::BuiltUp,
                vec![
                    WeightedFactor::new(0.4, neighbor(3)),
                    WeightedFactor::new(
                        0.3,
                        F::DistanceToStreets {
                            relation: R::Linear,
                            max_distance: 2000.0,
                        },
                    ),
                    WeightedFactor::new(
                        0.3,
                        F::DistanceToCities {
                            relation: R::InverseProportional,
                            max_distance: 5000.0,
                        },
                    ),
                ],
                Some(SlopeRange {
                    difficult_min: 10.0,
                    difficult_max: 25.0,
                }),
            ),
            LandUseTypeConfig::footprint(
                L::CroplandAnnual,
                vec![
                    WeightedFactor::new(0.35, neighbor(3)),
                    WeightedFactor::new(
                        0.25,
                        F::DistanceToStreets {
                            relation: R::Exponential,
                            max_distance: 3000.0,
                        },
                    ),
                    WeightedFactor::new(
                        0.25,
                        F::DistanceToSettlements {
                            relation: R::Linear,
                            max_distance: 4000.0,
                            max_distance_range: None,
                        },
                    ),
                    WeightedFactor::new(0.15, F::DistanceToForestEdge),
                ],
                Some(SlopeRange {
                    difficult_min: 8.0,
                    difficult_max: 15.0,
                }),
            ),
            LandUseTypeConfig::footprint(
                L::Pasture,
                vec![
                    WeightedFactor::new(0.4, neighbor(3)),
                    WeightedFactor::new(
                        0.3,
                        F::DistanceToFreshwater {
                            relation: R::Linear,
                            max_distance: 3000.0,
                        },
                    ),
                    WeightedFactor::new(
                        0.3,
                        F::CurrentLandUse {
                            preferences: BTreeMap::from([
                                (L::HerbaceousVegetation, 1.0),
                                (L::PastureAbandoned, 1.0),
                                (L::Shrubs, 0.6),
                                (L::DisturbedForest, 0.3),
                            ]),
                        },
                    ),
                ],
                Some(SlopeRange {
                    difficult_min: 15.0,
                    difficult_max: 30.0,
                }),
            ),
            LandUseTypeConfig::footprint(
                L::Agroforestry,
                vec![
                    WeightedFactor::new(0.3, neighbor(3)),
                    WeightedFactor::new(
                        0.3,
                        F::DistanceToSettlements {
                            relation: R::InverseProportional,
                            max_distance: 5000.0,
                            max_distance_range: None,
                        },
                    ),
                    WeightedFactor::new(0.4, F::DistanceToForestEdge),
                ],
                Some(SlopeRange {
                    difficult_min: 20.0,
                    difficult_max: 40.0,
                }),
            ),
            LandUseTypeConfig {
                rotation_period: Some(15),
                ..LandUseTypeConfig::footprint(
                    L::Plantation,
                    vec![
                        WeightedFactor::new(0.5, neighbor(3)),
                        WeightedFactor::new(
                            0.5,
                            F::DistanceToStreets {
                                relation: R::Linear,
                                max_distance: 5000.0,
                            },
                        ),
                    ],
                    Some(SlopeRange {
                        difficult_min: 20.0,
                        difficult_max: 35.0,
                    }),
                )
            },
        ];

        Self {
            seed: 42,
            samples: 1,
            time_steps: 30,
            cell_size: 100.0,
            scenario: Scenario::default(),
            active_land_use_types: vec![
                L::BuiltUp,
                L::CroplandAnnual,
                L::Pasture,
                L::Agroforestry,
                L::Plantation,
            ],
            land_use_types,
            succession: SuccessionConfig::default(),
            biomass: BiomassConfig::default(),
            harvest: HarvestConfig::default(),
            degradation: DegradationThresholds::default(),
            deforestation_order: DeforestationOrder::default(),
        }
    }
}

impl SimulationConfig {
    /// The built-in demo configuration
    pub fn builtin() -> Self {
        serde_json::from_str(BUILTIN_SIMULATION_CONFIG)
            .expect("builtin simulation config should parse")
    }

    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::ReadFailed {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&contents)
    }

    /// Configuration entry of a type, if present
    pub fn land_use_type(&self, land_use: LandUseType) -> Option<&LandUseTypeConfig> {
        self.land_use_types.iter().find(|c| c.land_use == land_use)
    }

    /// Mutable configuration entry of a type, if present
    pub fn land_use_type_mut(&mut self, land_use: LandUseType) -> Option<&mut LandUseTypeConfig> {
        self.land_use_types.iter_mut().find(|c| c.land_use == land_use)
    }

    /// Validate every section and resolve the per-type strategy table.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] found.
    pub fn validate(&self) -> Result<StrategyTable, ConfigError> {
        positive("cell_size", f64::from(self.cell_size))?;
        positive(
            "biomass.years_to_disturbed_forest",
            f64::from(self.biomass.years_to_disturbed_forest),
        )?;
        if let Some(radius) = self.harvest.local_consumption_radius {
            positive("harvest.local_consumption_radius", f64::from(radius))?;
        }

        let DegradationThresholds { lower, upper } = self.degradation;
        if !(0.0 < lower && lower < upper && upper < 1.0) {
            return Err(ConfigError::InvalidDegradationThresholds { lower, upper });
        }

        let increments = &self.biomass.stochastic_increments;
        for (class, (min, max)) in [
            ("undisturbed_forest", increments.undisturbed_forest),
            ("disturbed_forest", increments.disturbed_forest),
            ("plantation", increments.plantation),
            ("agroforestry", increments.agroforestry),
        ] {
            if !(min.is_finite() && max.is_finite() && 0.0 <= min && min <= max) {
                return Err(ConfigError::InvalidIncrementRange { class, min, max });
            }
        }

        self.validate_succession()?;
        StrategyTable::resolve(self)
    }

    fn validate_succession(&self) -> Result<(), ConfigError> {
        let mut seen: Vec<(LandUseType, PnvClass)> = Vec::new();
        for rule in &self.succession.rules {
            let invalid = |reason: &str| ConfigError::InvalidSuccessionRule {
                from: rule.from,
                to: rule.to,
                reason: reason.to_string(),
            };
            if !rule.from.tracks_succession_age() {
                return Err(invalid("source class does not track succession age"));
            }
            if rule.age_threshold == 0 {
                return Err(invalid("age threshold must be at least 1"));
            }
            if rule.pnv.is_empty() {
                return Err(invalid("rule applies to no potential vegetation class"));
            }
            for &pnv in &rule.pnv {
                if succession_rank(rule.to) > succession_rank(pnv.succession_ceiling()) {
                    return Err(invalid("target exceeds the potential natural vegetation"));
                }
                if seen.contains(&(rule.from, pnv)) {
                    return Err(ConfigError::DuplicateSuccessionRule {
                        from: rule.from,
                        pnv,
                    });
                }
                seen.push((rule.from, pnv));
            }
        }
        Ok(())
    }
}

/// Position in the natural succession chain (non-natural classes rank 0)
pub(crate) fn succession_rank(land_use: LandUseType) -> u8 {
    match land_use {
        LandUseType::Shrubs => 1,
        LandUseType::DisturbedForest => 2,
        LandUseType::UndisturbedForest => 3,
        _ => 0,
    }
}

fn positive(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::InvalidScalar { name, value })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_validates() {
        let config = SimulationConfig::default();
        let table = config.validate().unwrap();
        assert_eq!(table.order().len(), 5);
        assert_eq!(table.order()[0], LandUseType::BuiltUp);
    }

    #[test]
    fn test_builtin_config_parses_and_validates() {
        let config = SimulationConfig::builtin();
        let table = config.validate().unwrap();
        let cropland = table.get(LandUseType::CroplandAnnual).unwrap();
        assert!(matches!(cropland.demand_mode, DemandMode::Yield { .. }));
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = SimulationConfig::from_json_str(r#"{"seed": 7, "scenario": "no_conservation"}"#).unwrap();
        assert_eq!(config.seed, 7);
        assert_eq!(config.scenario, Scenario::NoConservation);
        assert_eq!(config.land_use_types.len(), 5);
    }

    #[test]
    fn test_unknown_factor_fails_to_parse() {
        let json = r#"{"land_use_types": [{"land_use": "pasture", "factors": [{"weight": 1.0, "factor": {"kind": "factor_99"}}]}]}"#;
        assert!(matches!(
            SimulationConfig::from_json_str(json),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_bad_weights_rejected() {
        let mut config = SimulationConfig::default();
        config.land_use_type_mut(LandUseType::Pasture).unwrap().factors[0].weight = 0.9;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::WeightsDoNotSum { land_use: LandUseType::Pasture, .. })
        ));
    }

    #[test]
    fn test_bad_degradation_thresholds_rejected() {
        let mut config = SimulationConfig::default();
        config.degradation = DegradationThresholds {
            lower: 0.7,
            upper: 0.5,
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidDegradationThresholds { .. })
        ));
    }

    #[test]
    fn test_succession_beyond_pnv_rejected() {
        let mut config = SimulationConfig::default();
        config.succession.rules.push(SuccessionRule {
            from: LandUseType::Shrubs,
            to: LandUseType::DisturbedForest,
            pnv: vec![PnvClass::Grassland],
            age_threshold: 3,
        });
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidSuccessionRule { .. })
        ));
    }

    #[test]
    fn test_duplicate_succession_rule_rejected() {
        let mut config = SimulationConfig::default();
        config.succession.rules.push(SuccessionRule {
            from: LandUseType::HerbaceousVegetation,
            to: LandUseType::Shrubs,
            pnv: vec![PnvClass::Forest],
            age_threshold: 8,
        });
        assert!(matches!(
            config.validate(),
            Err(ConfigError::DuplicateSuccessionRule { .. })
        ));
    }
}
