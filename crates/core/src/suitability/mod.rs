//! Land-use-type suitability model

pub mod calculator;
pub mod factors;

pub use calculator::{normalize, SuitabilityCalculator, NORMALIZATION_EPSILON};
pub use factors::{yield_score, DistanceRelation, SuitabilityFactor, WeightedFactor};
