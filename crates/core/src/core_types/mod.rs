//! Core types and utilities

pub mod demand;
pub mod land_use;
pub mod units;

pub use demand::{Demand, DemandRecord};
pub use land_use::{LandUseType, PnvClass};
pub use units::{Megagrams, YieldUnits};
