//! Land-Use and Land-Cover Change Core Library
//!
//! A raster-based demand-allocation engine for land-use and land-cover change
//! (LULCC) projections. Each annual time step assigns active land-use types
//! (settlement, cropland, pasture, plantation) to grid cells so that their
//! area or yield demand is met, while forest ages through succession, gains
//! and loses above-ground biomass (AGB), and is cut to satisfy biomass demand.
//!
//! ## Structure
//!
//! - [`config`]: JSON configuration, validated into per-type strategies
//! - [`grid`]: rasters, static layers and the mutable landscape
//! - [`suitability`]: per-type weighted suitability surfaces
//! - [`allocation`]: tiered grow/shrink allocation, plantation rotation and
//!   biomass harvest
//! - [`succession`]: aging, state transitions, fringe disturbance and
//!   degradation classification
//! - [`biomass`]: AGB increments and growth
//! - [`demand`]: per-step demand providers
//! - [`simulation`]: the per-sample step loop and the parallel sample runner

// Core types and utilities
pub mod core_types;
pub mod config;
pub mod grid;

// Models
pub mod allocation;
pub mod biomass;
pub mod succession;
pub mod suitability;

// Drivers
pub mod demand;
pub mod simulation;

// Re-export core types
pub use core_types::{Demand, DemandRecord, LandUseType, Megagrams, PnvClass, YieldUnits};

// Re-export main entry points
pub use config::{ConfigError, Scenario, SimulationConfig, StrategyTable};
pub use demand::{DemandProvider, DemandSchedule, PerCapita, PerCapitaDemand};
pub use grid::{Landscape, Raster, StaticInputs, StaticLayers, SyntheticRegion};
pub use simulation::{run_samples, RunLedger, Simulation, SimulationError, StepDiagnostics, StepSummary};
