//! Demand providers
//!
//! The allocator consumes one [`DemandRecord`] per time step. Where it comes
//! from is up to the provider: an explicit schedule, a population-driven
//! per-capita model or any closure `Fn(u32) -> DemandRecord`.

use crate::core_types::{Demand, DemandRecord, LandUseType, Megagrams, YieldUnits};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Source of per-step demand
pub trait DemandProvider: Send + Sync {
    /// Demand for a (1-based) time step
    fn demand(&self, step: u32) -> DemandRecord;
}

impl<F> DemandProvider for F
where
    F: Fn(u32) -> DemandRecord + Send + Sync,
{
    fn demand(&self, step: u32) -> DemandRecord {
        self(step)
    }
}

/// Explicit demand table.
///
/// A step without its own entry reuses the closest earlier entry; steps
/// before the first entry have no demand.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DemandSchedule {
    steps: BTreeMap<u32, DemandRecord>,
}

impl DemandSchedule {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert of the record for `step`
    pub fn with_step(mut self, step: u32, record: DemandRecord) -> Self {
        self.steps.insert(step, record);
        self
    }

    pub fn insert(&mut self, step: u32, record: DemandRecord) {
        self.steps.insert(step, record);
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

impl DemandProvider for DemandSchedule {
    fn demand(&self, step: u32) -> DemandRecord {
        self.steps
            .range(..=step)
            .next_back()
            .map(|(_, record)| record.clone())
            .unwrap_or_default()
    }
}

/// Per-capita requirement of one type
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PerCapita {
    /// Cells per person, rounded up to whole cells
    Cells(f64),
    /// Yield units per person
    Yield(f64),
}

/// Demand derived from a population growing at a constant annual rate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerCapitaDemand {
    /// Population at step 1
    pub initial_population: f64,
    /// Annual growth rate (0.02 = 2 % per year)
    pub growth_rate: f64,
    pub per_capita: BTreeMap<LandUseType, PerCapita>,
    /// AGB extracted per person and year (Mg)
    #[serde(default)]
    pub agb_per_capita: f64,
}

impl PerCapitaDemand {
    /// Population at a (1-based) time step
    pub fn population(&self, step: u32) -> f64 {
        let years = f64::from(step.saturating_sub(1));
        (self.initial_population * (1.0 + self.growth_rate).powf(years)).max(0.0)
    }
}

impl DemandProvider for PerCapitaDemand {
    fn demand(&self, step: u32) -> DemandRecord {
        let population = self.population(step);
        let quantities = self
            .per_capita
            .iter()
            .map(|(&land_use, &coefficient)| {
                let demand = match coefficient {
                    PerCapita::Cells(cells) => Demand::Cells((population * cells).max(0.0).ceil() as usize),
                    PerCapita::Yield(units) => Demand::Yield(YieldUnits::new(population * units)),
                };
                (land_use, demand)
            })
            .collect();
        DemandRecord {
            quantities,
            agb: Megagrams::new((population * self.agb_per_capita).max(0.0)),
        }
    }
}
