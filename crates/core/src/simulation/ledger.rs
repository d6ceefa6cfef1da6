//! Run ledger
//!
//! Per-sample, per-step summaries collected by whoever drives the
//! simulation. The core never writes to process-wide state; everything a
//! run reports ends up in a [`RunLedger`] the caller owns.

use crate::allocation::{AllocationReport, HarvestReport};
use crate::core_types::{LandUseType, Megagrams};
use crate::succession::ForestTrend;
use serde::Serialize;
use std::collections::BTreeMap;

/// Raster-free summary of one time step
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepSummary {
    pub sample: u32,
    pub step: u32,
    /// Cells per class after the step
    pub areas: BTreeMap<LandUseType, usize>,
    pub allocations: Vec<AllocationReport>,
    pub harvest: HarvestReport,
    pub plantation_harvested: usize,
    pub succession_transitions: usize,
    pub fringe_downgrades: usize,
    pub conflicts: usize,
    pub forest_trends: BTreeMap<ForestTrend, usize>,
    pub total_agb: Megagrams,
}

impl StepSummary {
    /// Unmet demand per type (cells or yield units), leaking types only
    pub fn leakage(&self) -> BTreeMap<LandUseType, f64> {
        self.allocations
            .iter()
            .filter(|report| report.is_leakage())
            .map(|report| (report.land_use, report.residual))
            .collect()
    }
}

/// Results of a whole run, keyed by sample
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunLedger {
    samples: BTreeMap<u32, Vec<StepSummary>>,
}

impl RunLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a step summary to its sample
    pub fn record(&mut self, summary: StepSummary) {
        self.samples.entry(summary.sample).or_default().push(summary);
    }

    /// Append all steps of one sample
    pub fn record_sample(&mut self, summaries: impl IntoIterator<Item = StepSummary>) {
        for summary in summaries {
            self.record(summary);
        }
    }

    pub fn sample(&self, sample: u32) -> Option<&[StepSummary]> {
        self.samples.get(&sample).map(Vec::as_slice)
    }

    pub fn sample_count(&self) -> usize {
        self.samples.len()
    }

    /// Iterate over `(sample, steps)` in sample order
    pub fn iter(&self) -> impl Iterator<Item = (u32, &[StepSummary])> {
        self.samples.iter().map(|(&sample, steps)| (sample, steps.as_slice()))
    }

    /// Final step of every sample
    pub fn final_steps(&self) -> impl Iterator<Item = &StepSummary> {
        self.samples.values().filter_map(|steps| steps.last())
    }
}
