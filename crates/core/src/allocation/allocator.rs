//! Demand allocator
//!
//! Grows or shrinks one land-use type's footprint to meet its demand,
//! cascading through the tier policy's degrees of limitation. Growth takes
//! the best-ranked candidates of a tier in one shot (footprint mode) or in
//! suitability bands until the yield target is met (yield mode). Shrink
//! abandons the least suitable cells of the type. Every cell touched becomes
//! immutable for the rest of the time step.
//!
//! Running out of land is never an error: the unmet part is reported as
//! leakage and dropped.

use super::diagnostics::{AllocationReport, Direction, TierOutcome};
use super::mask::build_mask;
use super::ranking::{RankOrder, Ranking};
use super::tier::{tier_policy, TierPolicy};
use crate::biomass::BiomassLedger;
use crate::config::{DemandMode, LandUseStrategy, Scenario, ShrinkRule};
use crate::core_types::{Demand, LandUseType};
use crate::grid::{Landscape, Raster, StaticLayers};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Hard ceiling on yield-mode iterations per allocation
pub const MAX_YIELD_ITERATIONS: u32 = 100;

/// Consecutive stalled shrink iterations before the band size doubles
pub const STALL_DOUBLING_INTERVAL: u32 = 40;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AllocationError {
    #[error("{0} is allocated by cell count but received a yield demand")]
    YieldDemandForFootprintType(LandUseType),
}

/// Mutable state threaded through every allocation of a time step
pub struct AllocationContext<'a> {
    pub landscape: &'a mut Landscape,
    pub layers: &'a StaticLayers,
    pub biomass: &'a BiomassLedger,
    /// Cells claimed earlier in this time step
    pub immutable: &'a mut Raster<bool>,
    pub step: u32,
}

impl AllocationContext<'_> {
    /// Give a cell to a type and lock it for the rest of the step
    fn claim(&mut self, strategy: &LandUseStrategy, idx: usize) {
        let land_use = strategy.land_use;
        let seed = self.biomass.seed_value(land_use, idx, self.layers, self.step);
        self.landscape.convert(idx, land_use, seed);
        if let Some(period) = strategy.rotation_period {
            self.landscape
                .set_rotation_end(idx, Some(self.step + period));
        }
        self.immutable[idx] = true;
    }

    /// Abandon a cell and lock it for the rest of the step
    fn release(&mut self, idx: usize, to: LandUseType) {
        self.landscape.convert(idx, to, 0.0);
        self.immutable[idx] = true;
    }

    fn cell_yield(&self, idx: usize, max_yield_per_cell: f64) -> f64 {
        let fraction = self.layers.climate_period(self.step).potential_yield[idx];
        max_yield_per_cell * f64::from(fraction.clamp(0.0, 1.0))
    }

    fn current_yield(&self, land_use: LandUseType, max_yield_per_cell: f64) -> f64 {
        (0..self.landscape.len())
            .filter(|&idx| self.landscape.land_use_at(idx) == land_use)
            .map(|idx| self.cell_yield(idx, max_yield_per_cell))
            .sum()
    }
}

/// Cascading allocator for one policy scenario
#[derive(Debug)]
pub struct DemandAllocator {
    policy: Box<dyn TierPolicy>,
}

impl DemandAllocator {
    /// Create an allocator with an explicit tier policy
    pub fn new(policy: Box<dyn TierPolicy>) -> Self {
        Self { policy }
    }

    /// Create the allocator of a scenario
    pub fn for_scenario(scenario: Scenario) -> Self {
        Self::new(tier_policy(scenario))
    }

    pub fn policy(&self) -> &dyn TierPolicy {
        self.policy.as_ref()
    }

    /// Bring `strategy`'s type to its demand.
    ///
    /// # Arguments
    ///
    /// * `strategy` - Resolved strategy of the type
    /// * `demand` - Cell count or yield target for this step
    /// * `suitability` - Normalized suitability of the type
    /// * `ctx` - Landscape, static layers and immutable mask of the step
    ///
    /// # Errors
    ///
    /// [`AllocationError::YieldDemandForFootprintType`] if a yield demand
    /// is issued for a type without a maximum yield per cell.
    pub fn allocate(
        &self,
        strategy: &LandUseStrategy,
        demand: Demand,
        suitability: &Raster<f32>,
        ctx: &mut AllocationContext<'_>,
    ) -> Result<AllocationReport, AllocationError> {
        let mut report = AllocationReport::new(strategy.land_use, demand);
        match (demand, strategy.demand_mode) {
            (Demand::Cells(target), _) => {
                let current = ctx.landscape.area(strategy.land_use);
                if current < target {
                    self.grow_footprint(strategy, target, suitability, ctx, &mut report);
                } else if current > target {
                    shrink_footprint(strategy, target, suitability, ctx, &mut report);
                }
            }
            (Demand::Yield(target), DemandMode::Yield { max_yield_per_cell }) => {
                let target = *target;
                let current = ctx.current_yield(strategy.land_use, max_yield_per_cell);
                if current < target {
                    self.grow_yield(strategy, target, max_yield_per_cell, suitability, ctx, &mut report);
                } else if current > target {
                    shrink_yield(strategy, target, max_yield_per_cell, suitability, ctx, &mut report);
                }
            }
            (Demand::Yield(_), DemandMode::Footprint) => {
                return Err(AllocationError::YieldDemandForFootprintType(strategy.land_use));
            }
        }

        if report.is_leakage() {
            info!(
                land_use = %strategy.land_use,
                step = ctx.step,
                shortfall = report.residual,
                "Demand of {} not satisfiable locally, trans-regional leakage likely",
                strategy.land_use
            );
        }
        Ok(report)
    }

    fn candidates(
        &self,
        strategy: &LandUseStrategy,
        tier: usize,
        suitability: &Raster<f32>,
        ctx: &AllocationContext<'_>,
    ) -> Option<Ranking> {
        let degree = self.policy.tiers()[tier];
        let forbidden = build_mask(strategy, degree, &*ctx.landscape, ctx.layers, &*ctx.immutable);
        let ranking = Ranking::new(suitability, RankOrder::MostSuitableFirst, |idx| !forbidden[idx]);
        if ranking.is_none() {
            debug!(
                land_use = %strategy.land_use,
                step = ctx.step,
                "Degree of limitation {:?} exhausted",
                degree
            );
        }
        ranking
    }

    fn grow_footprint(
        &self,
        strategy: &LandUseStrategy,
        target: usize,
        suitability: &Raster<f32>,
        ctx: &mut AllocationContext<'_>,
        report: &mut AllocationReport,
    ) {
        report.direction = Direction::Grow;

        for (tier, &degree) in self.policy.tiers().iter().enumerate() {
            let current = ctx.landscape.area(strategy.land_use);
            if current >= target {
                break;
            }
            let mut outcome = TierOutcome {
                degree,
                cells_added: 0,
                yield_added: 0.0,
                exhausted: false,
            };

            match self.candidates(strategy, tier, suitability, ctx) {
                None => outcome.exhausted = true,
                Some(ranking) => {
                    let wanted = (target - current).max(1);
                    for &idx in ranking.top(wanted) {
                        ctx.claim(strategy, idx);
                        if degree.is_conflict() && ctx.layers.restricted[idx] {
                            report.conflicts.push(idx);
                        }
                    }
                    outcome.cells_added = wanted.min(ranking.len());
                    outcome.exhausted = ranking.len() < wanted;
                }
            }
            report.cells_added += outcome.cells_added;
            report.tiers.push(outcome);
        }

        let area = ctx.landscape.area(strategy.land_use);
        report.residual = target.saturating_sub(area) as f64;
    }

    fn grow_yield(
        &self,
        strategy: &LandUseStrategy,
        target: f64,
        max_yield_per_cell: f64,
        suitability: &Raster<f32>,
        ctx: &mut AllocationContext<'_>,
        report: &mut AllocationReport,
    ) {
        report.direction = Direction::Grow;
        let mut current = ctx.current_yield(strategy.land_use, max_yield_per_cell);

        'tiers: for (tier, &degree) in self.policy.tiers().iter().enumerate() {
            if current >= target {
                break;
            }
            let mut outcome = TierOutcome {
                degree,
                cells_added: 0,
                yield_added: 0.0,
                exhausted: false,
            };

            if let Some(ranking) = self.candidates(strategy, tier, suitability, ctx) {
                let mut cursor = 0;
                while current < target {
                    if report.iterations >= MAX_YIELD_ITERATIONS {
                        report.converged = false;
                        report.cells_added += outcome.cells_added;
                        report.tiers.push(outcome);
                        break 'tiers;
                    }
                    if cursor >= ranking.len() {
                        break;
                    }
                    report.iterations += 1;

                    let band = ((target - current) / max_yield_per_cell).ceil().max(1.0) as usize;
                    let end = (cursor + band).min(ranking.len());
                    for &idx in &ranking.as_slice()[cursor..end] {
                        let gained = ctx.cell_yield(idx, max_yield_per_cell);
                        ctx.claim(strategy, idx);
                        if degree.is_conflict() && ctx.layers.restricted[idx] {
                            report.conflicts.push(idx);
                        }
                        current += gained;
                        outcome.yield_added += gained;
                        outcome.cells_added += 1;
                    }
                    cursor = end;
                }
                outcome.exhausted = cursor >= ranking.len() && current < target;
            } else {
                outcome.exhausted = true;
            }
            report.cells_added += outcome.cells_added;
            report.tiers.push(outcome);
        }

        if !report.converged {
            warn!(
                land_use = %strategy.land_use,
                step = ctx.step,
                iterations = report.iterations,
                "Yield allocation of {} stopped at the iteration cap",
                strategy.land_use
            );
        }
        report.residual = (target - current).max(0.0);
    }
}

fn shrink_footprint(
    strategy: &LandUseStrategy,
    target: usize,
    suitability: &Raster<f32>,
    ctx: &mut AllocationContext<'_>,
    report: &mut AllocationReport,
) {
    let current = ctx.landscape.area(strategy.land_use);
    let ShrinkRule::AbandonTo(abandoned) = strategy.shrink else {
        report.residual = (current - target) as f64;
        return;
    };
    report.direction = Direction::Shrink;

    let excess = current - target;
    let Some(ranking) = own_cells(strategy.land_use, suitability, ctx) else {
        report.residual = excess as f64;
        return;
    };
    for &idx in ranking.top(excess) {
        ctx.release(idx, abandoned);
        report.cells_removed += 1;
    }
    report.residual = (excess - report.cells_removed) as f64;
}

fn shrink_yield(
    strategy: &LandUseStrategy,
    target: f64,
    max_yield_per_cell: f64,
    suitability: &Raster<f32>,
    ctx: &mut AllocationContext<'_>,
    report: &mut AllocationReport,
) {
    let mut current = ctx.current_yield(strategy.land_use, max_yield_per_cell);
    let ShrinkRule::AbandonTo(abandoned) = strategy.shrink else {
        report.residual = current - target;
        return;
    };
    report.direction = Direction::Shrink;

    let Some(ranking) = own_cells(strategy.land_use, suitability, ctx) else {
        report.residual = current - target;
        return;
    };

    let mut cursor = 0;
    let mut multiplier = 1_usize;
    let mut stalled = 0_u32;

    'bands: while current > target && cursor < ranking.len() {
        if report.iterations >= MAX_YIELD_ITERATIONS {
            report.converged = false;
            warn!(
                land_use = %strategy.land_use,
                step = ctx.step,
                "Yield shrink of {} stopped at the iteration cap",
                strategy.land_use
            );
            break;
        }
        report.iterations += 1;

        let band = ((current - target) / max_yield_per_cell).floor().max(1.0) as usize * multiplier;
        let mut removed_yield = 0.0;
        for _ in 0..band {
            let Some(&idx) = ranking.as_slice().get(cursor) else {
                break 'bands;
            };
            let lost = ctx.cell_yield(idx, max_yield_per_cell);
            if current - lost < target {
                // Removing this cell would undershoot the demand
                break 'bands;
            }
            ctx.release(idx, abandoned);
            report.cells_removed += 1;
            current -= lost;
            removed_yield += lost;
            cursor += 1;
        }

        if removed_yield > 0.0 {
            stalled = 0;
        } else {
            stalled += 1;
            if stalled % STALL_DOUBLING_INTERVAL == 0 {
                multiplier *= 2;
            }
        }
    }

    report.residual = (current - target).max(0.0);
}

/// Unlocked cells of the type, least suitable first
fn own_cells(
    land_use: LandUseType,
    suitability: &Raster<f32>,
    ctx: &AllocationContext<'_>,
) -> Option<Ranking> {
    Ranking::new(suitability, RankOrder::LeastSuitableFirst, |idx| {
        ctx.landscape.land_use_at(idx) == land_use && !ctx.immutable[idx]
    })
}
