//! Demand allocation engine
//!
//! - [`mask`]: no-allocation masks per degree of limitation
//! - [`tier`]: ordered tier cascades per policy scenario
//! - [`ranking`]: deterministic suitability ordering of candidate cells
//! - [`allocator`]: grow/shrink of active types to their demand
//! - [`plantation`]: rotation-driven plantation harvest
//! - [`harvest`]: biomass extraction from the forest fringe
//! - [`diagnostics`]: per-type and harvest outcomes

pub mod allocator;
pub mod diagnostics;
pub mod harvest;
pub mod mask;
pub mod plantation;
pub mod ranking;
pub mod tier;

pub use allocator::{
    AllocationContext, AllocationError, DemandAllocator, MAX_YIELD_ITERATIONS,
    STALL_DOUBLING_INTERVAL,
};
pub use diagnostics::{AllocationReport, Direction, HarvestReport, TierOutcome};
pub use harvest::harvest_biomass;
pub use mask::{build_mask, DegreeOfLimitation, LegalMode, SlopeLimit};
pub use plantation::{harvest_due, stagger_initial_rotation};
pub use ranking::{RankOrder, Ranking};
pub use tier::{tier_policy, ConservationTiers, LandscapeWideTiers, TierPolicy};
