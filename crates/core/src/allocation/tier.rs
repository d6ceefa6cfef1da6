//! Tier policies: ordered degrees of limitation per policy scenario

use super::mask::DegreeOfLimitation;
use crate::config::Scenario;
use std::fmt::Debug;

/// Ordered cascade of degrees of limitation tried by the allocator
pub trait TierPolicy: Debug + Send + Sync {
    /// Degrees of limitation, most preferred first
    fn tiers(&self) -> &[DegreeOfLimitation];

    /// Whether biomass harvest may take forest inside restricted zones
    fn harvests_restricted_areas(&self) -> bool;
}

/// Conservation-respecting cascade: unrestricted land first, restricted
/// land (if allowed at all) as a recorded conflict
#[derive(Debug, Clone)]
pub struct ConservationTiers {
    tiers: Vec<DegreeOfLimitation>,
}

impl ConservationTiers {
    /// Unrestricted tiers followed by restricted tiers
    pub fn weak() -> Self {
        Self {
            tiers: vec![
                DegreeOfLimitation::FavorableTerrainInUnrestrictedAreas,
                DegreeOfLimitation::DifficultTerrainInUnrestrictedAreas,
                DegreeOfLimitation::FavorableTerrainInRestrictedAreas,
                DegreeOfLimitation::DifficultTerrainInRestrictedAreas,
            ],
        }
    }

    /// Unrestricted tiers only
    pub fn enforced() -> Self {
        Self {
            tiers: vec![
                DegreeOfLimitation::FavorableTerrainInUnrestrictedAreas,
                DegreeOfLimitation::DifficultTerrainInUnrestrictedAreas,
            ],
        }
    }
}

impl TierPolicy for ConservationTiers {
    fn tiers(&self) -> &[DegreeOfLimitation] {
        &self.tiers
    }

    fn harvests_restricted_areas(&self) -> bool {
        false
    }
}

/// "Worst case" cascade ignoring legal restriction
#[derive(Debug, Clone, Copy, Default)]
pub struct LandscapeWideTiers;

impl TierPolicy for LandscapeWideTiers {
    fn tiers(&self) -> &[DegreeOfLimitation] {
        &[
            DegreeOfLimitation::FavorableLandscapeWide,
            DegreeOfLimitation::DifficultLandscapeWide,
        ]
    }

    fn harvests_restricted_areas(&self) -> bool {
        true
    }
}

/// Tier policy of a scenario
pub fn tier_policy(scenario: Scenario) -> Box<dyn TierPolicy> {
    match scenario {
        Scenario::WeakConservation => Box::new(ConservationTiers::weak()),
        Scenario::EnforcedConservation => Box::new(ConservationTiers::enforced()),
        Scenario::NoConservation => Box::new(LandscapeWideTiers),
    }
}
