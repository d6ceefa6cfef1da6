//! No-allocation masks
//!
//! A degree of limitation is the combination of two independent axes: how
//! legally restricted zones are treated and which slopes are acceptable.
//! [`build_mask`] evaluates any combination; the named degrees are just
//! fixed pairs of the two.

use crate::config::{LandUseStrategy, SlopeRange};
use crate::grid::{Landscape, Raster, StaticLayers};
use serde::{Deserialize, Serialize};

/// Treatment of legally restricted zones
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LegalMode {
    /// Restriction is not considered
    Ignore,
    /// Restricted cells are forbidden
    Exclude,
}

/// Acceptable slopes relative to the type's difficult-terrain range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlopeLimit {
    /// `slope < difficult_min`
    BelowMin,
    /// `slope <= difficult_min`
    AtMostMin,
    /// `slope < difficult_max`
    BelowMax,
    /// `slope <= difficult_max`
    AtMostMax,
}

impl SlopeLimit {
    /// True if `slope` is acceptable under this limit
    #[inline]
    pub fn allows(self, slope: f32, range: SlopeRange) -> bool {
        match self {
            SlopeLimit::BelowMin => slope < range.difficult_min,
            SlopeLimit::AtMostMin => slope <= range.difficult_min,
            SlopeLimit::BelowMax => slope < range.difficult_max,
            SlopeLimit::AtMostMax => slope <= range.difficult_max,
        }
    }
}

/// Named no-allocation configurations, from least to most permissive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DegreeOfLimitation {
    OnlyTrulyInaccessible,
    FavorableTerrainInUnrestrictedAreas,
    DifficultTerrainInUnrestrictedAreas,
    FavorableTerrainInRestrictedAreas,
    DifficultTerrainInRestrictedAreas,
    FavorableLandscapeWide,
    DifficultLandscapeWide,
}

impl DegreeOfLimitation {
    /// Legal mode and slope limit of this degree
    pub const fn axes(self) -> (LegalMode, SlopeLimit) {
        match self {
            DegreeOfLimitation::OnlyTrulyInaccessible => (LegalMode::Ignore, SlopeLimit::AtMostMax),
            DegreeOfLimitation::FavorableTerrainInUnrestrictedAreas => {
                (LegalMode::Exclude, SlopeLimit::BelowMin)
            }
            DegreeOfLimitation::DifficultTerrainInUnrestrictedAreas => {
                (LegalMode::Exclude, SlopeLimit::BelowMax)
            }
            DegreeOfLimitation::FavorableTerrainInRestrictedAreas => (LegalMode::Ignore, SlopeLimit::AtMostMin),
            DegreeOfLimitation::DifficultTerrainInRestrictedAreas => (LegalMode::Ignore, SlopeLimit::AtMostMax),
            DegreeOfLimitation::FavorableLandscapeWide => (LegalMode::Ignore, SlopeLimit::BelowMin),
            DegreeOfLimitation::DifficultLandscapeWide => (LegalMode::Ignore, SlopeLimit::AtMostMax),
        }
    }

    /// Tier that opens restricted zones to allocation.
    ///
    /// A cell taken under such a tier is a land-use conflict only if it lies
    /// in a restricted zone.
    pub const fn is_conflict(self) -> bool {
        matches!(
            self,
            DegreeOfLimitation::FavorableTerrainInRestrictedAreas
                | DegreeOfLimitation::DifficultTerrainInRestrictedAreas
        )
    }
}

/// Boolean raster of cells where `strategy`'s type may not be allocated.
///
/// Always forbidden: static classes, the type's protected classes, cells
/// already of the type and immutable cells. The degree adds the legal and
/// slope conditions; a type without a slope range ignores slope.
///
/// # Arguments
///
/// * `strategy` - Type being allocated
/// * `degree` - Degree of limitation
/// * `landscape` - Current landscape
/// * `layers` - Static layers (slope, restricted zones)
/// * `immutable` - Cells already claimed this time step
#[must_use]
pub fn build_mask(
    strategy: &LandUseStrategy,
    degree: DegreeOfLimitation,
    landscape: &Landscape,
    layers: &StaticLayers,
    immutable: &Raster<bool>,
) -> Raster<bool> {
    let (legal, slope_limit) = degree.axes();
    let land_use = landscape.land_use();

    Raster::from_fn(landscape.width(), landscape.height(), |x, y| {
        let idx = y * landscape.width() + x;
        let current = land_use[idx];
        if current.is_static()
            || current == strategy.land_use
            || strategy.protected_types.contains(&current)
            || immutable[idx]
        {
            return true;
        }
        let restricted = layers.restricted[idx];
        let legal_ok = match legal {
            LegalMode::Ignore => true,
            LegalMode::Exclude => !restricted,
        };
        let slope_ok = strategy
            .slope
            .is_none_or(|range| slope_limit.allows(layers.slope[idx], range));
        !(legal_ok && slope_ok)
    })
}
