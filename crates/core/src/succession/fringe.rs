//! Forest-fringe disturbance
//!
//! Forest on an edge cannot be pristine: every net-forest cell with a
//! non-forest or out-of-bounds neighbour is downgraded to disturbed forest (keeping its AGB)
//! and its succession clock restarts.

use crate::core_types::LandUseType;
use crate::grid::{fringe_mask, Landscape};
use serde::Serialize;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FringeSummary {
    /// Undisturbed cells downgraded to disturbed forest
    pub downgraded: usize,
    /// Disturbed fringe cells whose age was reset
    pub reset: usize,
}

/// Apply the edge-effect rule to the whole landscape
pub fn apply_fringe_disturbance(landscape: &mut Landscape) -> FringeSummary {
    let forest = landscape.mask_where(LandUseType::is_net_forest);
    let fringe = fringe_mask(&forest);
    let mut summary = FringeSummary::default();

    for idx in 0..landscape.len() {
        if !fringe[idx] {
            continue;
        }
        match landscape.land_use_at(idx) {
            LandUseType::UndisturbedForest => {
                let agb = landscape.agb()[idx];
                landscape.convert(idx, LandUseType::DisturbedForest, agb);
                summary.downgraded += 1;
            }
            LandUseType::DisturbedForest => {
                landscape.set_succession_age(idx, 1);
                summary.reset += 1;
            }
            _ => {}
        }
    }
    summary
}
