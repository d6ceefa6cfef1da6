//! Degradation / regeneration classification
//!
//! A derived label per forest cell comparing this step's AGB with the
//! previous step's, relative to the climate-period potential maximum. It
//! never changes the landscape.

use crate::config::DegradationThresholds;
use crate::core_types::LandUseType;
use crate::grid::{Landscape, Raster};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ForestTrend {
    RegenerationLow,
    RegenerationMedium,
    RegenerationHigh,
    RegenerationFull,
    DegradationLow,
    DegradationModerate,
    DegradationSevere,
    DegradationAbsolute,
}

impl ForestTrend {
    pub fn is_degradation(self) -> bool {
        matches!(
            self,
            ForestTrend::DegradationLow
                | ForestTrend::DegradationModerate
                | ForestTrend::DegradationSevere
                | ForestTrend::DegradationAbsolute
        )
    }
}

/// Classify one cell.
///
/// # Arguments
///
/// * `previous` - AGB one step ago
/// * `current` - AGB now
/// * `potential` - Climate-period potential maximum AGB of the cell
/// * `thresholds` - Lower/upper fractions of `potential`
#[must_use]
pub fn classify(previous: f32, current: f32, potential: f32, thresholds: DegradationThresholds) -> ForestTrend {
    let fraction = if potential > 0.0 { current / potential } else { 1.0 };

    if current >= previous {
        if current >= potential {
            ForestTrend::RegenerationFull
        } else if fraction > thresholds.upper {
            ForestTrend::RegenerationHigh
        } else if fraction > thresholds.lower {
            ForestTrend::RegenerationMedium
        } else {
            ForestTrend::RegenerationLow
        }
    } else if current <= 0.0 {
        ForestTrend::DegradationAbsolute
    } else if fraction <= thresholds.lower {
        ForestTrend::DegradationSevere
    } else if fraction <= thresholds.upper {
        ForestTrend::DegradationModerate
    } else {
        ForestTrend::DegradationLow
    }
}

/// Classify every cell that is net forest now or was net forest one step
/// ago; all other cells are `None`.
#[must_use]
pub fn classify_landscape(
    previous_agb: &Raster<f32>,
    previous_forest: &Raster<bool>,
    landscape: &Landscape,
    potential_agb: &Raster<f32>,
    thresholds: DegradationThresholds,
) -> Raster<Option<ForestTrend>> {
    let agb = landscape.agb();
    Raster::from_fn(landscape.width(), landscape.height(), |x, y| {
        let idx = y * landscape.width() + x;
        let is_forest = LandUseType::is_net_forest(landscape.land_use_at(idx));
        (is_forest || previous_forest[idx])
            .then(|| classify(previous_agb[idx], agb[idx], potential_agb[idx], thresholds))
    })
}

/// Number of cells per class
pub fn trend_counts(trends: &Raster<Option<ForestTrend>>) -> BTreeMap<ForestTrend, usize> {
    let mut counts = BTreeMap::new();
    for trend in trends.iter().flatten() {
        *counts.entry(*trend).or_insert(0) += 1;
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;

    const T: DegradationThresholds = DegradationThresholds {
        lower: 0.33,
        upper: 0.66,
    };

    #[test]
    fn test_regeneration_classes() {
        assert_eq!(classify(10.0, 20.0, 100.0, T), ForestTrend::RegenerationLow);
        assert_eq!(classify(10.0, 50.0, 100.0, T), ForestTrend::RegenerationMedium);
        assert_eq!(classify(10.0, 90.0, 100.0, T), ForestTrend::RegenerationHigh);
        assert_eq!(classify(90.0, 100.0, 100.0, T), ForestTrend::RegenerationFull);
        assert_eq!(classify(50.0, 50.0, 100.0, T), ForestTrend::RegenerationMedium);
    }

    #[test]
    fn test_degradation_classes() {
        assert_eq!(classify(100.0, 80.0, 100.0, T), ForestTrend::DegradationLow);
        assert_eq!(classify(100.0, 50.0, 100.0, T), ForestTrend::DegradationModerate);
        assert_eq!(classify(100.0, 10.0, 100.0, T), ForestTrend::DegradationSevere);
        assert_eq!(classify(100.0, 0.0, 100.0, T), ForestTrend::DegradationAbsolute);
        assert!(ForestTrend::DegradationAbsolute.is_degradation());
        assert!(!ForestTrend::RegenerationFull.is_degradation());
    }

    #[test]
    fn test_landscape_classification_covers_lost_forest() {
        let land_use = Raster::from_vec(
            3,
            1,
            vec![
                LandUseType::NetForestDeforested,
                LandUseType::UndisturbedForest,
                LandUseType::Pasture,
            ],
        )
        .unwrap();
        let landscape = Landscape::new(land_use, Raster::from_vec(3, 1, vec![0.0, 100.0, 0.0]).unwrap(), 0).unwrap();
        let previous_agb = Raster::from_vec(3, 1, vec![80.0, 95.0, 0.0]).unwrap();
        let previous_forest = Raster::from_vec(3, 1, vec![true, true, false]).unwrap();
        let potential = Raster::filled(3, 1, 100.0);

        let trends = classify_landscape(&previous_agb, &previous_forest, &landscape, &potential, T);

        assert_eq!(trends[0], Some(ForestTrend::DegradationAbsolute));
        assert_eq!(trends[1], Some(ForestTrend::RegenerationFull));
        assert_eq!(trends[2], None);
        let counts = trend_counts(&trends);
        assert_eq!(counts.values().sum::<usize>(), 2);
    }
}
