//! Plantation rotation
//!
//! Standing plantation is clear-cut when its rotation ends, independent of
//! plantation demand. New plantation gets its end step when allocated; the
//! initial stand is spread uniformly over one rotation period.

use crate::core_types::LandUseType;
use crate::grid::{Landscape, Raster};
use rand::Rng;

/// Assign rotation end steps to the initial plantation cells.
///
/// Each cell is due at a uniformly drawn step in `1..=period`, so the
/// initial stand does not all mature in the same year.
pub fn stagger_initial_rotation(landscape: &mut Landscape, period: u32, rng: &mut impl Rng) {
    let period = period.max(1);
    for idx in 0..landscape.len() {
        if landscape.land_use_at(idx) == LandUseType::Plantation
            && landscape.rotation_end(idx).is_none()
        {
            landscape.set_rotation_end(idx, Some(rng.random_range(1..=period)));
        }
    }
}

/// Harvest plantation cells whose rotation ends at or before `step`.
///
/// Harvested cells become plantation deforested and immutable for the rest
/// of the step. Returns the number of harvested cells.
pub fn harvest_due(landscape: &mut Landscape, immutable: &mut Raster<bool>, step: u32) -> usize {
    let mut harvested = 0;
    for idx in 0..landscape.len() {
        if landscape.land_use_at(idx) != LandUseType::Plantation {
            continue;
        }
        if landscape.rotation_end(idx).is_some_and(|end| end <= step) {
            landscape.convert(idx, LandUseType::PlantationDeforested, 0.0);
            immutable[idx] = true;
            harvested += 1;
        }
    }
    harvested
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_staggered_rotation_within_period() {
        let mut landscape = Landscape::without_biomass(Raster::filled(10, 10, LandUseType::Plantation), 0);
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        stagger_initial_rotation(&mut landscape, 12, &mut rng);
        let ends: Vec<u32> = (0..100).filter_map(|i| landscape.rotation_end(i)).collect();
        assert_eq!(ends.len(), 100);
        assert!(ends.iter().all(|&e| (1..=12).contains(&e)));
        assert!(ends.iter().any(|&e| e != ends[0]));
    }

    #[test]
    fn test_due_cells_are_harvested() {
        let mut landscape = Landscape::new(
            Raster::filled(3, 1, LandUseType::Plantation),
            Raster::filled(3, 1, 80.0),
            0,
        )
        .unwrap();
        landscape.set_rotation_end(0, Some(2));
        landscape.set_rotation_end(1, Some(3));
        let mut immutable = Raster::filled(3, 1, false);

        assert_eq!(harvest_due(&mut landscape, &mut immutable, 2), 1);
        assert_eq!(landscape.land_use_at(0), LandUseType::PlantationDeforested);
        assert_eq!(landscape.agb()[0], 0.0);
        assert_eq!(landscape.succession_age()[0], 1);
        assert_eq!(landscape.rotation_end(0), None);
        assert!(immutable[0]);
        assert_eq!(landscape.land_use_at(1), LandUseType::Plantation);
        assert_eq!(landscape.land_use_at(2), LandUseType::Plantation);
    }
}
