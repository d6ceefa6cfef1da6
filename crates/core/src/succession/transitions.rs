//! Age-driven succession
//!
//! Abandoned and deforested land enters the natural chain
//! herbaceous vegetation → shrubs → disturbed forest → undisturbed forest.
//! Each transition fires once a cell has spent the rule's threshold in its
//! current state, and never beyond the cell's potential natural vegetation.

use crate::biomass::BiomassLedger;
use crate::config::SuccessionConfig;
use crate::core_types::{LandUseType, PnvClass};
use crate::grid::{Landscape, Raster, StaticLayers};
use rustc_hash::FxHashMap;

/// Target class and age threshold of a transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub to: LandUseType,
    pub age_threshold: u32,
}

/// Lookup table of succession rules keyed by (class, PNV)
#[derive(Debug, Clone, Default)]
pub struct SuccessionModel {
    rules: FxHashMap<(LandUseType, PnvClass), Transition>,
}

impl SuccessionModel {
    /// Build the lookup from validated configuration
    pub fn new(config: &SuccessionConfig) -> Self {
        let mut rules = FxHashMap::default();
        for rule in &config.rules {
            for &pnv in &rule.pnv {
                rules.insert(
                    (rule.from, pnv),
                    Transition {
                        to: rule.to,
                        age_threshold: rule.age_threshold,
                    },
                );
            }
        }
        Self { rules }
    }

    /// Transition leaving `from` on `pnv`, if any
    pub fn transition(&self, from: LandUseType, pnv: PnvClass) -> Option<Transition> {
        self.rules.get(&(from, pnv)).copied()
    }

    /// Age every tracked cell by one year or move it to its next state.
    ///
    /// A cell whose age has reached the threshold transitions and restarts
    /// at age 1; otherwise its age grows by one. Cells already converted
    /// this step are left alone. Entering a forest-bearing class from a
    /// non-forest class seeds AGB; forest-to-forest transitions keep it.
    ///
    /// Returns the cells that changed class.
    pub fn advance(
        &self,
        landscape: &mut Landscape,
        layers: &StaticLayers,
        biomass: &BiomassLedger,
        step: u32,
    ) -> Raster<bool> {
        let mut changed = Raster::filled(landscape.width(), landscape.height(), false);

        for idx in 0..landscape.len() {
            let from = landscape.land_use_at(idx);
            if !from.tracks_succession_age() || landscape.was_converted(idx) {
                continue;
            }
            let age = landscape.succession_age()[idx];
            match self.transition(from, layers.pnv[idx]) {
                Some(transition) if age >= transition.age_threshold => {
                    let agb = if from.is_forest_bearing() {
                        landscape.agb()[idx]
                    } else {
                        biomass.seed_value(transition.to, idx, layers, step)
                    };
                    landscape.convert(idx, transition.to, agb);
                    changed[idx] = true;
                }
                _ => landscape.set_succession_age(idx, age.saturating_add(1)),
            }
        }
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SimulationConfig;
    use crate::grid::{ClimateLayers, StaticInputs};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn layers(pnv: PnvClass) -> StaticLayers {
        let inputs = StaticInputs {
            elevation: Raster::filled(2, 1, 0.0),
            streets: Raster::filled(2, 1, false),
            freshwater: Raster::filled(2, 1, false),
            cities: Raster::filled(2, 1, false),
            restricted: Raster::filled(2, 1, false),
            pnv: Raster::filled(2, 1, pnv),
            population_density: Raster::filled(2, 1, 0.0),
            climate_periods: vec![ClimateLayers {
                start_step: 1,
                potential_agb: Raster::filled(2, 1, 200.0),
                potential_yield: Raster::filled(2, 1, 1.0),
                agb_increment: None,
            }],
        };
        StaticLayers::derive(inputs, 100.0).unwrap()
    }

    fn model_and_ledger(layers: &StaticLayers) -> (SuccessionModel, BiomassLedger) {
        let config = SimulationConfig::default();
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        (
            SuccessionModel::new(&config.succession),
            BiomassLedger::new(&config.biomass, layers, &mut rng).unwrap(),
        )
    }

    #[test]
    fn test_cell_ages_until_threshold() {
        let layers = layers(PnvClass::Forest);
        let (model, biomass) = model_and_ledger(&layers);
        let threshold = model
            .transition(LandUseType::HerbaceousVegetation, PnvClass::Forest)
            .unwrap()
            .age_threshold;
        let mut landscape =
            Landscape::without_biomass(Raster::filled(2, 1, LandUseType::HerbaceousVegetation), 0);
        landscape.set_succession_age(0, threshold - 1);
        landscape.set_succession_age(1, threshold);

        let changed = model.advance(&mut landscape, &layers, &biomass, 1);

        assert!(!changed[0]);
        assert_eq!(landscape.land_use_at(0), LandUseType::HerbaceousVegetation);
        assert_eq!(landscape.succession_age()[0], threshold);
        assert!(changed[1]);
        assert_eq!(landscape.land_use_at(1), LandUseType::Shrubs);
        assert_eq!(landscape.succession_age()[1], 1);
    }

    #[test]
    fn test_grassland_pnv_stops_at_herbaceous() {
        let layers = layers(PnvClass::Grassland);
        let (model, biomass) = model_and_ledger(&layers);
        let mut landscape =
            Landscape::without_biomass(Raster::filled(2, 1, LandUseType::HerbaceousVegetation), 0);
        landscape.set_succession_age(0, 500);

        model.advance(&mut landscape, &layers, &biomass, 1);

        assert_eq!(landscape.land_use_at(0), LandUseType::HerbaceousVegetation);
        assert_eq!(landscape.succession_age()[0], 501);
    }

    #[test]
    fn test_forest_maturation_keeps_agb() {
        let layers = layers(PnvClass::Forest);
        let (model, biomass) = model_and_ledger(&layers);
        let mut landscape = Landscape::new(
            Raster::filled(2, 1, LandUseType::DisturbedForest),
            Raster::filled(2, 1, 120.0),
            0,
        )
        .unwrap();
        landscape.set_succession_age(0, 40);

        model.advance(&mut landscape, &layers, &biomass, 1);

        assert_eq!(landscape.land_use_at(0), LandUseType::UndisturbedForest);
        assert_eq!(landscape.agb()[0], 120.0);
        assert_eq!(landscape.land_use_at(1), LandUseType::DisturbedForest);
        assert_eq!(landscape.succession_age()[1], 2);
    }

    #[test]
    fn test_shrubs_entering_forest_get_seed_agb() {
        let layers = layers(PnvClass::Forest);
        let (model, biomass) = model_and_ledger(&layers);
        let mut landscape = Landscape::without_biomass(Raster::filled(2, 1, LandUseType::Shrubs), 0);
        landscape.set_succession_age(0, 10);

        model.advance(&mut landscape, &layers, &biomass, 1);

        assert_eq!(landscape.land_use_at(0), LandUseType::DisturbedForest);
        assert!(landscape.agb()[0] > 0.0);
        assert!(landscape.agb()[0] <= 200.0);
    }
}
