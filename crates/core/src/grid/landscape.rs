//! Mutable per-sample landscape state
//!
//! Holds the per-cell land-use class, succession age, above-ground biomass
//! and plantation rotation end, plus the per-class area cache used by the
//! allocator. Every class change goes through [`Landscape::convert`], which
//! keeps the area cache, the succession-age reset rule and the
//! "no AGB outside forest-bearing classes" rule consistent.

use super::raster::{Raster, RasterError};
use crate::core_types::LandUseType;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rustc_hash::FxHashMap;

/// Upper bound of the per-cell tie-break perturbation added to suitability
pub const TIE_BREAK_MAGNITUDE: f32 = 1e-6;

/// Landscape grid of one Monte Carlo sample
#[derive(Debug, Clone)]
pub struct Landscape {
    land_use: Raster<LandUseType>,
    succession_age: Raster<u32>,
    agb: Raster<f32>,
    rotation_end: Raster<Option<u32>>,
    tie_break: Raster<f32>,
    converted: Raster<bool>,
    area: FxHashMap<LandUseType, usize>,
}

impl Landscape {
    /// Create a landscape from initial conditions.
    ///
    /// Cells in an age-tracked class start at age 1; AGB outside
    /// forest-bearing classes is forced to 0.
    ///
    /// # Arguments
    ///
    /// * `land_use` - Initial land-use raster
    /// * `agb` - Initial above-ground biomass (Mg per cell)
    /// * `seed` - Seed for the fixed tie-break perturbation
    ///
    /// # Errors
    ///
    /// Returns [`RasterError::ShapeMismatch`] if `agb` differs in shape
    pub fn new(
        land_use: Raster<LandUseType>,
        mut agb: Raster<f32>,
        seed: u64,
    ) -> Result<Self, RasterError> {
        land_use.ensure_same_shape(&agb)?;
        let (width, height) = (land_use.width(), land_use.height());

        for idx in 0..land_use.len() {
            if !land_use[idx].is_forest_bearing() {
                agb[idx] = 0.0;
            }
        }
        let succession_age = land_use.map(|lut| u32::from(lut.tracks_succession_age()));

        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let tie_break = Raster::from_fn(width, height, |_, _| {
            rng.random::<f32>() * TIE_BREAK_MAGNITUDE
        });

        let mut area = FxHashMap::default();
        for &lut in land_use.iter() {
            *area.entry(lut).or_insert(0) += 1;
        }

        Ok(Self {
            succession_age,
            agb,
            rotation_end: Raster::filled(width, height, None),
            tie_break,
            converted: Raster::filled(width, height, false),
            area,
            land_use,
        })
    }

    /// Landscape without initial biomass
    pub fn without_biomass(land_use: Raster<LandUseType>, seed: u64) -> Self {
        let agb = Raster::filled(land_use.width(), land_use.height(), 0.0);
        Self::new(land_use, agb, seed).expect("rasters built from the same shape")
    }

    pub fn width(&self) -> usize {
        self.land_use.width()
    }

    pub fn height(&self) -> usize {
        self.land_use.height()
    }

    /// Number of cells
    pub fn len(&self) -> usize {
        self.land_use.len()
    }

    pub fn is_empty(&self) -> bool {
        self.land_use.is_empty()
    }

    pub fn land_use(&self) -> &Raster<LandUseType> {
        &self.land_use
    }

    pub fn succession_age(&self) -> &Raster<u32> {
        &self.succession_age
    }

    pub fn agb(&self) -> &Raster<f32> {
        &self.agb
    }

    pub fn tie_break(&self) -> &Raster<f32> {
        &self.tie_break
    }

    /// Class of a cell
    #[inline]
    pub fn land_use_at(&self, idx: usize) -> LandUseType {
        self.land_use[idx]
    }

    /// Cached number of cells of a class
    pub fn area(&self, land_use: LandUseType) -> usize {
        self.area.get(&land_use).copied().unwrap_or(0)
    }

    /// Cached per-class areas
    pub fn areas(&self) -> &FxHashMap<LandUseType, usize> {
        &self.area
    }

    /// Per-class areas counted from the raster (ignores the cache)
    pub fn recount_areas(&self) -> FxHashMap<LandUseType, usize> {
        let mut counts = FxHashMap::default();
        for &lut in self.land_use.iter() {
            *counts.entry(lut).or_insert(0) += 1;
        }
        counts
    }

    /// Boolean raster of cells whose class satisfies `predicate`
    pub fn mask_where(&self, predicate: impl Fn(LandUseType) -> bool) -> Raster<bool> {
        self.land_use.map(|&lut| predicate(lut))
    }

    /// Change the class of a cell.
    ///
    /// Resets the succession age to 1 for age-tracked entry states (0
    /// otherwise), sets AGB to `agb` for forest-bearing classes and 0 for
    /// all others, and clears the plantation rotation when leaving
    /// plantation.
    pub fn convert(&mut self, idx: usize, to: LandUseType, agb: f32) {
        let from = self.land_use[idx];
        if from != to {
            if let Some(count) = self.area.get_mut(&from) {
                *count -= 1;
                if *count == 0 {
                    self.area.remove(&from);
                }
            }
            *self.area.entry(to).or_insert(0) += 1;
        }
        self.land_use[idx] = to;
        self.succession_age[idx] = u32::from(to.resets_succession_age());
        self.agb[idx] = if to.is_forest_bearing() { agb.max(0.0) } else { 0.0 };
        if to != LandUseType::Plantation {
            self.rotation_end[idx] = None;
        }
        self.converted[idx] = true;
    }

    /// Set the succession age of a cell
    pub fn set_succession_age(&mut self, idx: usize, age: u32) {
        self.succession_age[idx] = age;
    }

    /// Set the AGB of a cell (ignored outside forest-bearing classes)
    pub fn set_agb(&mut self, idx: usize, agb: f32) {
        if self.land_use[idx].is_forest_bearing() {
            self.agb[idx] = agb.max(0.0);
        }
    }

    /// Force AGB to 0 wherever the class is not forest-bearing.
    ///
    /// Returns the number of cells corrected.
    pub fn zero_agb_outside_forest(&mut self) -> usize {
        let mut corrected = 0;
        for idx in 0..self.land_use.len() {
            if !self.land_use[idx].is_forest_bearing() && self.agb[idx] != 0.0 {
                self.agb[idx] = 0.0;
                corrected += 1;
            }
        }
        corrected
    }

    /// Step at which a plantation cell is due for harvest
    pub fn rotation_end(&self, idx: usize) -> Option<u32> {
        self.rotation_end[idx]
    }

    /// Register the harvest step of a plantation cell
    pub fn set_rotation_end(&mut self, idx: usize, step: Option<u32>) {
        self.rotation_end[idx] = step;
    }

    /// Mark the start of a time step (clears the converted-this-step flags)
    pub fn begin_step(&mut self) {
        self.converted.fill(false);
    }

    /// True if the cell changed class during the current step
    pub fn was_converted(&self, idx: usize) -> bool {
        self.converted[idx]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_zeroes_agb_outside_forest() {
        let land_use = Raster::from_fn(2, 1, |x, _| {
            if x == 0 {
                LandUseType::UndisturbedForest
            } else {
                LandUseType::CroplandAnnual
            }
        });
        let agb = Raster::filled(2, 1, 50.0);
        let landscape = Landscape::new(land_use, agb, 7).unwrap();
        assert_eq!(landscape.agb()[0], 50.0);
        assert_eq!(landscape.agb()[1], 0.0);
    }

    #[test]
    fn test_tie_break_is_small_and_reproducible() {
        let land_use = Raster::filled(8, 8, LandUseType::Pasture);
        let a = Landscape::without_biomass(land_use.clone(), 11);
        let b = Landscape::without_biomass(land_use, 11);
        assert_eq!(a.tie_break(), b.tie_break());
        assert!(a
            .tie_break()
            .iter()
            .all(|&v| (0.0..TIE_BREAK_MAGNITUDE).contains(&v)));
    }

    #[test]
    fn test_convert_updates_area_age_and_agb() {
        let land_use = Raster::filled(3, 3, LandUseType::UndisturbedForest);
        let agb = Raster::filled(3, 3, 200.0);
        let mut landscape = Landscape::new(land_use, agb, 1).unwrap();
        landscape.begin_step();

        landscape.convert(4, LandUseType::CroplandAnnual, 0.0);
        assert_eq!(landscape.area(LandUseType::UndisturbedForest), 8);
        assert_eq!(landscape.area(LandUseType::CroplandAnnual), 1);
        assert_eq!(landscape.agb()[4], 0.0);
        assert!(landscape.was_converted(4));

        landscape.convert(4, LandUseType::CroplandAnnualAbandoned, 0.0);
        assert_eq!(landscape.succession_age()[4], 1);
        assert_eq!(landscape.area(LandUseType::CroplandAnnual), 0);
        assert_eq!(landscape.recount_areas(), landscape.areas().clone());
    }
}
