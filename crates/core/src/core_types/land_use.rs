//! Land-use / land-cover classes and their structural properties.
//!
//! Every landscape cell carries exactly one [`LandUseType`]. The numeric codes
//! match the classification used by the initial-conditions rasters:
//!
//! | Code | Class |
//! |------|-------|
//! | 1 | built-up |
//! | 2 | cropland-annual |
//! | 3 | pasture |
//! | 4 | agroforestry |
//! | 5 | plantation |
//! | 6 | herbaceous vegetation |
//! | 7 | shrubs |
//! | 8 | disturbed forest |
//! | 9 | undisturbed forest |
//! | 10 | sparse vegetation (moss, lichen, bare) |
//! | 11 | herbaceous wetland |
//! | 12 | water |
//! | 13 | no input |
//! | 14 | cropland-annual abandoned |
//! | 15 | pasture abandoned |
//! | 16 | agroforestry abandoned |
//! | 17 | net forest deforested |
//! | 18 | plantation deforested |

use serde::{Deserialize, Serialize};
use std::fmt;

/// Categorical land-use class of a single cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum LandUseType {
    BuiltUp = 1,
    CroplandAnnual = 2,
    Pasture = 3,
    Agroforestry = 4,
    Plantation = 5,
    HerbaceousVegetation = 6,
    Shrubs = 7,
    DisturbedForest = 8,
    UndisturbedForest = 9,
    SparseVegetation = 10,
    HerbaceousWetland = 11,
    Water = 12,
    NoInput = 13,
    CroplandAnnualAbandoned = 14,
    PastureAbandoned = 15,
    AgroforestryAbandoned = 16,
    NetForestDeforested = 17,
    PlantationDeforested = 18,
}

impl LandUseType {
    /// All classes in code order.
    pub const ALL: [LandUseType; 18] = [
        LandUseType::BuiltUp,
        LandUseType::CroplandAnnual,
        LandUseType::Pasture,
        LandUseType::Agroforestry,
        LandUseType::Plantation,
        LandUseType::HerbaceousVegetation,
        LandUseType::Shrubs,
        LandUseType::DisturbedForest,
        LandUseType::UndisturbedForest,
        LandUseType::SparseVegetation,
        LandUseType::HerbaceousWetland,
        LandUseType::Water,
        LandUseType::NoInput,
        LandUseType::CroplandAnnualAbandoned,
        LandUseType::PastureAbandoned,
        LandUseType::AgroforestryAbandoned,
        LandUseType::NetForestDeforested,
        LandUseType::PlantationDeforested,
    ];

    /// Numeric raster code of this class.
    #[inline]
    pub const fn code(self) -> u8 {
        self as u8
    }

    /// Look up a class from its raster code.
    ///
    /// Returns `None` for codes outside 1..=18.
    pub fn from_code(code: u8) -> Option<Self> {
        Self::ALL.get(usize::from(code).checked_sub(1)?).copied()
    }

    /// Human-facing label used in logs and reports.
    pub const fn label(self) -> &'static str {
        match self {
            LandUseType::BuiltUp => "built-up",
            LandUseType::CroplandAnnual => "cropland-annual",
            LandUseType::Pasture => "pasture",
            LandUseType::Agroforestry => "agroforestry",
            LandUseType::Plantation => "plantation",
            LandUseType::HerbaceousVegetation => "herbaceous vegetation",
            LandUseType::Shrubs => "shrubs",
            LandUseType::DisturbedForest => "disturbed forest",
            LandUseType::UndisturbedForest => "undisturbed forest",
            LandUseType::SparseVegetation => "sparse vegetation",
            LandUseType::HerbaceousWetland => "herbaceous wetland",
            LandUseType::Water => "water",
            LandUseType::NoInput => "no input",
            LandUseType::CroplandAnnualAbandoned => "cropland-annual abandoned",
            LandUseType::PastureAbandoned => "pasture abandoned",
            LandUseType::AgroforestryAbandoned => "agroforestry abandoned",
            LandUseType::NetForestDeforested => "net forest deforested",
            LandUseType::PlantationDeforested => "plantation deforested",
        }
    }

    /// Classes that demand can be allocated to (built-up through plantation).
    pub const fn is_active(self) -> bool {
        matches!(
            self,
            LandUseType::BuiltUp
                | LandUseType::CroplandAnnual
                | LandUseType::Pasture
                | LandUseType::Agroforestry
                | LandUseType::Plantation
        )
    }

    /// Classes that never change and can never be allocated into.
    pub const fn is_static(self) -> bool {
        matches!(
            self,
            LandUseType::HerbaceousWetland | LandUseType::Water | LandUseType::NoInput
        )
    }

    /// Classes carrying above-ground biomass.
    pub const fn is_forest_bearing(self) -> bool {
        matches!(
            self,
            LandUseType::Agroforestry
                | LandUseType::Plantation
                | LandUseType::DisturbedForest
                | LandUseType::UndisturbedForest
        )
    }

    /// Disturbed or undisturbed forest.
    pub const fn is_net_forest(self) -> bool {
        matches!(
            self,
            LandUseType::DisturbedForest | LandUseType::UndisturbedForest
        )
    }

    /// States whose succession age restarts at 1 on entry.
    pub const fn resets_succession_age(self) -> bool {
        matches!(
            self,
            LandUseType::HerbaceousVegetation
                | LandUseType::Shrubs
                | LandUseType::DisturbedForest
                | LandUseType::CroplandAnnualAbandoned
                | LandUseType::PastureAbandoned
                | LandUseType::AgroforestryAbandoned
                | LandUseType::NetForestDeforested
                | LandUseType::PlantationDeforested
        )
    }

    /// States whose age advances every year.
    pub const fn tracks_succession_age(self) -> bool {
        self.resets_succession_age()
    }

    /// Fixed 1:1 mapping to the class a shrinking type leaves behind.
    ///
    /// Built-up and plantation never shrink and therefore have no mapping.
    pub const fn abandoned_class(self) -> Option<LandUseType> {
        match self {
            LandUseType::CroplandAnnual => Some(LandUseType::CroplandAnnualAbandoned),
            LandUseType::Pasture => Some(LandUseType::PastureAbandoned),
            LandUseType::Agroforestry => Some(LandUseType::AgroforestryAbandoned),
            _ => None,
        }
    }
}

impl fmt::Display for LandUseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.label(), self.code())
    }
}

/// Potential natural vegetation class of a cell.
///
/// Bounds how far secondary succession can proceed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PnvClass {
    Grassland,
    Shrubland,
    Forest,
}

impl PnvClass {
    /// Most advanced class succession may reach on this PNV.
    pub const fn succession_ceiling(self) -> LandUseType {
        match self {
            PnvClass::Grassland => LandUseType::HerbaceousVegetation,
            PnvClass::Shrubland => LandUseType::Shrubs,
            PnvClass::Forest => LandUseType::UndisturbedForest,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_roundtrip_for_all_classes() {
        for lut in LandUseType::ALL {
            assert_eq!(LandUseType::from_code(lut.code()), Some(lut));
        }
        assert_eq!(LandUseType::from_code(0), None);
        assert_eq!(LandUseType::from_code(19), None);
    }

    #[test]
    fn test_abandoned_mapping() {
        assert_eq!(
            LandUseType::CroplandAnnual.abandoned_class(),
            Some(LandUseType::CroplandAnnualAbandoned)
        );
        assert_eq!(LandUseType::BuiltUp.abandoned_class(), None);
        assert_eq!(LandUseType::Plantation.abandoned_class(), None);
    }

    #[test]
    fn test_class_partitions() {
        assert!(LandUseType::Plantation.is_forest_bearing());
        assert!(!LandUseType::Plantation.is_net_forest());
        assert!(LandUseType::Water.is_static());
        assert!(!LandUseType::Water.is_active());
        assert!(LandUseType::NetForestDeforested.resets_succession_age());
        assert!(!LandUseType::UndisturbedForest.resets_succession_age());
    }
}
