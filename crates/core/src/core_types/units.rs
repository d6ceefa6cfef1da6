//! Semantic unit types for biomass and yield quantities
//!
//! Newtype wrappers keep above-ground biomass masses and crop/livestock yield
//! units from being mixed with cell counts.
//!
//! # Usage
//! ```
//! use lulcc_core::core_types::units::Megagrams;
//!
//! let stock = Megagrams::new(120.0);
//! let harvest = Megagrams::new(20.0);
//! assert_eq!(*(stock - harvest), 100.0);
//! ```

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Deref, Sub, SubAssign};

/// Above-ground biomass mass in megagrams (tonnes)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
#[repr(transparent)]
pub struct Megagrams(f64);

impl Megagrams {
    /// Zero mass
    pub const ZERO: Megagrams = Megagrams(0.0);

    /// Create a new mass. Asserts the value is finite and non-negative.
    #[inline]
    #[must_use]
    #[track_caller]
    pub fn new(value: f64) -> Self {
        assert!(
            value.is_finite() && value >= 0.0,
            "Megagrams::new: mass must be finite and non-negative, got {value}"
        );
        Megagrams(value)
    }

    /// Saturating subtraction (never below zero)
    #[inline]
    #[must_use]
    pub fn saturating_sub(self, other: Megagrams) -> Megagrams {
        Megagrams((self.0 - other.0).max(0.0))
    }
}

impl Eq for Megagrams {}

impl PartialOrd for Megagrams {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Megagrams {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl Deref for Megagrams {
    type Target = f64;
    #[inline]
    fn deref(&self) -> &f64 {
        &self.0
    }
}

impl Add for Megagrams {
    type Output = Megagrams;
    fn add(self, rhs: Megagrams) -> Megagrams {
        Megagrams(self.0 + rhs.0)
    }
}

impl AddAssign for Megagrams {
    fn add_assign(&mut self, rhs: Megagrams) {
        self.0 += rhs.0;
    }
}

impl Sub for Megagrams {
    type Output = Megagrams;
    fn sub(self, rhs: Megagrams) -> Megagrams {
        Megagrams(self.0 - rhs.0)
    }
}

impl SubAssign for Megagrams {
    fn sub_assign(&mut self, rhs: Megagrams) {
        self.0 -= rhs.0;
    }
}

impl Sum for Megagrams {
    fn sum<I: Iterator<Item = Megagrams>>(iter: I) -> Megagrams {
        Megagrams(iter.map(|m| m.0).sum())
    }
}

impl fmt::Display for Megagrams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2} Mg", self.0)
    }
}

/// Production in the yield units of a land-use type (e.g. tonnes of crop)
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
#[repr(transparent)]
pub struct YieldUnits(f64);

impl YieldUnits {
    /// Zero production
    pub const ZERO: YieldUnits = YieldUnits(0.0);

    /// Create a new yield quantity. Asserts the value is finite.
    #[inline]
    #[must_use]
    #[track_caller]
    pub fn new(value: f64) -> Self {
        assert!(value.is_finite(), "YieldUnits::new: value must be finite");
        YieldUnits(value)
    }
}

impl Deref for YieldUnits {
    type Target = f64;
    #[inline]
    fn deref(&self) -> &f64 {
        &self.0
    }
}

impl Add for YieldUnits {
    type Output = YieldUnits;
    fn add(self, rhs: YieldUnits) -> YieldUnits {
        YieldUnits(self.0 + rhs.0)
    }
}

impl AddAssign for YieldUnits {
    fn add_assign(&mut self, rhs: YieldUnits) {
        self.0 += rhs.0;
    }
}

impl Sub for YieldUnits {
    type Output = YieldUnits;
    fn sub(self, rhs: YieldUnits) -> YieldUnits {
        YieldUnits(self.0 - rhs.0)
    }
}

impl SubAssign for YieldUnits {
    fn sub_assign(&mut self, rhs: YieldUnits) {
        self.0 -= rhs.0;
    }
}

impl Sum for YieldUnits {
    fn sum<I: Iterator<Item = YieldUnits>>(iter: I) -> YieldUnits {
        YieldUnits(iter.map(|y| y.0).sum())
    }
}

impl fmt::Display for YieldUnits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.3} yield units", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_megagrams_saturating_sub() {
        let a = Megagrams::new(5.0);
        let b = Megagrams::new(8.0);
        assert_eq!(a.saturating_sub(b), Megagrams::ZERO);
        assert_eq!(*b.saturating_sub(a), 3.0);
    }

    #[test]
    #[should_panic(expected = "non-negative")]
    fn test_megagrams_rejects_negative() {
        let _ = Megagrams::new(-1.0);
    }

    #[test]
    fn test_sums() {
        let total: Megagrams = [1.0, 2.5, 3.5].into_iter().map(Megagrams::new).sum();
        assert_eq!(*total, 7.0);
        let produced: YieldUnits = [0.5, 0.25].into_iter().map(YieldUnits::new).sum();
        assert_eq!(*produced, 0.75);
    }
}
