//! Ordering of candidate cells by suitability
//!
//! "No candidates" is an explicit `None`, never a NaN maximum.

use crate::grid::Raster;

/// Direction of a ranking
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RankOrder {
    /// Most suitable first (growth)
    MostSuitableFirst,
    /// Least suitable first (shrink)
    LeastSuitableFirst,
}

/// Candidate cell indices in a strict total order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ranking {
    cells: Vec<usize>,
}

impl Ranking {
    /// Rank every cell accepted by `eligible`.
    ///
    /// Ties (after tie-break noise) are broken by cell index, so the order
    /// is fully deterministic. Returns `None` when no cell is eligible.
    pub fn new(
        suitability: &Raster<f32>,
        order: RankOrder,
        eligible: impl Fn(usize) -> bool,
    ) -> Option<Self> {
        let mut cells: Vec<usize> = (0..suitability.len()).filter(|&idx| eligible(idx)).collect();
        if cells.is_empty() {
            return None;
        }
        cells.sort_unstable_by(|&a, &b| {
            let by_value = match order {
                RankOrder::MostSuitableFirst => suitability[b].total_cmp(&suitability[a]),
                RankOrder::LeastSuitableFirst => suitability[a].total_cmp(&suitability[b]),
            };
            by_value.then(a.cmp(&b))
        });
        Some(Self { cells })
    }

    /// Number of ranked cells
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// The first `n` cells (or all of them)
    pub fn top(&self, n: usize) -> &[usize] {
        &self.cells[..n.min(self.cells.len())]
    }

    /// All ranked cells in order
    pub fn as_slice(&self) -> &[usize] {
        &self.cells
    }
}
