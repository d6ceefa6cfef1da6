//! Succession and forest-state dynamics

pub mod degradation;
pub mod fringe;
pub mod transitions;

pub use degradation::{classify, classify_landscape, trend_counts, ForestTrend};
pub use fringe::{apply_fringe_disturbance, FringeSummary};
pub use transitions::{SuccessionModel, Transition};
