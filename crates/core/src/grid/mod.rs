//! Grid primitives and landscape state

pub mod landscape;
pub mod layers;
pub mod noise;
pub mod ops;
pub mod raster;
pub mod synthetic;
pub mod terrain;

// Re-export main types
pub use landscape::{Landscape, TIE_BREAK_MAGNITUDE};
pub use layers::{ClimateLayers, IncrementLayers, LayerError, StaticInputs, StaticLayers};
pub use noise::NoiseGenerator;
pub use ops::{distance_to, fringe_mask, neighbor_count, window_count};
pub use raster::{Raster, RasterError};
pub use synthetic::SyntheticRegion;
pub use terrain::slope_degrees;
