use crate::allocation::AllocationError;
use crate::config::ConfigError;
use crate::core_types::LandUseType;
use crate::grid::{LayerError, RasterError};
use thiserror::Error;

/// Fatal simulation failures.
///
/// Demand shortfalls are never errors; these are configuration problems
/// caught at start-up and structural invariant violations that would
/// corrupt the forest and carbon accounting if the run continued.
#[derive(Debug, Error)]
pub enum SimulationError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Layers(#[from] LayerError),
    #[error("initial landscape does not match the static layers: {0}")]
    Landscape(#[from] RasterError),
    #[error("step {step}, sample {sample}: {source}")]
    Allocation {
        step: u32,
        sample: u32,
        #[source]
        source: AllocationError,
    },
    #[error("grid completeness violated at step {step}, sample {sample}: {assigned} of {expected} cells carry a land-use type")]
    Incomplete {
        step: u32,
        sample: u32,
        assigned: usize,
        expected: usize,
    },
    #[error("grid completeness violated at step {step}, sample {sample}: {land_use} has {cached} cells in the area cache but {counted} on the grid")]
    AreaMismatch {
        step: u32,
        sample: u32,
        land_use: LandUseType,
        cached: usize,
        counted: usize,
    },
    #[error("AGB consistency violated at step {step}, sample {sample}: {land_use} cell {cell} holds {agb} Mg")]
    BiomassOutsideForest {
        step: u32,
        sample: u32,
        land_use: LandUseType,
        cell: usize,
        agb: f32,
    },
}
