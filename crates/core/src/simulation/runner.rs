use super::{RunLedger, Simulation, SimulationError};
use crate::config::SimulationConfig;
use crate::core_types::LandUseType;
use crate::demand::DemandProvider;
use crate::grid::{Raster, StaticLayers};
use rayon::prelude::*;
use std::sync::Arc;
use tracing::info;

/// Run all Monte Carlo samples of a configuration in parallel.
///
/// Every sample starts from the same initial rasters, reads the same shared
/// static layers and owns its landscape and random stream. The ledger is
/// identical regardless of the number of worker threads.
///
/// # Arguments
///
/// * `config` - Run configuration; `samples` and `time_steps` set the run size
/// * `layers` - Static layers shared by all samples
/// * `land_use` - Initial land-use raster
/// * `agb` - Initial AGB raster (Mg per cell)
/// * `provider` - Demand per time step
///
/// # Errors
///
/// The first failing sample's error, in sample order.
pub fn run_samples(
    config: &SimulationConfig,
    layers: Arc<StaticLayers>,
    land_use: &Raster<LandUseType>,
    agb: &Raster<f32>,
    provider: &dyn DemandProvider,
) -> Result<RunLedger, SimulationError> {
    info!(
        "Running {} samples x {} steps on {} threads",
        config.samples,
        config.time_steps,
        rayon::current_num_threads()
    );

    let results: Vec<_> = (0..config.samples)
        .into_par_iter()
        .map(|sample| {
            let mut simulation =
                Simulation::new(config, Arc::clone(&layers), land_use.clone(), agb.clone(), sample)?;
            simulation.run(provider, config.time_steps)
        })
        .collect();

    let mut ledger = RunLedger::new();
    for summaries in results {
        ledger.record_sample(summaries?);
    }
    Ok(ledger)
}
