use clap::Parser;
use lulcc_core::{
    run_samples, LandUseType, PerCapita, PerCapitaDemand, RunLedger, Scenario, SimulationConfig,
    StaticLayers, SyntheticRegion,
};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

/// Land-use change projection on a synthetic region
#[derive(Parser, Debug)]
#[command(name = "lulcc-headless")]
#[command(about = "Headless land-use and land-cover change projection", long_about = None)]
struct Args {
    /// Simulation config (JSON); built-in config if omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Grid width in cells
    #[arg(long, default_value_t = 64)]
    width: usize,

    /// Grid height in cells
    #[arg(long, default_value_t = 64)]
    height: usize,

    /// Seed of the synthetic region
    #[arg(long, default_value_t = 7)]
    region_seed: u64,

    /// Override the config's random seed
    #[arg(short, long)]
    seed: Option<u64>,

    /// Override the number of Monte Carlo samples
    #[arg(long)]
    samples: Option<u32>,

    /// Override the number of annual time steps
    #[arg(long)]
    steps: Option<u32>,

    /// Policy scenario (weak-conservation, enforced-conservation, no-conservation)
    #[arg(long)]
    scenario: Option<String>,

    /// Initial population of the region
    #[arg(long, default_value_t = 5000.0)]
    population: f64,

    /// Annual population growth rate
    #[arg(long, default_value_t = 0.025)]
    growth_rate: f64,

    /// Write the full run ledger as JSON to this file
    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    println!("=== Land-Use Change Projection ===\n");

    let mut config = match &args.config {
        Some(path) => SimulationConfig::from_file(path)?,
        None => SimulationConfig::builtin(),
    };
    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    if let Some(samples) = args.samples {
        config.samples = samples;
    }
    if let Some(steps) = args.steps {
        config.time_steps = steps;
    }
    if let Some(name) = &args.scenario {
        config.scenario = match name.to_lowercase().as_str() {
            "weak-conservation" | "weak" => Scenario::WeakConservation,
            "enforced-conservation" | "enforced" => Scenario::EnforcedConservation,
            "no-conservation" | "none" => Scenario::NoConservation,
            _ => {
                println!("Unknown scenario '{}', using weak conservation", name);
                Scenario::WeakConservation
            }
        };
    }

    let region = SyntheticRegion::generate(args.width, args.height, args.region_seed);
    let layers = Arc::new(StaticLayers::derive(region.inputs, config.cell_size)?);
    println!(
        "Region: {}x{} cells of {:.0}m, scenario {:?}",
        layers.width, layers.height, config.cell_size, config.scenario
    );
    println!(
        "Running {} sample(s) x {} step(s)\n",
        config.samples, config.time_steps
    );

    let demand = PerCapitaDemand {
        initial_population: args.population,
        growth_rate: args.growth_rate,
        per_capita: BTreeMap::from([
            (LandUseType::BuiltUp, PerCapita::Cells(0.004)),
            (LandUseType::CroplandAnnual, PerCapita::Yield(0.05)),
            (LandUseType::Pasture, PerCapita::Cells(0.02)),
            (LandUseType::Agroforestry, PerCapita::Cells(0.003)),
            (LandUseType::Plantation, PerCapita::Cells(0.004)),
        ]),
        agb_per_capita: 0.8,
    };

    let ledger = run_samples(&config, layers, &region.land_use, &region.agb, &demand)?;
    print_report(&ledger);

    if let Some(path) = &args.output {
        std::fs::write(path, serde_json::to_string_pretty(&ledger)?)?;
        println!("\nLedger written to {}", path.display());
    }
    Ok(())
}

fn print_report(ledger: &RunLedger) {
    println!("Sample | Step | Built-up | Cropland | Pasture | Forest | Conflicts | Harvested(Mg) | Total AGB(Mg)");
    println!("-------|------|----------|----------|---------|--------|-----------|---------------|--------------");
    for (sample, steps) in ledger.iter() {
        for summary in steps {
            let area = |lut: LandUseType| summary.areas.get(&lut).copied().unwrap_or(0);
            let forest = area(LandUseType::DisturbedForest) + area(LandUseType::UndisturbedForest);
            println!(
                "{:6} | {:4} | {:8} | {:8} | {:7} | {:6} | {:9} | {:13.1} | {:13.1}",
                sample,
                summary.step,
                area(LandUseType::BuiltUp),
                area(LandUseType::CroplandAnnual),
                area(LandUseType::Pasture),
                forest,
                summary.conflicts,
                *summary.harvest.harvested,
                *summary.total_agb
            );
        }
    }

    println!("\n=== Projection Complete ===");
    for summary in ledger.final_steps() {
        let leakage = summary.leakage();
        if leakage.is_empty() {
            println!("Sample {}: all demand met locally", summary.sample);
        } else {
            for (land_use, residual) in leakage {
                println!(
                    "Sample {}: {} short by {:.1} at step {}",
                    summary.sample, land_use, residual, summary.step
                );
            }
        }
    }
}
