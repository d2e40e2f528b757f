use std::process::exit;

use clap::Parser;
use fluid_2d::sim::{FluidSim, task};
use tracing::{Level, error};

mod postprocessing;
mod preprocessing;

use preprocessing::cli::CliArgs;

fn main() {
    let args = CliArgs::parse();

    tracing_subscriber::fmt()
        .with_max_level(if args.verbose {
            Level::DEBUG
        } else {
            Level::INFO
        })
        .with_target(false)
        .init();

    let sim_input = args.create_input();
    sim_input.log();

    let sim = FluidSim::new(sim_input.params.clone()).unwrap_or_else(|err| {
        error!("Invalid simulation parameters: {err}");
        exit(1);
    });

    match task::headless_task(sim, sim_input.steps) {
        Ok(sim_output) => postprocessing::postprocess(&sim_input, &sim_output),
        Err(err) => {
            error!("Simulation failed: {err}");
            exit(1);
        }
    }
}
