use std::{path::PathBuf, process::exit};

use clap::Parser;
use fluid_2d::sim::SimulationParameters;
use tracing::{error, info};

use crate::preprocessing::SimulationInput;

// Raw, CLI input
#[derive(Parser, Debug)]
#[command(version, about = "Headless 2D stable-fluids solver", long_about = None)]
pub struct CliArgs {
    #[arg(long, help = "An input file with pre-loaded parameters.")]
    input_json: Option<PathBuf>,

    #[arg(long, help = "Optional path to save the resolved input file to.")]
    input_json_savepath: Option<PathBuf>,

    #[arg(long, help = "Optional path to write a JSON run summary to.")]
    summary_path: Option<PathBuf>,

    #[arg(short, long, default_value = "120", help = "Number of steps to run.")]
    steps: usize,

    #[arg(short = 'n', long, default_value = "128", help = "Cells along each side of the grid.")]
    grid_size: usize,

    #[arg(long, default_value = "0.08", help = "Time step.")]
    dt: f32,

    #[arg(long, default_value = "0.08", help = "Velocity dissipation rate.")]
    velocity_dissipation: f32,

    #[arg(long, default_value = "0.12", help = "Dye dissipation rate.")]
    dye_dissipation: f32,

    #[arg(long, default_value = "6.0", help = "Vorticity confinement strength.")]
    vorticity: f32,

    #[arg(long, default_value = "60", help = "Jacobi iterations per pressure solve.")]
    iterations: usize,

    #[arg(long, default_value = "7", help = "Seed for the random initial splats.")]
    seed: u64,

    #[arg(long, default_value = "6", help = "Number of random initial splats.")]
    seed_splats: usize,

    #[arg(short, long, help = "Log at debug level.")]
    pub verbose: bool,
}

impl CliArgs {
    pub fn create_input(&self) -> SimulationInput {
        let input = match &self.input_json {
            // if the input file is supplied, just use that
            Some(input_filepath) => {
                info!("Using input file {}", input_filepath.display());

                SimulationInput::load(input_filepath).unwrap_or_else(|err| {
                    error!("Failed to load input file {:?}: {}", input_filepath, err);
                    exit(1);
                })
            }

            // otherwise, build the input from the other arguments
            None => SimulationInput {
                params: SimulationParameters {
                    grid_size: self.grid_size,
                    dt: self.dt,
                    velocity_dissipation: self.velocity_dissipation,
                    dye_dissipation: self.dye_dissipation,
                    vorticity_strength: self.vorticity,
                    jacobi_iterations: self.iterations,
                    seed: self.seed,
                    seed_splats: self.seed_splats,
                },
                steps: self.steps,
                summary_path: self.summary_path.clone(),
            },
        };

        if let Some(savepath) = &self.input_json_savepath {
            match input.save(savepath) {
                Ok(()) => info!("Saved input file to {}", savepath.display()),
                Err(err) => error!("Failed to save input file {:?}: {}", savepath, err),
            }
        }

        input
    }
}
