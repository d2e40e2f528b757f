// Builds the headless run configuration from the CLI or a saved input file

use std::{
    error::Error,
    fs::File,
    io::{BufReader, BufWriter},
    path::{Path, PathBuf},
};

use fluid_2d::sim::SimulationParameters;
use serde::{Deserialize, Serialize};
use tracing::info;

pub mod cli;

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct SimulationInput {
    #[serde(default)]
    pub params: SimulationParameters,

    /// Number of steps to run
    pub steps: usize,

    /// Where to write the JSON run summary, if anywhere
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary_path: Option<PathBuf>,
}

impl SimulationInput {
    pub fn load(path: &Path) -> Result<Self, Box<dyn Error>> {
        let reader = BufReader::new(File::open(path)?);
        Ok(serde_json::from_reader(reader)?)
    }

    pub fn save(&self, path: &Path) -> Result<(), Box<dyn Error>> {
        let writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }

    pub fn log(&self) {
        let p = &self.params;
        info!(
            "Simulation is shown below:\n\n\
        \t grid:        {n} x {n} (h = {h})\n\
        \t steps:       {}\n\
        \t dt:          {}\n\
        \t dissipation: {} (velocity), {} (dye)\n\
        \t vorticity:   {}\n\
        \t jacobi:      {} iterations\n\
        \t seed:        {} ({} splats)\n\n\
        ",
            self.steps,
            p.dt,
            p.velocity_dissipation,
            p.dye_dissipation,
            p.vorticity_strength,
            p.jacobi_iterations,
            p.seed,
            p.seed_splats,
            n = p.grid_size,
            h = p.cell_size(),
        );
    }
}
