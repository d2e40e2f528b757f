// Post-run reporting

use std::{error::Error, fs::File, io::BufWriter, path::Path};

use fluid_2d::sim::{SimStats, SimulationParameters, task::HeadlessOutput};
use serde::Serialize;
use tracing::{info, warn};

use crate::preprocessing::SimulationInput;

#[derive(Serialize)]
struct RunSummary<'a> {
    params: &'a SimulationParameters,
    steps: usize,
    final_stats: &'a SimStats,
    divergence_series: &'a [f32],
}

pub fn postprocess(sim_input: &SimulationInput, sim_output: &HeadlessOutput) {
    if let Some(path) = &sim_input.summary_path {
        let summary = RunSummary {
            params: &sim_input.params,
            steps: sim_input.steps,
            final_stats: &sim_output.final_stats,
            divergence_series: &sim_output.divergence_series,
        };

        _ = write_summary(path, &summary)
            .inspect(|_| info!("Wrote run summary to {}", path.display()))
            .inspect_err(|err| warn!("Unable to write run summary: {:?}", err));
    }
}

fn write_summary(path: &Path, summary: &RunSummary) -> Result<(), Box<dyn Error>> {
    let writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(writer, summary)?;
    Ok(())
}
