// Headless task runner: steps the solver a fixed number of times

use indicatif::{ProgressBar, ProgressIterator, ProgressStyle};
use tracing::{info, warn};

use crate::sim::{
    error::SimError,
    fluid::{FluidSim, SimStats},
};

#[derive(Clone, Debug)]
pub struct HeadlessOutput {
    /// Post-projection divergence L2 norm of every step, in order
    pub divergence_series: Vec<f32>,

    pub final_stats: SimStats,
}

/// Run `steps` steps of `sim`, printing the divergence after each one.
///
/// After the first step the divergence on either side of the projection is
/// printed once as a smoke test. Stops with [`SimError::NonFinite`] as soon
/// as any field holds a NaN or infinity.
pub fn headless_task(mut sim: FluidSim, steps: usize) -> Result<HeadlessOutput, SimError> {
    let bar = ProgressBar::new(steps as u64);
    bar.set_style(
        ProgressStyle::with_template(
            "[Elapsed: {elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} (Remaining: {eta_precise})"
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("##-"),
    );

    let mut divergence_series: Vec<f32> = Vec::with_capacity(steps);

    for stats in sim.by_ref().take(steps).progress_with(bar.clone()) {
        if stats.step == 1 {
            bar.println(projection_test_line(&stats));
        }

        bar.println(step_line(&stats));

        if projection_regressed(&stats) {
            warn!(
                step = stats.step,
                before = stats.pre_projection_divergence_l2,
                after = stats.divergence_l2,
                "projection did not reduce divergence"
            );
        }

        if let Some(field) = stats.non_finite_field {
            warn!(field, step = stats.step, "simulation produced non-finite values");
            bar.abandon();
            return Err(SimError::NonFinite {
                field,
                step: stats.step,
            });
        }

        divergence_series.push(stats.divergence_l2);
    }

    bar.finish();

    let final_stats = sim.get_stats();
    info!(
        steps = final_stats.step,
        divergence_l2 = final_stats.divergence_l2,
        max_velocity = final_stats.max_velocity,
        max_dye = final_stats.max_dye,
        "headless run complete"
    );

    Ok(HeadlessOutput {
        divergence_series,
        final_stats,
    })
}

/// Whether the projection failed to lower a nonzero divergence. A field with
/// no divergence to begin with is not a failure.
fn projection_regressed(stats: &SimStats) -> bool {
    stats.pre_projection_divergence_l2 > 0.
        && stats.divergence_l2 >= stats.pre_projection_divergence_l2
}

/// One-off comparison printed after the first projection.
fn projection_test_line(stats: &SimStats) -> String {
    format!(
        "[projection test] L2(div) before={:.6}, after={:.6}",
        stats.pre_projection_divergence_l2, stats.divergence_l2
    )
}

/// Per-step progress line. Steps are numbered from 1, the same count that
/// [`SimStats::step`] and [`SimError::NonFinite`] report.
fn step_line(stats: &SimStats) -> String {
    format!("step {:03}  L2(div) = {:.6}", stats.step, stats.divergence_l2)
}
