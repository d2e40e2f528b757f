// Simulation parameters and their validation

use serde::{Deserialize, Serialize};

use crate::sim::error::SimError;

/// Solver configuration. Validated on construction and whenever it is
/// replaced; the driver only ever swaps it whole between steps (or updates
/// the seed on `reset_with_seed`).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationParameters {
    /// Cells along each side of the square grid
    pub grid_size: usize,

    /// Time step
    pub dt: f32,

    /// Exponential decay rate of velocity
    pub velocity_dissipation: f32,

    /// Exponential decay rate of dye
    pub dye_dissipation: f32,

    /// Vorticity confinement strength; zero disables confinement
    pub vorticity_strength: f32,

    /// Jacobi sweeps per pressure solve
    pub jacobi_iterations: usize,

    /// Seed for the random initial splats
    pub seed: u64,

    /// Number of random splats placed on reset
    pub seed_splats: usize,
}

impl Default for SimulationParameters {
    fn default() -> Self {
        SimulationParameters {
            grid_size: 128,
            dt: 0.08,
            velocity_dissipation: 0.08,
            dye_dissipation: 0.12,
            vorticity_strength: 6.0,
            jacobi_iterations: 60,
            seed: 7,
            seed_splats: 6,
        }
    }
}

impl SimulationParameters {
    /// Check every parameter, reporting the first one that is out of range.
    pub fn validate(&self) -> Result<(), SimError> {
        if self.grid_size < 2 {
            return Err(SimError::InvalidGridSize(self.grid_size));
        }

        if !(self.dt.is_finite() && self.dt > 0.) {
            return Err(invalid("dt", self.dt, "must be positive and finite"));
        }

        if self.jacobi_iterations == 0 {
            return Err(SimError::InvalidParameter {
                name: "jacobi_iterations",
                value: "0".to_string(),
                reason: "a zero-iteration projection never removes divergence",
            });
        }

        for (name, value) in [
            ("velocity_dissipation", self.velocity_dissipation),
            ("dye_dissipation", self.dye_dissipation),
            ("vorticity_strength", self.vorticity_strength),
        ] {
            if !(value.is_finite() && value >= 0.) {
                return Err(invalid(name, value, "must be non-negative and finite"));
            }
        }

        Ok(())
    }

    /// Cell size in domain units; the grid covers the unit square.
    pub fn cell_size(&self) -> f32 {
        1. / self.grid_size as f32
    }
}

fn invalid(name: &'static str, value: f32, reason: &'static str) -> SimError {
    SimError::InvalidParameter {
        name,
        value: value.to_string(),
        reason,
    }
}
