// Pressure projection by Jacobi relaxation of the Poisson equation.

use std::mem;

use na::DMatrix;
use tracing::trace;

use crate::{
    ScalarField,
    sim::{grid::GridState, numeric},
};

/// L2 norm of the interior divergence on either side of one projection.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ProjectionReport {
    pub divergence_before: f32,
    pub divergence_after: f32,
}

/// Owns the scratch grids for the pressure solve. Nothing in here carries
/// meaning across projections; pressure restarts from zero every time.
pub struct PressureProjector {
    /// Divergence of the velocity field being projected (Poisson RHS)
    div: ScalarField,

    /// Current pressure iterate
    p: ScalarField,

    /// Pressure iterate being written by the running sweep
    p_next: ScalarField,
}

impl PressureProjector {
    pub fn new(n: usize) -> Self {
        PressureProjector {
            div: DMatrix::zeros(n, n),
            p: DMatrix::zeros(n, n),
            p_next: DMatrix::zeros(n, n),
        }
    }

    /// The pressure from the most recent solve.
    pub fn pressure(&self) -> &ScalarField {
        &self.p
    }

    /// Iteratively solve the poisson equation ∇²p = div with a fixed number of
    /// Jacobi sweeps, starting from p = 0.
    ///
    /// Each sweep reads only the previous iterate. Walls use a zero normal
    /// gradient: edge pressure is copied from the adjacent interior cell.
    /// Zero iterations leave p = 0, which makes the projection a no-op.
    pub fn solve_pressure(&mut self, iterations: usize) -> &ScalarField {
        let n = self.div.nrows();

        self.p.fill(0.);
        self.p_next.fill(0.);

        for _ in 0..iterations {
            for r in 1..(n - 1) {
                for c in 1..(n - 1) {
                    let neighbours = self.p.index((r, c + 1))
                        + self.p.index((r, c - 1))
                        + self.p.index((r + 1, c))
                        + self.p.index((r - 1, c));
                    *(self.p_next.index_mut((r, c))) = 0.25 * (neighbours - self.div.index((r, c)));
                }
            }

            // Neumann condition that boundary dp/dn = 0
            for r in 0..n {
                *(self.p_next.index_mut((r, 0))) = *self.p_next.index((r, 1));
                *(self.p_next.index_mut((r, n - 1))) = *self.p_next.index((r, n - 2));
            }
            for c in 0..n {
                *(self.p_next.index_mut((0, c))) = *self.p_next.index((1, c));
                *(self.p_next.index_mut((n - 1, c))) = *self.p_next.index((n - 2, c));
            }

            mem::swap(&mut self.p, &mut self.p_next);
        }

        &self.p
    }

    /// Remove the gradient part of the velocity field, leaving it
    /// (approximately) divergence free.
    pub fn project(&mut self, grid: &mut GridState, iterations: usize) -> ProjectionReport {
        grid.enforce_no_through();

        numeric::divergence_into(&mut self.div, &grid.u, &grid.v);
        let divergence_before = numeric::interior_norm(&self.div);

        self.solve_pressure(iterations);

        let dp_dx: ScalarField = numeric::gradient_x(&self.p);
        let dp_dy: ScalarField = numeric::gradient_y(&self.p);

        grid.u -= dp_dx;
        grid.v -= dp_dy;
        grid.enforce_no_through();

        numeric::divergence_into(&mut self.div, &grid.u, &grid.v);
        let divergence_after = numeric::interior_norm(&self.div);

        trace!(divergence_before, divergence_after, iterations, "projected velocity");

        ProjectionReport {
            divergence_before,
            divergence_after,
        }
    }
}
