// Semi-Lagrangian transport

use std::mem;

use na::DMatrix;

use crate::{ScalarField, sim::grid::GridState, sim::numeric::bilinear_sample};

/// Trace every cell centre backwards through `(u, v)` for a time `dt`, and
/// write the value of `field` found there into `out`.
///
/// `out` must not alias any of the inputs; the whole pass reads the old
/// field. There is no CFL restriction: long steps only smear the result.
pub fn advect_into(
    out: &mut ScalarField,
    field: &ScalarField,
    u: &ScalarField,
    v: &ScalarField,
    dt: f32,
) {
    let (rows, cols) = field.shape();

    for r in 0..rows {
        for c in 0..cols {
            let x = c as f32 - dt * u.index((r, c));
            let y = r as f32 - dt * v.index((r, c));
            *(out.index_mut((r, c))) = bilinear_sample(field, x, y);
        }
    }
}

/// Back buffers for advection. Each pass writes into a back buffer, which is
/// then swapped with the live field.
pub struct Advector {
    u_back: ScalarField,
    v_back: ScalarField,
    dye_back: ScalarField,
}

impl Advector {
    pub fn new(n: usize) -> Self {
        Advector {
            u_back: DMatrix::zeros(n, n),
            v_back: DMatrix::zeros(n, n),
            dye_back: DMatrix::zeros(n, n),
        }
    }

    /// Self-advect the velocity field. Both components trace through the
    /// pre-advection velocity.
    pub fn advect_velocity(&mut self, grid: &mut GridState, dt: f32) {
        advect_into(&mut self.u_back, &grid.u, &grid.u, &grid.v, dt);
        advect_into(&mut self.v_back, &grid.v, &grid.u, &grid.v, dt);

        mem::swap(&mut grid.u, &mut self.u_back);
        mem::swap(&mut grid.v, &mut self.v_back);

        grid.enforce_no_through();
    }

    /// Advect the dye through the current velocity field.
    pub fn advect_dye(&mut self, grid: &mut GridState, dt: f32) {
        advect_into(&mut self.dye_back, &grid.dye, &grid.u, &grid.v, dt);
        mem::swap(&mut grid.dye, &mut self.dye_back);
    }
}
