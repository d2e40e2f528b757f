// Vorticity confinement

use na::DMatrix;

use crate::{
    ScalarField,
    sim::{grid::GridState, numeric},
};

/// Guards the normalisation of |∇|ω|| where the vorticity is flat
const GRADIENT_EPSILON: f32 = 1e-5;

/// Re-injects the small-scale rotation that semi-Lagrangian advection
/// smears out. Holds the vorticity scratch grid.
pub struct VorticityConfiner {
    curl: ScalarField,
}

impl VorticityConfiner {
    pub fn new(n: usize) -> Self {
        VorticityConfiner {
            curl: DMatrix::zeros(n, n),
        }
    }

    /// The vorticity computed by the last call to [`Self::apply`].
    pub fn vorticity(&self) -> &ScalarField {
        &self.curl
    }

    /// Add `dt * strength * (N × ω)` to the velocity field, where N is the
    /// unit vector pointing up the gradient of |ω|. A non-positive strength
    /// disables confinement.
    pub fn apply(&mut self, grid: &mut GridState, strength: f32, dt: f32) {
        if strength <= 0. {
            return;
        }

        numeric::curl_into(&mut self.curl, &grid.u, &grid.v);

        let w = &self.curl;
        let n = w.nrows();

        // Writes only touch the velocity, never the curl, so a single pass
        // over the interior is order independent.
        for r in 1..(n - 1) {
            for c in 1..(n - 1) {
                let grad_x = 0.5 * (w.index((r, c + 1)).abs() - w.index((r, c - 1)).abs());
                let grad_y = 0.5 * (w.index((r + 1, c)).abs() - w.index((r - 1, c)).abs());
                let length = (grad_x * grad_x + grad_y * grad_y).sqrt() + GRADIENT_EPSILON;

                let (nx, ny) = (grad_x / length, grad_y / length);
                let omega = *w.index((r, c));

                *(grid.u.index_mut((r, c))) += dt * strength * ny * omega;
                *(grid.v.index_mut((r, c))) -= dt * strength * nx * omega;
            }
        }

        grid.enforce_no_through();
    }
}
