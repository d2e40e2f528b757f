// Localized dye/velocity injection and field dissipation

use serde::{Deserialize, Serialize};

use crate::{ScalarField, sim::grid::GridState};

/// A radius-bounded injection of dye and velocity.
///
/// Position and radius are in normalized domain units, `[0,1]×[0,1]`. The
/// velocity `(fx, fy)` is added at full strength in the centre.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Splat {
    pub x: f32,
    pub y: f32,
    pub dye: f32,
    pub fx: f32,
    pub fy: f32,
    pub radius: f32,
}

impl Splat {
    pub fn new(x: f32, y: f32, dye: f32, fx: f32, fy: f32, radius: f32) -> Self {
        Splat {
            x,
            y,
            dye,
            fx,
            fy,
            radius,
        }
    }

    /// Whether applying this splat cannot change any field: no footprint,
    /// nothing to inject, or a footprint that misses the unit square.
    pub fn is_noop(&self) -> bool {
        let finite = [self.x, self.y, self.dye, self.fx, self.fy, self.radius]
            .iter()
            .all(|f| f.is_finite());

        !finite
            || self.radius <= 0.
            || (self.dye == 0. && self.fx == 0. && self.fy == 0.)
            || self.x + self.radius < 0.
            || self.x - self.radius > 1.
            || self.y + self.radius < 0.
            || self.y - self.radius > 1.
    }

    /// Add the splat to `grid`, clipped to the grid. The falloff is
    /// `(1 - d²/r²)²`: one at the centre, zero with zero slope at the rim.
    pub fn apply(&self, grid: &mut GridState) {
        if self.is_noop() {
            return;
        }

        let n = grid.size();
        let extent = (n - 1) as f32;

        let (cx, cy) = (self.x * extent, self.y * extent);
        let radius = self.radius * extent;
        let radius_sq = radius * radius;

        // bounding box of the footprint, clipped to the grid
        let c_lo = (cx - radius).ceil().max(0.) as usize;
        let c_hi = (cx + radius).floor().min(extent);
        let r_lo = (cy - radius).ceil().max(0.) as usize;
        let r_hi = (cy + radius).floor().min(extent);
        if c_hi < 0. || r_hi < 0. {
            return;
        }
        let (c_hi, r_hi) = (c_hi as usize, r_hi as usize);

        for r in r_lo..=r_hi {
            for c in c_lo..=c_hi {
                let (dx, dy) = (c as f32 - cx, r as f32 - cy);
                let q = (dx * dx + dy * dy) / radius_sq;
                if q >= 1. {
                    continue;
                }

                let weight = (1. - q) * (1. - q);
                *(grid.dye.index_mut((r, c))) += self.dye * weight;
                *(grid.u.index_mut((r, c))) += self.fx * weight;
                *(grid.v.index_mut((r, c))) += self.fy * weight;
            }
        }

        grid.enforce_no_through();
    }
}

/// Scale a field by `exp(-rate * dt)`.
pub fn dissipate(field: &mut ScalarField, rate: f32, dt: f32) {
    let decay = (-rate * dt).exp();
    if decay != 1. {
        *field *= decay;
    }
}
