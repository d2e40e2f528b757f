// Finite-difference operators and grid sampling
//
// All operators work in grid units: one cell is one unit of length, and
// velocities are expressed in cells per unit time. Rows index y, columns
// index x.

use na::DMatrix;

use crate::ScalarField;

/// Compute the finite-difference gradient of a scalar field **in the x axis**.
/// Uses a central finite difference for interior nodes and a first-order
/// forward/backward (depends on side) finite difference for edge nodes.
///
/// Parameters:
/// - `field` - A reference to the scalar field to take the gradient of
///
/// Returns:
/// - A `ScalarField` with the finite difference of each element
pub fn gradient_x(field: &ScalarField) -> ScalarField {
    let (rows, cols) = field.shape();

    let mut df_dx: DMatrix<f32> = DMatrix::zeros(rows, cols);

    // set interior nodes
    for r in 0..rows {
        for c in 1..(cols - 1) {
            *(df_dx.index_mut((r, c))) = 0.5 * (field.index((r, c + 1)) - field.index((r, c - 1)));
        }
    }

    // set edge nodes
    for r in 0..rows {
        *(df_dx.index_mut((r, 0))) = field.index((r, 1)) - field.index((r, 0));
        *(df_dx.index_mut((r, cols - 1))) = field.index((r, cols - 1)) - field.index((r, cols - 2));
    }

    df_dx
}

/// Compute the finite-difference gradient of a scalar field **in the y axis**.
/// Uses a central finite difference for interior nodes and a first-order
/// forward/backward (depends on side) finite difference for edge nodes.
///
/// Parameters:
/// - `field` - A reference to the scalar field to take the gradient of
///
/// Returns:
/// - A `ScalarField` with the finite difference of each element
pub fn gradient_y(field: &ScalarField) -> ScalarField {
    let (rows, cols) = field.shape();

    let mut df_dy: DMatrix<f32> = DMatrix::zeros(rows, cols);

    // set interior nodes
    for r in 1..(rows - 1) {
        for c in 0..cols {
            *(df_dy.index_mut((r, c))) = 0.5 * (field.index((r + 1, c)) - field.index((r - 1, c)));
        }
    }

    // set edge nodes
    for c in 0..cols {
        *(df_dy.index_mut((0, c))) = field.index((1, c)) - field.index((0, c));
        *(df_dy.index_mut((rows - 1, c))) = field.index((rows - 1, c)) - field.index((rows - 2, c));
    }

    df_dy
}

/// Compute the divergence of a velocity field <u,v> into `out`. That is, ∇⋅F
///
/// Interior cells use central differences of both components. The left and
/// right columns only see the one-sided x-derivative of `u`, and the top and
/// bottom rows add the one-sided y-derivative of `v`; since the normal
/// components vanish on the walls, these are the only terms that carry flux
/// across an edge.
pub fn divergence_into(out: &mut ScalarField, u: &ScalarField, v: &ScalarField) {
    let (rows, cols) = u.shape();
    out.fill(0.);

    for r in 1..(rows - 1) {
        for c in 1..(cols - 1) {
            *(out.index_mut((r, c))) = 0.5
                * ((u.index((r, c + 1)) - u.index((r, c - 1)))
                    + (v.index((r + 1, c)) - v.index((r - 1, c))));
        }
    }

    for r in 0..rows {
        *(out.index_mut((r, 0))) = u.index((r, 1)) - u.index((r, 0));
        *(out.index_mut((r, cols - 1))) = u.index((r, cols - 1)) - u.index((r, cols - 2));
    }

    for c in 0..cols {
        *(out.index_mut((0, c))) += v.index((1, c)) - v.index((0, c));
        *(out.index_mut((rows - 1, c))) += v.index((rows - 1, c)) - v.index((rows - 2, c));
    }
}

/// Compute the divergence of some velocity field <u,v>.
///
/// Returns:
///     A `ScalarField` of the divergence.
pub fn divergence(u: &ScalarField, v: &ScalarField) -> ScalarField {
    let mut div = DMatrix::zeros(u.nrows(), u.ncols());
    divergence_into(&mut div, u, v);
    div
}

/// Compute the scalar curl (vorticity) of a velocity field <u,v> into `out`.
///
/// Mathematically, this is ∂v/∂x - ∂u/∂y. Edge cells use the same one-sided
/// layout as [`divergence_into`].
pub fn curl_into(out: &mut ScalarField, u: &ScalarField, v: &ScalarField) {
    let (rows, cols) = u.shape();
    out.fill(0.);

    for r in 1..(rows - 1) {
        for c in 1..(cols - 1) {
            *(out.index_mut((r, c))) = 0.5
                * ((v.index((r, c + 1)) - v.index((r, c - 1)))
                    - (u.index((r + 1, c)) - u.index((r - 1, c))));
        }
    }

    for r in 0..rows {
        *(out.index_mut((r, 0))) = v.index((r, 1)) - v.index((r, 0));
        *(out.index_mut((r, cols - 1))) = v.index((r, cols - 1)) - v.index((r, cols - 2));
    }

    for c in 0..cols {
        *(out.index_mut((0, c))) -= u.index((1, c)) - u.index((0, c));
        *(out.index_mut((rows - 1, c))) -= u.index((rows - 1, c)) - u.index((rows - 2, c));
    }
}

/// Compute the scalar curl of some velocity field <u,v>.
pub fn curl(u: &ScalarField, v: &ScalarField) -> ScalarField {
    let mut w = DMatrix::zeros(u.nrows(), u.ncols());
    curl_into(&mut w, u, v);
    w
}

/// L2 norm of a field over its interior cells, leaving out the outer ring.
///
/// The edge cells of [`divergence`] carry one-sided wall terms that the
/// pressure solve never sees, so divergence is measured on the interior.
pub fn interior_norm(field: &ScalarField) -> f32 {
    let (rows, cols) = field.shape();
    if rows < 3 || cols < 3 {
        return 0.;
    }

    field.view((1, 1), (rows - 2, cols - 2)).norm()
}

/// Pointwise magnitude of a velocity field, sqrt(u² + v²).
pub fn velocity_magnitude(u: &ScalarField, v: &ScalarField) -> ScalarField {
    u.zip_map(v, |a, b| (a * a + b * b).sqrt())
}

/// Bilinearly sample a field at a (possibly off-grid) position.
///
/// `x` is the column coordinate and `y` the row coordinate, both in cells.
/// Coordinates are clamped just inside the grid so that the upper neighbour
/// always exists; sampling never indexes out of bounds.
pub fn bilinear_sample(field: &ScalarField, x: f32, y: f32) -> f32 {
    let (rows, cols) = field.shape();

    let x = x.clamp(0., cols as f32 - 1.001);
    let y = y.clamp(0., rows as f32 - 1.001);

    let (x0, y0) = (x.floor() as usize, y.floor() as usize);
    let (x1, y1) = ((x0 + 1).min(cols - 1), (y0 + 1).min(rows - 1));
    let (wx, wy) = (x - x0 as f32, y - y0 as f32);

    let f00 = field.index((y0, x0));
    let f10 = field.index((y0, x1));
    let f01 = field.index((y1, x0));
    let f11 = field.index((y1, x1));

    (1. - wx) * (1. - wy) * f00 + wx * (1. - wy) * f10 + (1. - wx) * wy * f01 + wx * wy * f11
}
