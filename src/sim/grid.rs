// Field storage and wall boundary conditions

use na::DMatrix;

use crate::ScalarField;

/// The discretized state of the fluid: the two velocity components and the
/// dye concentration, all on the same N×N grid.
#[derive(Clone, Debug, PartialEq)]
pub struct GridState {
    /// The x-component of velocity (cells per unit time)
    pub(crate) u: ScalarField,

    /// The y-component of velocity (cells per unit time)
    pub(crate) v: ScalarField,

    /// Passive dye concentration
    pub(crate) dye: ScalarField,
}

impl GridState {
    /// Allocate a zeroed `n`×`n` grid.
    pub fn new(n: usize) -> Self {
        GridState {
            u: DMatrix::zeros(n, n),
            v: DMatrix::zeros(n, n),
            dye: DMatrix::zeros(n, n),
        }
    }

    /// Number of cells along each axis
    pub fn size(&self) -> usize {
        self.u.nrows()
    }

    pub fn u(&self) -> &ScalarField {
        &self.u
    }

    pub fn v(&self) -> &ScalarField {
        &self.v
    }

    pub fn dye(&self) -> &ScalarField {
        &self.dye
    }

    /// Zero every field.
    pub fn clear(&mut self) {
        self.u.fill(0.);
        self.v.fill(0.);
        self.dye.fill(0.);
    }

    /// Set the no-through condition on the velocity field `(self.u, self.v)`
    pub fn enforce_no_through(&mut self) {
        enforce_no_through(&mut self.u, &mut self.v);
    }
}

/// Zero the velocity component normal to each wall. `u` vanishes on the left
/// and right columns, `v` on the top and bottom rows; tangential components
/// are left alone.
pub fn enforce_no_through(u: &mut ScalarField, v: &mut ScalarField) {
    let cols = u.ncols();
    let rows = v.nrows();

    u.column_mut(0).fill(0.);
    u.column_mut(cols - 1).fill(0.);
    v.row_mut(0).fill(0.);
    v.row_mut(rows - 1).fill(0.);
}

/// Whether the normal velocity is exactly zero on all four walls.
pub fn walls_are_closed(u: &ScalarField, v: &ScalarField) -> bool {
    let cols = u.ncols();
    let rows = v.nrows();

    u.column(0).iter().all(|x| *x == 0.)
        && u.column(cols - 1).iter().all(|x| *x == 0.)
        && v.row(0).iter().all(|x| *x == 0.)
        && v.row(rows - 1).iter().all(|x| *x == 0.)
}

#[cfg(test)]
mod tests {
    use na::dmatrix;

    use super::*;

    #[test]
    fn test_enforce_no_through() {
        let mut u: DMatrix<f32> = DMatrix::from_element(3, 3, 1.);
        let mut v: DMatrix<f32> = DMatrix::from_element(3, 3, 2.);

        enforce_no_through(&mut u, &mut v);

        let expected_u: DMatrix<f32> = dmatrix![
            0., 1., 0.;
            0., 1., 0.;
            0., 1., 0.;
        ];
        let expected_v: DMatrix<f32> = dmatrix![
            0., 0., 0.;
            2., 2., 2.;
            0., 0., 0.;
        ];

        assert_eq!(expected_u, u);
        assert_eq!(expected_v, v);
        assert!(walls_are_closed(&u, &v));
    }

    #[test]
    fn test_tangential_velocity_untouched() {
        let mut grid = GridState::new(4);
        grid.u.fill(1.);
        grid.v.fill(-1.);

        grid.enforce_no_through();

        // u along the top and bottom rows is tangential
        assert!(grid.u().row(0).columns(1, 2).iter().all(|x| *x == 1.));
        assert!(grid.u().row(3).columns(1, 2).iter().all(|x| *x == 1.));

        // v along the left and right columns is tangential
        assert!(grid.v().column(0).rows(1, 2).iter().all(|x| *x == -1.));
        assert!(grid.v().column(3).rows(1, 2).iter().all(|x| *x == -1.));
    }

    #[test]
    fn test_clear() {
        let mut grid = GridState::new(5);
        grid.dye.fill(3.);
        grid.u.fill(1.);

        grid.clear();

        assert_eq!(grid, GridState::new(5));
        assert_eq!(grid.size(), 5);
    }
}
