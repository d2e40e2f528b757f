// 2D incompressible fluid solver: semi-Lagrangian advection, vorticity
// confinement and Jacobi pressure projection on a square grid.

extern crate nalgebra as na;

pub mod sim;

use na::DMatrix;

pub type ScalarField = DMatrix<f32>;
