// Solver components and the driver that sequences them

pub mod advection;
pub mod error;
pub mod fluid;
pub mod grid;
pub mod numeric;
pub mod params;
pub mod poisson;
pub mod splat;
pub mod task;
pub mod vorticity;

pub use error::SimError;
pub use fluid::{FieldSnapshot, FluidSim, RunState, SimStats};
pub use params::SimulationParameters;
pub use splat::Splat;
