// Stable-fluids timestepping struct

use std::{collections::VecDeque, f32::consts::TAU};

use rand::{Rng, SeedableRng, rngs::StdRng};
use serde::Serialize;
use tracing::{debug, trace};

use crate::{
    ScalarField,
    sim::{
        advection::Advector,
        error::SimError,
        grid::GridState,
        numeric,
        params::SimulationParameters,
        poisson::{PressureProjector, ProjectionReport},
        splat::{self, Splat},
        vorticity::VorticityConfiner,
    },
};

/// Number of post-projection divergence values kept in [`SimStats::history`]
const HISTORY_LEN: usize = 100;

// Shape of the random initial splats
const SEED_RADIUS: f32 = 0.07;
const SEED_DYE: f32 = 1.0;
const SEED_SPEED: f32 = 0.6;

/// Whether an external driver should be advancing the simulation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum RunState {
    Running,
    Paused,
}

/// Diagnostics gathered after each step.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SimStats {
    /// Completed steps since construction or the last reset
    pub step: u64,

    /// Interior L2 norm of the divergence after the last projection
    pub divergence_l2: f32,

    /// Interior L2 norm of the divergence going into the last projection
    pub pre_projection_divergence_l2: f32,

    pub max_velocity: f32,

    /// Largest distance, in cells, a value travels in one step
    pub cfl_estimate: f32,

    pub max_dye: f32,

    /// Most recent post-projection divergence values, oldest first
    pub history: VecDeque<f32>,

    /// First field found holding a NaN or infinity, if any
    pub non_finite_field: Option<&'static str>,
}

impl SimStats {
    fn new() -> Self {
        SimStats {
            step: 0,
            divergence_l2: 0.,
            pre_projection_divergence_l2: 0.,
            max_velocity: 0.,
            cfl_estimate: 0.,
            max_dye: 0.,
            history: VecDeque::with_capacity(HISTORY_LEN),
            non_finite_field: None,
        }
    }
}

/// An owned copy of the fields at a step boundary.
#[derive(Clone, Debug, PartialEq)]
pub struct FieldSnapshot {
    pub step: u64,
    pub dye: ScalarField,
    pub u: ScalarField,
    pub v: ScalarField,
}

impl FieldSnapshot {
    /// Signed scalar curl of the velocity
    pub fn vorticity(&self) -> ScalarField {
        numeric::curl(&self.u, &self.v)
    }

    pub fn vorticity_magnitude(&self) -> ScalarField {
        self.vorticity().abs()
    }

    pub fn divergence(&self) -> ScalarField {
        numeric::divergence(&self.u, &self.v)
    }

    /// L2 norm of the interior divergence, as reported in [`SimStats`]
    pub fn divergence_l2(&self) -> f32 {
        numeric::interior_norm(&self.divergence())
    }

    pub fn velocity_magnitude(&self) -> ScalarField {
        numeric::velocity_magnitude(&self.u, &self.v)
    }

    /// Dye concentration at a point in normalized `[0,1]×[0,1]` coordinates.
    pub fn sample_dye(&self, x: f32, y: f32) -> f32 {
        let extent = (self.dye.nrows() - 1) as f32;
        numeric::bilinear_sample(&self.dye, x * extent, y * extent)
    }
}

/// High-level stable-fluids object. Owns every field and scratch buffer, and
/// steps through the simulation one fixed pipeline at a time.
pub struct FluidSim {
    params: SimulationParameters,

    /// Live fields
    grid: GridState,

    advector: Advector,
    projector: PressureProjector,
    confiner: VorticityConfiner,

    /// Splats waiting for the next step boundary
    pending: Vec<Splat>,

    stats: SimStats,
    state: RunState,
}

impl FluidSim {
    /// Create a new simulation, seeded with `params.seed_splats` random
    /// splats.
    ///
    /// Fails if any parameter is out of range.
    pub fn new(params: SimulationParameters) -> Result<Self, SimError> {
        params.validate()?;

        let n = params.grid_size;
        let mut sim = FluidSim {
            grid: GridState::new(n),
            advector: Advector::new(n),
            projector: PressureProjector::new(n),
            confiner: VorticityConfiner::new(n),
            pending: Vec::new(),
            stats: SimStats::new(),
            state: RunState::Running,
            params,
        };
        sim.reset();

        Ok(sim)
    }

    pub fn params(&self) -> &SimulationParameters {
        &self.params
    }

    /// Replace the parameters. Takes effect from the next step; the grid
    /// size is fixed for the lifetime of the simulation.
    pub fn set_params(&mut self, params: SimulationParameters) -> Result<(), SimError> {
        params.validate()?;

        if params.grid_size != self.params.grid_size {
            return Err(SimError::GridSizeChange {
                current: self.params.grid_size,
                requested: params.grid_size,
            });
        }

        debug!(?params, "updated simulation parameters");
        self.params = params;

        Ok(())
    }

    /// Queue a splat for the next step. Coordinates and radius are in
    /// normalized domain units; splats that cannot touch the grid are dropped.
    pub fn add_splat(&mut self, x: f32, y: f32, dye_amount: f32, fx: f32, fy: f32, radius: f32) {
        self.queue_splat(Splat::new(x, y, dye_amount, fx, fy, radius));
    }

    pub fn queue_splat(&mut self, splat: Splat) {
        if splat.is_noop() {
            trace!(?splat, "dropped splat with no effect");
            return;
        }
        self.pending.push(splat);
    }

    /// Advance the simulation by one time step:
    /// advect velocity → confine vorticity → dissipate velocity → apply
    /// queued splats → project → advect dye → dissipate dye.
    ///
    /// Runs regardless of the pause flag.
    pub fn step(&mut self) -> &SimStats {
        let dt = self.params.dt;

        self.advector.advect_velocity(&mut self.grid, dt);

        self.confiner
            .apply(&mut self.grid, self.params.vorticity_strength, dt);

        splat::dissipate(&mut self.grid.u, self.params.velocity_dissipation, dt);
        splat::dissipate(&mut self.grid.v, self.params.velocity_dissipation, dt);

        for splat in self.pending.drain(..) {
            splat.apply(&mut self.grid);
        }

        let report = self
            .projector
            .project(&mut self.grid, self.params.jacobi_iterations);

        self.advector.advect_dye(&mut self.grid, dt);
        splat::dissipate(&mut self.grid.dye, self.params.dye_dissipation, dt);

        self.record(report);

        &self.stats
    }

    /// Step only if the simulation is running. Returns whether a step ran.
    pub fn tick(&mut self) -> bool {
        match self.state {
            RunState::Running => {
                self.step();
                true
            }
            RunState::Paused => false,
        }
    }

    pub fn pause(&mut self) {
        self.state = RunState::Paused;
    }

    pub fn resume(&mut self) {
        self.state = RunState::Running;
    }

    pub fn is_paused(&self) -> bool {
        self.state == RunState::Paused
    }

    pub fn run_state(&self) -> RunState {
        self.state
    }

    /// Zero all fields, drop queued splats, and re-seed the random initial
    /// condition from `params.seed`. The step counter restarts at 0.
    pub fn reset(&mut self) {
        self.grid.clear();
        self.pending.clear();
        self.stats = SimStats::new();

        let mut rng = StdRng::seed_from_u64(self.params.seed);
        for _ in 0..self.params.seed_splats {
            let (x, y) = (rng.random::<f32>(), rng.random::<f32>());
            let angle = rng.random::<f32>() * TAU;

            Splat::new(
                x,
                y,
                SEED_DYE,
                angle.cos() * SEED_SPEED,
                angle.sin() * SEED_SPEED,
                SEED_RADIUS,
            )
            .apply(&mut self.grid);
        }

        self.refresh_field_stats();

        debug!(
            seed = self.params.seed,
            splats = self.params.seed_splats,
            "reset simulation"
        );
    }

    /// Reset with a new seed, which is kept for later resets.
    pub fn reset_with_seed(&mut self, seed: u64) {
        self.params.seed = seed;
        self.reset();
    }

    /// Remove all dye, leaving velocity and the step counter alone.
    pub fn clear_dye(&mut self) {
        self.grid.dye.fill(0.);
        self.stats.max_dye = 0.;
    }

    /// Copy of the current fields.
    pub fn get_fields(&self) -> FieldSnapshot {
        FieldSnapshot {
            step: self.stats.step,
            dye: self.grid.dye.clone(),
            u: self.grid.u.clone(),
            v: self.grid.v.clone(),
        }
    }

    pub fn get_stats(&self) -> SimStats {
        self.stats.clone()
    }

    /// Report the first field that holds a NaN or infinity.
    pub fn check_finite(&self) -> Result<(), SimError> {
        match self.stats.non_finite_field {
            Some(field) => Err(SimError::NonFinite {
                field,
                step: self.stats.step,
            }),
            None => Ok(()),
        }
    }

    fn record(&mut self, report: ProjectionReport) {
        self.stats.step += 1;
        self.stats.pre_projection_divergence_l2 = report.divergence_before;
        self.stats.divergence_l2 = report.divergence_after;

        if self.stats.history.len() == HISTORY_LEN {
            self.stats.history.pop_front();
        }
        self.stats.history.push_back(report.divergence_after);

        self.refresh_field_stats();

        trace!(
            step = self.stats.step,
            divergence_l2 = self.stats.divergence_l2,
            max_velocity = self.stats.max_velocity,
            "completed step"
        );
    }

    fn refresh_field_stats(&mut self) {
        let speed = numeric::velocity_magnitude(&self.grid.u, &self.grid.v);

        self.stats.max_velocity = speed.max();
        self.stats.cfl_estimate = self.stats.max_velocity * self.params.dt;
        self.stats.max_dye = self.grid.dye.max();

        self.stats.non_finite_field = [
            ("u", &self.grid.u),
            ("v", &self.grid.v),
            ("dye", &self.grid.dye),
        ]
        .into_iter()
        .find(|(_, field)| field.iter().any(|x| !x.is_finite()))
        .map(|(name, _)| name);
    }
}

/// Steps forever, yielding the statistics after each step.
impl Iterator for FluidSim {
    type Item = SimStats;

    fn next(&mut self) -> Option<Self::Item> {
        Some(self.step().clone())
    }
}

#[cfg(test)]
mod tests {
    use crate::sim::grid::walls_are_closed;

    use super::*;

    fn small_params() -> SimulationParameters {
        SimulationParameters {
            grid_size: 32,
            ..Default::default()
        }
    }

    #[test]
    fn test_construction_rejects_bad_parameters() {
        let params = SimulationParameters {
            grid_size: 1,
            ..Default::default()
        };
        assert!(matches!(
            FluidSim::new(params),
            Err(SimError::InvalidGridSize(1))
        ));
    }

    #[test]
    fn test_step_counter() {
        let mut sim = FluidSim::new(small_params()).unwrap();
        assert_eq!(sim.get_stats().step, 0);

        for expected in 1..=5 {
            assert_eq!(sim.step().step, expected);
        }

        sim.reset();
        assert_eq!(sim.get_stats().step, 0);
        assert_eq!(sim.step().step, 1);
    }

    #[test]
    fn test_walls_closed_after_every_step() {
        let mut sim = FluidSim::new(small_params()).unwrap();
        sim.add_splat(0.0, 0.5, 1., 3., 0., 0.2);
        sim.add_splat(0.5, 1.0, 1., 0., -3., 0.2);

        for _ in 0..20 {
            sim.step();
            let fields = sim.get_fields();
            assert!(walls_are_closed(&fields.u, &fields.v));
        }
    }

    #[test]
    fn test_reset_is_reproducible() {
        let mut a = FluidSim::new(small_params()).unwrap();
        let b = FluidSim::new(small_params()).unwrap();

        let initial = a.get_fields();
        assert_eq!(initial, b.get_fields());
        assert!(initial.dye.max() > 0.);

        for _ in 0..4 {
            a.step();
        }
        assert_ne!(initial, a.get_fields());

        a.reset();
        assert_eq!(initial, a.get_fields());
        assert_eq!(a.get_stats(), b.get_stats());
    }

    #[test]
    fn test_reset_with_seed() {
        let mut sim = FluidSim::new(small_params()).unwrap();
        let seven = sim.get_fields();

        sim.reset_with_seed(8);
        let eight = sim.get_fields();
        assert_ne!(seven, eight);
        assert_eq!(sim.params().seed, 8);

        sim.reset();
        assert_eq!(eight, sim.get_fields());
    }

    #[test]
    fn test_reset_keeps_parameters() {
        let mut sim = FluidSim::new(small_params()).unwrap();
        let params = sim.params().clone();

        sim.step();
        sim.reset();

        assert_eq!(&params, sim.params());
    }

    #[test]
    fn test_splats_wait_for_step() {
        let params = SimulationParameters {
            seed_splats: 0,
            ..small_params()
        };
        let mut sim = FluidSim::new(params).unwrap();
        let before = sim.get_fields();

        sim.add_splat(0.5, 0.5, 1., 0.5, 0.5, 0.1);
        assert_eq!(sim.pending.len(), 1);
        assert_eq!(before, sim.get_fields());

        sim.step();
        assert!(sim.pending.is_empty());
        assert!(sim.get_fields().dye.max() > 0.);
    }

    #[test]
    fn test_noop_splats_leave_fields_unchanged() {
        let params = SimulationParameters {
            seed_splats: 0,
            ..small_params()
        };
        let mut sim = FluidSim::new(params).unwrap();

        sim.add_splat(0.5, 0.5, 1., 1., 1., 0.);
        sim.add_splat(1.5, -0.5, 1., 1., 1., 0.2);
        assert!(sim.pending.is_empty());

        sim.step();
        let fields = sim.get_fields();
        assert!(fields.dye.iter().all(|x| *x == 0.));
        assert!(fields.u.iter().all(|x| *x == 0.));
        assert!(fields.v.iter().all(|x| *x == 0.));
    }

    #[test]
    fn test_dye_decays_exponentially_without_flow() {
        let params = SimulationParameters {
            seed_splats: 0,
            ..small_params()
        };
        let mut sim = FluidSim::new(params.clone()).unwrap();
        sim.grid.dye.fill(1.);

        let steps = 30;
        for _ in 0..steps {
            sim.step();
        }

        let expected = (-params.dye_dissipation * params.dt * steps as f32).exp();
        let dye = sim.get_fields().dye;
        assert!(dye.iter().all(|x| (x - expected).abs() < 1e-4));
    }

    #[test]
    fn test_projection_reduces_divergence_each_step() {
        let mut sim = FluidSim::new(small_params()).unwrap();

        for _ in 0..30 {
            let stats = sim.step();
            assert!(stats.divergence_l2 < stats.pre_projection_divergence_l2);
        }
    }

    #[test]
    fn test_pause_only_affects_tick() {
        let mut sim = FluidSim::new(small_params()).unwrap();

        sim.pause();
        assert!(sim.is_paused());
        assert!(!sim.tick());
        assert_eq!(sim.get_stats().step, 0);

        // single-stepping ignores the pause flag
        sim.step();
        assert_eq!(sim.get_stats().step, 1);

        sim.resume();
        assert_eq!(sim.run_state(), RunState::Running);
        assert!(sim.tick());
        assert_eq!(sim.get_stats().step, 2);
    }

    #[test]
    fn test_set_params() {
        let mut sim = FluidSim::new(small_params()).unwrap();

        let stronger = SimulationParameters {
            vorticity_strength: 12.,
            velocity_dissipation: 0.02,
            ..small_params()
        };
        sim.set_params(stronger.clone()).unwrap();
        assert_eq!(sim.params(), &stronger);

        let resized = SimulationParameters {
            grid_size: 64,
            ..small_params()
        };
        assert_eq!(
            sim.set_params(resized),
            Err(SimError::GridSizeChange {
                current: 32,
                requested: 64
            })
        );

        let broken = SimulationParameters {
            dt: -1.,
            ..small_params()
        };
        assert!(sim.set_params(broken).is_err());
        assert_eq!(sim.params(), &stronger);
    }

    #[test]
    fn test_clear_dye() {
        let mut sim = FluidSim::new(small_params()).unwrap();
        sim.step();
        let velocity = sim.get_fields();

        sim.clear_dye();

        let fields = sim.get_fields();
        assert!(fields.dye.iter().all(|x| *x == 0.));
        assert_eq!(fields.u, velocity.u);
        assert_eq!(sim.get_stats().step, 1);
    }

    #[test]
    fn test_snapshot_is_detached() {
        let mut sim = FluidSim::new(small_params()).unwrap();
        let snapshot = sim.get_fields();

        sim.step();

        assert_eq!(snapshot.step, 0);
        assert_ne!(snapshot, sim.get_fields());
        assert_eq!(sim.get_fields().step, 1);
    }

    #[test]
    fn test_snapshot_derived_fields() {
        let mut sim = FluidSim::new(small_params()).unwrap();
        sim.step();
        let fields = sim.get_fields();

        assert_eq!(fields.divergence_l2(), sim.get_stats().divergence_l2);
        assert!(fields.vorticity_magnitude().iter().all(|x| *x >= 0.));
        assert_eq!(fields.velocity_magnitude().max(), sim.get_stats().max_velocity);
        assert_eq!(fields.sample_dye(0., 0.), *fields.dye.index((0, 0)));
    }

    #[test]
    fn test_non_finite_fields_are_reported() {
        let mut sim = FluidSim::new(small_params()).unwrap();
        assert_eq!(sim.check_finite(), Ok(()));

        *sim.grid.dye.index_mut((3, 3)) = f32::NAN;
        sim.step();

        assert_eq!(sim.get_stats().non_finite_field, Some("dye"));
        assert_eq!(
            sim.check_finite(),
            Err(SimError::NonFinite {
                field: "dye",
                step: 1
            })
        );
    }

    #[test]
    fn test_history_is_bounded() {
        let params = SimulationParameters {
            grid_size: 8,
            jacobi_iterations: 4,
            ..Default::default()
        };
        let sim = FluidSim::new(params).unwrap();

        let last = sim.take(HISTORY_LEN + 20).last().unwrap();

        assert_eq!(last.step, (HISTORY_LEN + 20) as u64);
        assert_eq!(last.history.len(), HISTORY_LEN);
        assert_eq!(last.history.back(), Some(&last.divergence_l2));
    }

    #[test]
    fn test_seeded_run_regression() {
        // Confinement feeds energy in faster than dissipation removes it, so
        // the residual divergence grows over the first 50 steps.
        let params = SimulationParameters {
            grid_size: 64,
            ..Default::default()
        };
        let sim = FluidSim::new(params).unwrap();

        let series: Vec<SimStats> = sim.take(120).collect();

        assert_eq!(series.len(), 120);
        assert!(series.iter().all(|s| s.non_finite_field.is_none()));
        assert!(
            series
                .iter()
                .all(|s| s.divergence_l2 < s.pre_projection_divergence_l2)
        );
        assert!(series[49].divergence_l2 > 2. * series[0].divergence_l2);
    }
}
