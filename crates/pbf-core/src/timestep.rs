//! Sub-stepping driver.
//!
//! A [`Simulation`] owns a solver and splits each frame into sub-steps,
//! either a fixed count or one chosen from a CFL condition. The solver's
//! per-step hook runs exactly once per sub-step.

use crate::error::PbfError;

/// Per-step hook a particle solver exposes to the driver.
pub trait ParticleSolver {
    /// Advance by one sub-step of `dt` seconds, leaving positions and
    /// velocities consistent on return.
    fn advance_time_step(&mut self, dt: f32) -> Result<(), PbfError>;

    /// Largest particle speed, used by adaptive sub-stepping.
    fn max_speed(&self) -> f32;

    /// Length a particle may travel per sub-step at CFL number 1.
    fn characteristic_length(&self) -> f32;
}

/// How a frame is split into sub-steps.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SubStepping {
    /// Always run `n` sub-steps (at least one).
    Fixed(u32),
    /// `ceil(dt * max_speed / (cfl * length))`, clamped to `[1, max_sub_steps]`.
    Adaptive { cfl: f32, max_sub_steps: u32 },
}

impl Default for SubStepping {
    fn default() -> Self {
        SubStepping::Fixed(1)
    }
}

impl SubStepping {
    /// Number of sub-steps for a frame of `dt` seconds.
    pub fn sub_steps<S: ParticleSolver + ?Sized>(&self, solver: &S, dt: f32) -> u32 {
        match *self {
            SubStepping::Fixed(n) => n.max(1),
            SubStepping::Adaptive { cfl, max_sub_steps } => {
                let max_sub_steps = max_sub_steps.max(1);
                let allowed = cfl * solver.characteristic_length();
                if !(allowed > 0.0) {
                    return max_sub_steps;
                }
                let needed = (dt * solver.max_speed() / allowed).ceil();
                if !needed.is_finite() {
                    return max_sub_steps;
                }
                (needed as u32).clamp(1, max_sub_steps)
            }
        }
    }
}

/// Timing of one [`Simulation::update`] call.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FrameStats {
    /// Number of sub-steps executed.
    pub sub_steps: u32,
    /// Length of each sub-step in seconds.
    pub sub_step_dt: f32,
}

/// Drives a solver frame by frame.
pub struct Simulation<S> {
    solver: S,
    sub_stepping: SubStepping,
    time: f64,
    frame: u64,
}

impl<S: ParticleSolver> Simulation<S> {
    pub fn new(solver: S, sub_stepping: SubStepping) -> Self {
        Self {
            solver,
            sub_stepping,
            time: 0.0,
            frame: 0,
        }
    }

    pub fn solver(&self) -> &S {
        &self.solver
    }

    pub fn solver_mut(&mut self) -> &mut S {
        &mut self.solver
    }

    pub fn into_solver(self) -> S {
        self.solver
    }

    pub fn sub_stepping(&self) -> SubStepping {
        self.sub_stepping
    }

    pub fn set_sub_stepping(&mut self, sub_stepping: SubStepping) {
        self.sub_stepping = sub_stepping;
    }

    /// Elapsed simulation time over completed frames, in seconds.
    pub fn time(&self) -> f64 {
        self.time
    }

    /// Number of completed frames.
    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Advance one frame of `dt` seconds.
    ///
    /// Stops at the first failing sub-step and returns its error; the frame
    /// counter and clock only advance when every sub-step succeeds.
    pub fn update(&mut self, dt: f32) -> Result<FrameStats, PbfError> {
        if !dt.is_finite() || dt < 0.0 {
            return Err(PbfError::InvalidTimeStep(dt));
        }
        let sub_steps = self.sub_stepping.sub_steps(&self.solver, dt);
        let sub_step_dt = dt / sub_steps as f32;

        for sub_step in 0..sub_steps {
            if let Err(e) = self.solver.advance_time_step(sub_step_dt) {
                tracing::warn!(frame = self.frame, sub_step, error = %e, "sub-step failed");
                return Err(e);
            }
        }

        self.time += dt as f64;
        self.frame += 1;
        Ok(FrameStats {
            sub_steps,
            sub_step_dt,
        })
    }
}
