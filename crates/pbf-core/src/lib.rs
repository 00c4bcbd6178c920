//! Position based fluids with generic collider resolution.
//!
//! # Modules
//! - [`solver`] -- `PbfSolver`, its builder, and the per-step pass sequence.
//! - [`collider`] -- surface-backed colliders with restitution and friction.
//! - [`shapes`] -- the `Surface` capability and the primitives that implement it.
//! - [`particle`] -- struct-of-arrays particle storage and SPH system data.
//! - [`fluids`] -- SPH kernels, pseudo-viscosity and vorticity confinement.
//! - [`constraints`] -- the PBF density constraint.
//! - [`grid`] -- spatial hash grid for neighbor queries.
//! - [`timestep`] -- sub-stepping driver.
//! - [`config`] -- serializable solver parameters.
//! - [`materials`] -- fluid presets.

/// Maps `$f` over `0..$n` and collects into a `Vec`, in parallel when the
/// `parallel` feature is enabled.
macro_rules! par_map {
    ($n: expr, $f: expr) => {{
        #[cfg(not(feature = "parallel"))]
        let out: Vec<_> = (0..$n).map($f).collect();

        #[cfg(feature = "parallel")]
        let out: Vec<_> = {
            use rayon::prelude::*;
            (0..$n).into_par_iter().map($f).collect()
        };
        out
    }};
}

pub mod collider;
pub mod config;
pub mod constraints;
pub mod error;
pub mod fluids;
pub mod grid;
pub mod materials;
pub mod math;
pub mod particle;
pub mod shapes;
pub mod solver;
pub mod timestep;

pub use collider::{Collider, ColliderMotion, ColliderQueryResult, RigidBodyMotion, Static};
pub use config::PbfParameters;
pub use error::PbfError;
pub use particle::{FluidParticles, ParticleSet};
pub use shapes::{Surface, SurfacePoint};
pub use solver::{PbfSolver, PbfSolverBuilder};
pub use timestep::{ParticleSolver, Simulation, SubStepping};

/// Density of water at room temperature, in kg/m^3.
pub const WATER_DENSITY: f32 = 1000.0;
