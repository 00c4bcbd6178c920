use std::sync::{Arc, Mutex};

use glam::Vec3;

use crate::collider::Collider;
use crate::config::PbfParameters;
use crate::constraints::density::{solve_density_constraint, AntiClustering};
use crate::error::PbfError;
use crate::fluids::viscosity::compute_pseudo_viscosity;
use crate::fluids::vorticity::compute_vorticity_confinement;
use crate::math::max_length;
use crate::particle::FluidParticles;
use crate::timestep::ParticleSolver;
use crate::WATER_DENSITY;

/// Smallest relaxation the lambda denominator is allowed to use.
const MIN_LAMBDA_RELAXATION: f32 = f32::EPSILON;

/// Statistics from the most recent successful step.
#[derive(Clone, Copy, Debug, Default)]
pub struct StepStats {
    /// Constraint iterations actually run.
    pub iterations: u32,
    /// Number of particles stepped.
    pub particle_count: usize,
    /// max |rho / rho_0 - 1| seen by the last constraint iteration.
    pub max_density_error: f32,
}

/// Position based fluids solver.
///
/// References: Müller et al., "Position based dynamics" (2007);
/// Macklin & Müller, "Position based fluids" (2013).
///
/// One call to [`advance_time_step`](Self::advance_time_step) runs the
/// passes in order: external forces, position prediction, density
/// constraint iterations, velocity update from displacement,
/// pseudo-viscosity, vorticity confinement, and collision resolution.
/// Either the whole step lands or, on error, every piece of particle data
/// and the collider's motion are restored to their state from before the
/// step.
pub struct PbfSolver {
    particles: FluidParticles,
    collider: Option<Collider>,
    gravity: Vec3,
    drag_coefficient: f32,
    restitution_coefficient: f32,
    pseudo_viscosity_coefficient: f32,
    max_number_of_iterations: u32,
    lambda_relaxation: f32,
    anti_clustering: AntiClustering,
    vorticity_confinement_strength: f32,
    original_positions: Vec<Vec3>,
    original_velocities: Vec<Vec3>,
    original_forces: Vec<Vec3>,
    original_densities: Vec<f32>,
    original_neighbor_lists: Vec<Vec<usize>>,
    current_time: f32,
    last_step: StepStats,
}

impl Default for PbfSolver {
    fn default() -> Self {
        Self::new(WATER_DENSITY, 0.1, 1.8)
    }
}

impl PbfSolver {
    /// Solver with an empty particle set and default parameters.
    pub fn new(target_density: f32, target_spacing: f32, relative_kernel_radius: f32) -> Self {
        Self {
            particles: FluidParticles::new(target_density, target_spacing, relative_kernel_radius),
            collider: None,
            gravity: Vec3::new(0.0, -9.8, 0.0),
            drag_coefficient: 1e-4,
            restitution_coefficient: 0.0,
            pseudo_viscosity_coefficient: 0.01,
            max_number_of_iterations: 10,
            lambda_relaxation: 10.0,
            anti_clustering: AntiClustering::default(),
            vorticity_confinement_strength: 0.0,
            original_positions: Vec::new(),
            original_velocities: Vec::new(),
            original_forces: Vec::new(),
            original_densities: Vec::new(),
            original_neighbor_lists: Vec::new(),
            current_time: 0.0,
            last_step: StepStats::default(),
        }
    }

    /// Build a solver from validated parameters, clamping soft values.
    pub fn from_parameters(params: &PbfParameters) -> Result<Self, PbfError> {
        params.validate()?;
        let mut solver = Self::new(
            params.target_density,
            params.target_spacing,
            params.relative_kernel_radius,
        );
        solver.apply_parameters(params);
        tracing::info!(
            target_density = params.target_density,
            kernel_radius = params.kernel_radius(),
            iterations = params.max_number_of_iterations,
            "PBF solver created from parameters"
        );
        Ok(solver)
    }

    /// Apply every soft parameter of `params`. Density, spacing, and kernel
    /// radius are left alone; they shape the particle data.
    pub fn apply_parameters(&mut self, params: &PbfParameters) {
        self.set_max_number_of_iterations(params.max_number_of_iterations);
        self.set_lambda_relaxation(params.lambda_relaxation);
        self.set_pseudo_viscosity_coefficient(params.pseudo_viscosity_coefficient);
        self.set_anti_clustering_denominator_factor(params.anti_clustering_denominator_factor);
        self.set_anti_clustering_strength(params.anti_clustering_strength);
        self.set_anti_clustering_exponent(params.anti_clustering_exponent);
        self.set_vorticity_confinement_strength(params.vorticity_confinement_strength);
        self.set_restitution_coefficient(params.restitution_coefficient);
        self.set_drag_coefficient(params.drag_coefficient);
        self.set_gravity(params.gravity);
    }

    /// Snapshot of the current configuration.
    pub fn parameters(&self) -> PbfParameters {
        PbfParameters {
            target_density: self.particles.target_density(),
            target_spacing: self.particles.target_spacing(),
            relative_kernel_radius: self.particles.relative_kernel_radius(),
            max_number_of_iterations: self.max_number_of_iterations,
            lambda_relaxation: self.lambda_relaxation,
            pseudo_viscosity_coefficient: self.pseudo_viscosity_coefficient,
            anti_clustering_denominator_factor: self.anti_clustering.denominator_factor,
            anti_clustering_strength: self.anti_clustering.strength,
            anti_clustering_exponent: self.anti_clustering.exponent,
            vorticity_confinement_strength: self.vorticity_confinement_strength,
            restitution_coefficient: self.restitution_coefficient,
            drag_coefficient: self.drag_coefficient,
            gravity: self.gravity,
        }
    }

    pub fn builder() -> PbfSolverBuilder {
        PbfSolverBuilder::default()
    }

    // ---------- particle data and collider ----------

    pub fn particles(&self) -> &FluidParticles {
        &self.particles
    }

    pub fn particles_mut(&mut self) -> &mut FluidParticles {
        &mut self.particles
    }

    pub fn collider(&self) -> Option<&Collider> {
        self.collider.as_ref()
    }

    pub fn collider_mut(&mut self) -> Option<&mut Collider> {
        self.collider.as_mut()
    }

    pub fn set_collider(&mut self, collider: Collider) {
        self.collider = Some(collider);
    }

    pub fn remove_collider(&mut self) -> Option<Collider> {
        self.collider.take()
    }

    /// Simulation time accumulated over successful steps.
    pub fn current_time(&self) -> f32 {
        self.current_time
    }

    pub fn last_step_stats(&self) -> StepStats {
        self.last_step
    }

    // ---------- parameters ----------

    pub fn pseudo_viscosity_coefficient(&self) -> f32 {
        self.pseudo_viscosity_coefficient
    }

    /// Blend factor toward the neighborhood velocity, clamped to [0, 1].
    /// Default is 0.01.
    pub fn set_pseudo_viscosity_coefficient(&mut self, coefficient: f32) {
        self.pseudo_viscosity_coefficient = coefficient.clamp(0.0, 1.0);
    }

    pub fn max_number_of_iterations(&self) -> u32 {
        self.max_number_of_iterations
    }

    /// Density constraint iterations per step. Default is 10; 0 disables
    /// the constraint entirely.
    pub fn set_max_number_of_iterations(&mut self, n: u32) {
        self.max_number_of_iterations = n;
    }

    pub fn lambda_relaxation(&self) -> f32 {
        self.lambda_relaxation
    }

    /// Relaxation added to the lambda denominator. Default is 10.0; kept
    /// strictly positive.
    pub fn set_lambda_relaxation(&mut self, eps: f32) {
        self.lambda_relaxation = eps.max(MIN_LAMBDA_RELAXATION);
    }

    pub fn anti_clustering_denominator_factor(&self) -> f32 {
        self.anti_clustering.denominator_factor
    }

    /// Fraction of the target spacing used as the anti-clustering reference
    /// distance. Default is 0.2; 0.1 to 0.3 is the recommended range.
    pub fn set_anti_clustering_denominator_factor(&mut self, factor: f32) {
        self.anti_clustering.denominator_factor = factor.max(0.0);
    }

    pub fn anti_clustering_strength(&self) -> f32 {
        self.anti_clustering.strength
    }

    /// Default is 1e-6; should stay small.
    pub fn set_anti_clustering_strength(&mut self, strength: f32) {
        self.anti_clustering.strength = strength.max(0.0);
    }

    pub fn anti_clustering_exponent(&self) -> f32 {
        self.anti_clustering.exponent
    }

    /// Default is 4.
    pub fn set_anti_clustering_exponent(&mut self, exponent: f32) {
        self.anti_clustering.exponent = exponent.max(0.0);
    }

    pub fn vorticity_confinement_strength(&self) -> f32 {
        self.vorticity_confinement_strength
    }

    /// Default is 0, which skips the vorticity pass.
    pub fn set_vorticity_confinement_strength(&mut self, strength: f32) {
        self.vorticity_confinement_strength = strength.max(0.0);
    }

    pub fn restitution_coefficient(&self) -> f32 {
        self.restitution_coefficient
    }

    /// Restitution used against the collider, clamped to [0, 1].
    pub fn set_restitution_coefficient(&mut self, coefficient: f32) {
        self.restitution_coefficient = coefficient.clamp(0.0, 1.0);
    }

    pub fn drag_coefficient(&self) -> f32 {
        self.drag_coefficient
    }

    /// Linear air drag, clamped to be non-negative.
    pub fn set_drag_coefficient(&mut self, coefficient: f32) {
        self.drag_coefficient = coefficient.max(0.0);
    }

    pub fn gravity(&self) -> Vec3 {
        self.gravity
    }

    pub fn set_gravity(&mut self, gravity: Vec3) {
        self.gravity = gravity;
    }

    // ---------- stepping ----------

    /// Advance the fluid by `dt` seconds.
    ///
    /// A step shorter than 1e-9 s is a no-op. Negative or non-finite `dt`
    /// is rejected. If collision resolution fails, the step is rolled back
    /// and the error is returned.
    pub fn advance_time_step(&mut self, dt: f32) -> Result<(), PbfError> {
        if !dt.is_finite() || dt < 0.0 {
            return Err(PbfError::InvalidTimeStep(dt));
        }
        if dt < 1.0e-9 {
            return Ok(());
        }

        self.begin_time_step(dt);
        self.accumulate_forces();
        self.predict_position(dt);

        self.particles.build_neighbor_search();
        self.particles.build_neighbor_lists();

        let stats = solve_density_constraint(
            &mut self.particles,
            self.max_number_of_iterations,
            self.lambda_relaxation,
            &self.anti_clustering,
        );

        self.update_position(dt);
        self.particles.update_densities();
        self.compute_pseudo_viscosity();
        self.compute_vorticity_confinement(dt);

        if let Err(e) = self.resolve_collision() {
            tracing::warn!(error = %e, time = self.current_time, "PBF step rolled back");
            self.rollback();
            return Err(e);
        }

        self.current_time += dt;
        self.last_step = StepStats {
            iterations: stats.iterations,
            particle_count: self.particles.count(),
            max_density_error: stats.max_density_error,
        };
        tracing::debug!(
            dt,
            particles = self.last_step.particle_count,
            iterations = stats.iterations,
            max_density_error = stats.max_density_error,
            "PBF step"
        );
        Ok(())
    }

    /// Snapshot pre-step state and advance the collider's motion.
    fn begin_time_step(&mut self, dt: f32) {
        self.original_positions.clone_from(&self.particles.set.position);
        self.original_velocities.clone_from(&self.particles.set.velocity);
        self.original_forces.clone_from(&self.particles.set.force);
        self.original_densities.clone_from(&self.particles.density);
        self.original_neighbor_lists.clone_from(&self.particles.neighbor_lists);
        if let Some(collider) = self.collider.as_mut() {
            collider.update(self.current_time, dt);
        }
    }

    /// Gravity and linear drag.
    fn accumulate_forces(&mut self) {
        let set = &mut self.particles.set;
        let weight = self.gravity * set.mass;
        for (f, v) in set.force.iter_mut().zip(&set.velocity) {
            *f = weight - *v * self.drag_coefficient;
        }
    }

    /// Explicit Euler prediction: `v += dt * f / m`, then `x += dt * v`.
    fn predict_position(&mut self, dt: f32) {
        let set = &mut self.particles.set;
        let inv_mass = 1.0 / set.mass;
        for ((x, v), f) in set
            .position
            .iter_mut()
            .zip(set.velocity.iter_mut())
            .zip(&set.force)
        {
            *v += *f * (dt * inv_mass);
            *x += *v * dt;
        }
    }

    /// Velocity from net displacement over the step.
    fn update_position(&mut self, dt: f32) {
        let inv_dt = 1.0 / dt;
        let set = &mut self.particles.set;
        for ((v, x), x0) in set
            .velocity
            .iter_mut()
            .zip(&set.position)
            .zip(&self.original_positions)
        {
            *v = (*x - *x0) * inv_dt;
        }
    }

    fn compute_pseudo_viscosity(&mut self) {
        compute_pseudo_viscosity(&mut self.particles, self.pseudo_viscosity_coefficient);
    }

    fn compute_vorticity_confinement(&mut self, dt: f32) {
        if self.vorticity_confinement_strength == 0.0 {
            return;
        }
        compute_vorticity_confinement(&mut self.particles, self.vorticity_confinement_strength, dt);
    }

    /// Resolve every particle against the collider. Nothing is written
    /// unless every particle resolves.
    fn resolve_collision(&mut self) -> Result<(), PbfError> {
        let Some(collider) = self.collider.as_ref() else {
            return Ok(());
        };
        let set = &self.particles.set;
        let radius = set.radius;
        let restitution = self.restitution_coefficient;
        let positions = &set.position;
        let velocities = &set.velocity;

        let resolved: Vec<Result<(Vec3, Vec3), PbfError>> = par_map!(set.count, |i| {
            collider.resolve_collision(radius, restitution, positions[i], velocities[i])
        });
        let resolved = resolved.into_iter().collect::<Result<Vec<_>, _>>()?;

        let set = &mut self.particles.set;
        for (i, (x, v)) in resolved.into_iter().enumerate() {
            set.position[i] = x;
            set.velocity[i] = v;
        }
        Ok(())
    }

    /// Restore everything the step touched. The spatial hash is rebuilt
    /// from the restored positions.
    fn rollback(&mut self) {
        let set = &mut self.particles.set;
        set.position.clone_from(&self.original_positions);
        set.velocity.clone_from(&self.original_velocities);
        set.force.clone_from(&self.original_forces);
        self.particles.density.clone_from(&self.original_densities);
        self.particles.neighbor_lists.clone_from(&self.original_neighbor_lists);
        self.particles.build_neighbor_search();
        if let Some(collider) = self.collider.as_mut() {
            collider.rewind(self.current_time);
        }
    }
}

impl ParticleSolver for PbfSolver {
    fn advance_time_step(&mut self, dt: f32) -> Result<(), PbfError> {
        PbfSolver::advance_time_step(self, dt)
    }

    fn max_speed(&self) -> f32 {
        max_length(&self.particles.set.velocity)
    }

    fn characteristic_length(&self) -> f32 {
        self.particles.kernel_radius()
    }
}

/// Front-end to create [`PbfSolver`] objects step by step.
#[derive(Clone, Copy, Debug)]
pub struct PbfSolverBuilder {
    target_density: f32,
    target_spacing: f32,
    relative_kernel_radius: f32,
}

impl Default for PbfSolverBuilder {
    fn default() -> Self {
        Self {
            target_density: WATER_DENSITY,
            target_spacing: 0.1,
            relative_kernel_radius: 1.8,
        }
    }
}

impl PbfSolverBuilder {
    pub fn with_target_density(mut self, target_density: f32) -> Self {
        self.target_density = target_density;
        self
    }

    pub fn with_target_spacing(mut self, target_spacing: f32) -> Self {
        self.target_spacing = target_spacing;
        self
    }

    pub fn with_relative_kernel_radius(mut self, relative_kernel_radius: f32) -> Self {
        self.relative_kernel_radius = relative_kernel_radius;
        self
    }

    pub fn build(&self) -> PbfSolver {
        tracing::info!(
            target_density = self.target_density,
            target_spacing = self.target_spacing,
            relative_kernel_radius = self.relative_kernel_radius,
            "PBF solver built"
        );
        PbfSolver::new(
            self.target_density,
            self.target_spacing,
            self.relative_kernel_radius,
        )
    }

    /// Shared handle to a new solver.
    pub fn make_shared(&self) -> Arc<Mutex<PbfSolver>> {
        Arc::new(Mutex::new(self.build()))
    }
}
