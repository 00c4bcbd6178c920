use glam::Vec3;

use crate::fluids::StdKernel;
use crate::particle::FluidParticles;

/// Blend each particle's velocity toward the SPH-weighted average velocity
/// of its neighborhood (XSPH-style pseudo-viscosity).
///
/// `coefficient` is the blend factor: 0 leaves velocities untouched, 1
/// replaces each velocity with the smoothed one. Every smoothed velocity is
/// computed from the velocities as they were on entry, then all are written
/// back.
pub fn compute_pseudo_viscosity(particles: &mut FluidParticles, coefficient: f32) {
    let factor = coefficient.clamp(0.0, 1.0);
    if factor == 0.0 {
        return;
    }

    let count = particles.count();
    let kernel = StdKernel::new(particles.kernel_radius());
    let mass = particles.mass();
    let positions = &particles.set.position;
    let velocities = &particles.set.velocity;
    let densities = &particles.density;
    let lists = &particles.neighbor_lists;

    let smoothed: Vec<Vec3> = par_map!(count, |i| {
        let w_self = mass / densities[i].max(f32::EPSILON) * kernel.value(0.0);
        let mut weight_sum = w_self;
        let mut sum = velocities[i] * w_self;
        for &j in &lists[i] {
            let w = mass / densities[j].max(f32::EPSILON)
                * kernel.value((positions[i] - positions[j]).length());
            weight_sum += w;
            sum += velocities[j] * w;
        }
        if weight_sum > 0.0 {
            sum / weight_sum
        } else {
            velocities[i]
        }
    });

    for (v, s) in particles.set.velocity.iter_mut().zip(&smoothed) {
        *v = v.lerp(*s, factor);
    }
}
