use glam::Vec3;

use crate::fluids::SpikyKernel;
use crate::particle::FluidParticles;

/// Estimate the vorticity (curl of the velocity field) at every particle.
///
/// `omega_i = sum_j m / rho_j * grad W(x_i - x_j) x (v_j - v_i)`
pub fn compute_vorticity(particles: &FluidParticles) -> Vec<Vec3> {
    let spiky = SpikyKernel::new(particles.kernel_radius());
    let mass = particles.mass();
    let positions = &particles.set.position;
    let velocities = &particles.set.velocity;
    let densities = &particles.density;
    let lists = &particles.neighbor_lists;

    par_map!(particles.count(), |i| {
        let mut omega = Vec3::ZERO;
        for &j in &lists[i] {
            let volume = mass / densities[j].max(f32::EPSILON);
            let grad = spiky.gradient(positions[i] - positions[j]);
            omega += volume * grad.cross(velocities[j] - velocities[i]);
        }
        omega
    })
}

/// Apply vorticity confinement to counteract numerical dissipation.
///
/// Two phases:
/// 1. Compute vorticity (curl of velocity field) at each particle
/// 2. Push each particle along `N x omega`, where `N` is the normalized
///    gradient of `|omega|`
///
/// `v_i += dt * strength * (N_i x omega_i)`. A non-positive strength returns
/// immediately without touching the particles.
pub fn compute_vorticity_confinement(particles: &mut FluidParticles, strength: f32, dt: f32) {
    if strength <= 0.0 {
        return;
    }

    let vorticity = compute_vorticity(particles);
    let spiky = SpikyKernel::new(particles.kernel_radius());
    let mass = particles.mass();
    let positions = &particles.set.position;
    let densities = &particles.density;
    let lists = &particles.neighbor_lists;

    let forces: Vec<Vec3> = par_map!(particles.count(), |i| {
        let omega_i = vorticity[i];
        let omega_len = omega_i.length();
        if omega_len < 1e-6 {
            return Vec3::ZERO;
        }

        // Gradient of |omega|.
        let mut eta = Vec3::ZERO;
        for &j in &lists[i] {
            let volume = mass / densities[j].max(f32::EPSILON);
            let grad = spiky.gradient(positions[i] - positions[j]);
            eta += volume * (vorticity[j].length() - omega_len) * grad;
        }

        let eta_len = eta.length();
        if eta_len < 1e-6 {
            return Vec3::ZERO;
        }

        (eta / eta_len).cross(omega_i) * strength
    });

    for (v, f) in particles.set.velocity.iter_mut().zip(&forces) {
        *v += *f * dt;
    }
}
