use glam::Vec3;

use crate::fluids::{SpikyKernel, StdKernel};
use crate::particle::FluidParticles;

/// Anti-clustering (tensile instability) correction parameters.
///
/// `s_corr = -strength * (W(r) / W(target_spacing * denominator_factor))^exponent`
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AntiClustering {
    pub denominator_factor: f32,
    pub strength: f32,
    pub exponent: f32,
}

impl Default for AntiClustering {
    fn default() -> Self {
        Self {
            denominator_factor: 0.2,
            strength: 1e-6,
            exponent: 4.0,
        }
    }
}

/// Outcome of one call to [`solve_density_constraint`].
#[derive(Clone, Copy, Debug, Default)]
pub struct DensitySolveStats {
    pub iterations: u32,
    /// max |rho / rho_0 - 1| measured at the start of the last iteration
    pub max_density_error: f32,
}

/// Solve the PBF density constraint on the current (predicted) positions.
///
/// Reference: "Position Based Fluids", Macklin & Muller, SIGGRAPH 2013
///
/// Per iteration:
/// 1. Update densities at the current positions.
/// 2. Compute lambda_i = -C_i / (sum |grad C|^2 + relaxation) with
///    C_i = rho_i / rho_0 - 1.
/// 3. Compute every position correction from a consistent snapshot, then
///    apply them all at once (Jacobi).
///
/// Neighbor lists must already be built for the predicted positions.
pub fn solve_density_constraint(
    particles: &mut FluidParticles,
    max_iterations: u32,
    relaxation: f32,
    anti_clustering: &AntiClustering,
) -> DensitySolveStats {
    let count = particles.count();
    let mut stats = DensitySolveStats::default();
    if count == 0 {
        return stats;
    }

    let h = particles.kernel_radius();
    let std_kernel = StdKernel::new(h);
    let spiky = SpikyKernel::new(h);
    let inv_rho0 = 1.0 / particles.target_density();
    let mass_over_rho0 = particles.mass() * inv_rho0;

    let dq = particles.target_spacing() * anti_clustering.denominator_factor;
    let w_dq = std_kernel.value(dq);
    let anti_clustering_on = anti_clustering.strength > 0.0 && w_dq > 0.0;

    for iteration in 0..max_iterations {
        particles.update_densities();

        let positions = &particles.set.position;
        let densities = &particles.density;
        let lists = &particles.neighbor_lists;

        stats.max_density_error = densities
            .iter()
            .map(|rho| (rho * inv_rho0 - 1.0).abs())
            .fold(0.0_f32, f32::max);

        let lambdas: Vec<f32> = par_map!(count, |i| {
            let c = densities[i] * inv_rho0 - 1.0;
            let mut grad_sum_sq = 0.0_f32;
            let mut grad_self = Vec3::ZERO;
            for &j in &lists[i] {
                let grad_j = spiky.gradient(positions[i] - positions[j]) * mass_over_rho0;
                grad_sum_sq += grad_j.length_squared();
                grad_self += grad_j;
            }
            grad_sum_sq += grad_self.length_squared();
            -c / (grad_sum_sq + relaxation)
        });

        let deltas: Vec<Vec3> = par_map!(count, |i| {
            let mut delta = Vec3::ZERO;
            for &j in &lists[i] {
                let r = positions[i] - positions[j];
                let s_corr = if anti_clustering_on {
                    let ratio = std_kernel.value(r.length()) / w_dq;
                    -anti_clustering.strength * ratio.powf(anti_clustering.exponent)
                } else {
                    0.0
                };
                delta += (lambdas[i] + lambdas[j] + s_corr) * spiky.gradient(r);
            }
            delta * mass_over_rho0
        });

        for (p, d) in particles.set.position.iter_mut().zip(&deltas) {
            *p += *d;
        }

        tracing::trace!(
            iteration,
            max_density_error = stats.max_density_error,
            "pbf density iteration"
        );
        stats.iterations = iteration + 1;
    }

    stats
}
