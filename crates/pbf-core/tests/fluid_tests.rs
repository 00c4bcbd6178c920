use glam::Vec3;
use pbf_core::constraints::density::{solve_density_constraint, AntiClustering};
use pbf_core::fluids::viscosity::compute_pseudo_viscosity;
use pbf_core::fluids::vorticity::{compute_vorticity, compute_vorticity_confinement};
use pbf_core::fluids::{SpikyKernel, StdKernel};
use pbf_core::particle::FluidParticles;
use std::f32::consts::PI;

/// `n`^3 lattice centred on the origin at the default spacing, with
/// neighbor lists and densities up to date.
fn centred_lattice(n: usize) -> FluidParticles {
    let mut particles = FluidParticles::default();
    let half = (n - 1) as f32 * particles.target_spacing() * 0.5;
    particles.fill_box(Vec3::splat(-half), Vec3::splat(half), Vec3::ZERO);
    refresh(&mut particles);
    particles
}

fn refresh(particles: &mut FluidParticles) {
    particles.build_neighbor_search();
    particles.build_neighbor_lists();
    particles.update_densities();
}

#[test]
fn test_std_kernel_zero_distance() {
    let h = 0.1_f32;
    let kernel = StdKernel::new(h);
    let peak = 315.0 / (64.0 * PI * h.powi(3));
    let result = kernel.value(0.0);
    assert!(
        (result - peak).abs() < peak * 1e-5,
        "W(0) with h={h} is {result}, expected {peak}"
    );
}

#[test]
fn test_std_kernel_at_and_beyond_boundary() {
    let kernel = StdKernel::new(0.1);
    assert_eq!(kernel.value(0.1), 0.0, "W(h) should be 0.0");
    assert_eq!(kernel.value(0.11), 0.0, "W(h + 0.01) should be 0.0");
}

#[test]
fn test_std_kernel_midpoint() {
    let kernel = StdKernel::new(0.1);
    let mid = kernel.value(0.05);
    assert!(mid > 0.0, "W(h/2) should be positive");
    assert!(mid < kernel.value(0.0), "W(h/2) should be less than peak");
}

#[test]
fn test_spiky_gradient_zero_distance() {
    let spiky = SpikyKernel::new(0.1);
    let result = spiky.gradient(Vec3::new(1e-7, 0.0, 0.0));
    assert_eq!(result, Vec3::ZERO, "near-coincident particles have no gradient");
}

#[test]
fn test_spiky_gradient_at_boundary() {
    let spiky = SpikyKernel::new(0.1);
    assert_eq!(spiky.gradient(Vec3::new(0.1, 0.0, 0.0)), Vec3::ZERO);
    assert_eq!(spiky.value(0.1), 0.0);
}

#[test]
fn test_spiky_gradient_direction() {
    let spiky = SpikyKernel::new(0.1);
    let grad = spiky.gradient(Vec3::new(0.05, 0.0, 0.0));

    // r = x_i - x_j points along +x, so the neighbor sits on -x and the
    // gradient points toward it.
    assert!(grad.x < 0.0, "gradient x should be negative, got {}", grad.x);
    assert!(grad.y.abs() < 1e-10, "gradient y should be ~0, got {}", grad.y);
    assert!(grad.z.abs() < 1e-10, "gradient z should be ~0, got {}", grad.z);
    assert!((grad.x - spiky.first_derivative(0.05)).abs() < 1e-3);
}

#[test]
fn test_lattice_interior_has_target_density() {
    let particles = centred_lattice(7);
    let centre = 3 * 49 + 3 * 7 + 3;
    let rho = particles.density[centre];
    assert!(
        (rho / particles.target_density() - 1.0).abs() < 1e-4,
        "interior density {rho}"
    );
    assert_eq!(particles.neighbor_lists[centre].len(), 26);

    // Corners see far fewer neighbors.
    assert_eq!(particles.neighbor_lists[0].len(), 7);
    assert!(particles.density[0] < 0.7 * particles.target_density());
}

#[test]
fn test_interpolate_constant_field() {
    let particles = centred_lattice(7);
    let values = vec![Vec3::new(1.0, 2.0, 3.0); particles.count()];
    let sample = particles.interpolate(Vec3::ZERO, &values);
    assert!(
        (sample - Vec3::new(1.0, 2.0, 3.0)).length() < 1e-3,
        "interpolated {sample:?}"
    );
}

#[test]
fn test_density_constraint_relaxes_compressed_block() {
    let mut particles = FluidParticles::default();
    // Pack the block tighter than the target spacing.
    let positions: Vec<Vec3> = (0..343)
        .map(|k| {
            let (i, j, l) = (k % 7, (k / 7) % 7, k / 49);
            Vec3::new(i as f32, j as f32, l as f32) * 0.07
        })
        .collect();
    particles.add_particles(&positions, &[]);
    refresh(&mut particles);
    let centre = 3 * 49 + 3 * 7 + 3;
    let before = particles.density[centre];
    assert!(before > particles.target_density());

    let stats = solve_density_constraint(&mut particles, 10, 10.0, &AntiClustering::default());
    assert_eq!(stats.iterations, 10);
    particles.update_densities();

    let after = particles.density[centre];
    assert!(after < before, "density did not drop: {before} -> {after}");
    assert!(particles.set.position.iter().all(|p| p.is_finite()));
}

#[test]
fn test_density_constraint_zero_iterations() {
    let mut particles = centred_lattice(3);
    let before = particles.set.position.clone();
    let stats = solve_density_constraint(&mut particles, 0, 10.0, &AntiClustering::default());
    assert_eq!(stats.iterations, 0);
    assert_eq!(particles.set.position, before);
}

#[test]
fn test_pseudo_viscosity_blends_pair() {
    let mut particles = FluidParticles::default();
    particles.add_particles(
        &[Vec3::ZERO, Vec3::new(0.05, 0.0, 0.0)],
        &[Vec3::X, Vec3::NEG_X],
    );
    refresh(&mut particles);

    compute_pseudo_viscosity(&mut particles, 0.0);
    assert_eq!(particles.set.velocity, vec![Vec3::X, Vec3::NEG_X]);

    compute_pseudo_viscosity(&mut particles, 1.0);
    let v0 = particles.set.velocity[0];
    let v1 = particles.set.velocity[1];
    assert!(v0.x > 0.0 && v0.x < 1.0, "v0 = {v0:?}");
    assert!((v0 + v1).length() < 1e-5, "momentum not symmetric: {v0:?} {v1:?}");
}

#[test]
fn test_rigid_rotation_vorticity_points_along_axis() {
    let mut particles = centred_lattice(7);
    for (v, x) in particles.set.velocity.iter_mut().zip(&particles.set.position) {
        *v = Vec3::Z.cross(*x);
    }
    let omega = compute_vorticity(&particles);
    let centre = omega[3 * 49 + 3 * 7 + 3];
    assert!(centre.z > 0.0, "vorticity {centre:?}");
    assert!(centre.x.abs() < 1e-3 * centre.z);
    assert!(centre.y.abs() < 1e-3 * centre.z);
}

#[test]
fn test_zero_confinement_leaves_velocities() {
    let mut particles = centred_lattice(5);
    for (v, x) in particles.set.velocity.iter_mut().zip(&particles.set.position) {
        *v = Vec3::Y.cross(*x) * 3.0;
    }
    let before = particles.set.velocity.clone();
    compute_vorticity_confinement(&mut particles, 0.0, 0.01);
    assert_eq!(particles.set.velocity, before);

    compute_vorticity_confinement(&mut particles, 0.5, 0.01);
    assert!(particles.set.velocity.iter().all(|v| v.is_finite()));
}

/// Shear flow whose vorticity magnitude grows with height.
fn sheared_lattice() -> FluidParticles {
    let mut particles = centred_lattice(7);
    for (v, x) in particles.set.velocity.iter_mut().zip(&particles.set.position) {
        *v = Vec3::new(5.0 * x.y * x.y, 0.0, 0.0);
    }
    particles
}

fn confinement_kick(strength: f32, dt: f32) -> Vec<Vec3> {
    let mut particles = sheared_lattice();
    let before = particles.set.velocity.clone();
    compute_vorticity_confinement(&mut particles, strength, dt);
    particles
        .set
        .velocity
        .iter()
        .zip(&before)
        .map(|(after, before)| *after - *before)
        .collect()
}

#[test]
fn test_confinement_pushes_along_gradient_cross_vorticity() {
    let particles = sheared_lattice();
    let omega = compute_vorticity(&particles);
    let spiky = SpikyKernel::new(particles.kernel_radius());
    let mass = particles.mass();
    let (strength, dt) = (0.5, 0.01);
    let kick = confinement_kick(strength, dt);

    // Interior particle above the shear centre line.
    let i = 3 * 49 + 5 * 7 + 3;
    let mut eta = Vec3::ZERO;
    for &j in &particles.neighbor_lists[i] {
        let volume = mass / particles.density[j];
        let grad = spiky.gradient(particles.set.position[i] - particles.set.position[j]);
        eta += volume * (omega[j].length() - omega[i].length()) * grad;
    }
    let expected = eta.normalize().cross(omega[i]) * (strength * dt);

    assert!(expected.length() > 1e-6, "no confinement expected at {i}");
    assert!(
        (kick[i] - expected).length() < 1e-4 * expected.length(),
        "kick {:?} expected {:?}",
        kick[i],
        expected
    );
    // Perpendicular to the vorticity itself.
    assert!(kick[i].dot(omega[i]).abs() < 1e-3 * kick[i].length() * omega[i].length());
}

#[test]
fn test_confinement_scales_with_strength_and_dt() {
    let base = confinement_kick(0.5, 0.01);
    let stronger = confinement_kick(1.0, 0.01);
    let longer = confinement_kick(0.5, 0.02);
    assert!(base.iter().any(|dv| dv.length() > 1e-6));
    for ((b, s), l) in base.iter().zip(&stronger).zip(&longer) {
        let tolerance = 1e-4 * b.length() + 1e-6;
        assert!((*s - *b * 2.0).length() <= tolerance, "{s:?} vs 2 * {b:?}");
        assert!((*l - *b * 2.0).length() <= tolerance, "{l:?} vs 2 * {b:?}");
    }
}

fn anti_clustered_pair_separation(strength: f32) -> f32 {
    let mut particles = FluidParticles::default();
    particles.add_particles(&[Vec3::ZERO, Vec3::new(0.03, 0.0, 0.0)], &[]);
    refresh(&mut particles);
    let anti_clustering = AntiClustering {
        strength,
        ..Default::default()
    };
    // Huge relaxation leaves lambda near zero so only s_corr acts.
    solve_density_constraint(&mut particles, 1, 1.0e12, &anti_clustering);
    (particles.set.position[1] - particles.set.position[0]).length()
}

#[test]
fn test_anti_clustering_separates_close_pair() {
    let without = anti_clustered_pair_separation(0.0);
    let with = anti_clustered_pair_separation(0.1);
    assert!((without - 0.03).abs() < 1e-6, "pair moved without s_corr: {without}");
    assert!(with > 0.03 + 1e-3, "pair did not separate: {with}");
}
