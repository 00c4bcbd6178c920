use glam::Vec3;

use crate::fluids::StdKernel;
use crate::grid::SpatialHashGrid;
use crate::WATER_DENSITY;

/// SoA particle storage
pub struct ParticleSet {
    pub count: usize,
    pub position: Vec<Vec3>,
    pub velocity: Vec<Vec3>,
    /// Accumulated external force, cleared at the start of each step
    pub force: Vec<Vec3>,
    /// Mass shared by every particle
    pub mass: f32,
    /// Radius shared by every particle (used for collisions)
    pub radius: f32,
}

impl ParticleSet {
    pub fn new(count: usize) -> Self {
        Self {
            count,
            position: vec![Vec3::ZERO; count],
            velocity: vec![Vec3::ZERO; count],
            force: vec![Vec3::ZERO; count],
            mass: 1e-3,
            radius: 1e-3,
        }
    }

    /// Append particles. Missing velocities default to zero.
    pub fn add_particles(&mut self, positions: &[Vec3], velocities: &[Vec3]) {
        for (k, &p) in positions.iter().enumerate() {
            self.position.push(p);
            self.velocity.push(velocities.get(k).copied().unwrap_or(Vec3::ZERO));
            self.force.push(Vec3::ZERO);
        }
        self.count = self.position.len();
    }
}

/// SPH system data: a particle set plus everything the fluid solver reads
/// per step (densities, neighbor lists, kernel radius, target density).
pub struct FluidParticles {
    pub set: ParticleSet,
    /// Current SPH density estimate
    pub density: Vec<f32>,
    /// Neighbors within the kernel radius, excluding the particle itself
    pub neighbor_lists: Vec<Vec<usize>>,
    target_density: f32,
    target_spacing: f32,
    relative_kernel_radius: f32,
    kernel_radius: f32,
    grid: SpatialHashGrid,
}

impl Default for FluidParticles {
    fn default() -> Self {
        Self::new(WATER_DENSITY, 0.1, 1.8)
    }
}

impl FluidParticles {
    pub fn new(target_density: f32, target_spacing: f32, relative_kernel_radius: f32) -> Self {
        let kernel_radius = target_spacing * relative_kernel_radius;
        let mut particles = Self {
            set: ParticleSet::new(0),
            density: Vec::new(),
            neighbor_lists: Vec::new(),
            target_density,
            target_spacing,
            relative_kernel_radius,
            kernel_radius,
            grid: SpatialHashGrid::new(kernel_radius, SpatialHashGrid::DEFAULT_TABLE_SIZE),
        };
        particles.set.radius = target_spacing;
        particles.compute_mass();
        particles
    }

    pub fn count(&self) -> usize {
        self.set.count
    }

    pub fn mass(&self) -> f32 {
        self.set.mass
    }

    pub fn radius(&self) -> f32 {
        self.set.radius
    }

    pub fn target_density(&self) -> f32 {
        self.target_density
    }

    pub fn target_spacing(&self) -> f32 {
        self.target_spacing
    }

    pub fn relative_kernel_radius(&self) -> f32 {
        self.relative_kernel_radius
    }

    pub fn kernel_radius(&self) -> f32 {
        self.kernel_radius
    }

    /// Sets the target density and rescales the particle mass to match.
    pub fn set_target_density(&mut self, target_density: f32) {
        self.target_density = target_density;
        self.compute_mass();
    }

    /// Sets the target spacing. The particle radius follows the spacing,
    /// and kernel radius and mass are recomputed.
    pub fn set_target_spacing(&mut self, spacing: f32) {
        self.target_spacing = spacing;
        self.set.radius = spacing;
        self.update_kernel_radius();
    }

    pub fn set_relative_kernel_radius(&mut self, relative_kernel_radius: f32) {
        self.relative_kernel_radius = relative_kernel_radius;
        self.update_kernel_radius();
    }

    fn update_kernel_radius(&mut self) {
        self.kernel_radius = self.target_spacing * self.relative_kernel_radius;
        self.grid = SpatialHashGrid::new(self.kernel_radius, SpatialHashGrid::DEFAULT_TABLE_SIZE);
        self.compute_mass();
    }

    /// Append particles. Missing velocities default to zero.
    pub fn add_particles(&mut self, positions: &[Vec3], velocities: &[Vec3]) {
        self.set.add_particles(positions, velocities);
        self.density.resize(self.set.count, 0.0);
        self.neighbor_lists.resize_with(self.set.count, Vec::new);
    }

    /// Fill the box `[lower, upper]` with a cubic lattice at the target
    /// spacing. Returns the number of particles added.
    pub fn fill_box(&mut self, lower: Vec3, upper: Vec3, velocity: Vec3) -> usize {
        let spacing = self.target_spacing;
        if spacing <= 0.0 {
            return 0;
        }
        let extent = (upper - lower).max(Vec3::ZERO);
        let nx = (extent.x / spacing + 1e-4).floor() as usize + 1;
        let ny = (extent.y / spacing + 1e-4).floor() as usize + 1;
        let nz = (extent.z / spacing + 1e-4).floor() as usize + 1;

        let mut positions = Vec::with_capacity(nx * ny * nz);
        for k in 0..nz {
            for j in 0..ny {
                for i in 0..nx {
                    positions.push(lower + Vec3::new(i as f32, j as f32, k as f32) * spacing);
                }
            }
        }
        let velocities = vec![velocity; positions.len()];
        self.add_particles(&positions, &velocities);
        positions.len()
    }

    /// Rebuild the spatial hash from current positions.
    pub fn build_neighbor_search(&mut self) {
        self.grid.build(&self.set.position);
    }

    /// Rebuild neighbor lists from the spatial hash.
    pub fn build_neighbor_lists(&mut self) {
        let grid = &self.grid;
        let positions = &self.set.position;
        let h = self.kernel_radius;
        self.neighbor_lists = par_map!(self.set.count, |i| {
            let mut neighbors = Vec::new();
            grid.for_each_nearby_point(positions[i], h, |j, _| {
                if j != i {
                    neighbors.push(j);
                }
            });
            neighbors
        });
    }

    /// Recompute densities from current positions and neighbor lists.
    pub fn update_densities(&mut self) {
        let kernel = StdKernel::new(self.kernel_radius);
        let positions = &self.set.position;
        let lists = &self.neighbor_lists;
        let mass = self.set.mass;
        self.density = par_map!(self.set.count, |i| {
            let mut sum = kernel.value(0.0);
            for &j in &lists[i] {
                sum += kernel.value((positions[i] - positions[j]).length());
            }
            mass * sum
        });
    }

    /// SPH interpolation of `values` at `origin`:
    /// `sum_j m / rho_j * values[j] * W(|origin - x_j|)`.
    ///
    /// Uses the spatial hash, so `build_neighbor_search` and
    /// `update_densities` must be current.
    pub fn interpolate(&self, origin: Vec3, values: &[Vec3]) -> Vec3 {
        let kernel = StdKernel::new(self.kernel_radius);
        let mass = self.set.mass;
        let mut sum = Vec3::ZERO;
        self.grid
            .for_each_nearby_point(origin, self.kernel_radius, |j, p| {
                let rho = self.density[j].max(f32::EPSILON);
                sum += values[j] * (mass / rho * kernel.value((origin - p).length()));
            });
        sum
    }

    /// Set the particle mass so that an infinite cubic lattice at the target
    /// spacing has exactly the target density.
    pub fn compute_mass(&mut self) {
        let spacing = self.target_spacing;
        let h = self.kernel_radius;
        if spacing <= 0.0 || h <= 0.0 {
            return;
        }
        let kernel = StdKernel::new(h);
        let reach = (h / spacing).ceil() as i32;
        let mut number_density = 0.0_f32;
        for i in -reach..=reach {
            for j in -reach..=reach {
                for k in -reach..=reach {
                    let offset = Vec3::new(i as f32, j as f32, k as f32) * spacing;
                    number_density += kernel.value(offset.length());
                }
            }
        }
        if number_density > 0.0 {
            self.set.mass = self.target_density / number_density;
        }
    }
}
