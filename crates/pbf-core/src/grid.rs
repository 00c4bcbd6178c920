use glam::{IVec3, Vec3};

/// Uniform spatial hash grid for neighbor queries.
///
/// Uses counting sort for O(N) construction: count particles per cell -> prefix sum -> scatter.
/// The grid keeps its own copy of the points it was built from, so queries
/// stay consistent until the next `build`.
pub struct SpatialHashGrid {
    cell_size: f32,
    inv_cell_size: f32,
    table_size: usize,
    /// Count array (reused): cell_count[hash] = number of particles in cell
    cell_count: Vec<u32>,
    /// Prefix sum: cell_start[hash] = index where particles for this cell begin in sorted_indices
    cell_start: Vec<u32>,
    /// Particle indices sorted by cell hash
    sorted_indices: Vec<u32>,
    /// Integer cell per particle; filters out hash collisions between cells
    particle_cells: Vec<IVec3>,
    points: Vec<Vec3>,
}

impl SpatialHashGrid {
    /// Default hash table size (2^17).
    pub const DEFAULT_TABLE_SIZE: usize = 131072;

    /// Create grid with given cell size.
    /// `cell_size` should be at least the largest query radius.
    pub fn new(cell_size: f32, table_size: usize) -> Self {
        let cell_size = cell_size.max(1e-6);
        let table_size = table_size.max(1);
        Self {
            cell_size,
            inv_cell_size: 1.0 / cell_size,
            table_size,
            cell_count: vec![0u32; table_size],
            cell_start: vec![0u32; table_size],
            sorted_indices: Vec::new(),
            particle_cells: Vec::new(),
            points: Vec::new(),
        }
    }

    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    /// Number of points the grid was last built from.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Build the grid from `positions`. O(N) using counting sort.
    pub fn build(&mut self, positions: &[Vec3]) {
        let count = positions.len();
        self.points.clear();
        self.points.extend_from_slice(positions);
        self.particle_cells.clear();
        self.sorted_indices.clear();
        self.sorted_indices.resize(count, 0);

        self.cell_count.fill(0);

        for &p in positions {
            let cell = self.cell_coords(p);
            self.particle_cells.push(cell);
            let h = self.hash_cell(cell);
            self.cell_count[h] += 1;
        }

        self.cell_start[0] = 0;
        for k in 1..self.table_size {
            self.cell_start[k] = self.cell_start[k - 1] + self.cell_count[k - 1];
        }

        // Reuse cell_count as scatter offsets.
        self.cell_count.fill(0);

        for i in 0..count {
            let h = self.hash_cell(self.particle_cells[i]);
            let idx = self.cell_start[h] + self.cell_count[h];
            self.sorted_indices[idx as usize] = i as u32;
            self.cell_count[h] += 1;
        }
    }

    /// Calls `callback(index, position)` once for every point within
    /// `radius` of `origin` (strictly closer than `radius`).
    pub fn for_each_nearby_point<F: FnMut(usize, Vec3)>(
        &self,
        origin: Vec3,
        radius: f32,
        mut callback: F,
    ) {
        if self.points.is_empty() {
            return;
        }
        let reach = (radius * self.inv_cell_size).ceil().max(1.0) as i32;
        let center = self.cell_coords(origin);
        let radius_sq = radius * radius;

        for dx in -reach..=reach {
            for dy in -reach..=reach {
                for dz in -reach..=reach {
                    let cell = center + IVec3::new(dx, dy, dz);
                    let h = self.hash_cell(cell);
                    let start = self.cell_start[h] as usize;
                    let end = start + self.cell_count[h] as usize;
                    for &idx in &self.sorted_indices[start..end] {
                        let j = idx as usize;
                        if self.particle_cells[j] != cell {
                            continue;
                        }
                        let p = self.points[j];
                        if (p - origin).length_squared() < radius_sq {
                            callback(j, p);
                        }
                    }
                }
            }
        }
    }

    /// True if any point lies within `radius` of `origin`.
    pub fn has_nearby_point(&self, origin: Vec3, radius: f32) -> bool {
        let mut found = false;
        self.for_each_nearby_point(origin, radius, |_, _| found = true);
        found
    }

    /// Hash function: cell coords -> table index
    #[inline]
    fn hash_cell(&self, cell: IVec3) -> usize {
        let h = (cell.x as u32).wrapping_mul(73856093)
            ^ (cell.y as u32).wrapping_mul(19349663)
            ^ (cell.z as u32).wrapping_mul(83492791);
        (h as usize) % self.table_size
    }

    /// Convert world position to cell coordinates
    #[inline]
    fn cell_coords(&self, pos: Vec3) -> IVec3 {
        (pos * self.inv_cell_size).floor().as_ivec3()
    }
}
