//! Composite surfaces.

use std::sync::Arc;

use glam::Vec3;

use super::{Surface, SurfacePoint};

/// Union of several surfaces sharing one collider.
///
/// Queries answer with the closest member. A point is inside the set if it
/// is inside any member.
#[derive(Clone, Default)]
pub struct SurfaceSet {
    surfaces: Vec<Arc<dyn Surface>>,
}

impl SurfaceSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_surfaces(surfaces: Vec<Arc<dyn Surface>>) -> Self {
        Self { surfaces }
    }

    pub fn add_surface(&mut self, surface: Arc<dyn Surface>) {
        self.surfaces.push(surface);
    }

    pub fn len(&self) -> usize {
        self.surfaces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.surfaces.is_empty()
    }
}

impl Surface for SurfaceSet {
    /// `None` if the set is empty or any member fails to answer.
    fn closest_point(&self, query: Vec3) -> Option<SurfacePoint> {
        let mut best: Option<SurfacePoint> = None;
        for surface in &self.surfaces {
            let hit = surface.closest_point(query)?;
            if best.map_or(true, |b| hit.distance < b.distance) {
                best = Some(hit);
            }
        }
        best
    }

    fn is_inside(&self, query: Vec3) -> bool {
        self.surfaces.iter().any(|s| s.is_inside(query))
    }
}

/// Flips a surface inside out, e.g. turning a solid box into a container.
#[derive(Clone, Copy, Debug)]
pub struct Inverted<S> {
    pub inner: S,
}

impl<S: Surface> Inverted<S> {
    pub fn new(inner: S) -> Self {
        Self { inner }
    }
}

impl<S: Surface> Surface for Inverted<S> {
    fn closest_point(&self, query: Vec3) -> Option<SurfacePoint> {
        self.inner.closest_point(query).map(|hit| SurfacePoint {
            normal: -hit.normal,
            ..hit
        })
    }

    fn is_inside(&self, query: Vec3) -> bool {
        !self.inner.is_inside(query)
    }
}
