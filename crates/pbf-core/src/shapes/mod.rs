//! Boundary surfaces that colliders are built on.
//!
//! A surface answers one question: given a query point, where is the
//! closest point on the boundary, which way does the boundary face there,
//! and how far away is it. Primitives live in [`primitives`]; [`set`] holds
//! the composites that combine or flip other surfaces.
use glam::Vec3;

pub mod primitives;
pub mod set;

pub use primitives::{Cuboid, Plane, Sphere};
pub use set::{Inverted, SurfaceSet};

/// Result of a closest-point query against a [`Surface`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SurfacePoint {
    /// Closest point on the surface.
    pub point: Vec3,
    /// Outward unit normal at `point`.
    pub normal: Vec3,
    /// Unsigned distance from the query point to `point`.
    pub distance: f32,
}

/// Closest-point capability consumed by colliders.
///
/// Implementations must be deterministic and free of side effects; a
/// surface is shared read-only by every particle during collision
/// resolution.
pub trait Surface: Send + Sync {
    /// Closest point, outward normal, and distance for `query`.
    ///
    /// Returns `None` when no closest point can be determined.
    fn closest_point(&self, query: Vec3) -> Option<SurfacePoint>;

    /// True if `query` lies strictly on the solid side of the surface.
    fn is_inside(&self, query: Vec3) -> bool;
}
