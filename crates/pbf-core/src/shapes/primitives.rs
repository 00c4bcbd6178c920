//! Analytic boundary primitives.

use glam::Vec3;

use super::{Surface, SurfacePoint};

/// Infinite plane. Everything behind the normal is solid.
#[derive(Clone, Copy, Debug)]
pub struct Plane {
    pub normal: Vec3,
    pub point: Vec3,
}

impl Plane {
    /// Create a plane through `point` facing `normal` (normalized here).
    pub fn new(normal: Vec3, point: Vec3) -> Self {
        Self {
            normal: normal.normalize_or_zero(),
            point,
        }
    }

    /// Horizontal ground plane at height `y`, facing up.
    pub fn ground(y: f32) -> Self {
        Self::new(Vec3::Y, Vec3::new(0.0, y, 0.0))
    }

    #[inline]
    fn signed_distance(&self, query: Vec3) -> f32 {
        (query - self.point).dot(self.normal)
    }
}

impl Surface for Plane {
    fn closest_point(&self, query: Vec3) -> Option<SurfacePoint> {
        // A zero normal means the plane was built from a zero vector.
        if self.normal == Vec3::ZERO {
            return None;
        }
        let d = self.signed_distance(query);
        Some(SurfacePoint {
            point: query - self.normal * d,
            normal: self.normal,
            distance: d.abs(),
        })
    }

    fn is_inside(&self, query: Vec3) -> bool {
        self.signed_distance(query) < 0.0
    }
}

/// Solid sphere.
#[derive(Clone, Copy, Debug)]
pub struct Sphere {
    pub center: Vec3,
    pub radius: f32,
}

impl Sphere {
    pub fn new(center: Vec3, radius: f32) -> Self {
        Self {
            center,
            radius: radius.max(0.0),
        }
    }
}

impl Surface for Sphere {
    fn closest_point(&self, query: Vec3) -> Option<SurfacePoint> {
        let offset = query - self.center;
        let len = offset.length();
        // Every surface point is equidistant from the center; pick +Y.
        let normal = if len > 1e-12 { offset / len } else { Vec3::Y };
        Some(SurfacePoint {
            point: self.center + normal * self.radius,
            normal,
            distance: (len - self.radius).abs(),
        })
    }

    fn is_inside(&self, query: Vec3) -> bool {
        (query - self.center).length_squared() < self.radius * self.radius
    }
}

/// Solid axis-aligned box.
#[derive(Clone, Copy, Debug)]
pub struct Cuboid {
    pub lower: Vec3,
    pub upper: Vec3,
}

impl Cuboid {
    /// Create a box from two opposite corners in any order.
    pub fn new(a: Vec3, b: Vec3) -> Self {
        Self {
            lower: a.min(b),
            upper: a.max(b),
        }
    }
}

impl Surface for Cuboid {
    fn closest_point(&self, query: Vec3) -> Option<SurfacePoint> {
        if !self.is_inside(query) {
            let point = query.clamp(self.lower, self.upper);
            let offset = query - point;
            let distance = offset.length();
            let normal = if distance > 1e-12 {
                offset / distance
            } else {
                face_normal_nearest(self, query).1
            };
            return Some(SurfacePoint {
                point,
                normal,
                distance,
            });
        }

        // Inside: project onto the nearest face.
        let (distance, normal) = face_normal_nearest(self, query);
        Some(SurfacePoint {
            point: query + normal * distance,
            normal,
            distance,
        })
    }

    fn is_inside(&self, query: Vec3) -> bool {
        query.cmpgt(self.lower).all() && query.cmplt(self.upper).all()
    }
}

/// Distance to, and outward normal of, the face nearest to `query`.
fn face_normal_nearest(cuboid: &Cuboid, query: Vec3) -> (f32, Vec3) {
    let faces = [
        (query.x - cuboid.lower.x, Vec3::NEG_X),
        (cuboid.upper.x - query.x, Vec3::X),
        (query.y - cuboid.lower.y, Vec3::NEG_Y),
        (cuboid.upper.y - query.y, Vec3::Y),
        (query.z - cuboid.lower.z, Vec3::NEG_Z),
        (cuboid.upper.z - query.z, Vec3::Z),
    ];
    faces
        .into_iter()
        .map(|(d, n)| (d.abs(), n))
        .fold((f32::INFINITY, Vec3::Y), |best, face| {
            if face.0 < best.0 {
                face
            } else {
                best
            }
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plane_closest_point_above() {
        let plane = Plane::ground(0.0);
        let hit = plane.closest_point(Vec3::new(1.0, 2.0, -3.0)).unwrap();
        assert_eq!(hit.point, Vec3::new(1.0, 0.0, -3.0));
        assert_eq!(hit.normal, Vec3::Y);
        assert_eq!(hit.distance, 2.0);
        assert!(!plane.is_inside(Vec3::new(1.0, 2.0, -3.0)));
    }

    #[test]
    fn test_plane_below_is_inside() {
        let plane = Plane::ground(1.0);
        let q = Vec3::new(0.0, 0.5, 0.0);
        assert!(plane.is_inside(q));
        let hit = plane.closest_point(q).unwrap();
        assert!((hit.distance - 0.5).abs() < 1e-6);
        assert!((hit.point.y - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_zero_normal_plane_has_no_closest_point() {
        let plane = Plane::new(Vec3::ZERO, Vec3::ZERO);
        assert!(plane.closest_point(Vec3::ONE).is_none());
    }

    #[test]
    fn test_cuboid_inside_projects_to_nearest_face() {
        let cuboid = Cuboid::new(Vec3::ZERO, Vec3::ONE);
        let hit = cuboid.closest_point(Vec3::new(0.5, 0.9, 0.5)).unwrap();
        assert_eq!(hit.normal, Vec3::Y);
        assert!((hit.point.y - 1.0).abs() < 1e-6);
        assert!((hit.distance - 0.1).abs() < 1e-6);
    }

    #[test]
    fn test_cuboid_outside_corner() {
        let cuboid = Cuboid::new(Vec3::ONE, Vec3::ZERO);
        let hit = cuboid.closest_point(Vec3::new(2.0, 2.0, 0.5)).unwrap();
        assert_eq!(hit.point, Vec3::new(1.0, 1.0, 0.5));
        assert!((hit.distance - 2.0_f32.sqrt()).abs() < 1e-6);
        assert!(!cuboid.is_inside(Vec3::new(2.0, 2.0, 0.5)));
    }
}
