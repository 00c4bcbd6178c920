//! Generic colliders.
//!
//! A [`Collider`] pairs a shared boundary [`Surface`] with a motion model
//! and a friction coefficient. All collision resolution lives here; a
//! motion model only answers how fast the boundary moves at a point.

use std::sync::Arc;

use glam::Vec3;

use crate::error::PbfError;
use crate::math::split_normal_tangent;
use crate::shapes::Surface;

/// Velocity field of a collider's boundary.
pub trait ColliderMotion: Send + Sync {
    /// Boundary velocity at `point`.
    fn velocity_at(&self, point: Vec3) -> Vec3;

    /// Move time-dependent motion state to `time + dt`.
    ///
    /// State must be a function of time alone: `advance(t, 0.0)` puts the
    /// motion back where it was at `t`, which is how an aborted step rewinds
    /// its collider.
    fn advance(&mut self, _time: f32, _dt: f32) {}
}

/// A boundary that never moves.
#[derive(Clone, Copy, Debug, Default)]
pub struct Static;

impl ColliderMotion for Static {
    fn velocity_at(&self, _point: Vec3) -> Vec3 {
        Vec3::ZERO
    }
}

/// Kinematic rigid motion: `linear + angular x (point - origin)`.
#[derive(Clone, Copy, Debug, Default)]
pub struct RigidBodyMotion {
    pub linear_velocity: Vec3,
    pub angular_velocity: Vec3,
    /// Center of rotation
    pub origin: Vec3,
}

impl ColliderMotion for RigidBodyMotion {
    fn velocity_at(&self, point: Vec3) -> Vec3 {
        self.linear_velocity + self.angular_velocity.cross(point - self.origin)
    }
}

/// Scripted motion: a velocity field that depends on simulation time.
pub struct AnimatedMotion<F> {
    field: F,
    time: f32,
}

impl<F> AnimatedMotion<F>
where
    F: Fn(f32, Vec3) -> Vec3 + Send + Sync,
{
    /// `field(time, point)` returns the boundary velocity.
    pub fn new(field: F) -> Self {
        Self { field, time: 0.0 }
    }

    pub fn time(&self) -> f32 {
        self.time
    }
}

impl<F> ColliderMotion for AnimatedMotion<F>
where
    F: Fn(f32, Vec3) -> Vec3 + Send + Sync,
{
    fn velocity_at(&self, point: Vec3) -> Vec3 {
        (self.field)(self.time, point)
    }

    fn advance(&mut self, time: f32, dt: f32) {
        self.time = time + dt;
    }
}

/// Closest-point query result, with the boundary velocity at that point.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ColliderQueryResult {
    pub distance: f32,
    pub point: Vec3,
    pub normal: Vec3,
    pub velocity: Vec3,
}

/// Surface-backed collider with restitution and friction.
pub struct Collider {
    surface: Arc<dyn Surface>,
    friction_coefficient: f32,
    motion: Box<dyn ColliderMotion>,
}

impl Collider {
    pub fn new(surface: Arc<dyn Surface>, motion: impl ColliderMotion + 'static) -> Self {
        Self {
            surface,
            friction_coefficient: 0.0,
            motion: Box::new(motion),
        }
    }

    /// Collider whose boundary never moves.
    pub fn fixed(surface: Arc<dyn Surface>) -> Self {
        Self::new(surface, Static)
    }

    /// Collider moving as a rigid body.
    pub fn rigid_body(surface: Arc<dyn Surface>, motion: RigidBodyMotion) -> Self {
        Self::new(surface, motion)
    }

    /// Builder-style friction setter. Negative values clamp to zero.
    pub fn with_friction(mut self, friction_coefficient: f32) -> Self {
        self.set_friction_coefficient(friction_coefficient);
        self
    }

    /// Boundary velocity at `point`.
    pub fn velocity_at(&self, point: Vec3) -> Vec3 {
        self.motion.velocity_at(point)
    }

    pub fn friction_coefficient(&self) -> f32 {
        self.friction_coefficient
    }

    /// Negative input is clamped to zero.
    pub fn set_friction_coefficient(&mut self, friction_coefficient: f32) {
        self.friction_coefficient = friction_coefficient.max(0.0);
    }

    pub fn surface(&self) -> &Arc<dyn Surface> {
        &self.surface
    }

    /// Swap the boundary between steps. Other colliders sharing the old
    /// surface keep it.
    pub fn set_surface(&mut self, surface: Arc<dyn Surface>) {
        self.surface = surface;
    }

    pub fn set_motion(&mut self, motion: impl ColliderMotion + 'static) {
        self.motion = Box::new(motion);
    }

    /// Advance the motion model. The surface itself never changes here.
    pub fn update(&mut self, time: f32, dt: f32) {
        self.motion.advance(time, dt);
    }

    /// Put the motion model back to its state at `time`.
    pub(crate) fn rewind(&mut self, time: f32) {
        self.motion.advance(time, 0.0);
    }

    /// Query the surface and attach the boundary velocity at the closest
    /// point. One of the two building blocks of `resolve_collision`, exposed
    /// for callers that handle contacts themselves.
    ///
    /// Fails with [`PbfError::NoClosestPoint`] when the surface cannot answer,
    /// and [`PbfError::DegenerateSurface`] when it answers with non-finite
    /// data or a zero normal.
    pub fn closest_point(&self, query: Vec3) -> Result<ColliderQueryResult, PbfError> {
        let hit = self
            .surface
            .closest_point(query)
            .ok_or(PbfError::NoClosestPoint { query })?;

        if !hit.point.is_finite()
            || !hit.normal.is_finite()
            || !hit.distance.is_finite()
            || hit.normal.length_squared() < 1e-12
        {
            return Err(PbfError::DegenerateSurface { query });
        }

        Ok(ColliderQueryResult {
            distance: hit.distance,
            point: hit.point,
            normal: hit.normal,
            velocity: self.velocity_at(hit.point),
        })
    }

    /// True if `position` is inside the solid, or closer to the surface than
    /// `radius`. A point exactly `radius` away on the outside is not
    /// penetrating. Pure; the other building block of `resolve_collision`.
    pub fn is_penetrating(
        &self,
        query: &ColliderQueryResult,
        position: Vec3,
        radius: f32,
    ) -> bool {
        self.surface.is_inside(position) || query.distance < radius
    }

    /// Resolve a particle of `radius` at `position` moving with `velocity`
    /// against this collider.
    ///
    /// Returns the corrected `(position, velocity)`; both come back unchanged
    /// when the particle is not penetrating. On contact the position is
    /// projected to `radius` outside the surface; the normal part of the
    /// relative velocity is reflected and scaled by `restitution` only when
    /// approaching, and the tangential part is damped by friction without
    /// ever reversing.
    pub fn resolve_collision(
        &self,
        radius: f32,
        restitution: f32,
        position: Vec3,
        velocity: Vec3,
    ) -> Result<(Vec3, Vec3), PbfError> {
        let query = self.closest_point(position)?;
        if !self.is_penetrating(&query, position, radius) {
            return Ok((position, velocity));
        }

        let normal = query.normal;
        let target_point = query.point + normal * radius;
        let boundary_velocity = query.velocity;
        let relative = velocity - boundary_velocity;
        let (normal_speed, mut relative_n, mut relative_t) = split_normal_tangent(relative, normal);

        // Separating: only the position is corrected.
        if normal_speed >= 0.0 {
            return Ok((target_point, velocity));
        }

        let delta_n = relative_n * (-restitution - 1.0);
        relative_n *= -restitution;

        let tangential_speed = relative_t.length();
        if tangential_speed > 0.0 {
            let scale = (1.0
                - self.friction_coefficient * delta_n.length() / tangential_speed)
                .max(0.0);
            relative_t *= scale;
        }

        Ok((target_point, relative_n + relative_t + boundary_velocity))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes::Plane;

    #[test]
    fn test_rigid_body_velocity_at() {
        let motion = RigidBodyMotion {
            linear_velocity: Vec3::X,
            angular_velocity: Vec3::new(0.0, 0.0, 1.0),
            origin: Vec3::ZERO,
        };
        let v = motion.velocity_at(Vec3::new(1.0, 0.0, 0.0));
        assert!((v - Vec3::new(1.0, 1.0, 0.0)).length() < 1e-6);
    }

    #[test]
    fn test_animated_motion_follows_time() {
        let mut collider = Collider::new(
            Arc::new(Plane::ground(0.0)),
            AnimatedMotion::new(|t: f32, _p: Vec3| Vec3::new(t, 0.0, 0.0)),
        );
        assert_eq!(collider.velocity_at(Vec3::ZERO), Vec3::ZERO);
        collider.update(1.0, 0.5);
        assert_eq!(collider.velocity_at(Vec3::ZERO), Vec3::new(1.5, 0.0, 0.0));
    }

    #[test]
    fn test_animated_motion_rewinds() {
        let mut motion = AnimatedMotion::new(|t: f32, _p: Vec3| Vec3::new(0.0, t, 0.0));
        motion.advance(0.5, 0.25);
        assert_eq!(motion.time(), 0.75);
        motion.advance(0.5, 0.0);
        assert_eq!(motion.time(), 0.5);

        let mut collider = Collider::new(Arc::new(Plane::ground(0.0)), motion);
        collider.update(0.5, 0.25);
        collider.rewind(0.5);
        assert_eq!(collider.velocity_at(Vec3::ZERO), Vec3::new(0.0, 0.5, 0.0));
    }

    #[test]
    fn test_set_motion_replaces_velocity_field() {
        let mut collider = Collider::fixed(Arc::new(Plane::ground(0.0)));
        assert_eq!(collider.velocity_at(Vec3::ONE), Vec3::ZERO);
        collider.set_motion(RigidBodyMotion {
            linear_velocity: Vec3::X,
            ..Default::default()
        });
        assert_eq!(collider.velocity_at(Vec3::ONE), Vec3::X);
    }

    #[test]
    fn test_closest_point_attaches_boundary_velocity() {
        let collider = Collider::rigid_body(
            Arc::new(Plane::ground(0.0)),
            RigidBodyMotion {
                linear_velocity: Vec3::new(2.0, 0.0, 0.0),
                ..Default::default()
            },
        );
        let q = collider.closest_point(Vec3::new(0.0, 1.0, 0.0)).unwrap();
        assert_eq!(q.velocity, Vec3::new(2.0, 0.0, 0.0));
        assert_eq!(q.normal, Vec3::Y);
        assert_eq!(q.distance, 1.0);
    }
}
