use crate::shapes::{CollisionShape, ShapeKind};
use crate::math::{Vector3, Matrix3, Aabb, Transform};
use std::any::Any;

/// A sphere. Its core is the center point and its margin is the radius.
#[derive(Debug, Clone, PartialEq)]
pub struct Sphere {
    radius: f32,
}

impl Sphere {
    /// Creates a new sphere with the given radius
    ///
    /// # Panics
    ///
    /// Panics if `radius` is not strictly positive.
    pub fn new(radius: f32) -> Self {
        assert!(radius > 0.0, "sphere radius must be positive, got {}", radius);
        Self { radius }
    }

    /// Returns the radius of the sphere
    pub fn get_radius(&self) -> f32 {
        self.radius
    }
}

impl CollisionShape for Sphere {
    fn kind(&self) -> ShapeKind {
        ShapeKind::Sphere
    }

    fn margin(&self) -> f32 {
        self.radius
    }

    fn support_point_without_margin(&self, _direction: Vector3) -> Vector3 {
        Vector3::zero()
    }

    fn local_inertia_tensor(&self, mass: f32) -> Matrix3 {
        let inertia = 0.4 * mass * self.radius * self.radius;
        Matrix3::from_diagonal(Vector3::splat(inertia))
    }

    fn local_bounds(&self) -> Aabb {
        Aabb::from_center_half_extents(Vector3::zero(), Vector3::splat(self.radius))
    }

    fn world_bounds(&self, transform: &Transform) -> Aabb {
        Aabb::from_center_half_extents(transform.position, Vector3::splat(self.radius))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
