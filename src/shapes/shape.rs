use crate::math::{Vector3, Matrix3, Aabb, Transform, MACHINE_EPSILON};
use std::any::Any;
use std::fmt::Debug;

#[cfg(feature = "serialize")]
use serde::{Serialize, Deserialize};

/// Default collision margin of shapes whose margin is not implied by their geometry
pub const DEFAULT_MARGIN: f32 = 0.04;

/// Tag identifying the concrete kind of a collision shape
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub enum ShapeKind {
    Sphere,
    Box,
    Capsule,
    Cylinder,
    Cone,
    ConvexHull,
}

/// A convex collision shape described by its support mapping.
///
/// Every shape is split into a *core* and a *margin*: the full shape is the
/// Minkowski sum of the core and a sphere of radius `margin()`. Narrow-phase
/// queries run GJK on the cores and only fall back to the inflated shapes
/// when the cores overlap.
///
/// Shapes are immutable once built and shared between bodies through
/// `Arc<dyn CollisionShape>`.
pub trait CollisionShape: Send + Sync + Debug + 'static {
    /// Returns the kind of the shape
    fn kind(&self) -> ShapeKind;

    /// Returns the collision margin (always non-negative)
    fn margin(&self) -> f32;

    /// Support point of the core shape in the given local direction.
    ///
    /// The direction does not need to be normalized and may be zero.
    fn support_point_without_margin(&self, direction: Vector3) -> Vector3;

    /// Support point of the full (margin-inflated) shape in the given local direction.
    ///
    /// For a zero direction a fixed point on the top of the shape (+Y) is returned.
    fn support_point_with_margin(&self, direction: Vector3) -> Vector3 {
        let margin = self.margin();
        if direction.length_squared() >= MACHINE_EPSILON * MACHINE_EPSILON {
            self.support_point_without_margin(direction) + direction.normalize() * margin
        } else {
            self.support_point_without_margin(Vector3::unit_y()) + Vector3::new(0.0, margin, 0.0)
        }
    }

    /// Returns the local inertia tensor of the shape for the given mass
    fn local_inertia_tensor(&self, mass: f32) -> Matrix3;

    /// Returns the bounds of the full shape in local space
    fn local_bounds(&self) -> Aabb;

    /// Returns the tight bounds of the full shape placed at `transform`.
    ///
    /// Computed from the support mapping along the six world axes.
    fn world_bounds(&self, transform: &Transform) -> Aabb {
        let mut min = Vector3::zero();
        let mut max = Vector3::zero();
        for (axis, unit) in [Vector3::unit_x(), Vector3::unit_y(), Vector3::unit_z()]
            .into_iter()
            .enumerate()
        {
            let upper = world_support_point(self, unit, transform);
            let lower = world_support_point(self, -unit, transform);
            match axis {
                0 => {
                    max.x = upper.x;
                    min.x = lower.x;
                }
                1 => {
                    max.y = upper.y;
                    min.y = lower.y;
                }
                _ => {
                    max.z = upper.z;
                    min.z = lower.z;
                }
            }
        }
        Aabb::new(min, max)
    }

    /// Returns a dynamic reference to any for downcasting
    fn as_any(&self) -> &dyn Any;
}

/// Support point with margin of a shape placed at `transform`, for a world direction
#[inline]
pub fn world_support_point<S: CollisionShape + ?Sized>(
    shape: &S,
    direction: Vector3,
    transform: &Transform,
) -> Vector3 {
    let local_direction = transform.inverse_transform_direction(direction);
    transform.transform_point(shape.support_point_with_margin(local_direction))
}

/// Support point without margin of a shape placed at `transform`, for a world direction
#[inline]
pub fn world_core_support_point<S: CollisionShape + ?Sized>(
    shape: &S,
    direction: Vector3,
    transform: &Transform,
) -> Vector3 {
    let local_direction = transform.inverse_transform_direction(direction);
    transform.transform_point(shape.support_point_without_margin(local_direction))
}
