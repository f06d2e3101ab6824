use crate::shapes::{CollisionShape, ShapeKind, DEFAULT_MARGIN};
use crate::math::{Vector3, Matrix3, Aabb};
use std::any::Any;

/// An oriented box centered on the body origin.
///
/// The core is the box shrunk by the margin on every side, so the
/// margin-inflated shape matches the requested half extents.
#[derive(Debug, Clone, PartialEq)]
pub struct BoxShape {
    /// Half extents of the core box
    core_half_extents: Vector3,
    margin: f32,
}

impl BoxShape {
    /// Creates a box with the given half extents and the default margin
    ///
    /// # Panics
    ///
    /// Panics if any half extent is not larger than the default margin.
    pub fn new(half_extents: Vector3) -> Self {
        Self::with_margin(half_extents, DEFAULT_MARGIN)
    }

    /// Creates a box with the given half extents and margin
    ///
    /// # Panics
    ///
    /// Panics if `margin` is negative or any half extent is not larger than it.
    pub fn with_margin(half_extents: Vector3, margin: f32) -> Self {
        assert!(margin >= 0.0, "box margin must be non-negative, got {}", margin);
        assert!(
            half_extents.x > margin && half_extents.y > margin && half_extents.z > margin,
            "box half extents {} must exceed the margin {}",
            half_extents,
            margin
        );
        Self {
            core_half_extents: half_extents - Vector3::splat(margin),
            margin,
        }
    }

    /// Returns the half extents of the full box (core plus margin)
    pub fn get_half_extents(&self) -> Vector3 {
        self.core_half_extents + Vector3::splat(self.margin)
    }
}

impl CollisionShape for BoxShape {
    fn kind(&self) -> ShapeKind {
        ShapeKind::Box
    }

    fn margin(&self) -> f32 {
        self.margin
    }

    fn support_point_without_margin(&self, direction: Vector3) -> Vector3 {
        let e = self.core_half_extents;
        Vector3::new(
            if direction.x < 0.0 { -e.x } else { e.x },
            if direction.y < 0.0 { -e.y } else { e.y },
            if direction.z < 0.0 { -e.z } else { e.z },
        )
    }

    fn local_inertia_tensor(&self, mass: f32) -> Matrix3 {
        let e = self.get_half_extents();
        let (x2, y2, z2) = (e.x * e.x, e.y * e.y, e.z * e.z);
        let factor = mass / 3.0;
        Matrix3::from_diagonal(Vector3::new(
            factor * (y2 + z2),
            factor * (x2 + z2),
            factor * (x2 + y2),
        ))
    }

    fn local_bounds(&self) -> Aabb {
        Aabb::from_center_half_extents(Vector3::zero(), self.get_half_extents())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
