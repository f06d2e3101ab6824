use crate::shapes::{CollisionShape, ShapeKind, DEFAULT_MARGIN};
use crate::math::{Vector3, Matrix3, Aabb, MACHINE_EPSILON};
use std::any::Any;

/// A solid cylinder aligned with the local Y axis.
///
/// The core is the cylinder itself; the margin is added around it.
#[derive(Debug, Clone, PartialEq)]
pub struct Cylinder {
    radius: f32,
    half_height: f32,
    margin: f32,
}

impl Cylinder {
    /// Creates a cylinder with the default margin
    ///
    /// # Panics
    ///
    /// Panics if `radius` or `height` is not strictly positive.
    pub fn new(radius: f32, height: f32) -> Self {
        Self::with_margin(radius, height, DEFAULT_MARGIN)
    }

    /// Creates a cylinder with an explicit margin
    ///
    /// # Panics
    ///
    /// Panics if `radius` or `height` is not strictly positive or `margin` is negative.
    pub fn with_margin(radius: f32, height: f32, margin: f32) -> Self {
        assert!(radius > 0.0, "cylinder radius must be positive, got {}", radius);
        assert!(height > 0.0, "cylinder height must be positive, got {}", height);
        assert!(margin >= 0.0, "cylinder margin must be non-negative, got {}", margin);
        Self {
            radius,
            half_height: height * 0.5,
            margin,
        }
    }

    pub fn get_radius(&self) -> f32 {
        self.radius
    }

    pub fn get_height(&self) -> f32 {
        2.0 * self.half_height
    }
}

impl CollisionShape for Cylinder {
    fn kind(&self) -> ShapeKind {
        ShapeKind::Cylinder
    }

    fn margin(&self) -> f32 {
        self.margin
    }

    fn support_point_without_margin(&self, direction: Vector3) -> Vector3 {
        let y = if direction.y < 0.0 { -self.half_height } else { self.half_height };
        let radial_length = (direction.x * direction.x + direction.z * direction.z).sqrt();

        if radial_length > MACHINE_EPSILON {
            let scale = self.radius / radial_length;
            Vector3::new(direction.x * scale, y, direction.z * scale)
        } else {
            Vector3::new(0.0, y, 0.0)
        }
    }

    fn local_inertia_tensor(&self, mass: f32) -> Matrix3 {
        let height = self.get_height();
        let r2 = self.radius * self.radius;
        let diagonal_xz = mass / 12.0 * (3.0 * r2 + height * height);
        Matrix3::from_diagonal(Vector3::new(diagonal_xz, 0.5 * mass * r2, diagonal_xz))
    }

    fn local_bounds(&self) -> Aabb {
        Aabb::from_center_half_extents(
            Vector3::zero(),
            Vector3::new(self.radius, self.half_height, self.radius),
        )
        .inflate(self.margin)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
