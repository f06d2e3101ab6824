use crate::shapes::{CollisionShape, ShapeKind, DEFAULT_MARGIN};
use crate::math::{Vector3, Matrix3, Aabb, MACHINE_EPSILON};
use std::any::Any;

/// A cone aligned with the local Y axis, apex at `+half_height` and base disc at
/// `-half_height`. The origin is halfway between apex and base.
#[derive(Debug, Clone, PartialEq)]
pub struct Cone {
    radius: f32,
    half_height: f32,
    /// Sine of the half angle at the apex
    sin_theta: f32,
    margin: f32,
}

impl Cone {
    /// Creates a cone with the default margin
    ///
    /// # Panics
    ///
    /// Panics if `radius` or `height` is not strictly positive.
    pub fn new(radius: f32, height: f32) -> Self {
        Self::with_margin(radius, height, DEFAULT_MARGIN)
    }

    /// Creates a cone with an explicit margin
    ///
    /// # Panics
    ///
    /// Panics if `radius` or `height` is not strictly positive or `margin` is negative.
    pub fn with_margin(radius: f32, height: f32, margin: f32) -> Self {
        assert!(radius > 0.0, "cone radius must be positive, got {}", radius);
        assert!(height > 0.0, "cone height must be positive, got {}", height);
        assert!(margin >= 0.0, "cone margin must be non-negative, got {}", margin);
        Self {
            radius,
            half_height: height * 0.5,
            sin_theta: radius / (radius * radius + height * height).sqrt(),
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

impl CollisionShape for Cone {
    fn kind(&self) -> ShapeKind {
        ShapeKind::Cone
    }

    fn margin(&self) -> f32 {
        self.margin
    }

    fn support_point_without_margin(&self, direction: Vector3) -> Vector3 {
        // Inside the apex cone of directions the apex wins
        if direction.y > self.sin_theta * direction.length() {
            return Vector3::new(0.0, self.half_height, 0.0);
        }

        let radial_length = (direction.x * direction.x + direction.z * direction.z).sqrt();
        if radial_length > MACHINE_EPSILON {
            let scale = self.radius / radial_length;
            Vector3::new(direction.x * scale, -self.half_height, direction.z * scale)
        } else {
            Vector3::new(0.0, -self.half_height, 0.0)
        }
    }

    fn local_inertia_tensor(&self, mass: f32) -> Matrix3 {
        let r2 = self.radius * self.radius;
        let height = self.get_height();
        let diagonal_xz = 0.15 * mass * (r2 + height * height);
        Matrix3::from_diagonal(Vector3::new(diagonal_xz, 0.3 * mass * r2, diagonal_xz))
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
