use crate::shapes::{CollisionShape, ShapeKind};
use crate::math::{Vector3, Matrix3, Aabb, MACHINE_EPSILON};
use std::any::Any;

/// A capsule aligned with the local Y axis.
///
/// It is the convex hull of two spheres of radius `radius` centered at
/// `(0, ±half_height, 0)`. The core is the segment between the two centers and
/// the margin is the radius.
#[derive(Debug, Clone, PartialEq)]
pub struct Capsule {
    radius: f32,
    half_height: f32,
}

impl Capsule {
    /// Creates a capsule from its radius and the length of its cylindrical part
    ///
    /// # Panics
    ///
    /// Panics if `radius` or `height` is not strictly positive.
    pub fn new(radius: f32, height: f32) -> Self {
        assert!(radius > 0.0, "capsule radius must be positive, got {}", radius);
        assert!(height > 0.0, "capsule height must be positive, got {}", height);
        Self {
            radius,
            half_height: height * 0.5,
        }
    }

    pub fn get_radius(&self) -> f32 {
        self.radius
    }

    /// Half of the distance between the two sphere centers
    pub fn get_half_height(&self) -> f32 {
        self.half_height
    }
}

impl CollisionShape for Capsule {
    fn kind(&self) -> ShapeKind {
        ShapeKind::Capsule
    }

    fn margin(&self) -> f32 {
        self.radius
    }

    /// Compares the support points of both end spheres and keeps the one that
    /// goes further along `direction`. Ties go to the bottom sphere.
    fn support_point_with_margin(&self, direction: Vector3) -> Vector3 {
        if direction.length_squared() < MACHINE_EPSILON * MACHINE_EPSILON {
            return Vector3::new(0.0, self.radius, 0.0);
        }

        let offset = direction.normalize() * self.radius;
        let top = Vector3::new(0.0, self.half_height, 0.0) + offset;
        let bottom = Vector3::new(0.0, -self.half_height, 0.0) + offset;

        if top.dot(&direction) > bottom.dot(&direction) {
            top
        } else {
            bottom
        }
    }

    fn support_point_without_margin(&self, direction: Vector3) -> Vector3 {
        if direction.y > 0.0 {
            Vector3::new(0.0, self.half_height, 0.0)
        } else {
            Vector3::new(0.0, -self.half_height, 0.0)
        }
    }

    /// Cylinder plus two hemispheres, each part weighted by its share of the
    /// capsule length.
    fn local_inertia_tensor(&self, mass: f32) -> Matrix3 {
        let r = self.radius;
        let height = 2.0 * self.half_height;
        let radius_square = r * r;
        let height_square = height * height;
        let radius_square_double = 2.0 * radius_square;

        let denominator = 4.0 * r + 3.0 * height;
        let factor1 = 2.0 * r / denominator;
        let factor2 = 3.0 * height / denominator;

        let sum1 = 0.4 * radius_square_double;
        let sum2 = 0.75 * height * r + 0.5 * height_square;
        let sum3 = 0.25 * radius_square + height_square / 12.0;

        let ixx_and_izz = factor1 * mass * (sum1 + sum2) + factor2 * mass * sum3;
        let iyy = factor1 * mass * sum1 + factor2 * mass * 0.25 * radius_square_double;

        Matrix3::from_diagonal(Vector3::new(ixx_and_izz, iyy, ixx_and_izz))
    }

    fn local_bounds(&self) -> Aabb {
        Aabb::from_center_half_extents(
            Vector3::zero(),
            Vector3::new(self.radius, self.half_height + self.radius, self.radius),
        )
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
