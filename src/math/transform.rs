use crate::math::{Vector3, Quaternion, Matrix3};
use std::ops::Mul;

#[cfg(feature = "serialize")]
use serde::{Serialize, Deserialize};

/// Rigid transformation (position and orientation) of a body in world space
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub struct Transform {
    /// Position of the body origin (center of mass)
    pub position: Vector3,

    /// Orientation as a unit quaternion
    pub orientation: Quaternion,
}

impl Transform {
    /// Creates a new transform from a position and an orientation
    #[inline]
    pub fn new(position: Vector3, orientation: Quaternion) -> Self {
        Self { position, orientation }
    }

    /// Creates the identity transform
    #[inline]
    pub fn identity() -> Self {
        Self::new(Vector3::zero(), Quaternion::identity())
    }

    /// Creates a transform with the given position and no rotation
    #[inline]
    pub fn from_position(position: Vector3) -> Self {
        Self::new(position, Quaternion::identity())
    }

    /// Rotation part as a matrix
    #[inline]
    pub fn rotation_matrix(&self) -> Matrix3 {
        self.orientation.to_rotation_matrix()
    }

    /// Maps a point from local space to world space
    #[inline]
    pub fn transform_point(&self, point: Vector3) -> Vector3 {
        self.orientation.rotate(point) + self.position
    }

    /// Maps a direction from local space to world space
    #[inline]
    pub fn transform_direction(&self, direction: Vector3) -> Vector3 {
        self.orientation.rotate(direction)
    }

    /// Maps a point from world space to local space
    #[inline]
    pub fn inverse_transform_point(&self, point: Vector3) -> Vector3 {
        self.orientation.inverse_rotate(point - self.position)
    }

    /// Maps a direction from world space to local space
    #[inline]
    pub fn inverse_transform_direction(&self, direction: Vector3) -> Vector3 {
        self.orientation.inverse_rotate(direction)
    }

    /// Returns the inverse transform
    pub fn inverse(&self) -> Self {
        let inverse_orientation = self.orientation.conjugate();
        Self::new(inverse_orientation.rotate(-self.position), inverse_orientation)
    }

    /// Interpolates between two transforms (lerp position, slerp orientation)
    pub fn interpolate(previous: &Self, current: &Self, factor: f32) -> Self {
        Self::new(
            previous.position.lerp(&current.position, factor),
            previous.orientation.slerp(&current.orientation, factor),
        )
    }

    /// Returns true if both parts are finite
    pub fn is_finite(&self) -> bool {
        self.position.is_finite() && self.orientation.is_finite()
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}

impl Mul<Vector3> for Transform {
    type Output = Vector3;

    #[inline]
    fn mul(self, point: Vector3) -> Vector3 {
        self.transform_point(point)
    }
}

impl Mul for Transform {
    type Output = Self;

    /// Composes two transforms; `(a * b) * p == a * (b * p)`
    fn mul(self, rhs: Self) -> Self {
        Self::new(
            self.transform_point(rhs.position),
            (self.orientation * rhs.orientation).normalize(),
        )
    }
}
