use nalgebra as na;
use approx::{AbsDiffEq, RelativeEq};
use crate::math::{Vector3, Matrix3, EPSILON};
use std::fmt;
use std::ops::{Add, Mul, MulAssign};

#[cfg(feature = "serialize")]
use serde::{Serialize, Deserialize};

/// Unit quaternion representing a body orientation
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub struct Quaternion {
    /// Real component
    pub w: f32,
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Quaternion {
    /// Creates a new quaternion
    #[inline]
    pub const fn new(w: f32, x: f32, y: f32, z: f32) -> Self {
        Self { w, x, y, z }
    }

    /// Creates an identity quaternion (no rotation)
    #[inline]
    pub const fn identity() -> Self {
        Self::new(1.0, 0.0, 0.0, 0.0)
    }

    /// Builds a quaternion from its imaginary part and its real part
    #[inline]
    pub fn from_parts(vector: Vector3, w: f32) -> Self {
        Self::new(w, vector.x, vector.y, vector.z)
    }

    /// Creates a quaternion rotating by `angle` radians around `axis`
    pub fn from_axis_angle(axis: Vector3, angle: f32) -> Self {
        let half_angle = angle * 0.5;
        Self::from_parts(axis.normalize() * half_angle.sin(), half_angle.cos())
    }

    /// Creates a quaternion from an orthonormal rotation matrix
    pub fn from_rotation_matrix(m: &Matrix3) -> Self {
        let rotation = na::Rotation3::from_matrix_unchecked(m.to_nalgebra());
        let unit = na::UnitQuaternion::from_rotation_matrix(&rotation);
        Self::from_nalgebra(unit.quaternion())
    }

    /// Converts the quaternion to a rotation matrix
    pub fn to_rotation_matrix(&self) -> Matrix3 {
        let (w, x, y, z) = (self.w, self.x, self.y, self.z);
        let (xx, yy, zz) = (x * x, y * y, z * z);
        let (xy, xz, yz) = (x * y, x * z, y * z);
        let (wx, wy, wz) = (w * x, w * y, w * z);

        Matrix3::new([
            [1.0 - 2.0 * (yy + zz), 2.0 * (xy - wz), 2.0 * (xz + wy)],
            [2.0 * (xy + wz), 1.0 - 2.0 * (xx + zz), 2.0 * (yz - wx)],
            [2.0 * (xz - wy), 2.0 * (yz + wx), 1.0 - 2.0 * (xx + yy)],
        ])
    }

    /// Imaginary part of the quaternion
    #[inline]
    pub fn vector_part(&self) -> Vector3 {
        Vector3::new(self.x, self.y, self.z)
    }

    /// Returns the conjugate of this quaternion
    #[inline]
    pub fn conjugate(&self) -> Self {
        Self::new(self.w, -self.x, -self.y, -self.z)
    }

    #[inline]
    pub fn length_squared(&self) -> f32 {
        self.dot(self)
    }

    #[inline]
    pub fn length(&self) -> f32 {
        self.length_squared().sqrt()
    }

    /// Returns the normalized quaternion, or identity for a degenerate one
    pub fn normalize(&self) -> Self {
        let len = self.length();
        if len > EPSILON {
            *self * (1.0 / len)
        } else {
            Self::identity()
        }
    }

    /// Returns the inverse of this quaternion
    pub fn inverse(&self) -> Self {
        let len_sq = self.length_squared();
        if len_sq > EPSILON {
            self.conjugate() * (1.0 / len_sq)
        } else {
            Self::identity()
        }
    }

    #[inline]
    pub fn dot(&self, other: &Self) -> f32 {
        self.w * other.w + self.x * other.x + self.y * other.y + self.z * other.z
    }

    /// Rotates a vector by this (unit) quaternion
    #[inline]
    pub fn rotate(&self, v: Vector3) -> Vector3 {
        // v' = v + 2w(q x v) + 2 q x (q x v)
        let q = self.vector_part();
        let t = q.cross(&v) * 2.0;
        v + t * self.w + q.cross(&t)
    }

    /// Rotates a vector by the inverse of this (unit) quaternion
    #[inline]
    pub fn inverse_rotate(&self, v: Vector3) -> Vector3 {
        self.conjugate().rotate(v)
    }

    /// Advances the orientation by an angular velocity over `dt`.
    ///
    /// Uses the first-order update `q' = q + 0.5 * (0, w) * q * dt` followed by
    /// renormalization.
    pub fn integrate(&self, angular_velocity: Vector3, dt: f32) -> Self {
        let spin = Self::from_parts(angular_velocity, 0.0) * *self;
        (*self + spin * (0.5 * dt)).normalize()
    }

    /// Spherical linear interpolation between two orientations
    pub fn slerp(&self, other: &Self, t: f32) -> Self {
        let mut cos_theta = self.dot(other);

        // Take the shortest arc
        let mut end = *other;
        if cos_theta < 0.0 {
            end = *other * -1.0;
            cos_theta = -cos_theta;
        }

        if cos_theta > 0.9995 {
            return (*self * (1.0 - t) + end * t).normalize();
        }

        let theta = cos_theta.acos();
        let sin_theta = theta.sin();
        let a = ((1.0 - t) * theta).sin() / sin_theta;
        let b = (t * theta).sin() / sin_theta;
        *self * a + end * b
    }

    /// Returns true if every component is finite
    pub fn is_finite(&self) -> bool {
        self.w.is_finite() && self.vector_part().is_finite()
    }

    /// Convert to nalgebra Quaternion
    #[inline]
    pub fn to_nalgebra(&self) -> na::Quaternion<f32> {
        na::Quaternion::new(self.w, self.x, self.y, self.z)
    }

    /// Convert from nalgebra Quaternion
    #[inline]
    pub fn from_nalgebra(q: &na::Quaternion<f32>) -> Self {
        Self::new(q.w, q.i, q.j, q.k)
    }
}

impl Default for Quaternion {
    fn default() -> Self {
        Self::identity()
    }
}

impl fmt::Display for Quaternion {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "({}, {}, {}, {})", self.w, self.x, self.y, self.z)
    }
}

impl Mul for Quaternion {
    type Output = Self;

    #[inline]
    fn mul(self, rhs: Self) -> Self {
        let a = self.vector_part();
        let b = rhs.vector_part();
        Self::from_parts(
            b * self.w + a * rhs.w + a.cross(&b),
            self.w * rhs.w - a.dot(&b),
        )
    }
}

impl Mul<f32> for Quaternion {
    type Output = Self;

    #[inline]
    fn mul(self, rhs: f32) -> Self {
        Self::new(self.w * rhs, self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

impl Add for Quaternion {
    type Output = Self;

    #[inline]
    fn add(self, rhs: Self) -> Self {
        Self::new(self.w + rhs.w, self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl MulAssign for Quaternion {
    #[inline]
    fn mul_assign(&mut self, rhs: Self) {
        *self = *self * rhs;
    }
}

impl AbsDiffEq for Quaternion {
    type Epsilon = f32;

    fn default_epsilon() -> f32 {
        f32::default_epsilon()
    }

    fn abs_diff_eq(&self, other: &Self, epsilon: f32) -> bool {
        self.w.abs_diff_eq(&other.w, epsilon)
            && self.vector_part().abs_diff_eq(&other.vector_part(), epsilon)
    }
}

impl RelativeEq for Quaternion {
    fn default_max_relative() -> f32 {
        f32::default_max_relative()
    }

    fn relative_eq(&self, other: &Self, epsilon: f32, max_relative: f32) -> bool {
        self.w.relative_eq(&other.w, epsilon, max_relative)
            && self
                .vector_part()
                .relative_eq(&other.vector_part(), epsilon, max_relative)
    }
}
