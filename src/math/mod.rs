mod vector;
mod matrix;
mod transform;
mod rotation;
mod aabb;

pub use vector::Vector3;
pub use matrix::Matrix3;
pub use transform::Transform;
pub use rotation::Quaternion;
pub use aabb::Aabb;

/// Machine epsilon of the scalar type used by the engine
pub const MACHINE_EPSILON: f32 = f32::EPSILON;

/// Constant for a very small number, used for comparisons
pub const EPSILON: f32 = 1.0e-6;
