//! Convex collision shapes and the support-point protocol they share

mod shape;
mod sphere;
mod box_shape;
mod capsule;
mod cylinder;
mod cone;
mod convex_hull;

pub use shape::{
    CollisionShape, ShapeKind, DEFAULT_MARGIN, world_support_point, world_core_support_point,
};
pub use sphere::Sphere;
pub use box_shape::BoxShape;
pub use capsule::Capsule;
pub use cylinder::Cylinder;
pub use cone::Cone;
pub use convex_hull::ConvexHull;
