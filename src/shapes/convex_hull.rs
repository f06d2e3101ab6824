use crate::shapes::{CollisionShape, ShapeKind, DEFAULT_MARGIN};
use crate::math::{Vector3, Matrix3, Aabb};
use std::any::Any;

/// Convex hull of a point cloud, given in the body's local frame.
///
/// The points do not need to be in convex position: the support mapping of a
/// point cloud is the support mapping of its hull. The margin is added around
/// the points.
#[derive(Debug, Clone, PartialEq)]
pub struct ConvexHull {
    vertices: Vec<Vector3>,
    /// Bounds of the core points
    core_bounds: Aabb,
    margin: f32,
}

impl ConvexHull {
    /// Creates a convex hull with the default margin
    ///
    /// # Panics
    ///
    /// Panics if `points` is empty.
    pub fn new(points: &[Vector3]) -> Self {
        Self::with_margin(points, DEFAULT_MARGIN)
    }

    /// Creates a convex hull with an explicit margin
    ///
    /// # Panics
    ///
    /// Panics if `points` is empty or `margin` is negative.
    pub fn with_margin(points: &[Vector3], margin: f32) -> Self {
        assert!(margin >= 0.0, "convex hull margin must be non-negative, got {}", margin);
        let core_bounds = match Aabb::from_points(points) {
            Some(bounds) => bounds,
            None => panic!("convex hull needs at least one point"),
        };
        Self {
            vertices: points.to_vec(),
            core_bounds,
            margin,
        }
    }

    /// Returns the vertices of the hull
    pub fn get_vertices(&self) -> &[Vector3] {
        &self.vertices
    }
}

impl CollisionShape for ConvexHull {
    fn kind(&self) -> ShapeKind {
        ShapeKind::ConvexHull
    }

    fn margin(&self) -> f32 {
        self.margin
    }

    fn support_point_without_margin(&self, direction: Vector3) -> Vector3 {
        // Linear scan; the first vertex wins ties
        let mut best = self.vertices[0];
        let mut best_dot = best.dot(&direction);
        for vertex in &self.vertices[1..] {
            let dot = vertex.dot(&direction);
            if dot > best_dot {
                best_dot = dot;
                best = *vertex;
            }
        }
        best
    }

    /// Approximated by the inertia tensor of the local bounding box
    fn local_inertia_tensor(&self, mass: f32) -> Matrix3 {
        let extents = self.local_bounds().half_extents() * 2.0;
        let (x2, y2, z2) = (
            extents.x * extents.x,
            extents.y * extents.y,
            extents.z * extents.z,
        );
        let factor = mass / 12.0;
        Matrix3::from_diagonal(Vector3::new(
            factor * (y2 + z2),
            factor * (x2 + z2),
            factor * (x2 + y2),
        ))
    }

    fn local_bounds(&self) -> Aabb {
        self.core_bounds.inflate(self.margin)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
