use crate::math::{Vector3, Transform};

/// Maximum number of contact points kept in a manifold
pub const MAX_CONTACT_POINTS: usize = 4;

/// Raw contact produced by the narrow phase.
///
/// `normal` points from body 1 to body 2 in world space. The local points lie
/// on the surface of each body, in that body's frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContactPointInfo {
    pub normal: Vector3,
    pub penetration_depth: f32,
    pub local_point1: Vector3,
    pub local_point2: Vector3,
}

/// A cached contact point and its accumulated solver impulses
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContactPoint {
    /// Contact normal in world space, from body 1 to body 2
    pub normal: Vector3,

    /// Penetration along the normal; negative when the points have separated
    pub penetration_depth: f32,

    pub local_point1: Vector3,
    pub local_point2: Vector3,
    pub world_point1: Vector3,
    pub world_point2: Vector3,

    /// True once the point survived at least one refresh
    pub is_resting_contact: bool,

    /// Accumulated normal impulse
    pub penetration_impulse: f32,

    /// Accumulated impulses along the two friction directions
    pub friction_impulse1: f32,
    pub friction_impulse2: f32,

    /// Friction directions used in the last step
    pub friction_vectors: [Vector3; 2],
}

impl ContactPoint {
    /// Creates a point from narrow-phase output
    pub fn new(info: &ContactPointInfo, transform1: &Transform, transform2: &Transform) -> Self {
        Self {
            normal: info.normal,
            penetration_depth: info.penetration_depth,
            local_point1: info.local_point1,
            local_point2: info.local_point2,
            world_point1: transform1.transform_point(info.local_point1),
            world_point2: transform2.transform_point(info.local_point2),
            is_resting_contact: false,
            penetration_impulse: 0.0,
            friction_impulse1: 0.0,
            friction_impulse2: 0.0,
            friction_vectors: [Vector3::zero(); 2],
        }
    }

    /// Replaces the geometry of the point, keeping its accumulated impulses
    fn replace_geometry(&mut self, info: &ContactPointInfo, transform1: &Transform, transform2: &Transform) {
        let impulses = (
            self.penetration_impulse,
            self.friction_impulse1,
            self.friction_impulse2,
            self.friction_vectors,
        );
        *self = Self::new(info, transform1, transform2);
        self.is_resting_contact = true;
        self.penetration_impulse = impulses.0;
        self.friction_impulse1 = impulses.1;
        self.friction_impulse2 = impulses.2;
        self.friction_vectors = impulses.3;
    }
}

/// Persistent set of up to four contact points between two bodies.
///
/// Points are kept across steps so that the solver can warm start from their
/// impulses. They are refreshed from the body transforms every step and
/// dropped once they drift too far apart.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContactManifold {
    points: Vec<ContactPoint>,

    /// Accumulated friction impulses when friction is solved at the manifold center
    pub friction_impulse1: f32,
    pub friction_impulse2: f32,
    pub friction_twist_impulse: f32,

    /// Friction directions used at the manifold center in the last step
    pub friction_vector1: Vector3,
    pub friction_vector2: Vector3,
}

impl ContactManifold {
    pub fn new() -> Self {
        Self {
            points: Vec::with_capacity(MAX_CONTACT_POINTS),
            ..Default::default()
        }
    }

    pub fn points(&self) -> &[ContactPoint] {
        &self.points
    }

    pub fn points_mut(&mut self) -> &mut [ContactPoint] {
        &mut self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Removes every point and resets the manifold impulses
    pub fn clear(&mut self) {
        self.points.clear();
        self.reset_center_friction();
    }

    fn reset_center_friction(&mut self) {
        self.friction_impulse1 = 0.0;
        self.friction_impulse2 = 0.0;
        self.friction_twist_impulse = 0.0;
    }

    /// Recomputes world points and depths from the body transforms and evicts
    /// points that no longer describe the contact.
    ///
    /// A point goes when its bodies separated along the normal by more than
    /// `threshold`, or when its two world points slid apart tangentially by
    /// more than `threshold`.
    pub fn update(&mut self, transform1: &Transform, transform2: &Transform, threshold: f32) {
        if self.points.is_empty() {
            return;
        }

        for point in self.points.iter_mut() {
            point.world_point1 = transform1.transform_point(point.local_point1);
            point.world_point2 = transform2.transform_point(point.local_point2);
            point.penetration_depth = (point.world_point1 - point.world_point2).dot(&point.normal);
            point.is_resting_contact = true;
        }

        let threshold_squared = threshold * threshold;
        self.points.retain(|point| {
            let distance_normal = -point.penetration_depth;
            if distance_normal > threshold {
                return false;
            }
            let projection = point.world_point1 + point.normal * distance_normal;
            let tangential = point.world_point2 - projection;
            tangential.length_squared() <= threshold_squared
        });

        if self.points.is_empty() {
            self.reset_center_friction();
        }
    }

    /// Adds a new point produced by the narrow phase.
    ///
    /// A point close to an existing one (distance between the local points on
    /// body 1 within `threshold`) replaces that point's geometry and inherits
    /// its impulses. When the manifold is full, one point is evicted by
    /// [`ContactManifold::index_to_remove`].
    pub fn add_contact_point(
        &mut self,
        info: &ContactPointInfo,
        transform1: &Transform,
        transform2: &Transform,
        threshold: f32,
    ) {
        let threshold_squared = threshold * threshold;
        if let Some(existing) = self
            .points
            .iter_mut()
            .find(|p| (p.local_point1 - info.local_point1).length_squared() <= threshold_squared)
        {
            existing.replace_geometry(info, transform1, transform2);
            return;
        }

        if self.points.len() == MAX_CONTACT_POINTS {
            let deepest = self.index_of_deepest_penetration(info.penetration_depth);
            let index = self.index_to_remove(deepest, info.local_point1);
            self.points.remove(index);
        }

        self.points.push(ContactPoint::new(info, transform1, transform2));
    }

    /// Index of the deepest cached point, or None if the new depth beats all of them
    fn index_of_deepest_penetration(&self, new_depth: f32) -> Option<usize> {
        let mut max_depth = new_depth;
        let mut index = None;
        for (i, point) in self.points.iter().enumerate() {
            if point.penetration_depth > max_depth {
                max_depth = point.penetration_depth;
                index = Some(i);
            }
        }
        index
    }

    /// Chooses which of the four cached points to drop for `new_point`.
    ///
    /// The deepest point is never dropped. Among the others, the one whose
    /// removal leaves the largest area spanned by the remaining three points and
    /// the new point is dropped. The area of each candidate quadrilateral is
    /// estimated by the squared length of the cross product of its diagonals.
    pub fn index_to_remove(&self, deepest: Option<usize>, new_point: Vector3) -> usize {
        debug_assert_eq!(self.points.len(), MAX_CONTACT_POINTS);
        let p: Vec<Vector3> = self.points.iter().map(|point| point.local_point1).collect();

        let area = |skip: usize| -> f32 {
            if deepest == Some(skip) {
                return 0.0;
            }
            let (diagonal1, diagonal2) = match skip {
                0 => (new_point - p[1], p[3] - p[2]),
                1 => (new_point - p[0], p[3] - p[2]),
                2 => (new_point - p[0], p[3] - p[1]),
                _ => (new_point - p[0], p[2] - p[1]),
            };
            diagonal1.cross(&diagonal2).length_squared()
        };

        let areas = [area(0), area(1), area(2), area(3)];
        let mut best = 0;
        for i in 1..MAX_CONTACT_POINTS {
            if areas[i] > areas[best] {
                best = i;
            }
        }
        if deepest == Some(best) {
            // All candidate areas are zero; drop any other point
            best = (best + 1) % MAX_CONTACT_POINTS;
        }
        best
    }

    /// Average of the world points on body 1 and on body 2
    pub fn centers(&self) -> (Vector3, Vector3) {
        let count = self.points.len().max(1) as f32;
        let (sum1, sum2) = self.points.iter().fold(
            (Vector3::zero(), Vector3::zero()),
            |(a, b), point| (a + point.world_point1, b + point.world_point2),
        );
        (sum1 / count, sum2 / count)
    }

    /// Average of the point normals
    pub fn average_normal(&self) -> Vector3 {
        self.points
            .iter()
            .fold(Vector3::zero(), |sum, point| sum + point.normal)
            .normalize()
    }
}
