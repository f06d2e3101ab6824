use crate::collision::{BodyPair, ContactManifold};
use crate::math::Vector3;

/// Per-pair cache living while the broad phase reports the two bodies as overlapping
#[derive(Debug, Clone)]
pub struct OverlappingPair {
    pair: BodyPair,
    manifold: ContactManifold,

    /// Last separating axis found by GJK, used as its next starting direction
    cached_separating_axis: Vector3,
}

impl OverlappingPair {
    pub fn new(pair: BodyPair) -> Self {
        Self {
            pair,
            manifold: ContactManifold::new(),
            cached_separating_axis: Vector3::unit_y(),
        }
    }

    pub fn pair(&self) -> BodyPair {
        self.pair
    }

    pub fn manifold(&self) -> &ContactManifold {
        &self.manifold
    }

    pub fn manifold_mut(&mut self) -> &mut ContactManifold {
        &mut self.manifold
    }

    pub fn cached_separating_axis(&self) -> Vector3 {
        self.cached_separating_axis
    }

    pub fn set_cached_separating_axis(&mut self, axis: Vector3) {
        if !axis.is_zero() && axis.is_finite() {
            self.cached_separating_axis = axis;
        }
    }
}
