use bitflags::bitflags;

bitflags! {
    /// Collision category bits of a body.
    ///
    /// A body belongs to one or more categories and carries a mask of the
    /// categories it collides with. Any bit pattern is allowed; the named
    /// constants are conveniences.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct CollisionCategory: u32 {
        const DEFAULT = 0x0000_0001;
        const STATIC = 0x0000_0002;
        const DYNAMIC = 0x0000_0004;
        const KINEMATIC = 0x0000_0008;
        const DEBRIS = 0x0000_0010;
        const ALL = 0xFFFF_FFFF;
    }
}

impl Default for CollisionCategory {
    fn default() -> Self {
        CollisionCategory::DEFAULT
    }
}

/// Category membership and mask of one body
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollisionFilter {
    pub category: CollisionCategory,
    pub mask: CollisionCategory,
}

impl CollisionFilter {
    pub fn new(category: CollisionCategory, mask: CollisionCategory) -> Self {
        Self { category, mask }
    }

    /// Two bodies may collide only if each one's mask accepts the other's category
    #[inline]
    pub fn can_collide(&self, other: &CollisionFilter) -> bool {
        self.mask.intersects(other.category) && other.mask.intersects(self.category)
    }
}

impl Default for CollisionFilter {
    fn default() -> Self {
        Self::new(CollisionCategory::DEFAULT, CollisionCategory::ALL)
    }
}
