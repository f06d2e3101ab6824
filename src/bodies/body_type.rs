use bitflags::bitflags;

#[cfg(feature = "serialize")]
use serde::{Serialize, Deserialize};

/// Type of rigid body, determining how it behaves in the simulation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub enum RigidBodyType {
    /// Fully simulated: affected by gravity, forces, contacts and joints
    Dynamic,

    /// Infinite mass, moved by the velocity the user gives it
    Kinematic,

    /// Infinite mass, never moves
    Static,
}

impl RigidBodyType {
    #[inline]
    pub fn is_dynamic(self) -> bool {
        self == Self::Dynamic
    }
}

bitflags! {
    /// State flags of a rigid body
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct BodyFlags: u32 {
        /// Body may be put to sleep by the deactivation pass
        const CAN_SLEEP = 0x01;

        /// Body is sleeping and skipped by the broad phase and the solvers
        const SLEEPING = 0x02;

        /// Body receives the world gravity
        const AFFECTED_BY_GRAVITY = 0x04;

        /// Transform changed since the last broad-phase update
        const HAS_MOVED = 0x08;
    }
}

impl Default for BodyFlags {
    fn default() -> Self {
        BodyFlags::CAN_SLEEP | BodyFlags::AFFECTED_BY_GRAVITY | BodyFlags::HAS_MOVED
    }
}
