pub mod world;
pub mod config;
pub mod storage;
pub mod events;
pub mod timer;
mod island;
pub mod velocities;

pub use self::world::DynamicsWorld;
pub use self::config::DynamicsConfig;
pub use self::storage::{Arena, ArenaHandle, BodyStorage, JointStorage};
pub use self::events::{EventQueue, ContactEvent, ContactEventType, BodyEvent, BodyEventType};
pub use self::timer::Timer;
pub(crate) use self::island::{Island, IslandBuilder};
pub use self::velocities::{ConstrainedVelocities, BodyIndexMap};

use std::fmt;

#[cfg(feature = "serialize")]
use serde::{Serialize, Deserialize};

/// Handle to a rigid body of a dynamics world.
///
/// Handles are ordered by slot index then generation; that order defines the
/// canonical order of body pairs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub struct BodyHandle {
    pub(crate) index: u32,
    pub(crate) generation: u32,
}

/// Handle to a joint of a dynamics world
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub struct JointHandle {
    pub(crate) index: u32,
    pub(crate) generation: u32,
}

impl ArenaHandle for BodyHandle {
    fn from_parts(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    fn index(&self) -> u32 {
        self.index
    }

    fn generation(&self) -> u32 {
        self.generation
    }
}

impl ArenaHandle for JointHandle {
    fn from_parts(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    fn index(&self) -> u32 {
        self.index
    }

    fn generation(&self) -> u32 {
        self.generation
    }
}

impl fmt::Display for BodyHandle {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "body#{}v{}", self.index, self.generation)
    }
}

impl fmt::Display for JointHandle {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "joint#{}v{}", self.index, self.generation)
    }
}
