use crate::core::BodyHandle;
use std::fmt;

#[cfg(feature = "serialize")]
use serde::{Serialize, Deserialize};

/// Unordered pair of bodies stored in canonical order (`body1 < body2`).
///
/// Used as the key of every per-pair cache, so iteration over pairs follows
/// handle order and does not depend on insertion order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub struct BodyPair {
    body1: BodyHandle,
    body2: BodyHandle,
}

impl BodyPair {
    /// Creates the canonical pair of two handles
    pub fn new(a: BodyHandle, b: BodyHandle) -> Self {
        if a <= b {
            Self { body1: a, body2: b }
        } else {
            Self { body1: b, body2: a }
        }
    }

    /// Body with the smaller handle
    #[inline]
    pub fn body1(&self) -> BodyHandle {
        self.body1
    }

    /// Body with the larger handle
    #[inline]
    pub fn body2(&self) -> BodyHandle {
        self.body2
    }

    pub fn contains(&self, body: BodyHandle) -> bool {
        self.body1 == body || self.body2 == body
    }

    /// Returns the other body of the pair
    pub fn other(&self, body: BodyHandle) -> Option<BodyHandle> {
        if self.body1 == body {
            Some(self.body2)
        } else if self.body2 == body {
            Some(self.body1)
        } else {
            None
        }
    }
}

impl fmt::Display for BodyPair {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "({}, {})", self.body1, self.body2)
    }
}
