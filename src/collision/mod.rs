mod body_pair;
mod broad_phase;
mod collision_filter;
mod contact_manifold;
mod contact_solver;
mod narrow_phase;
mod overlapping_pair;
pub mod gjk;
pub mod epa;

pub use self::body_pair::BodyPair;
pub use self::broad_phase::{BroadPhase, BroadPhasePairs, BruteForceBroadPhase, SpatialHashing};
pub use self::collision_filter::{CollisionCategory, CollisionFilter};
pub use self::contact_manifold::{ContactManifold, ContactPoint, ContactPointInfo, MAX_CONTACT_POINTS};
pub use self::contact_solver::{ContactConstraint, ContactSolver};
pub use self::narrow_phase::{NarrowPhase, NarrowPhaseInput, NarrowPhaseOutput};
pub use self::overlapping_pair::OverlappingPair;
pub use self::gjk::{Gjk, GjkResult, Simplex, SupportVertex};
pub use self::epa::{Epa, Penetration};
