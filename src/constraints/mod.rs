mod joint;
mod constraint_solver;
mod ball_socket;
mod hinge;
mod slider;
mod fixed;
mod distance;

pub use self::joint::{ConstraintSolverData, Joint, JointInfo, JointType};
pub use self::constraint_solver::{ConstraintSolver, JointConstraint};
pub use self::ball_socket::{BallSocketJoint, BallSocketJointInfo};
pub use self::hinge::{HingeJoint, HingeJointInfo};
pub use self::slider::{SliderJoint, SliderJointInfo};
pub use self::fixed::{FixedJoint, FixedJointInfo};
pub use self::distance::{DistanceJoint, DistanceJointInfo};
