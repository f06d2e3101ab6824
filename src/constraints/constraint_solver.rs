use crate::constraints::{ConstraintSolverData, Joint};
use crate::core::{ConstrainedVelocities, DynamicsConfig, JointHandle, JointStorage};
use crate::math::Transform;

/// Joint handed to the solver for one step
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JointConstraint {
    pub joint: JointHandle,

    /// Velocity slots of the two bodies
    pub body1: usize,
    pub body2: usize,

    pub transform1: Transform,
    pub transform2: Transform,
}

/// Drives the joints of an island through the same Gauss-Seidel passes as
/// the contacts
#[derive(Debug, Clone, Copy)]
pub struct ConstraintSolver {
    time_step: f32,
    is_warm_starting_active: bool,
    is_error_correction_active: bool,
    baumgarte_factor: f32,
}

impl ConstraintSolver {
    pub fn new(config: &DynamicsConfig, time_step: f32) -> Self {
        Self {
            time_step,
            is_warm_starting_active: config.is_warm_starting_active,
            is_error_correction_active: config.is_error_correction_active,
            baumgarte_factor: config.baumgarte_factor,
        }
    }

    pub fn init(
        &self,
        joints: &mut JointStorage<Box<dyn Joint>>,
        constraints: &[JointConstraint],
        velocities: &ConstrainedVelocities,
    ) {
        for constraint in constraints {
            if let Some(joint) = joints.get_mut(constraint.joint) {
                let data = ConstraintSolverData {
                    time_step: self.time_step,
                    is_warm_starting_active: self.is_warm_starting_active,
                    is_error_correction_active: self.is_error_correction_active,
                    baumgarte_factor: self.baumgarte_factor,
                    index1: constraint.body1,
                    index2: constraint.body2,
                    transform1: constraint.transform1,
                    transform2: constraint.transform2,
                    velocities,
                };
                joint.init_before_solve(&data);
            }
        }
    }

    pub fn warm_start(
        &self,
        joints: &mut JointStorage<Box<dyn Joint>>,
        constraints: &[JointConstraint],
        velocities: &mut ConstrainedVelocities,
    ) {
        if !self.is_warm_starting_active {
            return;
        }
        for constraint in constraints {
            if let Some(joint) = joints.get_mut(constraint.joint) {
                joint.warm_start(velocities);
            }
        }
    }

    /// One pass over the joints
    pub fn solve(
        &self,
        joints: &mut JointStorage<Box<dyn Joint>>,
        constraints: &[JointConstraint],
        velocities: &mut ConstrainedVelocities,
    ) {
        for constraint in constraints {
            if let Some(joint) = joints.get_mut(constraint.joint) {
                joint.solve_velocity_constraint(velocities);
            }
        }
    }
}
