use std::any::Any;

use crate::constraints::joint::{inverse_or_zero, point_mass_matrix};
use crate::constraints::{ConstraintSolverData, Joint, JointType};
use crate::core::{BodyHandle, ConstrainedVelocities};
use crate::math::{Matrix3, Transform, Vector3};

#[cfg(feature = "serialize")]
use serde::{Serialize, Deserialize};

/// Parameters of a ball-and-socket joint
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub struct BallSocketJointInfo {
    pub body1: BodyHandle,
    pub body2: BodyHandle,

    /// Pivot shared by the two bodies, world space at creation
    pub anchor_point_world: Vector3,

    pub is_collision_enabled: bool,
}

impl BallSocketJointInfo {
    pub fn new(body1: BodyHandle, body2: BodyHandle, anchor_point_world: Vector3) -> Self {
        Self {
            body1,
            body2,
            anchor_point_world,
            is_collision_enabled: true,
        }
    }
}

/// Keeps one point of each body together and leaves the three rotations free
#[derive(Debug)]
pub struct BallSocketJoint {
    body1: BodyHandle,
    body2: BodyHandle,
    is_collision_enabled: bool,

    local_anchor1: Vector3,
    local_anchor2: Vector3,

    index1: usize,
    index2: usize,
    r1_world: Vector3,
    r2_world: Vector3,
    inverse_mass_matrix: Matrix3,
    bias_vector: Vector3,

    /// Accumulated impulse on body 2
    impulse: Vector3,
}

impl BallSocketJoint {
    pub fn new(info: &BallSocketJointInfo, transform1: &Transform, transform2: &Transform) -> Self {
        Self {
            body1: info.body1,
            body2: info.body2,
            is_collision_enabled: info.is_collision_enabled,
            local_anchor1: transform1.inverse_transform_point(info.anchor_point_world),
            local_anchor2: transform2.inverse_transform_point(info.anchor_point_world),
            index1: 0,
            index2: 0,
            r1_world: Vector3::zero(),
            r2_world: Vector3::zero(),
            inverse_mass_matrix: Matrix3::zero(),
            bias_vector: Vector3::zero(),
            impulse: Vector3::zero(),
        }
    }

    pub fn get_impulse(&self) -> Vector3 {
        self.impulse
    }
}

impl Joint for BallSocketJoint {
    fn joint_type(&self) -> JointType {
        JointType::BallSocket
    }

    fn body1(&self) -> BodyHandle {
        self.body1
    }

    fn body2(&self) -> BodyHandle {
        self.body2
    }

    fn is_collision_enabled(&self) -> bool {
        self.is_collision_enabled
    }

    fn init_before_solve(&mut self, data: &ConstraintSolverData<'_>) {
        self.index1 = data.index1;
        self.index2 = data.index2;

        self.r1_world = data.transform1.orientation.rotate(self.local_anchor1);
        self.r2_world = data.transform2.orientation.rotate(self.local_anchor2);

        self.inverse_mass_matrix = inverse_or_zero(point_mass_matrix(data, self.r1_world, self.r2_world));

        let error = data.transform2.position + self.r2_world - data.transform1.position - self.r1_world;
        self.bias_vector = error * data.bias_factor();

        if !data.is_warm_starting_active {
            self.impulse = Vector3::zero();
        }
    }

    fn warm_start(&mut self, velocities: &mut ConstrainedVelocities) {
        velocities.apply_linear_impulse(self.index1, self.index2, self.r1_world, self.r2_world, self.impulse);
    }

    fn solve_velocity_constraint(&mut self, velocities: &mut ConstrainedVelocities) {
        let (i1, i2) = (self.index1, self.index2);
        let jv = velocities.linear[i2] + velocities.angular[i2].cross(&self.r2_world)
            - velocities.linear[i1]
            - velocities.angular[i1].cross(&self.r1_world);

        let delta_lambda = self.inverse_mass_matrix * (-jv - self.bias_vector);
        self.impulse += delta_lambda;
        velocities.apply_linear_impulse(i1, i2, self.r1_world, self.r2_world, delta_lambda);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
