use std::any::Any;

use crate::constraints::joint::{inverse_or_zero, point_mass_matrix};
use crate::constraints::{ConstraintSolverData, Joint, JointType};
use crate::core::{BodyHandle, ConstrainedVelocities};
use crate::math::{Matrix3, Quaternion, Transform, Vector3};

#[cfg(feature = "serialize")]
use serde::{Serialize, Deserialize};

/// Parameters of a fixed joint
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub struct FixedJointInfo {
    pub body1: BodyHandle,
    pub body2: BodyHandle,
    pub anchor_point_world: Vector3,
    pub is_collision_enabled: bool,
}

impl FixedJointInfo {
    pub fn new(body1: BodyHandle, body2: BodyHandle, anchor_point_world: Vector3) -> Self {
        Self {
            body1,
            body2,
            anchor_point_world,
            is_collision_enabled: true,
        }
    }
}

/// Welds two bodies together: no relative translation nor rotation
#[derive(Debug)]
pub struct FixedJoint {
    body1: BodyHandle,
    body2: BodyHandle,
    is_collision_enabled: bool,

    local_anchor1: Vector3,
    local_anchor2: Vector3,

    /// Inverse of the relative orientation `q2·q1⁻¹` at creation
    init_orientation_difference_inv: Quaternion,

    index1: usize,
    index2: usize,
    r1_world: Vector3,
    r2_world: Vector3,
    inverse_mass_matrix_translation: Matrix3,
    inverse_mass_matrix_rotation: Matrix3,
    bias_translation: Vector3,
    bias_rotation: Vector3,

    impulse_translation: Vector3,
    impulse_rotation: Vector3,
}

/// Orientation error of body 2 relative to body 1 against their initial relative orientation
pub(crate) fn orientation_error(
    orientation1: &Quaternion,
    orientation2: &Quaternion,
    init_difference_inv: &Quaternion,
) -> Quaternion {
    let current_difference = (*orientation2 * orientation1.inverse()).normalize();
    (current_difference * *init_difference_inv).normalize()
}

pub(crate) fn initial_orientation_difference_inv(transform1: &Transform, transform2: &Transform) -> Quaternion {
    (transform2.orientation * transform1.orientation.inverse())
        .normalize()
        .inverse()
}

impl FixedJoint {
    pub fn new(info: &FixedJointInfo, transform1: &Transform, transform2: &Transform) -> Self {
        Self {
            body1: info.body1,
            body2: info.body2,
            is_collision_enabled: info.is_collision_enabled,
            local_anchor1: transform1.inverse_transform_point(info.anchor_point_world),
            local_anchor2: transform2.inverse_transform_point(info.anchor_point_world),
            init_orientation_difference_inv: initial_orientation_difference_inv(transform1, transform2),
            index1: 0,
            index2: 0,
            r1_world: Vector3::zero(),
            r2_world: Vector3::zero(),
            inverse_mass_matrix_translation: Matrix3::zero(),
            inverse_mass_matrix_rotation: Matrix3::zero(),
            bias_translation: Vector3::zero(),
            bias_rotation: Vector3::zero(),
            impulse_translation: Vector3::zero(),
            impulse_rotation: Vector3::zero(),
        }
    }
}

impl Joint for FixedJoint {
    fn joint_type(&self) -> JointType {
        JointType::Fixed
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
        let bias_factor = data.bias_factor();

        self.r1_world = data.transform1.orientation.rotate(self.local_anchor1);
        self.r2_world = data.transform2.orientation.rotate(self.local_anchor2);
        self.inverse_mass_matrix_translation =
            inverse_or_zero(point_mass_matrix(data, self.r1_world, self.r2_world));
        self.bias_translation = (data.transform2.position + self.r2_world
            - data.transform1.position
            - self.r1_world)
            * bias_factor;

        let (i1, i2) = data.inverse_inertias();
        self.inverse_mass_matrix_rotation = inverse_or_zero(i1 + i2);
        let error = orientation_error(
            &data.transform1.orientation,
            &data.transform2.orientation,
            &self.init_orientation_difference_inv,
        );
        self.bias_rotation = error.vector_part() * (2.0 * bias_factor);

        if !data.is_warm_starting_active {
            self.impulse_translation = Vector3::zero();
            self.impulse_rotation = Vector3::zero();
        }
    }

    fn warm_start(&mut self, velocities: &mut ConstrainedVelocities) {
        velocities.apply_linear_impulse(
            self.index1,
            self.index2,
            self.r1_world,
            self.r2_world,
            self.impulse_translation,
        );
        velocities.apply_angular_impulse(self.index1, self.index2, self.impulse_rotation);
    }

    fn solve_velocity_constraint(&mut self, velocities: &mut ConstrainedVelocities) {
        let (i1, i2) = (self.index1, self.index2);

        let jv = velocities.linear[i2] + velocities.angular[i2].cross(&self.r2_world)
            - velocities.linear[i1]
            - velocities.angular[i1].cross(&self.r1_world);
        let delta_translation = self.inverse_mass_matrix_translation * (-jv - self.bias_translation);
        self.impulse_translation += delta_translation;
        velocities.apply_linear_impulse(i1, i2, self.r1_world, self.r2_world, delta_translation);

        let jv_rotation = velocities.angular[i2] - velocities.angular[i1];
        let delta_rotation = self.inverse_mass_matrix_rotation * (-jv_rotation - self.bias_rotation);
        self.impulse_rotation += delta_rotation;
        velocities.apply_angular_impulse(i1, i2, delta_rotation);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
