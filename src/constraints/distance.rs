use std::any::Any;

use crate::constraints::joint::scalar_inverse_or_zero;
use crate::constraints::{ConstraintSolverData, Joint, JointType};
use crate::core::{BodyHandle, ConstrainedVelocities};
use crate::math::{Transform, Vector3};

#[cfg(feature = "serialize")]
use serde::{Serialize, Deserialize};

/// Parameters of a distance joint
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub struct DistanceJointInfo {
    pub body1: BodyHandle,
    pub body2: BodyHandle,

    /// Anchor on body 1, world space at creation
    pub anchor_point_world1: Vector3,

    /// Anchor on body 2, world space at creation
    pub anchor_point_world2: Vector3,

    /// Distance to keep between the anchors; None keeps the distance at creation
    pub rest_length: Option<f32>,

    pub is_collision_enabled: bool,
}

impl DistanceJointInfo {
    pub fn new(
        body1: BodyHandle,
        body2: BodyHandle,
        anchor_point_world1: Vector3,
        anchor_point_world2: Vector3,
    ) -> Self {
        Self {
            body1,
            body2,
            anchor_point_world1,
            anchor_point_world2,
            rest_length: None,
            is_collision_enabled: true,
        }
    }
}

/// Keeps two anchor points at a fixed distance from each other
#[derive(Debug)]
pub struct DistanceJoint {
    body1: BodyHandle,
    body2: BodyHandle,
    is_collision_enabled: bool,

    local_anchor1: Vector3,
    local_anchor2: Vector3,
    rest_length: f32,

    index1: usize,
    index2: usize,
    r1_world: Vector3,
    r2_world: Vector3,

    /// Unit direction from anchor 1 to anchor 2
    direction: Vector3,
    inverse_mass: f32,
    bias: f32,

    impulse: f32,
}

impl DistanceJoint {
    pub fn new(info: &DistanceJointInfo, transform1: &Transform, transform2: &Transform) -> Self {
        let rest_length = info
            .rest_length
            .unwrap_or_else(|| info.anchor_point_world1.distance(&info.anchor_point_world2));
        Self {
            body1: info.body1,
            body2: info.body2,
            is_collision_enabled: info.is_collision_enabled,
            local_anchor1: transform1.inverse_transform_point(info.anchor_point_world1),
            local_anchor2: transform2.inverse_transform_point(info.anchor_point_world2),
            rest_length,
            index1: 0,
            index2: 0,
            r1_world: Vector3::zero(),
            r2_world: Vector3::zero(),
            direction: Vector3::zero(),
            inverse_mass: 0.0,
            bias: 0.0,
            impulse: 0.0,
        }
    }

    pub fn get_rest_length(&self) -> f32 {
        self.rest_length
    }

    pub fn set_rest_length(&mut self, length: f32) {
        if length.is_finite() && length >= 0.0 {
            self.rest_length = length;
        }
    }
}

impl Joint for DistanceJoint {
    fn joint_type(&self) -> JointType {
        JointType::Distance
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
        let separation = data.transform2.position + self.r2_world - data.transform1.position - self.r1_world;
        let length = separation.length();

        // Coincident anchors leave the direction undefined; skip the step
        if length <= f32::EPSILON {
            self.direction = Vector3::zero();
            self.inverse_mass = 0.0;
            self.bias = 0.0;
            self.impulse = 0.0;
            return;
        }
        self.direction = separation / length;

        let (m1, m2) = data.inverse_masses();
        let (i1, i2) = data.inverse_inertias();
        let r1_cross_n = self.r1_world.cross(&self.direction);
        let r2_cross_n = self.r2_world.cross(&self.direction);
        self.inverse_mass = scalar_inverse_or_zero(
            m1 + m2 + r1_cross_n.dot(&(i1 * r1_cross_n)) + r2_cross_n.dot(&(i2 * r2_cross_n)),
        );
        self.bias = (length - self.rest_length) * data.bias_factor();

        if !data.is_warm_starting_active {
            self.impulse = 0.0;
        }
    }

    fn warm_start(&mut self, velocities: &mut ConstrainedVelocities) {
        velocities.apply_linear_impulse(
            self.index1,
            self.index2,
            self.r1_world,
            self.r2_world,
            self.direction * self.impulse,
        );
    }

    fn solve_velocity_constraint(&mut self, velocities: &mut ConstrainedVelocities) {
        let (i1, i2) = (self.index1, self.index2);
        let relative = velocities.linear[i2] + velocities.angular[i2].cross(&self.r2_world)
            - velocities.linear[i1]
            - velocities.angular[i1].cross(&self.r1_world);
        let jv = relative.dot(&self.direction);

        let delta_lambda = -(jv + self.bias) * self.inverse_mass;
        self.impulse += delta_lambda;
        velocities.apply_linear_impulse(i1, i2, self.r1_world, self.r2_world, self.direction * delta_lambda);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
