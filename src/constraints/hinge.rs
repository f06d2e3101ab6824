use std::any::Any;
use std::f32::consts::PI;

use crate::constraints::fixed::{initial_orientation_difference_inv, orientation_error};
use crate::constraints::joint::{
    inverse2_or_zero, inverse_or_zero, mul2, point_mass_matrix, scalar_inverse_or_zero, Matrix2,
};
use crate::constraints::{ConstraintSolverData, Joint, JointType};
use crate::core::{BodyHandle, ConstrainedVelocities};
use crate::math::{Matrix3, Quaternion, Transform, Vector3};

#[cfg(feature = "serialize")]
use serde::{Serialize, Deserialize};

/// Parameters of a hinge joint
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub struct HingeJointInfo {
    pub body1: BodyHandle,
    pub body2: BodyHandle,
    pub anchor_point_world: Vector3,

    /// Rotation axis in world space at creation
    pub rotation_axis_world: Vector3,

    pub is_limit_enabled: bool,

    /// Lower angle limit in radians, in [-2π, 0]
    pub min_angle_limit: f32,

    /// Upper angle limit in radians, in [0, 2π]
    pub max_angle_limit: f32,

    pub is_motor_enabled: bool,

    /// Target relative angular speed `(ω2 - ω1)·axis`, rad/s
    pub motor_speed: f32,

    /// Maximum torque the motor can apply
    pub max_motor_torque: f32,

    pub is_collision_enabled: bool,
}

impl HingeJointInfo {
    pub fn new(body1: BodyHandle, body2: BodyHandle, anchor_point_world: Vector3, rotation_axis_world: Vector3) -> Self {
        Self {
            body1,
            body2,
            anchor_point_world,
            rotation_axis_world,
            is_limit_enabled: false,
            min_angle_limit: -PI,
            max_angle_limit: PI,
            is_motor_enabled: false,
            motor_speed: 0.0,
            max_motor_torque: 0.0,
            is_collision_enabled: true,
        }
    }

    pub fn with_limits(mut self, min_angle_limit: f32, max_angle_limit: f32) -> Self {
        self.is_limit_enabled = true;
        self.min_angle_limit = min_angle_limit;
        self.max_angle_limit = max_angle_limit;
        self
    }

    pub fn with_motor(mut self, motor_speed: f32, max_motor_torque: f32) -> Self {
        self.is_motor_enabled = true;
        self.motor_speed = motor_speed;
        self.max_motor_torque = max_motor_torque;
        self
    }
}

/// Leaves a single rotation about an axis free, with optional angle limits and motor
#[derive(Debug)]
pub struct HingeJoint {
    body1: BodyHandle,
    body2: BodyHandle,
    is_collision_enabled: bool,

    local_anchor1: Vector3,
    local_anchor2: Vector3,
    hinge_local_axis1: Vector3,
    hinge_local_axis2: Vector3,
    init_orientation_difference_inv: Quaternion,

    is_limit_enabled: bool,
    lower_limit: f32,
    upper_limit: f32,
    is_motor_enabled: bool,
    motor_speed: f32,
    max_motor_torque: f32,

    index1: usize,
    index2: usize,
    time_step: f32,
    r1_world: Vector3,
    r2_world: Vector3,
    a1: Vector3,
    b2_cross_a1: Vector3,
    c2_cross_a1: Vector3,
    inverse_mass_matrix_translation: Matrix3,
    inverse_mass_matrix_rotation: Matrix2,
    inverse_mass_matrix_limit_motor: f32,
    bias_translation: Vector3,
    bias_rotation: [f32; 2],
    bias_lower_limit: f32,
    bias_upper_limit: f32,
    is_lower_limit_violated: bool,
    is_upper_limit_violated: bool,

    impulse_translation: Vector3,
    impulse_rotation: [f32; 2],
    impulse_lower_limit: f32,
    impulse_upper_limit: f32,
    impulse_motor: f32,
}

/// Wraps an angle into [-π, π]
fn normalized_angle(angle: f32) -> f32 {
    let mut angle = angle % (2.0 * PI);
    if angle < -PI {
        angle += 2.0 * PI;
    } else if angle > PI {
        angle -= 2.0 * PI;
    }
    angle
}

/// Picks between `angle` and `angle ± 2π` the value closest to the limit range
fn angle_near_limits(angle: f32, lower: f32, upper: f32) -> f32 {
    if upper - lower >= 2.0 * PI {
        return angle;
    }
    if angle > upper {
        let to_upper = (angle - upper).abs();
        let to_lower = (angle - 2.0 * PI - lower).abs();
        if to_upper > to_lower {
            angle - 2.0 * PI
        } else {
            angle
        }
    } else if angle < lower {
        let to_upper = (angle + 2.0 * PI - upper).abs();
        let to_lower = (angle - lower).abs();
        if to_upper > to_lower {
            angle
        } else {
            angle + 2.0 * PI
        }
    } else {
        angle
    }
}

impl HingeJoint {
    pub fn new(info: &HingeJointInfo, transform1: &Transform, transform2: &Transform) -> Self {
        let axis = info.rotation_axis_world.normalize();
        Self {
            body1: info.body1,
            body2: info.body2,
            is_collision_enabled: info.is_collision_enabled,
            local_anchor1: transform1.inverse_transform_point(info.anchor_point_world),
            local_anchor2: transform2.inverse_transform_point(info.anchor_point_world),
            hinge_local_axis1: transform1.inverse_transform_direction(axis).normalize(),
            hinge_local_axis2: transform2.inverse_transform_direction(axis).normalize(),
            init_orientation_difference_inv: initial_orientation_difference_inv(transform1, transform2),
            is_limit_enabled: info.is_limit_enabled,
            lower_limit: info.min_angle_limit,
            upper_limit: info.max_angle_limit,
            is_motor_enabled: info.is_motor_enabled,
            motor_speed: info.motor_speed,
            max_motor_torque: info.max_motor_torque,
            index1: 0,
            index2: 0,
            time_step: 0.0,
            r1_world: Vector3::zero(),
            r2_world: Vector3::zero(),
            a1: Vector3::zero(),
            b2_cross_a1: Vector3::zero(),
            c2_cross_a1: Vector3::zero(),
            inverse_mass_matrix_translation: Matrix3::zero(),
            inverse_mass_matrix_rotation: Matrix2::zeros(),
            inverse_mass_matrix_limit_motor: 0.0,
            bias_translation: Vector3::zero(),
            bias_rotation: [0.0; 2],
            bias_lower_limit: 0.0,
            bias_upper_limit: 0.0,
            is_lower_limit_violated: false,
            is_upper_limit_violated: false,
            impulse_translation: Vector3::zero(),
            impulse_rotation: [0.0; 2],
            impulse_lower_limit: 0.0,
            impulse_upper_limit: 0.0,
            impulse_motor: 0.0,
        }
    }

    pub fn is_limit_enabled(&self) -> bool {
        self.is_limit_enabled
    }

    pub fn enable_limit(&mut self, enabled: bool) {
        if enabled != self.is_limit_enabled {
            self.is_limit_enabled = enabled;
            self.reset_limits();
        }
    }

    pub fn get_min_angle_limit(&self) -> f32 {
        self.lower_limit
    }

    pub fn get_max_angle_limit(&self) -> f32 {
        self.upper_limit
    }

    /// Sets the angle limits; ignored unless `lower <= 0 <= upper`
    pub fn set_limits(&mut self, lower: f32, upper: f32) {
        if lower <= 0.0 && upper >= 0.0 && (lower != self.lower_limit || upper != self.upper_limit) {
            self.lower_limit = lower;
            self.upper_limit = upper;
            self.reset_limits();
        }
    }

    pub fn is_motor_enabled(&self) -> bool {
        self.is_motor_enabled
    }

    pub fn enable_motor(&mut self, enabled: bool) {
        self.is_motor_enabled = enabled;
        self.impulse_motor = 0.0;
    }

    pub fn get_motor_speed(&self) -> f32 {
        self.motor_speed
    }

    pub fn set_motor_speed(&mut self, speed: f32) {
        self.motor_speed = speed;
    }

    pub fn get_max_motor_torque(&self) -> f32 {
        self.max_motor_torque
    }

    pub fn set_max_motor_torque(&mut self, torque: f32) {
        if torque >= 0.0 {
            self.max_motor_torque = torque;
        }
    }

    /// Torque applied by the motor during the last step
    pub fn get_motor_torque(&self) -> f32 {
        if self.time_step > 0.0 {
            self.impulse_motor / self.time_step
        } else {
            0.0
        }
    }

    fn reset_limits(&mut self) {
        self.impulse_lower_limit = 0.0;
        self.impulse_upper_limit = 0.0;
    }

    /// Current hinge angle of body 2 relative to body 1, around the hinge axis
    fn compute_current_angle(&self, orientation1: &Quaternion, orientation2: &Quaternion, axis: Vector3) -> f32 {
        let relative = orientation_error(orientation1, orientation2, &self.init_orientation_difference_inv);
        let vector = relative.vector_part();
        let sin_half = if vector.dot(&axis) >= 0.0 { vector.length() } else { -vector.length() };
        let angle = normalized_angle(2.0 * sin_half.atan2(relative.w));
        angle_near_limits(angle, self.lower_limit, self.upper_limit)
    }
}

impl Joint for HingeJoint {
    fn joint_type(&self) -> JointType {
        JointType::Hinge
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
        self.time_step = data.time_step;
        let bias_factor = data.bias_factor();
        let orientation1 = data.transform1.orientation;
        let orientation2 = data.transform2.orientation;

        self.a1 = orientation1.rotate(self.hinge_local_axis1).normalize();
        let a2 = orientation2.rotate(self.hinge_local_axis2).normalize();
        let b2 = a2.one_unit_orthogonal_vector();
        let c2 = a2.cross(&b2);
        self.b2_cross_a1 = b2.cross(&self.a1);
        self.c2_cross_a1 = c2.cross(&self.a1);

        let hinge_angle = self.compute_current_angle(&orientation1, &orientation2, self.a1);
        let lower_limit_error = hinge_angle - self.lower_limit;
        let upper_limit_error = self.upper_limit - hinge_angle;
        let old_lower = self.is_lower_limit_violated;
        let old_upper = self.is_upper_limit_violated;
        self.is_lower_limit_violated = lower_limit_error <= 0.0;
        self.is_upper_limit_violated = upper_limit_error <= 0.0;
        if self.is_lower_limit_violated != old_lower {
            self.impulse_lower_limit = 0.0;
        }
        if self.is_upper_limit_violated != old_upper {
            self.impulse_upper_limit = 0.0;
        }

        self.r1_world = orientation1.rotate(self.local_anchor1);
        self.r2_world = orientation2.rotate(self.local_anchor2);
        self.inverse_mass_matrix_translation =
            inverse_or_zero(point_mass_matrix(data, self.r1_world, self.r2_world));
        self.bias_translation = (data.transform2.position + self.r2_world
            - data.transform1.position
            - self.r1_world)
            * bias_factor;

        let (i1, i2) = data.inverse_inertias();
        let i1_b = i1 * self.b2_cross_a1;
        let i1_c = i1 * self.c2_cross_a1;
        let i2_b = i2 * self.b2_cross_a1;
        let i2_c = i2 * self.c2_cross_a1;
        self.inverse_mass_matrix_rotation = inverse2_or_zero(Matrix2::new(
            self.b2_cross_a1.dot(&i1_b) + self.b2_cross_a1.dot(&i2_b),
            self.b2_cross_a1.dot(&i1_c) + self.b2_cross_a1.dot(&i2_c),
            self.c2_cross_a1.dot(&i1_b) + self.c2_cross_a1.dot(&i2_b),
            self.c2_cross_a1.dot(&i1_c) + self.c2_cross_a1.dot(&i2_c),
        ));
        self.bias_rotation = [
            self.a1.dot(&b2) * bias_factor,
            self.a1.dot(&c2) * bias_factor,
        ];

        if !data.is_warm_starting_active {
            self.impulse_translation = Vector3::zero();
            self.impulse_rotation = [0.0; 2];
            self.impulse_lower_limit = 0.0;
            self.impulse_upper_limit = 0.0;
            self.impulse_motor = 0.0;
        }

        if self.is_limit_enabled || self.is_motor_enabled {
            self.inverse_mass_matrix_limit_motor =
                scalar_inverse_or_zero(self.a1.dot(&(i1 * self.a1)) + self.a1.dot(&(i2 * self.a1)));
            self.bias_lower_limit = lower_limit_error * bias_factor;
            self.bias_upper_limit = upper_limit_error * bias_factor;
        }
    }

    fn warm_start(&mut self, velocities: &mut ConstrainedVelocities) {
        let (i1, i2) = (self.index1, self.index2);
        velocities.apply_linear_impulse(i1, i2, self.r1_world, self.r2_world, self.impulse_translation);

        let angular = self.b2_cross_a1 * self.impulse_rotation[0]
            + self.c2_cross_a1 * self.impulse_rotation[1]
            + self.a1 * (self.impulse_lower_limit - self.impulse_upper_limit + self.impulse_motor);
        velocities.apply_angular_impulse(i1, i2, angular);
    }

    fn solve_velocity_constraint(&mut self, velocities: &mut ConstrainedVelocities) {
        let (i1, i2) = (self.index1, self.index2);

        // Point-to-point
        let jv = velocities.linear[i2] + velocities.angular[i2].cross(&self.r2_world)
            - velocities.linear[i1]
            - velocities.angular[i1].cross(&self.r1_world);
        let delta_translation = self.inverse_mass_matrix_translation * (-jv - self.bias_translation);
        self.impulse_translation += delta_translation;
        velocities.apply_linear_impulse(i1, i2, self.r1_world, self.r2_world, delta_translation);

        // Two rotations orthogonal to the hinge axis
        let delta_w = velocities.angular[i2] - velocities.angular[i1];
        let jv_rotation = [
            self.b2_cross_a1.dot(&delta_w),
            self.c2_cross_a1.dot(&delta_w),
        ];
        let delta_rotation = mul2(&self.inverse_mass_matrix_rotation, [
            -jv_rotation[0] - self.bias_rotation[0],
            -jv_rotation[1] - self.bias_rotation[1],
        ]);
        self.impulse_rotation[0] += delta_rotation[0];
        self.impulse_rotation[1] += delta_rotation[1];
        velocities.apply_angular_impulse(
            i1,
            i2,
            self.b2_cross_a1 * delta_rotation[0] + self.c2_cross_a1 * delta_rotation[1],
        );

        if self.is_limit_enabled {
            if self.is_lower_limit_violated {
                let jv_lower = (velocities.angular[i2] - velocities.angular[i1]).dot(&self.a1);
                let lambda = self.inverse_mass_matrix_limit_motor * (-jv_lower - self.bias_lower_limit);
                let previous = self.impulse_lower_limit;
                self.impulse_lower_limit = (previous + lambda).max(0.0);
                let delta = self.impulse_lower_limit - previous;
                velocities.apply_angular_impulse(i1, i2, self.a1 * delta);
            }
            if self.is_upper_limit_violated {
                let jv_upper = (velocities.angular[i1] - velocities.angular[i2]).dot(&self.a1);
                let lambda = self.inverse_mass_matrix_limit_motor * (-jv_upper - self.bias_upper_limit);
                let previous = self.impulse_upper_limit;
                self.impulse_upper_limit = (previous + lambda).max(0.0);
                let delta = self.impulse_upper_limit - previous;
                velocities.apply_angular_impulse(i1, i2, -self.a1 * delta);
            }
        }

        if self.is_motor_enabled {
            let jv_motor = (velocities.angular[i2] - velocities.angular[i1]).dot(&self.a1);
            let max_impulse = self.max_motor_torque * self.time_step;
            let lambda = self.inverse_mass_matrix_limit_motor * (self.motor_speed - jv_motor);
            let previous = self.impulse_motor;
            self.impulse_motor = (previous + lambda).clamp(-max_impulse, max_impulse);
            let delta = self.impulse_motor - previous;
            velocities.apply_angular_impulse(i1, i2, self.a1 * delta);
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
