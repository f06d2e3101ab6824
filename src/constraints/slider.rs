use std::any::Any;

use crate::constraints::fixed::{initial_orientation_difference_inv, orientation_error};
use crate::constraints::joint::{inverse2_or_zero, inverse_or_zero, mul2, scalar_inverse_or_zero, Matrix2};
use crate::constraints::{ConstraintSolverData, Joint, JointType};
use crate::core::{BodyHandle, ConstrainedVelocities};
use crate::math::{Matrix3, Quaternion, Transform, Vector3};

#[cfg(feature = "serialize")]
use serde::{Serialize, Deserialize};

/// Parameters of a slider (prismatic) joint
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub struct SliderJointInfo {
    pub body1: BodyHandle,
    pub body2: BodyHandle,
    pub anchor_point_world: Vector3,

    /// Sliding axis in world space at creation
    pub slider_axis_world: Vector3,

    pub is_limit_enabled: bool,

    /// Lower translation limit along the axis, `<= 0`
    pub min_translation_limit: f32,

    /// Upper translation limit along the axis, `>= 0`
    pub max_translation_limit: f32,

    pub is_motor_enabled: bool,

    /// Target relative linear speed `(v2 - v1)·axis`
    pub motor_speed: f32,

    /// Maximum force the motor can apply
    pub max_motor_force: f32,

    pub is_collision_enabled: bool,
}

impl SliderJointInfo {
    pub fn new(body1: BodyHandle, body2: BodyHandle, anchor_point_world: Vector3, slider_axis_world: Vector3) -> Self {
        Self {
            body1,
            body2,
            anchor_point_world,
            slider_axis_world,
            is_limit_enabled: false,
            min_translation_limit: -1.0,
            max_translation_limit: 1.0,
            is_motor_enabled: false,
            motor_speed: 0.0,
            max_motor_force: 0.0,
            is_collision_enabled: true,
        }
    }

    pub fn with_limits(mut self, min_translation_limit: f32, max_translation_limit: f32) -> Self {
        self.is_limit_enabled = true;
        self.min_translation_limit = min_translation_limit;
        self.max_translation_limit = max_translation_limit;
        self
    }

    pub fn with_motor(mut self, motor_speed: f32, max_motor_force: f32) -> Self {
        self.is_motor_enabled = true;
        self.motor_speed = motor_speed;
        self.max_motor_force = max_motor_force;
        self
    }
}

/// Leaves a single translation along an axis free, with optional limits and motor
#[derive(Debug)]
pub struct SliderJoint {
    body1: BodyHandle,
    body2: BodyHandle,
    is_collision_enabled: bool,

    local_anchor1: Vector3,
    local_anchor2: Vector3,
    slider_local_axis1: Vector3,
    init_orientation_difference_inv: Quaternion,

    is_limit_enabled: bool,
    lower_limit: f32,
    upper_limit: f32,
    is_motor_enabled: bool,
    motor_speed: f32,
    max_motor_force: f32,

    index1: usize,
    index2: usize,
    time_step: f32,
    slider_axis_world: Vector3,
    n1: Vector3,
    n2: Vector3,
    r1_plus_u: Vector3,
    r2_world: Vector3,
    inverse_mass_matrix_translation: Matrix2,
    inverse_mass_matrix_rotation: Matrix3,
    inverse_mass_matrix_limit: f32,
    inverse_mass_matrix_motor: f32,
    bias_translation: [f32; 2],
    bias_rotation: Vector3,
    bias_lower_limit: f32,
    bias_upper_limit: f32,
    is_lower_limit_violated: bool,
    is_upper_limit_violated: bool,
    translation: f32,

    impulse_translation: [f32; 2],
    impulse_rotation: Vector3,
    impulse_lower_limit: f32,
    impulse_upper_limit: f32,
    impulse_motor: f32,
}

impl SliderJoint {
    pub fn new(info: &SliderJointInfo, transform1: &Transform, transform2: &Transform) -> Self {
        let axis = info.slider_axis_world.normalize();
        Self {
            body1: info.body1,
            body2: info.body2,
            is_collision_enabled: info.is_collision_enabled,
            local_anchor1: transform1.inverse_transform_point(info.anchor_point_world),
            local_anchor2: transform2.inverse_transform_point(info.anchor_point_world),
            slider_local_axis1: transform1.inverse_transform_direction(axis).normalize(),
            init_orientation_difference_inv: initial_orientation_difference_inv(transform1, transform2),
            is_limit_enabled: info.is_limit_enabled,
            lower_limit: info.min_translation_limit,
            upper_limit: info.max_translation_limit,
            is_motor_enabled: info.is_motor_enabled,
            motor_speed: info.motor_speed,
            max_motor_force: info.max_motor_force,
            index1: 0,
            index2: 0,
            time_step: 0.0,
            slider_axis_world: axis,
            n1: Vector3::zero(),
            n2: Vector3::zero(),
            r1_plus_u: Vector3::zero(),
            r2_world: Vector3::zero(),
            inverse_mass_matrix_translation: Matrix2::zeros(),
            inverse_mass_matrix_rotation: Matrix3::zero(),
            inverse_mass_matrix_limit: 0.0,
            inverse_mass_matrix_motor: 0.0,
            bias_translation: [0.0; 2],
            bias_rotation: Vector3::zero(),
            bias_lower_limit: 0.0,
            bias_upper_limit: 0.0,
            is_lower_limit_violated: false,
            is_upper_limit_violated: false,
            translation: 0.0,
            impulse_translation: [0.0; 2],
            impulse_rotation: Vector3::zero(),
            impulse_lower_limit: 0.0,
            impulse_upper_limit: 0.0,
            impulse_motor: 0.0,
        }
    }

    /// Translation of the anchor of body 2 along the axis, as of the last step
    pub fn get_translation(&self) -> f32 {
        self.translation
    }

    pub fn is_limit_enabled(&self) -> bool {
        self.is_limit_enabled
    }

    pub fn enable_limit(&mut self, enabled: bool) {
        if enabled != self.is_limit_enabled {
            self.is_limit_enabled = enabled;
            self.impulse_lower_limit = 0.0;
            self.impulse_upper_limit = 0.0;
        }
    }

    pub fn get_min_translation_limit(&self) -> f32 {
        self.lower_limit
    }

    pub fn get_max_translation_limit(&self) -> f32 {
        self.upper_limit
    }

    /// Sets the translation limits; ignored unless `lower <= 0 <= upper`
    pub fn set_limits(&mut self, lower: f32, upper: f32) {
        if lower <= 0.0 && upper >= 0.0 {
            self.lower_limit = lower;
            self.upper_limit = upper;
            self.impulse_lower_limit = 0.0;
            self.impulse_upper_limit = 0.0;
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

    pub fn get_max_motor_force(&self) -> f32 {
        self.max_motor_force
    }

    pub fn set_max_motor_force(&mut self, force: f32) {
        if force >= 0.0 {
            self.max_motor_force = force;
        }
    }

    /// Force applied by the motor during the last step
    pub fn get_motor_force(&self) -> f32 {
        if self.time_step > 0.0 {
            self.impulse_motor / self.time_step
        } else {
            0.0
        }
    }

    /// Velocity of the constraint `axis·(anchor2 - anchor1)` for a direction `d`
    #[inline]
    fn jv(&self, velocities: &ConstrainedVelocities, d: Vector3) -> f32 {
        let (i1, i2) = (self.index1, self.index2);
        d.dot(&velocities.linear[i2]) + self.r2_world.cross(&d).dot(&velocities.angular[i2])
            - d.dot(&velocities.linear[i1])
            - self.r1_plus_u.cross(&d).dot(&velocities.angular[i1])
    }
}

impl Joint for SliderJoint {
    fn joint_type(&self) -> JointType {
        JointType::Slider
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
        let (m1, m2) = data.inverse_masses();
        let (i1, i2) = data.inverse_inertias();
        let orientation1 = data.transform1.orientation;
        let orientation2 = data.transform2.orientation;

        let r1 = orientation1.rotate(self.local_anchor1);
        self.r2_world = orientation2.rotate(self.local_anchor2);
        let u = data.transform2.position + self.r2_world - data.transform1.position - r1;

        let axis = orientation1.rotate(self.slider_local_axis1).normalize();
        self.slider_axis_world = axis;
        self.translation = u.dot(&axis);

        let lower_limit_error = self.translation - self.lower_limit;
        let upper_limit_error = self.upper_limit - self.translation;
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

        self.n1 = axis.one_unit_orthogonal_vector();
        self.n2 = axis.cross(&self.n1);
        self.r1_plus_u = r1 + u;

        let r1u_n1 = self.r1_plus_u.cross(&self.n1);
        let r1u_n2 = self.r1_plus_u.cross(&self.n2);
        let r2_n1 = self.r2_world.cross(&self.n1);
        let r2_n2 = self.r2_world.cross(&self.n2);
        let sum_inverse_mass = m1 + m2;
        self.inverse_mass_matrix_translation = inverse2_or_zero(Matrix2::new(
            sum_inverse_mass + r1u_n1.dot(&(i1 * r1u_n1)) + r2_n1.dot(&(i2 * r2_n1)),
            r1u_n1.dot(&(i1 * r1u_n2)) + r2_n1.dot(&(i2 * r2_n2)),
            r1u_n2.dot(&(i1 * r1u_n1)) + r2_n2.dot(&(i2 * r2_n1)),
            sum_inverse_mass + r1u_n2.dot(&(i1 * r1u_n2)) + r2_n2.dot(&(i2 * r2_n2)),
        ));
        self.bias_translation = [u.dot(&self.n1) * bias_factor, u.dot(&self.n2) * bias_factor];

        self.inverse_mass_matrix_rotation = inverse_or_zero(i1 + i2);
        let error = orientation_error(&orientation1, &orientation2, &self.init_orientation_difference_inv);
        self.bias_rotation = error.vector_part() * (2.0 * bias_factor);

        if self.is_limit_enabled {
            let r1u_axis = self.r1_plus_u.cross(&axis);
            let r2_axis = self.r2_world.cross(&axis);
            self.inverse_mass_matrix_limit = scalar_inverse_or_zero(
                sum_inverse_mass + r1u_axis.dot(&(i1 * r1u_axis)) + r2_axis.dot(&(i2 * r2_axis)),
            );
            self.bias_lower_limit = lower_limit_error * bias_factor;
            self.bias_upper_limit = upper_limit_error * bias_factor;
        }

        if self.is_motor_enabled {
            self.inverse_mass_matrix_motor = scalar_inverse_or_zero(sum_inverse_mass);
        }

        if !data.is_warm_starting_active {
            self.impulse_translation = [0.0; 2];
            self.impulse_rotation = Vector3::zero();
            self.impulse_lower_limit = 0.0;
            self.impulse_upper_limit = 0.0;
            self.impulse_motor = 0.0;
        }
    }

    fn warm_start(&mut self, velocities: &mut ConstrainedVelocities) {
        let (i1, i2) = (self.index1, self.index2);
        let impulse = self.n1 * self.impulse_translation[0]
            + self.n2 * self.impulse_translation[1]
            + self.slider_axis_world * (self.impulse_lower_limit - self.impulse_upper_limit);
        velocities.apply_linear_impulse(i1, i2, self.r1_plus_u, self.r2_world, impulse);
        velocities.apply_angular_impulse(i1, i2, self.impulse_rotation);
        velocities.apply_linear_impulse(
            i1,
            i2,
            Vector3::zero(),
            Vector3::zero(),
            self.slider_axis_world * self.impulse_motor,
        );
    }

    fn solve_velocity_constraint(&mut self, velocities: &mut ConstrainedVelocities) {
        let (i1, i2) = (self.index1, self.index2);

        // Two translations orthogonal to the axis
        let jv_translation = [self.jv(velocities, self.n1), self.jv(velocities, self.n2)];
        let delta_translation = mul2(&self.inverse_mass_matrix_translation, [
            -jv_translation[0] - self.bias_translation[0],
            -jv_translation[1] - self.bias_translation[1],
        ]);
        self.impulse_translation[0] += delta_translation[0];
        self.impulse_translation[1] += delta_translation[1];
        velocities.apply_linear_impulse(
            i1,
            i2,
            self.r1_plus_u,
            self.r2_world,
            self.n1 * delta_translation[0] + self.n2 * delta_translation[1],
        );

        // Three rotations
        let jv_rotation = velocities.angular[i2] - velocities.angular[i1];
        let delta_rotation = self.inverse_mass_matrix_rotation * (-jv_rotation - self.bias_rotation);
        self.impulse_rotation += delta_rotation;
        velocities.apply_angular_impulse(i1, i2, delta_rotation);

        let axis = self.slider_axis_world;
        if self.is_limit_enabled {
            if self.is_lower_limit_violated {
                let jv_lower = self.jv(velocities, axis);
                let lambda = self.inverse_mass_matrix_limit * (-jv_lower - self.bias_lower_limit);
                let previous = self.impulse_lower_limit;
                self.impulse_lower_limit = (previous + lambda).max(0.0);
                let delta = self.impulse_lower_limit - previous;
                velocities.apply_linear_impulse(i1, i2, self.r1_plus_u, self.r2_world, axis * delta);
            }
            if self.is_upper_limit_violated {
                let jv_upper = -self.jv(velocities, axis);
                let lambda = self.inverse_mass_matrix_limit * (-jv_upper - self.bias_upper_limit);
                let previous = self.impulse_upper_limit;
                self.impulse_upper_limit = (previous + lambda).max(0.0);
                let delta = self.impulse_upper_limit - previous;
                velocities.apply_linear_impulse(i1, i2, self.r1_plus_u, self.r2_world, -axis * delta);
            }
        }

        if self.is_motor_enabled {
            let jv_motor = axis.dot(&(velocities.linear[i2] - velocities.linear[i1]));
            let max_impulse = self.max_motor_force * self.time_step;
            let lambda = self.inverse_mass_matrix_motor * (self.motor_speed - jv_motor);
            let previous = self.impulse_motor;
            self.impulse_motor = (previous + lambda).clamp(-max_impulse, max_impulse);
            let delta = self.impulse_motor - previous;
            velocities.apply_linear_impulse(i1, i2, Vector3::zero(), Vector3::zero(), axis * delta);
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
