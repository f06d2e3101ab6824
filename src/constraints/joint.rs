use nalgebra as na;
use std::any::Any;
use std::fmt::Debug;

use crate::core::{BodyHandle, ConstrainedVelocities};
use crate::error::PhysicsError;
use crate::math::{Matrix3, Transform, Vector3};
use crate::Result;

#[cfg(feature = "serialize")]
use serde::{Serialize, Deserialize};

use super::{
    BallSocketJoint, BallSocketJointInfo, DistanceJoint, DistanceJointInfo, FixedJoint,
    FixedJointInfo, HingeJoint, HingeJointInfo, SliderJoint, SliderJointInfo,
};

/// Kind of a joint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JointType {
    BallSocket,
    Hinge,
    Slider,
    Fixed,
    Distance,
}

/// Everything a joint needs from the step to build its constraint
#[derive(Debug, Clone, Copy)]
pub struct ConstraintSolverData<'a> {
    pub time_step: f32,
    pub is_warm_starting_active: bool,
    pub is_error_correction_active: bool,
    pub baumgarte_factor: f32,

    /// Velocity slots of the two bodies
    pub index1: usize,
    pub index2: usize,

    /// Current transforms (center of mass frames) of the two bodies
    pub transform1: Transform,
    pub transform2: Transform,

    pub velocities: &'a ConstrainedVelocities,
}

impl ConstraintSolverData<'_> {
    /// `β / dt` when error correction is on, zero otherwise
    #[inline]
    pub fn bias_factor(&self) -> f32 {
        if self.is_error_correction_active {
            self.baumgarte_factor / self.time_step
        } else {
            0.0
        }
    }

    #[inline]
    pub fn inverse_masses(&self) -> (f32, f32) {
        (
            self.velocities.inverse_mass[self.index1],
            self.velocities.inverse_mass[self.index2],
        )
    }

    #[inline]
    pub fn inverse_inertias(&self) -> (Matrix3, Matrix3) {
        (
            self.velocities.inverse_inertia[self.index1],
            self.velocities.inverse_inertia[self.index2],
        )
    }
}

/// A velocity constraint between two bodies.
///
/// The solver calls `init_before_solve` once per step, then `warm_start` once,
/// then `solve_velocity_constraint` once per iteration. Accumulated impulses
/// live in the joint and carry over to the next step.
pub trait Joint: Send + Sync + Debug + 'static {
    fn joint_type(&self) -> JointType;

    fn body1(&self) -> BodyHandle;

    fn body2(&self) -> BodyHandle;

    /// Whether the two bodies of the joint still collide with each other
    fn is_collision_enabled(&self) -> bool;

    fn init_before_solve(&mut self, data: &ConstraintSolverData<'_>);

    fn warm_start(&mut self, velocities: &mut ConstrainedVelocities);

    fn solve_velocity_constraint(&mut self, velocities: &mut ConstrainedVelocities);

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Description of a joint to create in a world
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub enum JointInfo {
    BallSocket(BallSocketJointInfo),
    Hinge(HingeJointInfo),
    Slider(SliderJointInfo),
    Fixed(FixedJointInfo),
    Distance(DistanceJointInfo),
}

impl JointInfo {
    pub fn body1(&self) -> BodyHandle {
        match self {
            JointInfo::BallSocket(info) => info.body1,
            JointInfo::Hinge(info) => info.body1,
            JointInfo::Slider(info) => info.body1,
            JointInfo::Fixed(info) => info.body1,
            JointInfo::Distance(info) => info.body1,
        }
    }

    pub fn body2(&self) -> BodyHandle {
        match self {
            JointInfo::BallSocket(info) => info.body2,
            JointInfo::Hinge(info) => info.body2,
            JointInfo::Slider(info) => info.body2,
            JointInfo::Fixed(info) => info.body2,
            JointInfo::Distance(info) => info.body2,
        }
    }

    pub fn joint_type(&self) -> JointType {
        match self {
            JointInfo::BallSocket(_) => JointType::BallSocket,
            JointInfo::Hinge(_) => JointType::Hinge,
            JointInfo::Slider(_) => JointType::Slider,
            JointInfo::Fixed(_) => JointType::Fixed,
            JointInfo::Distance(_) => JointType::Distance,
        }
    }

    /// Checks the geometric parameters of the joint
    pub fn validate(&self) -> Result<()> {
        if self.body1() == self.body2() {
            return Err(PhysicsError::InvalidParameter(
                "a joint needs two distinct bodies".into(),
            ));
        }
        match self {
            JointInfo::BallSocket(info) => check_point("anchor", info.anchor_point_world),
            JointInfo::Fixed(info) => check_point("anchor", info.anchor_point_world),
            JointInfo::Hinge(info) => {
                check_point("anchor", info.anchor_point_world)?;
                check_axis(info.rotation_axis_world)?;
                check_limits(info.min_angle_limit, info.max_angle_limit)?;
                check_motor(info.max_motor_torque)
            }
            JointInfo::Slider(info) => {
                check_point("anchor", info.anchor_point_world)?;
                check_axis(info.slider_axis_world)?;
                check_limits(info.min_translation_limit, info.max_translation_limit)?;
                check_motor(info.max_motor_force)
            }
            JointInfo::Distance(info) => {
                check_point("first anchor", info.anchor_point_world1)?;
                check_point("second anchor", info.anchor_point_world2)?;
                match info.rest_length {
                    Some(length) if !(length.is_finite() && length >= 0.0) => Err(
                        PhysicsError::InvalidParameter(format!("invalid rest length {}", length)),
                    ),
                    _ => Ok(()),
                }
            }
        }
    }

    /// Builds the joint from the bodies' transforms at creation time
    pub(crate) fn build(&self, transform1: &Transform, transform2: &Transform) -> Box<dyn Joint> {
        match self {
            JointInfo::BallSocket(info) => Box::new(BallSocketJoint::new(info, transform1, transform2)),
            JointInfo::Hinge(info) => Box::new(HingeJoint::new(info, transform1, transform2)),
            JointInfo::Slider(info) => Box::new(SliderJoint::new(info, transform1, transform2)),
            JointInfo::Fixed(info) => Box::new(FixedJoint::new(info, transform1, transform2)),
            JointInfo::Distance(info) => Box::new(DistanceJoint::new(info, transform1, transform2)),
        }
    }
}

impl From<BallSocketJointInfo> for JointInfo {
    fn from(info: BallSocketJointInfo) -> Self {
        JointInfo::BallSocket(info)
    }
}

impl From<HingeJointInfo> for JointInfo {
    fn from(info: HingeJointInfo) -> Self {
        JointInfo::Hinge(info)
    }
}

impl From<SliderJointInfo> for JointInfo {
    fn from(info: SliderJointInfo) -> Self {
        JointInfo::Slider(info)
    }
}

impl From<FixedJointInfo> for JointInfo {
    fn from(info: FixedJointInfo) -> Self {
        JointInfo::Fixed(info)
    }
}

impl From<DistanceJointInfo> for JointInfo {
    fn from(info: DistanceJointInfo) -> Self {
        JointInfo::Distance(info)
    }
}

fn check_point(name: &str, point: Vector3) -> Result<()> {
    if point.is_finite() {
        Ok(())
    } else {
        Err(PhysicsError::InvalidParameter(format!("{} point is not finite", name)))
    }
}

fn check_axis(axis: Vector3) -> Result<()> {
    if axis.is_finite() && !axis.is_zero() {
        Ok(())
    } else {
        Err(PhysicsError::InvalidParameter(format!("invalid joint axis {}", axis)))
    }
}

fn check_limits(lower: f32, upper: f32) -> Result<()> {
    if lower.is_finite() && upper.is_finite() && lower <= 0.0 && upper >= 0.0 {
        Ok(())
    } else {
        Err(PhysicsError::InvalidParameter(format!(
            "joint limits must satisfy lower <= 0 <= upper, got [{}, {}]",
            lower, upper
        )))
    }
}

fn check_motor(max: f32) -> Result<()> {
    if max.is_finite() && max >= 0.0 {
        Ok(())
    } else {
        Err(PhysicsError::InvalidParameter(format!("invalid maximum motor effort {}", max)))
    }
}

/// Effective mass matrix of a point-to-point constraint:
/// `(m1⁻¹ + m2⁻¹)·I₃ + [r1]·I1⁻¹·[r1]ᵀ + [r2]·I2⁻¹·[r2]ᵀ`
pub(crate) fn point_mass_matrix(data: &ConstraintSolverData<'_>, r1: Vector3, r2: Vector3) -> Matrix3 {
    let (m1, m2) = data.inverse_masses();
    let (i1, i2) = data.inverse_inertias();
    let skew1 = Matrix3::skew_symmetric(r1);
    let skew2 = Matrix3::skew_symmetric(r2);
    Matrix3::identity().scale(m1 + m2)
        + skew1 * i1 * skew1.transpose()
        + skew2 * i2 * skew2.transpose()
}

/// Inverse of a constraint mass matrix; a singular matrix disables the constraint
#[inline]
pub(crate) fn inverse_or_zero(matrix: Matrix3) -> Matrix3 {
    matrix.inverse().unwrap_or_else(Matrix3::zero)
}

#[inline]
pub(crate) fn scalar_inverse_or_zero(value: f32) -> f32 {
    if value > 0.0 {
        1.0 / value
    } else {
        0.0
    }
}

/// 2x2 block of the two-row constraints of the hinge and slider joints
pub(crate) type Matrix2 = na::Matrix2<f32>;

/// Inverse of a 2x2 constraint mass matrix; a singular matrix disables the block
#[inline]
pub(crate) fn inverse2_or_zero(matrix: Matrix2) -> Matrix2 {
    matrix.try_inverse().unwrap_or_else(Matrix2::zeros)
}

/// Applies a 2x2 block to a pair of constraint rows
#[inline]
pub(crate) fn mul2(matrix: &Matrix2, v: [f32; 2]) -> [f32; 2] {
    let product = matrix * na::Vector2::new(v[0], v[1]);
    [product.x, product.y]
}

