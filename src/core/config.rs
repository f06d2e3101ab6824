use crate::error::PhysicsError;
use crate::math::Vector3;
use crate::Result;

#[cfg(feature = "serialize")]
use serde::{Serialize, Deserialize};

/// Configuration parameters of a dynamics world
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub struct DynamicsConfig {
    /// Fixed time step of one simulation step, in seconds
    pub time_step: f32,

    /// Maximum number of fixed steps run by a single `update` call
    pub max_substeps: u32,

    /// Number of velocity iterations of the contact and joint solvers
    pub nb_iterations_solver: u32,

    pub gravity: Vector3,
    pub is_gravity_on: bool,

    /// Solve the positional error on pseudo velocities that do not feed back
    /// into the body velocities
    pub is_split_impulse_active: bool,

    /// Solve friction once per manifold at its center instead of per contact point
    pub is_solve_friction_at_contact_manifold_center_active: bool,

    /// Apply Baumgarte position correction to contacts and joints
    pub is_error_correction_active: bool,

    /// Start each step from the impulses of the previous one
    pub is_warm_starting_active: bool,

    /// Put resting islands to sleep
    pub is_deactivation_active: bool,

    /// Linear speed below which a body counts as resting
    pub sleep_linear_velocity: f32,

    /// Angular speed (rad/s) below which a body counts as resting
    pub sleep_angular_velocity: f32,

    /// Time an island must rest before it is put to sleep
    pub time_before_sleep: f32,

    /// Minimal approach speed for restitution to apply
    pub restitution_velocity_threshold: f32,

    /// Fraction of the position error corrected per step
    pub baumgarte_factor: f32,

    /// Penetration tolerated before position correction kicks in
    pub slop: f32,

    /// Distance beyond which a cached contact point is dropped from its manifold
    pub persistent_contact_distance_threshold: f32,
}

impl DynamicsConfig {
    /// Checks every parameter. Called before each step.
    pub fn validate(&self) -> Result<()> {
        if !(self.time_step > 0.0 && self.time_step.is_finite()) {
            return Err(PhysicsError::InvalidParameter(format!(
                "time step must be positive and finite, got {}",
                self.time_step
            )));
        }
        if self.nb_iterations_solver == 0 {
            return Err(PhysicsError::InvalidParameter(
                "solver needs at least one iteration".to_string(),
            ));
        }
        if self.max_substeps == 0 {
            return Err(PhysicsError::InvalidParameter(
                "max substeps must be at least one".to_string(),
            ));
        }
        if !self.gravity.is_finite() {
            return Err(PhysicsError::InvalidParameter(format!(
                "gravity must be finite, got {}",
                self.gravity
            )));
        }
        if !(0.0..=1.0).contains(&self.baumgarte_factor) {
            return Err(PhysicsError::InvalidParameter(format!(
                "baumgarte factor must be in [0, 1], got {}",
                self.baumgarte_factor
            )));
        }
        let non_negative = [
            ("slop", self.slop),
            ("sleep linear velocity", self.sleep_linear_velocity),
            ("sleep angular velocity", self.sleep_angular_velocity),
            ("time before sleep", self.time_before_sleep),
            ("restitution velocity threshold", self.restitution_velocity_threshold),
            ("persistent contact distance threshold", self.persistent_contact_distance_threshold),
        ];
        for (name, value) in non_negative {
            if !(value >= 0.0 && value.is_finite()) {
                return Err(PhysicsError::InvalidParameter(format!(
                    "{} must be non-negative and finite, got {}",
                    name, value
                )));
            }
        }
        Ok(())
    }
}

impl Default for DynamicsConfig {
    fn default() -> Self {
        Self {
            time_step: 1.0 / 60.0,
            max_substeps: 8,
            nb_iterations_solver: 10,
            gravity: Vector3::new(0.0, -9.81, 0.0),
            is_gravity_on: true,
            is_split_impulse_active: true,
            is_solve_friction_at_contact_manifold_center_active: true,
            is_error_correction_active: true,
            is_warm_starting_active: true,
            is_deactivation_active: true,
            sleep_linear_velocity: 0.02,
            sleep_angular_velocity: 3.0_f32.to_radians(),
            time_before_sleep: 1.0,
            restitution_velocity_threshold: 1.0,
            baumgarte_factor: 0.2,
            slop: 0.01,
            persistent_contact_distance_threshold: 0.03,
        }
    }
}
