use crate::math::{Transform, Vector3};

/// Trait for position integration schemes.
///
/// Velocities are already final for the step when the integrator runs; it only
/// advances the transform.
pub trait Integrator: Send + Sync {
    /// Returns the transform reached from `transform` after `dt` at the given velocities
    fn integrate(
        &self,
        transform: &Transform,
        linear_velocity: Vector3,
        angular_velocity: Vector3,
        dt: f32,
    ) -> Transform;

    /// Returns the name of the integrator
    fn name(&self) -> &str;
}
