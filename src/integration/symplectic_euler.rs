use crate::integration::Integrator;
use crate::math::{Transform, Vector3};

/// Semi-implicit Euler: positions advance with the velocities of the end of the step.
///
/// `x' = x + v·dt` and `q' = normalize(q + ½·(0, ω)·q·dt)`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SymplecticEulerIntegrator;

impl SymplecticEulerIntegrator {
    pub fn new() -> Self {
        Self
    }
}

impl Integrator for SymplecticEulerIntegrator {
    fn integrate(
        &self,
        transform: &Transform,
        linear_velocity: Vector3,
        angular_velocity: Vector3,
        dt: f32,
    ) -> Transform {
        Transform::new(
            transform.position + linear_velocity * dt,
            transform.orientation.integrate(angular_velocity, dt),
        )
    }

    fn name(&self) -> &str {
        "SymplecticEuler"
    }
}
