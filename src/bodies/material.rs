#[cfg(feature = "serialize")]
use serde::{Serialize, Deserialize};

/// Surface properties of a body used by the contact solver
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub struct Material {
    /// Coefficient of restitution (bounciness), in [0, 1]
    pub restitution: f32,

    /// Coefficient of friction, non-negative
    pub friction: f32,
}

impl Material {
    /// Creates a new material
    pub fn new(restitution: f32, friction: f32) -> Self {
        Self {
            restitution,
            friction,
        }
    }

    /// Low friction, some bounce
    pub fn ice() -> Self {
        Self::new(0.4, 0.05)
    }

    /// High friction, strong bounce
    pub fn rubber() -> Self {
        Self::new(0.7, 0.8)
    }

    /// Medium friction, almost no bounce
    pub fn wood() -> Self {
        Self::new(0.2, 0.6)
    }

    /// Restitution of a contact between two materials (the larger one wins)
    #[inline]
    pub fn mix_restitution(a: &Material, b: &Material) -> f32 {
        a.restitution.max(b.restitution)
    }

    /// Friction coefficient of a contact between two materials (geometric mean)
    #[inline]
    pub fn mix_friction(a: &Material, b: &Material) -> f32 {
        (a.friction * b.friction).sqrt()
    }

    /// Returns true if the coefficients are in their valid ranges
    pub fn is_valid(&self) -> bool {
        (0.0..=1.0).contains(&self.restitution) && self.friction >= 0.0 && self.friction.is_finite()
    }
}

impl Default for Material {
    fn default() -> Self {
        Self {
            restitution: 0.5,
            friction: 0.3,
        }
    }
}
