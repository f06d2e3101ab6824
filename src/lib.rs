pub mod math;
pub mod core;
pub mod bodies;
pub mod shapes;
pub mod collision;
pub mod constraints;
pub mod integration;

/// Re-export common types for easier usage
pub use crate::core::{BodyHandle, DynamicsConfig, DynamicsWorld, JointHandle};
pub use crate::bodies::{Material, RigidBody, RigidBodyType};
pub use crate::constraints::JointInfo;
pub use crate::math::{Matrix3, Quaternion, Transform, Vector3};
pub use crate::error::PhysicsError;

/// Error types for the dynamics engine
pub mod error {
    use thiserror::Error;

    #[derive(Error, Debug, Clone, PartialEq)]
    pub enum PhysicsError {
        #[error("Invalid parameter: {0}")]
        InvalidParameter(String),

        #[error("Resource not found: {0}")]
        ResourceNotFound(String),

        #[error("Simulation stability error: {0}")]
        SimulationError(String),

        #[error("Internal error: {0}")]
        InternalError(String),
    }
}

/// Result type for dynamics engine operations
pub type Result<T> = std::result::Result<T, error::PhysicsError>;

/// Engine version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
