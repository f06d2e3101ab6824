mod rigid_body;
mod material;
mod body_type;

pub use self::rigid_body::RigidBody;
pub use self::material::Material;
pub use self::body_type::{RigidBodyType, BodyFlags};
