use crate::Handle;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PhysicsError {
    #[error("Failed to initialize the physics world: {0}")]
    Initialization(String),

    #[error("Invalid geometry: {0}")]
    InvalidGeometry(String),

    #[error("Invalid mass {0}: dynamic bodies require a positive, finite mass")]
    InvalidMass(f32),

    #[error("No rigid body exists for handle {0:?}")]
    MissingBody(Handle),
}

pub type Result<T, E = PhysicsError> = std::result::Result<T, E>;
