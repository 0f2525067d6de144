mod config;
mod constraint;
mod error;
mod interaction;
mod registry;
mod shape;
mod sync;
mod world;

#[cfg(test)]
mod testing;

pub use self::{
    config::*, constraint::*, error::*, interaction::*, registry::*, shape::*, sync::*, world::*,
};
pub use rapier3d;

pub type Handle = rapier3d::dynamics::RigidBodyHandle;
pub type ColliderHandle = rapier3d::geometry::ColliderHandle;
