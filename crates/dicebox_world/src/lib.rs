mod camera;
mod geometry;
mod scene;
mod transform;

pub use self::{camera::*, geometry::*, scene::*, transform::*};
