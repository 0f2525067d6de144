pub mod app {
    pub use dicebox_app::*;
}

pub mod physics {
    pub use dicebox_physics::*;
}

pub mod world {
    pub use dicebox_world::*;
}
