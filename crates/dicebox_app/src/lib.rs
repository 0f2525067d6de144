mod app;
mod input;
mod logger;
mod settings;
mod system;
mod tray;

pub use self::{app::*, input::*, logger::*, settings::*, system::*, tray::*};
