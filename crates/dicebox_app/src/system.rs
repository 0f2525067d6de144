use dicebox_world::Viewport;
use nalgebra_glm as glm;
use std::time::Instant;

pub struct System {
    pub viewport: Viewport,
    pub delta_time: f32,
    /// When set, every frame advances by this many seconds instead of the measured frame time.
    pub fixed_timestep: Option<f32>,
    pub frame: u64,
    pub last_frame: Instant,
    pub exit_requested: bool,
}

impl System {
    pub fn new(width: u32, height: u32) -> Self {
        let now = Instant::now();
        Self {
            last_frame: now,
            delta_time: 0.01,
            fixed_timestep: None,
            frame: 0,
            exit_requested: false,
            viewport: Viewport::new(width as _, height as _),
        }
    }

    pub fn with_fixed_timestep(mut self, timestep: f32) -> Self {
        self.fixed_timestep = Some(timestep);
        self.delta_time = timestep;
        self
    }

    pub fn window_center(&self) -> glm::Vec2 {
        glm::vec2(self.viewport.width / 2.0, self.viewport.height / 2.0)
    }

    /// Starts a new frame and updates the delta time.
    pub fn new_frame(&mut self) {
        let now = Instant::now();
        self.delta_time = match self.fixed_timestep {
            Some(timestep) => timestep,
            None => (now.duration_since(self.last_frame).as_micros() as f64 / 1_000_000_f64) as f32,
        };
        self.last_frame = now;
        self.frame += 1;
    }
}
