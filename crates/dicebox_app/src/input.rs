use nalgebra_glm as glm;

/// Pointer input in window pixels, origin at the top left.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MouseInput {
    Moved(glm::Vec2),
    Pressed,
    Released,
}

pub struct Input {
    pub mouse: Mouse,
    pub allowed: bool,
}

impl Default for Input {
    fn default() -> Self {
        Self {
            mouse: Mouse::default(),
            allowed: true,
        }
    }
}

impl Input {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn handle_mouse(&mut self, input: MouseInput) {
        self.mouse.handle_input(input);
    }
}

#[derive(Default)]
pub struct Mouse {
    pub is_left_clicked: bool,
    pub position: glm::Vec2,
    pub position_delta: glm::Vec2,
    pub moved: bool,
}

impl Mouse {
    pub fn handle_input(&mut self, input: MouseInput) {
        match input {
            MouseInput::Moved(position) => self.cursor_moved(position),
            MouseInput::Pressed => self.is_left_clicked = true,
            MouseInput::Released => self.is_left_clicked = false,
        }
    }

    /// Clears the per-frame motion state.
    pub fn new_frame(&mut self) {
        if !self.moved {
            self.position_delta = glm::vec2(0.0, 0.0);
        }
        self.moved = false;
    }

    fn cursor_moved(&mut self, position: glm::Vec2) {
        let last_position = self.position;
        self.position = position;
        self.position_delta = position - last_position;
        self.moved = true;
    }
}
