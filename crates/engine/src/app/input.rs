use super::Vec2;

/// Raw input sampled once per tick.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct InputSnapshot {
    move_vector: Vec2,
    quit_requested: bool,
}

impl InputSnapshot {
    pub fn empty() -> Self {
        Self::default()
    }

    /// The vector is clamped to unit length; non-finite input reads as zero.
    pub fn with_move_vector(mut self, move_vector: Vec2) -> Self {
        self.move_vector = move_vector.clamp_length(1.0);
        self
    }

    pub fn with_quit_requested(mut self, quit_requested: bool) -> Self {
        self.quit_requested = quit_requested;
        self
    }

    pub fn move_vector(&self) -> Vec2 {
        self.move_vector
    }

    pub fn quit_requested(&self) -> bool {
        self.quit_requested
    }
}

pub trait InputSource {
    fn poll(&mut self, sim_time_seconds: f32) -> InputSnapshot;
}
