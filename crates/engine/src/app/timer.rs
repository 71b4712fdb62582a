/// Steps within this fraction of the armed duration count as having reached it.
const EXPIRY_TOLERANCE: f64 = 1.0e-5;

/// Cooperative countdown advanced by the fixed tick.
///
/// Expiry is reported exactly once, on the tick whose accumulated time reaches
/// the armed duration. Cancelling never reports expiry.
///
/// Elapsed time is summed in `f64` and compared with a relative tolerance, so
/// a duration of `n` steps of `1/tps` expires on step `n` even though the
/// `f32` step is not exact.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TimerGate {
    duration: f32,
    elapsed: f64,
    active: bool,
}

impl TimerGate {
    pub const fn idle() -> Self {
        Self {
            duration: 0.0,
            elapsed: 0.0,
            active: false,
        }
    }

    pub fn armed(duration_seconds: f32) -> Self {
        let mut gate = Self::idle();
        gate.arm(duration_seconds);
        gate
    }

    /// Restarts the countdown. Re-arming replaces the remaining time.
    pub fn arm(&mut self, duration_seconds: f32) {
        self.duration = sanitize_duration(duration_seconds);
        self.elapsed = 0.0;
        self.active = true;
    }

    pub fn tick(&mut self, dt_seconds: f32) -> bool {
        if !self.active {
            return false;
        }
        self.elapsed += f64::from(sanitize_duration(dt_seconds));
        let duration = f64::from(self.duration);
        if self.elapsed >= duration - duration * EXPIRY_TOLERANCE {
            self.elapsed = duration;
            self.active = false;
            return true;
        }
        false
    }

    pub fn cancel(&mut self) -> bool {
        let was_active = self.active;
        self.active = false;
        self.duration = 0.0;
        self.elapsed = 0.0;
        was_active
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn remaining(&self) -> f32 {
        (f64::from(self.duration) - self.elapsed).max(0.0) as f32
    }
}

fn sanitize_duration(value: f32) -> f32 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        0.0
    }
}
