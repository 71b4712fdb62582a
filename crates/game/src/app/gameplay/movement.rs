/// Sole writer of an entity's transform.
///
/// Horizontal velocity eases toward `input * max_speed`; vertical motion is a
/// simple gravity integration clamped at the ground height. Rotation follows
/// the horizontal velocity once it is above the rotation threshold.
#[derive(Debug, Clone)]
struct MovementIntegrator {
    tuning: MovementTuning,
    input_direction: Vec3,
    velocity: Vec3,
    vertical_velocity: f32,
    grounded: bool,
    speed_fraction: f32,
    pause: TimerGate,
    enabled: bool,
}

impl MovementIntegrator {
    fn new(tuning: MovementTuning) -> Self {
        Self {
            tuning,
            input_direction: Vec3::ZERO,
            velocity: Vec3::ZERO,
            vertical_velocity: 0.0,
            grounded: true,
            speed_fraction: 0.0,
            pause: TimerGate::idle(),
            enabled: true,
        }
    }

    fn set_input_vector(&mut self, input: Vec2) {
        self.input_direction = Vec3::from_planar(input.clamp_length(1.0));
    }

    fn tick(&mut self, dt: f32, transform: &mut Transform) {
        if !self.enabled {
            return;
        }

        let paused = self.pause.is_active() && !self.pause.tick(dt);
        if paused {
            self.velocity = Vec3::ZERO;
        } else {
            let target = self.input_direction * self.tuning.max_speed;
            let t = (self.tuning.acceleration * dt).clamp(0.0, 1.0);
            self.velocity = self.velocity.lerp(target, t);
        }
        self.speed_fraction = if self.tuning.max_speed > 0.0 {
            (self.velocity.length() / self.tuning.max_speed).clamp(0.0, 1.0)
        } else {
            0.0
        };

        transform.position += self.velocity * dt;
        self.integrate_vertical(dt, transform);

        let threshold = self.tuning.rotation_threshold;
        if self.velocity.length_squared() >= threshold * threshold {
            if let Some(target_yaw) = yaw_towards(self.velocity) {
                transform.yaw_degrees = rotate_towards_degrees(
                    transform.yaw_degrees,
                    target_yaw,
                    self.tuning.rotation_speed_degrees * dt,
                );
            }
        }
    }

    fn integrate_vertical(&mut self, dt: f32, transform: &mut Transform) {
        if self.grounded && self.vertical_velocity < 0.0 {
            self.vertical_velocity = 0.0;
        }
        self.vertical_velocity += self.tuning.gravity * dt;
        transform.position.y += self.vertical_velocity * dt;
        if transform.position.y <= self.tuning.ground_height {
            transform.position.y = self.tuning.ground_height;
            self.grounded = true;
        } else {
            self.grounded = false;
        }
    }

    /// Returns `false` without touching the running pause when already paused.
    fn pause_movement(&mut self, seconds: f32) -> bool {
        if self.pause.is_active() {
            return false;
        }
        self.pause.arm(seconds);
        self.velocity = Vec3::ZERO;
        self.speed_fraction = 0.0;
        true
    }

    fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        if !enabled {
            self.velocity = Vec3::ZERO;
            self.vertical_velocity = 0.0;
            self.speed_fraction = 0.0;
            self.pause.cancel();
        }
    }

    /// Turns toward `point` by `fraction` of the remaining angular gap.
    fn turn_towards(&self, transform: &mut Transform, point: Vec3, fraction: f32) {
        if let Some(target_yaw) = yaw_towards(point - transform.position) {
            transform.yaw_degrees = lerp_angle_degrees(transform.yaw_degrees, target_yaw, fraction);
        }
    }

    #[cfg(test)]
    fn is_paused(&self) -> bool {
        self.pause.is_active()
    }

    fn speed_fraction(&self) -> f32 {
        self.speed_fraction
    }

    #[cfg(test)]
    fn velocity(&self) -> Vec3 {
        self.velocity
    }
}
