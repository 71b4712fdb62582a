#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
struct CameraPose {
    position: Vec3,
    fov: f32,
}

#[derive(Debug, Clone)]
struct CameraFollow {
    tuning: CameraTuning,
    pose: CameraPose,
}

impl CameraFollow {
    fn new(tuning: CameraTuning, initial_target: Vec3) -> Self {
        Self {
            pose: CameraPose {
                position: initial_target + tuning.offset,
                fov: tuning.default_fov,
            },
            tuning,
        }
    }

    /// Widens the field of view with speed and eases toward the target.
    fn tick(&mut self, dt: f32, target: Vec3, speed_fraction: f32) {
        let wanted_fov = lerp_scalar(
            self.tuning.default_fov,
            self.tuning.max_fov,
            speed_fraction,
        );
        self.pose.fov = lerp_scalar(self.pose.fov, wanted_fov, self.tuning.zoom_speed * dt);
        self.pose.position = self
            .pose
            .position
            .lerp(target + self.tuning.offset, self.tuning.smooth_speed);
    }

    fn pose(&self) -> CameraPose {
        self.pose
    }
}

fn lerp_scalar(from: f32, to: f32, t: f32) -> f32 {
    let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
    from + (to - from) * t
}
