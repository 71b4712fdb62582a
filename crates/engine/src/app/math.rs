use std::ops::{Add, AddAssign, Mul, Sub};

use serde::{Deserialize, Serialize};

const DIRECTION_EPSILON_SQ: f32 = 1.0e-8;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn length_squared(self) -> f32 {
        self.x * self.x + self.y * self.y
    }

    pub fn length(self) -> f32 {
        self.length_squared().sqrt()
    }

    /// Scales the vector down so its length is at most `max_length`.
    /// Non-finite components collapse to zero.
    pub fn clamp_length(self, max_length: f32) -> Self {
        if !self.x.is_finite() || !self.y.is_finite() {
            return Self::ZERO;
        }
        let len_sq = self.length_squared();
        let max_length = max_length.max(0.0);
        if len_sq <= max_length * max_length {
            return self;
        }
        let scale = max_length / len_sq.sqrt();
        Self {
            x: self.x * scale,
            y: self.y * scale,
        }
    }
}

/// World-space vector. `y` is up; the ground plane is `x`/`z`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const ZERO: Self = Self {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Maps a planar input vector onto the ground plane (`x` -> `x`, `y` -> `z`).
    pub fn from_planar(value: Vec2) -> Self {
        Self {
            x: value.x,
            y: 0.0,
            z: value.y,
        }
    }

    pub fn length_squared(self) -> f32 {
        self.x * self.x + self.y * self.y + self.z * self.z
    }

    pub fn length(self) -> f32 {
        self.length_squared().sqrt()
    }

    pub fn distance_squared(self, other: Self) -> f32 {
        (other - self).length_squared()
    }

    pub fn distance(self, other: Self) -> f32 {
        self.distance_squared(other).sqrt()
    }

    pub fn horizontal(self) -> Self {
        Self { y: 0.0, ..self }
    }

    /// Linear interpolation with `t` clamped to `[0, 1]`.
    pub fn lerp(self, target: Self, t: f32) -> Self {
        let t = clamp01(t);
        Self {
            x: self.x + (target.x - self.x) * t,
            y: self.y + (target.y - self.y) * t,
            z: self.z + (target.z - self.z) * t,
        }
    }
}

impl Add for Vec3 {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self {
            x: self.x + rhs.x,
            y: self.y + rhs.y,
            z: self.z + rhs.z,
        }
    }
}

impl AddAssign for Vec3 {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl Sub for Vec3 {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self {
            x: self.x - rhs.x,
            y: self.y - rhs.y,
            z: self.z - rhs.z,
        }
    }
}

impl Mul<f32> for Vec3 {
    type Output = Self;

    fn mul(self, rhs: f32) -> Self {
        Self {
            x: self.x * rhs,
            y: self.y * rhs,
            z: self.z * rhs,
        }
    }
}

pub(crate) fn clamp01(value: f32) -> f32 {
    if value.is_nan() {
        return 0.0;
    }
    value.clamp(0.0, 1.0)
}

/// Heading (degrees, 0 = +z, 90 = +x) that looks along the horizontal part of
/// `direction`, or `None` when the direction has no horizontal extent.
pub fn yaw_towards(direction: Vec3) -> Option<f32> {
    let flat = direction.horizontal();
    if flat.length_squared() <= DIRECTION_EPSILON_SQ {
        return None;
    }
    Some(normalize_degrees(flat.x.atan2(flat.z).to_degrees()))
}

pub fn forward_from_yaw(yaw_degrees: f32) -> Vec3 {
    let radians = yaw_degrees.to_radians();
    Vec3 {
        x: radians.sin(),
        y: 0.0,
        z: radians.cos(),
    }
}

/// Wraps an angle into `[0, 360)`.
pub fn normalize_degrees(degrees: f32) -> f32 {
    if !degrees.is_finite() {
        return 0.0;
    }
    let wrapped = degrees.rem_euclid(360.0);
    if wrapped >= 360.0 {
        0.0
    } else {
        wrapped
    }
}

/// Shortest signed difference `target - current`, in `(-180, 180]`.
pub fn delta_angle_degrees(current: f32, target: f32) -> f32 {
    let mut delta = (target - current).rem_euclid(360.0);
    if delta > 180.0 {
        delta -= 360.0;
    }
    delta
}

/// Turns `current` toward `target` by at most `max_delta_degrees`, never
/// overshooting.
pub fn rotate_towards_degrees(current: f32, target: f32, max_delta_degrees: f32) -> f32 {
    let max_delta = max_delta_degrees.max(0.0);
    let delta = delta_angle_degrees(current, target);
    if delta.abs() <= max_delta {
        return normalize_degrees(target);
    }
    normalize_degrees(current + max_delta.copysign(delta))
}

pub fn lerp_angle_degrees(current: f32, target: f32, t: f32) -> f32 {
    let delta = delta_angle_degrees(current, target);
    normalize_degrees(current + delta * clamp01(t))
}
