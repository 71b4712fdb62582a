use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

use arcade_engine::{
    forward_from_yaw, lerp_angle_degrees, rotate_towards_degrees,
    yaw_towards, CapabilitySet, CapabilityTag, ConfigurationAsset, EntityId, InputSnapshot,
    SimCommand, SimWorld, Simulation, SpatialQuery, TimerGate, Transform, Vec2, Vec3,
};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, trace, warn};

const DEFAULT_ACCELERATION: f32 = 2.0;
const DEFAULT_ROTATION_THRESHOLD: f32 = 0.1;
const DEFAULT_ROTATION_SPEED_DEGREES: f32 = 720.0;
const DEFAULT_GRAVITY: f32 = -9.81;
const DEFAULT_GROUND_HEIGHT: f32 = 0.0;
const DEFAULT_ATTACK_DELAY_SECONDS: f32 = 1.0;
const DEFAULT_ATTACK_DURATION_SECONDS: f32 = 0.1;
const DEFAULT_ATTACK_OFFSET: f32 = 0.5;
const DEFAULT_ATTACK_INTERVAL_SECONDS: f32 = 2.0;
const DEFAULT_MIN_MOVEMENT_SPEED_FOR_ATTACK: f32 = 0.25;
const DEFAULT_FACE_TARGET_SPEED: f32 = 25.0;
const DEFAULT_STOP_DURATION_ON_DAMAGE_SECONDS: f32 = 2.0;
const DEFAULT_DEATH_WAIT_SECONDS: f32 = 2.0;
const DEFAULT_STOP_DURATION_ON_SPECIAL_COLLECT_SECONDS: f32 = 3.0;
const DEFAULT_INTERACTION_DURATION_SECONDS: f32 = 5.0;
const DEFAULT_DEACTIVATE_DELAY_SECONDS: f32 = 1.0;
const DEFAULT_COLLECTABLE_VALUE: f32 = 1.0;
const DEFAULT_CAMERA_FOV: f32 = 60.0;
const DEFAULT_CAMERA_MAX_FOV: f32 = 70.0;
const DEFAULT_CAMERA_ZOOM_SPEED: f32 = 2.0;
const DEFAULT_CAMERA_SMOOTH_SPEED: f32 = 0.125;
const DEFAULT_CAMERA_OFFSET: Vec3 = Vec3 {
    x: 0.0,
    y: 10.0,
    z: -8.0,
};
const MAX_INTENT_PASSES: usize = 8;
const GAMEPLAY_SYSTEM_ORDER_TEXT: &str =
    "InputIntent>Movement>Targeting>CombatResolution>Collection>Interaction>Lifecycle>Camera>Cleanup";

include!("types.rs");
include!("tuning.rs");
include!("movement.rs");
include!("health.rs");
include!("attack.rs");
include!("interaction.rs");
include!("collection.rs");
include!("camera.rs");
include!("systems.rs");
include!("scene_state.rs");
include!("scene_impl.rs");
