mod input;
mod loop_runner;
mod math;
mod metrics;
mod spatial;
mod timer;
mod world;

pub use input::{InputSnapshot, InputSource};
pub use loop_runner::{
    load_content, run_headless, run_headless_with_metrics, AppError, LoopConfig, RunSummary,
    StopReason,
};
pub use math::{
    delta_angle_degrees, forward_from_yaw, lerp_angle_degrees, normalize_degrees,
    rotate_towards_degrees, yaw_towards, Vec2, Vec3,
};
pub use metrics::{LoopMetricsSnapshot, MetricsHandle};
pub use spatial::{CapabilitySet, CapabilityTag, SpatialQuery, UnknownCapabilityTag};
pub use timer::TimerGate;
pub use world::{Entity, EntityId, SimCommand, SimWorld, Simulation, Transform};
