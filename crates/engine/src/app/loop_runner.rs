use std::thread;
use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::info;

use crate::content::{compile_config_database, ConfigDatabase, ContentCompileError};
use crate::{resolve_app_paths, AppPaths, ContentRequest, StartupError};

use super::metrics::MetricsAccumulator;
use super::{InputSource, MetricsHandle, SimCommand, SimWorld, Simulation};

#[derive(Debug, Clone)]
pub struct LoopConfig {
    pub target_tps: u32,
    /// Stop after this many ticks. `None` runs until quit or the simulation stops.
    pub max_ticks: Option<u64>,
    /// Sleep so ticks line up with wall-clock time.
    pub realtime: bool,
    pub metrics_log_interval: Duration,
    pub content_request: ContentRequest,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            target_tps: 60,
            max_ticks: None,
            realtime: false,
            metrics_log_interval: Duration::from_secs(1),
            content_request: ContentRequest::default(),
        }
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Startup(#[from] StartupError),
    #[error("failed to compile content database: {0}")]
    Content(#[from] ContentCompileError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    TickLimit,
    QuitRequested,
    SimulationStopped,
}

impl StopReason {
    pub const fn as_str(self) -> &'static str {
        match self {
            StopReason::TickLimit => "tick_limit",
            StopReason::QuitRequested => "quit_requested",
            StopReason::SimulationStopped => "simulation_stopped",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunSummary {
    pub ticks: u64,
    pub simulated_seconds: f64,
    pub stop_reason: StopReason,
}

/// Resolves the project root and compiles the configuration database from
/// the base content plus the requested override directories.
pub fn load_content(request: &ContentRequest) -> Result<(AppPaths, ConfigDatabase), AppError> {
    let app_paths = resolve_app_paths()?;
    info!(
        root = %app_paths.root.display(),
        base_content_dir = %app_paths.base_content_dir.display(),
        mods_dir = %app_paths.mods_dir.display(),
        "startup"
    );
    let database = compile_config_database(&app_paths, request)?;
    Ok((app_paths, database))
}

pub fn run_headless(
    config: &LoopConfig,
    simulation: &mut dyn Simulation,
    world: &mut SimWorld,
    input: &mut dyn InputSource,
) -> RunSummary {
    let metrics_handle = MetricsHandle::default();
    run_headless_with_metrics(config, simulation, world, input, &metrics_handle)
}

pub fn run_headless_with_metrics(
    config: &LoopConfig,
    simulation: &mut dyn Simulation,
    world: &mut SimWorld,
    input: &mut dyn InputSource,
    metrics_handle: &MetricsHandle,
) -> RunSummary {
    let target_tps = config.target_tps.max(1);
    let metrics_log_interval =
        normalize_non_zero_duration(config.metrics_log_interval, Duration::from_secs(1));
    let fixed_dt = Duration::from_secs_f64(1.0 / target_tps as f64);
    let fixed_dt_seconds = fixed_dt.as_secs_f32();

    info!(
        target_tps,
        max_ticks = config.max_ticks.unwrap_or(0),
        realtime = config.realtime,
        metrics_log_interval_ms = metrics_log_interval.as_millis() as u64,
        "loop_config"
    );

    simulation.load(world);
    world.apply_pending();
    info!(entity_count = world.entity_count(), "simulation_loaded");

    let mut ticks: u64 = 0;
    let mut metrics_accumulator = MetricsAccumulator::new(metrics_log_interval, Instant::now());
    let stop_reason = loop {
        if config.max_ticks.is_some_and(|limit| ticks >= limit) {
            break StopReason::TickLimit;
        }

        let tick_start = Instant::now();
        let sim_time_seconds = simulated_seconds(ticks, fixed_dt_seconds);
        let snapshot = input.poll(sim_time_seconds as f32);
        if snapshot.quit_requested() {
            info!(reason = "input", tick = ticks, "shutdown_requested");
            break StopReason::QuitRequested;
        }

        let command = simulation.update(fixed_dt_seconds, &snapshot, world);
        world.apply_pending();
        ticks = ticks.saturating_add(1);

        let tick_end = Instant::now();
        metrics_accumulator.record_tick(tick_end.saturating_duration_since(tick_start));
        let simulated = simulated_seconds(ticks, fixed_dt_seconds) as f32;
        if let Some(metrics) = metrics_accumulator.maybe_snapshot(tick_end, simulated) {
            metrics_handle.publish(metrics);
            log_metrics(&metrics, world, simulation);
        }

        if command == SimCommand::Stop {
            info!(reason = "simulation", tick = ticks, "shutdown_requested");
            break StopReason::SimulationStopped;
        }

        if config.realtime {
            let pacing_sleep = compute_pacing_sleep(tick_end.duration_since(tick_start), fixed_dt);
            if pacing_sleep > Duration::ZERO {
                thread::sleep(pacing_sleep);
            }
        }
    };

    let final_metrics = metrics_accumulator.flush(
        Instant::now(),
        simulated_seconds(ticks, fixed_dt_seconds) as f32,
    );
    metrics_handle.publish(final_metrics);

    simulation.unload(world);
    let summary = RunSummary {
        ticks,
        simulated_seconds: simulated_seconds(ticks, fixed_dt_seconds),
        stop_reason,
    };
    info!(
        ticks = summary.ticks,
        simulated_seconds = summary.simulated_seconds,
        stop_reason = summary.stop_reason.as_str(),
        "shutdown"
    );
    summary
}

fn log_metrics(
    metrics: &super::LoopMetricsSnapshot,
    world: &SimWorld,
    simulation: &dyn Simulation,
) {
    info!(
        tps = metrics.tps,
        tick_time_ms = metrics.tick_time_ms,
        simulated_seconds = metrics.simulated_seconds,
        entity_count = world.entity_count(),
        title = simulation.debug_title(world).as_deref().unwrap_or(""),
        "loop_metrics"
    );
}

fn simulated_seconds(ticks: u64, fixed_dt_seconds: f32) -> f64 {
    ticks as f64 * fixed_dt_seconds as f64
}

fn normalize_non_zero_duration(value: Duration, fallback: Duration) -> Duration {
    if value.is_zero() {
        fallback
    } else {
        value
    }
}

fn compute_pacing_sleep(elapsed: Duration, target: Duration) -> Duration {
    target.saturating_sub(elapsed)
}
