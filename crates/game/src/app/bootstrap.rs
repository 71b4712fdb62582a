use std::env;
use std::path::PathBuf;

use arcade_engine::{load_content, AppError, ConfigDatabase, ContentRequest, LoopConfig, SimWorld};
use thiserror::Error;
use tracing::info;
use tracing_subscriber::EnvFilter;

use super::gameplay::{GameplayError, GameplayScene, TracingAnimationSink};
use super::scenario::{load_scenario, ScenarioError, ScenarioFile, ScriptedInput};

const ENABLED_MODS_ENV_VAR: &str = "ARCADE_ENABLED_MODS";
const SCENARIO_ENV_VAR: &str = "ARCADE_SCENARIO";

#[derive(Debug, Error)]
pub(crate) enum BootstrapError {
    #[error(transparent)]
    App(#[from] AppError),
    #[error(transparent)]
    Scenario(#[from] ScenarioError),
    #[error("failed to spawn scenario entities: {0}")]
    Gameplay(#[from] GameplayError),
}

pub(crate) struct AppWiring {
    pub(crate) config: LoopConfig,
    pub(crate) scene: GameplayScene,
    pub(crate) world: SimWorld,
    pub(crate) input: ScriptedInput,
}

pub(crate) fn build_app() -> Result<AppWiring, BootstrapError> {
    info!("=== Arcade Sim Startup ===");

    let content_request = parse_enabled_mods_from_env();
    let scenario_path = env::var_os(SCENARIO_ENV_VAR).map(PathBuf::from);
    let scenario = load_scenario(scenario_path.as_deref())?;
    let (_app_paths, database) = load_content(&content_request)?;
    wire_scenario(scenario, database, content_request)
}

fn wire_scenario(
    scenario: ScenarioFile,
    database: ConfigDatabase,
    content_request: ContentRequest,
) -> Result<AppWiring, BootstrapError> {
    let mut world = SimWorld::default();
    world.set_def_database(database);

    let mut scene = GameplayScene::new(scenario.name.as_str(), Box::new(TracingAnimationSink));
    for spawn in &scenario.spawns {
        scene.spawn_archetype(&mut world, &spawn.def, spawn.position, spawn.player)?;
    }
    if let Some(camera_def) = scenario.camera.as_deref() {
        scene.attach_camera(&world, camera_def)?;
    }

    let config = LoopConfig {
        target_tps: scenario.tick_rate,
        max_ticks: Some(scenario.total_ticks()),
        content_request,
        ..LoopConfig::default()
    };

    Ok(AppWiring {
        config,
        scene,
        world,
        input: ScriptedInput::new(scenario.input),
    })
}

pub(crate) fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_names(true)
        .compact()
        .init();
}

fn parse_enabled_mods_from_env() -> ContentRequest {
    env::var(ENABLED_MODS_ENV_VAR)
        .map(|raw| ContentRequest::from_mod_list(&raw))
        .unwrap_or_default()
}
