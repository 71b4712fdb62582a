use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use arcade_engine::{InputSnapshot, InputSource, Vec2, Vec3};
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info};

const BUILT_IN_SCENARIO_ORIGIN: &str = "built-in arena";
const BUILT_IN_SCENARIO_JSON: &str = include_str!("../../../../assets/scenarios/arena.json");
const KEYFRAME_TIME_EPSILON: f32 = 1e-4;

#[derive(Debug, Error)]
pub(crate) enum ScenarioError {
    #[error("failed to read scenario {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("parse scenario {origin}: {source}")]
    Parse {
        origin: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("parse scenario {origin} at {path}: {source}")]
    ParseAt {
        origin: String,
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid scenario {origin} at {path}: {message}")]
    Invalid {
        origin: String,
        path: String,
        message: String,
    },
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct ScenarioFile {
    pub(crate) name: String,
    pub(crate) tick_rate: u32,
    pub(crate) duration_seconds: f32,
    #[serde(default)]
    pub(crate) camera: Option<String>,
    pub(crate) spawns: Vec<ScenarioSpawn>,
    #[serde(default)]
    pub(crate) input: Vec<InputKeyframe>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct ScenarioSpawn {
    pub(crate) def: String,
    pub(crate) position: Vec3,
    #[serde(default)]
    pub(crate) player: bool,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct InputKeyframe {
    pub(crate) at_seconds: f32,
    pub(crate) move_vector: Vec2,
}

impl ScenarioFile {
    /// Tick budget covering the whole duration; a partial final tick rounds up.
    pub(crate) fn total_ticks(&self) -> u64 {
        (f64::from(self.duration_seconds) * f64::from(self.tick_rate)).ceil() as u64
    }

    fn validate(&self, origin: &str) -> Result<(), ScenarioError> {
        let invalid = |path: &str, message: String| ScenarioError::Invalid {
            origin: origin.to_string(),
            path: path.to_string(),
            message,
        };

        if self.name.trim().is_empty() {
            return Err(invalid("name", "must not be empty".to_string()));
        }
        if self.tick_rate == 0 {
            return Err(invalid("tick_rate", "expected > 0, got 0".to_string()));
        }
        if !self.duration_seconds.is_finite() || self.duration_seconds <= 0.0 {
            return Err(invalid(
                "duration_seconds",
                format!("expected finite > 0, got {}", self.duration_seconds),
            ));
        }

        let mut player_index = None;
        for (index, spawn) in self.spawns.iter().enumerate() {
            if spawn.def.trim().is_empty() {
                return Err(invalid(
                    &format!("spawns[{index}].def"),
                    "must not be empty".to_string(),
                ));
            }
            let position = spawn.position;
            if !(position.x.is_finite() && position.y.is_finite() && position.z.is_finite()) {
                return Err(invalid(
                    &format!("spawns[{index}].position"),
                    "components must be finite".to_string(),
                ));
            }
            if spawn.player {
                if let Some(first) = player_index {
                    return Err(invalid(
                        &format!("spawns[{index}].player"),
                        format!("at most one player allowed, first is spawns[{first}]"),
                    ));
                }
                player_index = Some(index);
            }
        }

        let mut previous = f32::NEG_INFINITY;
        for (index, keyframe) in self.input.iter().enumerate() {
            let move_vector = keyframe.move_vector;
            if !keyframe.at_seconds.is_finite()
                || !move_vector.x.is_finite()
                || !move_vector.y.is_finite()
            {
                return Err(invalid(
                    &format!("input[{index}]"),
                    "values must be finite".to_string(),
                ));
            }
            if keyframe.at_seconds < previous {
                return Err(invalid(
                    &format!("input[{index}].at_seconds"),
                    format!(
                        "expected non-decreasing times, got {} after {}",
                        keyframe.at_seconds, previous
                    ),
                ));
            }
            previous = keyframe.at_seconds;
        }
        Ok(())
    }
}

/// Loads the scenario at `path`, or the built-in arena when none is given.
pub(crate) fn load_scenario(path: Option<&Path>) -> Result<ScenarioFile, ScenarioError> {
    let scenario = match path {
        Some(path) => {
            let raw = fs::read_to_string(path).map_err(|source| ScenarioError::Read {
                path: path.to_path_buf(),
                source,
            })?;
            parse_scenario_json(&raw, &path.display().to_string())?
        }
        None => parse_scenario_json(BUILT_IN_SCENARIO_JSON, BUILT_IN_SCENARIO_ORIGIN)?,
    };
    info!(
        scenario = %scenario.name,
        tick_rate = scenario.tick_rate,
        duration_seconds = scenario.duration_seconds,
        spawns = scenario.spawns.len(),
        keyframes = scenario.input.len(),
        "scenario_loaded"
    );
    Ok(scenario)
}

fn parse_scenario_json(raw: &str, origin: &str) -> Result<ScenarioFile, ScenarioError> {
    let mut deserializer = serde_json::Deserializer::from_str(raw);
    let scenario = match serde_path_to_error::deserialize::<_, ScenarioFile>(&mut deserializer) {
        Ok(scenario) => scenario,
        Err(error) => {
            let path = error.path().to_string();
            let source = error.into_inner();
            return Err(if path.is_empty() || path == "." {
                ScenarioError::Parse {
                    origin: origin.to_string(),
                    source,
                }
            } else {
                ScenarioError::ParseAt {
                    origin: origin.to_string(),
                    path,
                    source,
                }
            });
        }
    };
    scenario.validate(origin)?;
    Ok(scenario)
}

/// Replays scenario keyframes. Each keyframe's vector holds until the next.
#[derive(Debug, Clone)]
pub(crate) struct ScriptedInput {
    keyframes: Vec<InputKeyframe>,
    next_keyframe: usize,
    current: Vec2,
}

impl ScriptedInput {
    pub(crate) fn new(keyframes: Vec<InputKeyframe>) -> Self {
        Self {
            keyframes,
            next_keyframe: 0,
            current: Vec2::ZERO,
        }
    }
}

impl InputSource for ScriptedInput {
    fn poll(&mut self, sim_time_seconds: f32) -> InputSnapshot {
        while let Some(keyframe) = self.keyframes.get(self.next_keyframe) {
            if keyframe.at_seconds > sim_time_seconds + KEYFRAME_TIME_EPSILON {
                break;
            }
            self.current = keyframe.move_vector;
            self.next_keyframe += 1;
            debug!(
                at_seconds = keyframe.at_seconds,
                x = self.current.x,
                y = self.current.y,
                "input_keyframe"
            );
        }
        InputSnapshot::empty().with_move_vector(self.current)
    }
}
