use std::path::PathBuf;

use thiserror::Error;

/// Which override directories to layer over the base content, in load order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContentRequest {
    pub enabled_mods: Vec<String>,
}

impl ContentRequest {
    /// Parses a comma separated mod list such as `ARCADE_ENABLED_MODS`.
    /// Blank segments are skipped so an empty variable means "base only".
    pub fn from_mod_list(raw: &str) -> Self {
        let enabled_mods = raw
            .split(',')
            .map(str::trim)
            .filter(|segment| !segment.is_empty())
            .map(str::to_string)
            .collect();
        Self { enabled_mods }
    }
}

#[derive(Debug, Error)]
pub enum ContentPlanError {
    #[error("enabled mod id cannot be empty")]
    EmptyEnabledMod,
    #[error("duplicate enabled mod id in request: {mod_id}")]
    DuplicateEnabledMod { mod_id: String },
    #[error("enabled mod does not exist on disk: {mod_id} at {expected_dir}")]
    EnabledModMissing {
        mod_id: String,
        expected_dir: PathBuf,
    },
}
