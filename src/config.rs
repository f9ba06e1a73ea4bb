// SPDX-License-Identifier: GPL-3.0-only

//! User configuration
//!
//! Persisted as JSON under the user config directory. Missing or invalid
//! files fall back to defaults; unknown fields are ignored so older builds
//! can read newer files.

use crate::constants::{
    APP_DIR_NAME, DEFAULT_CAPTURE_HEIGHT, DEFAULT_CAPTURE_WIDTH, DEFAULT_ENGINE_ENDPOINT,
    DEFAULT_NUM_FACES,
};
use crate::engine::EngineOptions;
use crate::errors::{AppError, AppResult};
use crate::state::DisplayMode;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::warn;

/// Inference engine settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    /// Address of the inference service
    pub endpoint: String,
    /// Model asset the service should load
    pub model_asset_path: String,
    /// Connector topology file shipped with the model data
    pub topology_path: Option<PathBuf>,
    /// Maximum faces per frame
    pub num_faces: usize,
    /// Whether to request blend-shape scores
    pub output_blend_shapes: bool,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENGINE_ENDPOINT.to_string(),
            model_asset_path: "face_landmarker.task".to_string(),
            topology_path: None,
            num_faces: DEFAULT_NUM_FACES,
            output_blend_shapes: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Overlay mode restored at startup
    pub mode: DisplayMode,
    /// Mirror camera preview horizontally (selfie mode)
    pub mirror_preview: bool,
    /// V4L2 camera index
    pub camera_index: usize,
    /// Requested capture resolution
    pub capture_width: u32,
    pub capture_height: u32,
    /// Inference engine settings
    pub engine: EngineSettings,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            mode: DisplayMode::default(),
            mirror_preview: true, // Default to mirrored (selfie mode)
            camera_index: 0,
            capture_width: DEFAULT_CAPTURE_WIDTH,
            capture_height: DEFAULT_CAPTURE_HEIGHT,
            engine: EngineSettings::default(),
        }
    }
}

impl Config {
    /// Path of the persisted config file
    pub fn path() -> Option<PathBuf> {
        Some(dirs::config_dir()?.join(APP_DIR_NAME).join("config.json"))
    }

    /// Load the config, falling back to defaults on any failure
    pub fn load() -> Config {
        let Some(path) = Self::path() else {
            return Config::default();
        };
        match std::fs::read_to_string(&path) {
            Ok(data) => match serde_json::from_str(&data) {
                Ok(config) => config,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Invalid config, using defaults");
                    Config::default()
                }
            },
            Err(_) => Config::default(),
        }
    }

    /// Persist the config
    pub fn save(&self) -> AppResult<()> {
        let path = Self::path().ok_or(AppError::Config("no config directory".to_string()))?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_string_pretty(self)
            .map_err(|e| AppError::Config(e.to_string()))?;
        std::fs::write(&path, data)?;
        Ok(())
    }

    /// Engine options derived from the settings
    pub fn engine_options(&self) -> EngineOptions {
        EngineOptions {
            model_asset_path: self.engine.model_asset_path.clone(),
            num_faces: self.engine.num_faces,
            output_blend_shapes: self.engine.output_blend_shapes,
        }
    }
}
