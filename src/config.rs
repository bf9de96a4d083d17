//! Configuration module for persistent settings.
//!
//! Loads, saves, and validates controller and demo configuration stored
//! as JSON.

use crate::error::ConfigError;
use crate::frame_window::DEFAULT_WINDOW_CAPACITY;
use crate::quality::{QualityLevel, QualityTable};
use crate::simulation::SimulationConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;

/// Tuning for the quality controller.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct ControllerConfig {
    pub target_fps: f64,
    /// Exponential smoothing factor applied to the FPS readout
    pub smoothing_factor: f64,
    /// Frame-time window capacity
    pub sample_window: usize,
    /// Samples required before any automatic adjustment
    pub min_samples: usize,
    pub low_fps_threshold: f64,
    pub high_fps_threshold: f64,
    /// Base streak length; scaled by 0.8 for drops and 2.5 for increases
    pub required_consecutive_frames: u32,
    pub cooldown_frames: u32,
    /// Headroom subtracted from the target frame time, in ms
    pub budget_margin_ms: f64,
    pub auto_adjust: bool,
    pub initial_level: QualityLevel,
    pub quality_levels: QualityTable,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            target_fps: 60.0,
            smoothing_factor: 0.1,
            sample_window: DEFAULT_WINDOW_CAPACITY,
            min_samples: 60,
            low_fps_threshold: 50.0,
            high_fps_threshold: 59.0,
            required_consecutive_frames: 60,
            cooldown_frames: 120,
            budget_margin_ms: 2.0,
            auto_adjust: false,
            initial_level: QualityLevel::Ultra,
            quality_levels: QualityTable::default(),
        }
    }
}

impl ControllerConfig {
    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.target_fps.is_finite() && self.target_fps > 0.0) {
            return Err(ConfigError::ValidationError(format!(
                "target_fps ({}) must be a positive number",
                self.target_fps
            )));
        }

        if !(self.smoothing_factor > 0.0 && self.smoothing_factor <= 1.0) {
            return Err(ConfigError::ValidationError(format!(
                "smoothing_factor ({}) must be in (0, 1]",
                self.smoothing_factor
            )));
        }

        if self.sample_window == 0 {
            return Err(ConfigError::ValidationError(
                "sample_window must be at least 1".to_string(),
            ));
        }

        if self.min_samples > self.sample_window {
            return Err(ConfigError::ValidationError(format!(
                "min_samples ({}) cannot exceed sample_window ({})",
                self.min_samples, self.sample_window
            )));
        }

        if self.low_fps_threshold > self.high_fps_threshold {
            return Err(ConfigError::ValidationError(format!(
                "low_fps_threshold ({}) cannot be greater than high_fps_threshold ({})",
                self.low_fps_threshold, self.high_fps_threshold
            )));
        }

        if self.required_consecutive_frames == 0 {
            return Err(ConfigError::ValidationError(
                "required_consecutive_frames must be at least 1".to_string(),
            ));
        }

        if !(self.budget_margin_ms.is_finite() && self.budget_margin_ms >= 0.0) {
            return Err(ConfigError::ValidationError(format!(
                "budget_margin_ms ({}) must be a non-negative number",
                self.budget_margin_ms
            )));
        }

        self.quality_levels
            .validate()
            .map_err(ConfigError::ValidationError)
    }
}

/// Application configuration.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    pub controller: ControllerConfig,
    pub simulation: SimulationConfig,
}

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.controller.validate()?;
        self.simulation.validate()
    }
}

/// Load configuration from `path`, or defaults if the file doesn't exist.
pub fn load_or_default(path: &Path) -> Result<Config, ConfigError> {
    if !path.exists() {
        return Ok(Config::default());
    }

    let contents = fs::read_to_string(path)
        .map_err(|e| ConfigError::ParseError(format!("Failed to read config file: {}", e)))?;

    let config: Config = serde_json::from_str(&contents)
        .map_err(|e| ConfigError::ParseError(format!("Invalid JSON: {}", e)))?;

    config.validate()?;
    Ok(config)
}

/// Like `load_or_default`, but writes the defaults out on first launch so
/// there is a file to edit.
pub fn load_or_init(path: &Path) -> Result<Config, ConfigError> {
    if path.exists() {
        return load_or_default(path);
    }

    let config = Config::default();
    save(&config, path)?;
    info!("Wrote default configuration to {:?}", path);
    Ok(config)
}

/// Validate and save `config` to `path` using an atomic write.
pub fn save(config: &Config, path: &Path) -> Result<(), ConfigError> {
    config.validate()?;

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    // Write to temp file, then rename
    let temp_path = path.with_extension("json.tmp");
    let json = serde_json::to_string_pretty(config)
        .map_err(|e| ConfigError::ParseError(format!("Failed to serialize config: {}", e)))?;

    {
        let mut file = fs::File::create(&temp_path)?;
        file.write_all(json.as_bytes())?;
        file.sync_all()?;
    }

    fs::rename(&temp_path, path)?;

    Ok(())
}

/// Default config path (`<config dir>/adaptive-quality/config.json`).
///
/// `ADAPTIVE_QUALITY_CONFIG` overrides the location.
pub fn default_path() -> PathBuf {
    if let Some(path) = std::env::var_os("ADAPTIVE_QUALITY_CONFIG") {
        return PathBuf::from(path);
    }
    config_dir().join("config.json")
}

fn config_dir() -> PathBuf {
    dirs::config_dir()
        .map(|dir| dir.join("adaptive-quality"))
        .unwrap_or_else(|| std::env::temp_dir().join("adaptive-quality"))
}
