//! Simulated renderer for the demo binary.
//!
//! Frame cost scales with the iteration count and the square of the pixel
//! ratio of the active settings, multiplied by a scripted scene load. The
//! renderer reconfigures itself from `qualitychange` events.

use crate::controller::{QualityChange, QualityController};
use crate::error::ConfigError;
use crate::quality::QualitySettings;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::info;

/// One segment of the scripted load profile.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct LoadPhase {
    /// Number of frames the phase lasts
    pub frames: u64,
    /// Cost multiplier during the phase
    pub load_factor: f64,
}

/// Demo render loop configuration.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct SimulationConfig {
    /// Fixed per-frame cost in ms
    pub base_cost_ms: f64,
    /// Cost per raymarch iteration at pixel ratio 1.0, in ms
    pub cost_per_iteration_ms: f64,
    /// Added when bloom is on, in ms
    pub bloom_cost_ms: f64,
    /// Added when shadows are on, in ms
    pub shadow_cost_ms: f64,
    /// Load profile, repeated once exhausted
    pub phases: Vec<LoadPhase>,
    /// Log a stats line every N frames (0 disables)
    pub report_every_frames: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            base_cost_ms: 1.5,
            cost_per_iteration_ms: 0.0125,
            bloom_cost_ms: 0.75,
            shadow_cost_ms: 1.25,
            phases: vec![
                LoadPhase {
                    frames: 600,
                    load_factor: 1.0,
                },
                LoadPhase {
                    frames: 900,
                    load_factor: 2.5,
                },
                LoadPhase {
                    frames: 1200,
                    load_factor: 0.5,
                },
            ],
            report_every_frames: 60,
        }
    }
}

impl SimulationConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let costs = [
            ("base_cost_ms", self.base_cost_ms),
            ("cost_per_iteration_ms", self.cost_per_iteration_ms),
            ("bloom_cost_ms", self.bloom_cost_ms),
            ("shadow_cost_ms", self.shadow_cost_ms),
        ];
        for (name, value) in costs {
            if !(value.is_finite() && value >= 0.0) {
                return Err(ConfigError::ValidationError(format!(
                    "{} ({}) must be a non-negative number",
                    name, value
                )));
            }
        }

        for (i, phase) in self.phases.iter().enumerate() {
            if phase.frames == 0 {
                return Err(ConfigError::ValidationError(format!(
                    "phase {} must last at least one frame",
                    i
                )));
            }
            if !(phase.load_factor.is_finite() && phase.load_factor > 0.0) {
                return Err(ConfigError::ValidationError(format!(
                    "phase {} load_factor ({}) must be a positive number",
                    i, phase.load_factor
                )));
            }
        }

        Ok(())
    }
}

/// Renderer stand-in whose frame cost follows the applied settings.
#[derive(Debug)]
pub struct SimulatedRenderer {
    config: SimulationConfig,
    settings: QualitySettings,
    frame_index: u64,
}

impl SimulatedRenderer {
    pub fn new(config: SimulationConfig, settings: QualitySettings) -> Self {
        Self {
            config,
            settings,
            frame_index: 0,
        }
    }

    /// Create a shared renderer that reconfigures on `controller`'s level changes.
    pub fn attach(config: SimulationConfig, controller: &mut QualityController) -> Arc<Mutex<Self>> {
        let renderer = Arc::new(Mutex::new(Self::new(config, *controller.settings())));
        let listener = Arc::clone(&renderer);
        controller.on_quality_change(move |change: &QualityChange| {
            if let Ok(mut r) = listener.lock() {
                r.apply(&change.settings);
            }
            info!(
                "Renderer reconfigured for {} (pixel ratio {:.2}, {} iterations)",
                change.level, change.settings.pixel_ratio, change.settings.iterations
            );
        });
        renderer
    }

    pub fn apply(&mut self, settings: &QualitySettings) {
        self.settings = *settings;
    }

    pub fn settings(&self) -> &QualitySettings {
        &self.settings
    }

    /// Load multiplier for a frame, cycling through the configured phases.
    pub fn load_factor(&self, frame_index: u64) -> f64 {
        let cycle: u64 = self.config.phases.iter().map(|p| p.frames).sum();
        if cycle == 0 {
            return 1.0;
        }

        let mut offset = frame_index % cycle;
        for phase in &self.config.phases {
            if offset < phase.frames {
                return phase.load_factor;
            }
            offset -= phase.frames;
        }
        1.0
    }

    /// Cost of rendering `frame_index` with the current settings, in ms.
    pub fn frame_cost_ms(&self, frame_index: u64) -> f64 {
        let s = &self.settings;
        let mut cost = self.config.base_cost_ms
            + f64::from(s.iterations) * self.config.cost_per_iteration_ms * s.pixel_ratio.powi(2);
        if s.bloom_enabled {
            cost += self.config.bloom_cost_ms;
        }
        if s.shadows_enabled {
            cost += self.config.shadow_cost_ms;
        }
        cost * self.load_factor(frame_index)
    }

    /// Advance one frame and return how long it takes to render.
    pub fn render_frame(&mut self) -> Duration {
        let cost = self.frame_cost_ms(self.frame_index);
        self.frame_index += 1;
        Duration::from_secs_f64(cost / 1000.0)
    }

    pub fn frames_rendered(&self) -> u64 {
        self.frame_index
    }
}
