//! Text overlay for FPS and quality readouts.
//!
//! Produces the lines a debug overlay would draw and keeps its quality
//! label current by listening for `qualitychange`.

use crate::controller::{QualityChange, QualityController, QualityStats};
use crate::events::SubscriptionId;
use crate::quality::QualityLevel;
use std::sync::{Arc, Mutex};

/// Colour band for an FPS readout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FpsBand {
    /// 58fps and up
    Good,
    /// 45 to 58fps
    Fair,
    /// 30 to 45fps
    Poor,
    Critical,
}

impl FpsBand {
    pub fn classify(fps: f64) -> Self {
        if fps >= 58.0 {
            FpsBand::Good
        } else if fps >= 45.0 {
            FpsBand::Fair
        } else if fps >= 30.0 {
            FpsBand::Poor
        } else {
            FpsBand::Critical
        }
    }

    /// Hex colour for the band.
    pub fn color(self) -> &'static str {
        match self {
            FpsBand::Good => "#00ff00",
            FpsBand::Fair => "#ffd93d",
            FpsBand::Poor => "#ff9f43",
            FpsBand::Critical => "#ff6b6b",
        }
    }
}

/// Hex colour for a quality label.
pub fn level_color(level: QualityLevel) -> &'static str {
    match level {
        QualityLevel::Low => "#ff6b6b",
        QualityLevel::Medium => "#ffd93d",
        QualityLevel::High => "#6bcf7f",
        QualityLevel::Ultra => "#4dabf7",
    }
}

/// One rendered overlay line.
#[derive(Debug, Clone, PartialEq)]
pub struct HudLine {
    pub text: String,
    pub color: &'static str,
}

/// FPS / frame time / quality overlay.
#[derive(Debug)]
pub struct HudOverlay {
    enabled: bool,
    quality: QualityLevel,
}

impl HudOverlay {
    pub fn new(initial: QualityLevel) -> Self {
        Self {
            enabled: true,
            quality: initial,
        }
    }

    /// Create a shared overlay that tracks `controller`'s level changes.
    pub fn attach(controller: &mut QualityController) -> (Arc<Mutex<Self>>, SubscriptionId) {
        let overlay = Arc::new(Mutex::new(Self::new(controller.quality_level())));
        let listener = Arc::clone(&overlay);
        let id = controller.on_quality_change(move |change: &QualityChange| {
            if let Ok(mut hud) = listener.lock() {
                hud.set_quality(change.level);
            }
        });
        (overlay, id)
    }

    pub fn set_quality(&mut self, level: QualityLevel) {
        self.quality = level;
    }

    pub fn quality(&self) -> QualityLevel {
        self.quality
    }

    pub fn show(&mut self) {
        self.enabled = true;
    }

    pub fn hide(&mut self) {
        self.enabled = false;
    }

    pub fn toggle(&mut self) {
        self.enabled = !self.enabled;
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Overlay lines for the current stats. Empty while hidden.
    pub fn render(&self, stats: &QualityStats) -> Vec<HudLine> {
        if !self.enabled {
            return Vec::new();
        }

        vec![
            HudLine {
                text: format!("FPS: {:.1}", stats.fps),
                color: FpsBand::classify(stats.fps).color(),
            },
            HudLine {
                text: format!("Frame: {:.2}ms", stats.frame_time_ms),
                color: FpsBand::Good.color(),
            },
            HudLine {
                text: format!("Quality: {}", self.quality.as_str().to_uppercase()),
                color: level_color(self.quality),
            },
        ]
    }
}
