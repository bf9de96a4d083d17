//! Quality levels and the settings bundle each level carries.
//!
//! Levels form a closed, totally ranked set. Every level maps to one
//! `QualitySettings` record through an immutable `QualityTable`, so a
//! lookup can never miss.

use crate::error::QualityError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Discrete rendering-fidelity tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum QualityLevel {
    /// Highest fidelity, highest cost
    #[default]
    Ultra,
    High,
    Medium,
    /// Cheapest tier
    Low,
}

impl QualityLevel {
    /// Rank order from highest fidelity to lowest.
    pub const RANKED: [QualityLevel; 4] = [
        QualityLevel::Ultra,
        QualityLevel::High,
        QualityLevel::Medium,
        QualityLevel::Low,
    ];

    /// Position in `RANKED` (0 = ultra).
    pub fn rank(self) -> usize {
        match self {
            QualityLevel::Ultra => 0,
            QualityLevel::High => 1,
            QualityLevel::Medium => 2,
            QualityLevel::Low => 3,
        }
    }

    /// Next cheaper level, or `None` at `Low`.
    pub fn lower(self) -> Option<QualityLevel> {
        Self::RANKED.get(self.rank() + 1).copied()
    }

    /// Next richer level, or `None` at `Ultra`.
    pub fn higher(self) -> Option<QualityLevel> {
        self.rank().checked_sub(1).map(|i| Self::RANKED[i])
    }

    pub fn as_str(self) -> &'static str {
        match self {
            QualityLevel::Ultra => "ultra",
            QualityLevel::High => "high",
            QualityLevel::Medium => "medium",
            QualityLevel::Low => "low",
        }
    }
}

impl fmt::Display for QualityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QualityLevel {
    type Err = QualityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "ultra" => Ok(QualityLevel::Ultra),
            "high" => Ok(QualityLevel::High),
            "medium" => Ok(QualityLevel::Medium),
            "low" => Ok(QualityLevel::Low),
            _ => Err(QualityError::InvalidLevel(s.to_string())),
        }
    }
}

impl Serialize for QualityLevel {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for QualityLevel {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Render parameters applied at a given quality level.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QualitySettings {
    /// Raymarch iteration count
    pub iterations: u32,
    /// Raymarch step length
    pub step_size: f64,
    /// Renderer pixel ratio
    pub pixel_ratio: f64,
    pub bloom_enabled: bool,
    pub shadows_enabled: bool,
}

impl QualitySettings {
    fn validate(&self, level: QualityLevel) -> Result<(), String> {
        if self.iterations == 0 {
            return Err(format!("{} iterations must be greater than 0", level));
        }
        if !(self.step_size.is_finite() && self.step_size > 0.0) {
            return Err(format!(
                "{} step_size ({}) must be a positive number",
                level, self.step_size
            ));
        }
        if !(self.pixel_ratio.is_finite() && self.pixel_ratio > 0.0) {
            return Err(format!(
                "{} pixel_ratio ({}) must be a positive number",
                level, self.pixel_ratio
            ));
        }
        Ok(())
    }
}

/// Immutable `QualityLevel -> QualitySettings` mapping.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QualityTable {
    pub ultra: QualitySettings,
    pub high: QualitySettings,
    pub medium: QualitySettings,
    pub low: QualitySettings,
}

impl QualityTable {
    /// Device pixel ratio assumed when none is configured.
    pub const DEFAULT_DEVICE_PIXEL_RATIO: f64 = 2.0;

    /// Build the stock table, capping pixel ratios against the display's
    /// device pixel ratio.
    pub fn for_device_pixel_ratio(device_pixel_ratio: f64) -> Self {
        let dpr = if device_pixel_ratio.is_finite() && device_pixel_ratio > 0.0 {
            device_pixel_ratio
        } else {
            1.0
        };

        Self {
            low: QualitySettings {
                iterations: 64,
                step_size: 0.014,
                pixel_ratio: 1.0,
                bloom_enabled: false,
                shadows_enabled: false,
            },
            medium: QualitySettings {
                iterations: 96,
                step_size: 0.0095,
                pixel_ratio: dpr.min(1.5),
                bloom_enabled: true,
                shadows_enabled: false,
            },
            high: QualitySettings {
                iterations: 128,
                step_size: 0.0071,
                pixel_ratio: dpr.min(2.0),
                bloom_enabled: true,
                shadows_enabled: true,
            },
            ultra: QualitySettings {
                iterations: 192,
                step_size: 0.0047,
                pixel_ratio: dpr.min(2.0),
                bloom_enabled: true,
                shadows_enabled: true,
            },
        }
    }

    /// Settings for a level.
    pub fn get(&self, level: QualityLevel) -> &QualitySettings {
        match level {
            QualityLevel::Ultra => &self.ultra,
            QualityLevel::High => &self.high,
            QualityLevel::Medium => &self.medium,
            QualityLevel::Low => &self.low,
        }
    }

    /// Check every entry for usable values.
    pub fn validate(&self) -> Result<(), String> {
        QualityLevel::RANKED
            .iter()
            .try_for_each(|level| self.get(*level).validate(*level))
    }
}

impl Default for QualityTable {
    fn default() -> Self {
        Self::for_device_pixel_ratio(Self::DEFAULT_DEVICE_PIXEL_RATIO)
    }
}
