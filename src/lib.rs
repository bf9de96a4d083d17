//! Adaptive render quality control.
//!
//! A `QualityController` is fed one timestamp per rendered frame. It keeps a
//! smoothed FPS readout and a predictive frame budget, and steps between
//! four quality levels with hysteresis, notifying subscribers of every
//! level change.

pub mod config;
pub mod controller;
pub mod error;
pub mod events;
pub mod frame_window;
pub mod hud;
pub mod logging;
pub mod metrics;
pub mod quality;
pub mod simulation;

pub use config::{Config, ControllerConfig};
pub use controller::{QualityChange, QualityController, QualityStats, Trend};
pub use error::{AppError, ConfigError, QualityError};
pub use quality::{QualityLevel, QualitySettings, QualityTable};
