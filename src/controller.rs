//! Adaptive quality controller.
//!
//! Turns a stream of frame timestamps into a smoothed FPS readout and a
//! predictive frame budget, and steps the quality level up or down once a
//! sustained run of qualifying frames has been observed.

use crate::config::ControllerConfig;
use crate::error::{ConfigError, QualityError};
use crate::events::{Notifier, SubscriptionId, QUALITY_CHANGE_EVENT};
use crate::frame_window::FrameTimeWindow;
use crate::metrics::{ChangeCause, MetricsCollector, MetricsSnapshot};
use crate::quality::{QualityLevel, QualitySettings, QualityTable};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Smallest elapsed time accepted between two updates, in ms.
pub const MIN_FRAME_TIME_MS: f64 = 0.001;

/// Streak scale for stepping down (0.8 × required frames).
const DROP_STREAK_SCALE: f64 = 0.8;
/// Streak scale for stepping up (2.5 × required frames).
const INCREASE_STREAK_SCALE: f64 = 2.5;

/// Payload of the `qualitychange` event.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QualityChange {
    pub level: QualityLevel,
    pub settings: QualitySettings,
}

/// Direction the hysteresis counters are currently leaning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum Trend {
    /// No streak in progress
    #[default]
    Steady,
    /// Consecutive frames below target
    Degrading { frames: u32 },
    /// Consecutive frames with headroom
    Recovering { frames: u32 },
}

/// Read-only snapshot of the controller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityStats {
    pub fps: f64,
    pub frame_time_ms: f64,
    pub frame_budget_ms: f64,
    pub p99_frame_time_ms: f64,
    pub target_fps: f64,
    pub quality_level: QualityLevel,
    pub auto_adjust_enabled: bool,
    pub settings: QualitySettings,
    pub sample_count: usize,
    pub consecutive_low_frames: u32,
    pub consecutive_high_frames: u32,
    pub cooldown_frames_remaining: u32,
    pub trend: Trend,
    pub metrics: MetricsSnapshot,
}

/// Hysteresis controller for render quality.
///
/// Levels only ever move one rank at a time. Drops need a short streak of
/// slow frames, recoveries a much longer streak of fast ones, and every
/// automatic change is followed by a cooldown.
#[derive(Debug)]
pub struct QualityController {
    config: ControllerConfig,
    table: QualityTable,
    samples: FrameTimeWindow,
    level: QualityLevel,
    target_fps: f64,
    target_frame_time_ms: f64,
    last_time_ms: f64,
    frame_time_ms: f64,
    smoothed_fps: f64,
    frame_budget_ms: f64,
    consecutive_low_frames: u32,
    consecutive_high_frames: u32,
    cooldown_frames_remaining: u32,
    auto_adjust: bool,
    metrics: MetricsCollector,
    notifier: Notifier<QualityChange>,
}

impl QualityController {
    /// Create a controller whose clock starts at `start_ms`.
    ///
    /// The first `update` measures its frame time against `start_ms`.
    /// `config` is taken as already validated; use `try_new` for
    /// untrusted input.
    pub fn new(config: ControllerConfig, start_ms: f64) -> Self {
        let target_fps = config.target_fps;
        let target_frame_time_ms = 1000.0 / target_fps;

        Self {
            table: config.quality_levels,
            samples: FrameTimeWindow::with_capacity(config.sample_window),
            level: config.initial_level,
            target_fps,
            target_frame_time_ms,
            last_time_ms: start_ms,
            frame_time_ms: 0.0,
            smoothed_fps: target_fps,
            frame_budget_ms: target_frame_time_ms,
            consecutive_low_frames: 0,
            consecutive_high_frames: 0,
            cooldown_frames_remaining: 0,
            auto_adjust: config.auto_adjust,
            metrics: MetricsCollector::new(),
            notifier: Notifier::new(),
            config,
        }
    }

    /// Validate `config`, then create the controller.
    pub fn try_new(config: ControllerConfig, start_ms: f64) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::new(config, start_ms))
    }

    /// Record a frame ending at `now_ms` and re-evaluate quality.
    ///
    /// `now_ms` should never go backwards; a non-advancing clock is clamped
    /// to `MIN_FRAME_TIME_MS`.
    pub fn update(&mut self, now_ms: f64) {
        let elapsed = now_ms - self.last_time_ms;
        self.frame_time_ms = if elapsed.is_finite() && elapsed >= MIN_FRAME_TIME_MS {
            elapsed
        } else {
            debug!(
                "Non-advancing frame clock (elapsed {:.4}ms), clamping to {}ms",
                elapsed, MIN_FRAME_TIME_MS
            );
            MIN_FRAME_TIME_MS
        };
        self.last_time_ms = now_ms;

        self.samples.push(self.frame_time_ms);
        self.metrics.record_frame(self.level);

        let avg_frame_time = self.samples.mean();
        let instant_fps = 1000.0 / avg_frame_time;

        self.smoothed_fps += self.config.smoothing_factor * (instant_fps - self.smoothed_fps);

        // Predictive budget: mean plus one standard deviation
        self.frame_budget_ms = avg_frame_time + self.samples.variance().sqrt();

        if self.auto_adjust {
            self.auto_adjust_quality();
        }
    }

    fn auto_adjust_quality(&mut self) {
        if self.cooldown_frames_remaining > 0 {
            self.cooldown_frames_remaining -= 1;
            return;
        }

        if self.samples.len() < self.config.min_samples {
            return;
        }

        let fps = self.smoothed_fps;
        let approaching_budget =
            self.frame_budget_ms > self.target_frame_time_ms - self.config.budget_margin_ms;

        if fps < self.config.low_fps_threshold || approaching_budget {
            self.consecutive_low_frames += 1;
            self.consecutive_high_frames = 0;
        } else if fps > self.config.high_fps_threshold && !approaching_budget {
            self.consecutive_high_frames += 1;
            self.consecutive_low_frames = 0;
        } else {
            self.consecutive_low_frames = 0;
            self.consecutive_high_frames = 0;
        }

        let required = f64::from(self.config.required_consecutive_frames);

        // Both checks run; the classification above keeps them exclusive
        if f64::from(self.consecutive_low_frames) >= required * DROP_STREAK_SCALE {
            if let Some(lower) = self.level.lower() {
                info!(
                    "Decreasing quality: {} -> {} (FPS: {:.1})",
                    self.level, lower, self.smoothed_fps
                );
                self.apply_level(lower, ChangeCause::Drop);
            }
            self.consecutive_low_frames = 0;
            self.cooldown_frames_remaining = self.config.cooldown_frames;
        }

        if f64::from(self.consecutive_high_frames) >= required * INCREASE_STREAK_SCALE {
            if let Some(higher) = self.level.higher() {
                info!(
                    "Increasing quality: {} -> {} (FPS: {:.1})",
                    self.level, higher, self.smoothed_fps
                );
                self.apply_level(higher, ChangeCause::Increase);
            }
            self.consecutive_high_frames = 0;
            self.cooldown_frames_remaining = self.config.cooldown_frames;
        }
    }

    /// Step one level toward `low`. No-op at `low`.
    pub fn decrease_quality(&mut self) {
        if let Some(lower) = self.level.lower() {
            info!(
                "Decreasing quality: {} -> {} (FPS: {:.1})",
                self.level, lower, self.smoothed_fps
            );
            self.apply_level(lower, ChangeCause::Manual);
        }
    }

    /// Step one level toward `ultra`. No-op at `ultra`.
    pub fn increase_quality(&mut self) {
        if let Some(higher) = self.level.higher() {
            info!(
                "Increasing quality: {} -> {} (FPS: {:.1})",
                self.level, higher, self.smoothed_fps
            );
            self.apply_level(higher, ChangeCause::Manual);
        }
    }

    /// Switch to `level`, discard collected samples, and notify subscribers.
    ///
    /// Emits even when `level` equals the current level.
    pub fn set_quality_level(&mut self, level: QualityLevel) {
        self.apply_level(level, ChangeCause::Manual);
    }

    /// Like `set_quality_level`, taking a level name.
    ///
    /// Unknown names are logged and leave the controller untouched.
    pub fn set_quality_level_named(&mut self, name: &str) -> Result<(), QualityError> {
        match name.parse::<QualityLevel>() {
            Ok(level) => {
                self.set_quality_level(level);
                Ok(())
            }
            Err(e) => {
                warn!("{}", e);
                Err(e)
            }
        }
    }

    fn apply_level(&mut self, level: QualityLevel, cause: ChangeCause) {
        self.level = level;
        self.metrics.record_change(cause);

        let change = QualityChange {
            level,
            settings: *self.table.get(level),
        };
        let delivered = self.notifier.emit(QUALITY_CHANGE_EVENT, &change);
        debug!("Quality set to {} ({} subscribers notified)", level, delivered);

        // Fresh data after every change
        self.samples.clear();
    }

    /// Enable or disable automatic adjustment. Disabling clears both streaks.
    pub fn set_auto_adjust(&mut self, enabled: bool) {
        self.auto_adjust = enabled;
        if !enabled {
            self.consecutive_low_frames = 0;
            self.consecutive_high_frames = 0;
        }
        info!("Auto-adjust {}", if enabled { "enabled" } else { "disabled" });
    }

    /// Change the target frame rate used for budget math.
    pub fn set_target_fps(&mut self, fps: f64) -> Result<(), QualityError> {
        if !(fps.is_finite() && fps > 0.0) {
            warn!("Ignoring invalid target FPS {}", fps);
            return Err(QualityError::InvalidTargetFps(fps));
        }
        self.target_fps = fps;
        self.target_frame_time_ms = 1000.0 / fps;
        Ok(())
    }

    /// Subscribe to `qualitychange`. Handlers run synchronously inside
    /// `update` / `set_quality_level`, in registration order.
    pub fn on_quality_change<F>(&mut self, handler: F) -> SubscriptionId
    where
        F: FnMut(&QualityChange) + Send + 'static,
    {
        self.notifier.on(QUALITY_CHANGE_EVENT, handler)
    }

    pub fn off_quality_change(&mut self, id: SubscriptionId) -> bool {
        self.notifier.off(QUALITY_CHANGE_EVENT, id)
    }

    /// Smoothed FPS.
    pub fn fps(&self) -> f64 {
        self.smoothed_fps
    }

    /// Duration of the most recent frame in ms.
    pub fn frame_time_ms(&self) -> f64 {
        self.frame_time_ms
    }

    pub fn frame_budget_ms(&self) -> f64 {
        self.frame_budget_ms
    }

    pub fn target_fps(&self) -> f64 {
        self.target_fps
    }

    pub fn target_frame_time_ms(&self) -> f64 {
        self.target_frame_time_ms
    }

    pub fn quality_level(&self) -> QualityLevel {
        self.level
    }

    /// Settings for the current level.
    pub fn settings(&self) -> &QualitySettings {
        self.table.get(self.level)
    }

    pub fn auto_adjust_enabled(&self) -> bool {
        self.auto_adjust
    }

    pub fn sample_count(&self) -> usize {
        self.samples.len()
    }

    pub fn consecutive_low_frames(&self) -> u32 {
        self.consecutive_low_frames
    }

    pub fn consecutive_high_frames(&self) -> u32 {
        self.consecutive_high_frames
    }

    pub fn cooldown_frames_remaining(&self) -> u32 {
        self.cooldown_frames_remaining
    }

    pub fn trend(&self) -> Trend {
        if self.consecutive_low_frames > 0 {
            Trend::Degrading {
                frames: self.consecutive_low_frames,
            }
        } else if self.consecutive_high_frames > 0 {
            Trend::Recovering {
                frames: self.consecutive_high_frames,
            }
        } else {
            Trend::Steady
        }
    }

    pub fn stats(&self) -> QualityStats {
        QualityStats {
            fps: self.smoothed_fps,
            frame_time_ms: self.frame_time_ms,
            frame_budget_ms: self.frame_budget_ms,
            p99_frame_time_ms: self.samples.percentile(0.99),
            target_fps: self.target_fps,
            quality_level: self.level,
            auto_adjust_enabled: self.auto_adjust,
            settings: *self.settings(),
            sample_count: self.samples.len(),
            consecutive_low_frames: self.consecutive_low_frames,
            consecutive_high_frames: self.consecutive_high_frames,
            cooldown_frames_remaining: self.cooldown_frames_remaining,
            trend: self.trend(),
            metrics: self.metrics.snapshot(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::sync::{Arc, Mutex};

    fn auto_config(initial_level: QualityLevel) -> ControllerConfig {
        ControllerConfig {
            auto_adjust: true,
            initial_level,
            ..ControllerConfig::default()
        }
    }

    /// Controller that records every emitted change.
    fn recording_controller(
        config: ControllerConfig,
    ) -> (QualityController, Arc<Mutex<Vec<QualityChange>>>) {
        let mut controller = QualityController::new(config, 0.0);
        let changes = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&changes);
        controller.on_quality_change(move |change| sink.lock().unwrap().push(*change));
        (controller, changes)
    }

    /// Feed `frames` updates spaced `spacing_ms` apart, continuing from `clock`.
    fn feed(controller: &mut QualityController, clock: &mut f64, frames: usize, spacing_ms: f64) {
        for _ in 0..frames {
            *clock += spacing_ms;
            controller.update(*clock);
        }
    }

    #[test]
    fn test_new_controller_defaults() {
        let controller = QualityController::new(ControllerConfig::default(), 0.0);
        assert_eq!(controller.quality_level(), QualityLevel::Ultra);
        assert_eq!(controller.fps(), 60.0);
        assert!((controller.frame_budget_ms() - 1000.0 / 60.0).abs() < 1e-9);
        assert!(!controller.auto_adjust_enabled());
        assert_eq!(controller.trend(), Trend::Steady);
        assert_eq!(controller.sample_count(), 0);
    }

    #[test]
    fn test_first_update_measures_from_start_time() {
        let mut controller = QualityController::new(ControllerConfig::default(), 1000.0);
        controller.update(1020.0);
        assert_eq!(controller.frame_time_ms(), 20.0);
        assert_eq!(controller.sample_count(), 1);
    }

    #[test]
    fn test_steady_60fps_converges() {
        let mut controller = QualityController::new(ControllerConfig::default(), 0.0);
        let spacing = 1000.0 / 60.0;

        for i in 1..=120 {
            controller.update(i as f64 * spacing);
        }

        assert!((controller.fps() - 60.0).abs() < 0.6);
        assert_eq!(controller.sample_count(), 120);
        // No variance inflation on a flat signal
        assert!((controller.frame_budget_ms() - spacing).abs() < 1e-6);
    }

    #[test]
    fn test_smoothing_moves_ten_percent_toward_instant() {
        let mut controller = QualityController::new(ControllerConfig::default(), 0.0);
        // 1000 / 20ms = 50fps; smoothed = 60 + 0.1 * (50 - 60)
        controller.update(20.0);
        assert!((controller.fps() - 59.0).abs() < 1e-9);
    }

    #[test]
    fn test_frame_budget_includes_standard_deviation() {
        let mut controller = QualityController::new(ControllerConfig::default(), 0.0);
        controller.update(10.0);
        controller.update(30.0);
        // mean 15, population std dev 5
        assert!((controller.frame_budget_ms() - 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_non_advancing_clock_is_clamped() {
        let mut controller = QualityController::new(ControllerConfig::default(), 100.0);
        controller.update(100.0);
        assert_eq!(controller.frame_time_ms(), MIN_FRAME_TIME_MS);
        controller.update(50.0);
        assert_eq!(controller.frame_time_ms(), MIN_FRAME_TIME_MS);
        assert!(controller.fps().is_finite());
        assert!(controller.frame_budget_ms().is_finite());
    }

    #[test]
    fn test_no_adjustment_before_min_samples() {
        let (mut controller, changes) = recording_controller(auto_config(QualityLevel::Ultra));
        let mut clock = 0.0;

        feed(&mut controller, &mut clock, 59, 25.0);
        assert_eq!(controller.consecutive_low_frames(), 0);

        feed(&mut controller, &mut clock, 1, 25.0);
        assert_eq!(controller.consecutive_low_frames(), 1);
        assert!(changes.lock().unwrap().is_empty());
    }

    #[test]
    fn test_sustained_low_fps_steps_down_once() {
        let (mut controller, changes) = recording_controller(auto_config(QualityLevel::Ultra));
        let mut clock = 0.0;

        // Classification starts at frame 60; 48 low frames lands on frame 107
        feed(&mut controller, &mut clock, 106, 25.0);
        assert_eq!(controller.quality_level(), QualityLevel::Ultra);
        assert_eq!(controller.consecutive_low_frames(), 47);

        feed(&mut controller, &mut clock, 1, 25.0);
        assert_eq!(controller.quality_level(), QualityLevel::High);
        assert_eq!(controller.consecutive_low_frames(), 0);
        assert_eq!(controller.cooldown_frames_remaining(), 120);
        assert_eq!(controller.sample_count(), 0);

        let recorded = changes.lock().unwrap().clone();
        assert_eq!(recorded.len(), 1);
        assert_eq!(recorded[0].level, QualityLevel::High);
        assert_eq!(recorded[0].settings, QualityTable::default().high);
    }

    #[test]
    fn test_second_drop_waits_for_cooldown() {
        let (mut controller, changes) = recording_controller(auto_config(QualityLevel::Ultra));
        let mut clock = 0.0;

        feed(&mut controller, &mut clock, 107, 25.0);
        assert_eq!(controller.quality_level(), QualityLevel::High);

        // 120 cooldown frames, then 47 more low frames: still high
        feed(&mut controller, &mut clock, 120, 25.0);
        assert_eq!(controller.cooldown_frames_remaining(), 0);
        assert_eq!(controller.consecutive_low_frames(), 0);

        feed(&mut controller, &mut clock, 47, 25.0);
        assert_eq!(controller.quality_level(), QualityLevel::High);

        feed(&mut controller, &mut clock, 1, 25.0);
        assert_eq!(controller.quality_level(), QualityLevel::Medium);
        assert_eq!(changes.lock().unwrap().len(), 2);
    }

    #[test]
    fn test_sustained_high_fps_steps_up_once() {
        let (mut controller, changes) = recording_controller(auto_config(QualityLevel::Low));
        let mut clock = 0.0;

        // 10ms frames: 100fps and well inside the budget
        feed(&mut controller, &mut clock, 208, 10.0);
        assert_eq!(controller.quality_level(), QualityLevel::Low);
        assert_eq!(controller.consecutive_high_frames(), 149);

        feed(&mut controller, &mut clock, 1, 10.0);
        assert_eq!(controller.quality_level(), QualityLevel::Medium);
        assert_eq!(controller.consecutive_high_frames(), 0);
        assert_eq!(controller.cooldown_frames_remaining(), 120);

        feed(&mut controller, &mut clock, 100, 10.0);
        assert_eq!(controller.quality_level(), QualityLevel::Medium);
        assert_eq!(changes.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_flat_60fps_reads_as_approaching_budget() {
        let (mut controller, _changes) = recording_controller(auto_config(QualityLevel::Ultra));
        let mut clock = 0.0;

        // 16.67ms exceeds the 14.67ms budget line
        feed(&mut controller, &mut clock, 70, 1000.0 / 60.0);
        assert!(matches!(controller.trend(), Trend::Degrading { .. }));
    }

    #[test]
    fn test_middle_range_resets_both_counters() {
        let config = ControllerConfig {
            high_fps_threshold: 80.0,
            budget_margin_ms: 0.0,
            ..auto_config(QualityLevel::High)
        };
        let (mut controller, _changes) = recording_controller(config);
        let mut clock = 0.0;

        // 100fps clears the raised high threshold
        feed(&mut controller, &mut clock, 80, 10.0);
        assert_eq!(controller.consecutive_high_frames(), 21);

        // ~71fps sits between the thresholds and inside the budget
        feed(&mut controller, &mut clock, 120, 14.0);
        assert_eq!(controller.consecutive_high_frames(), 0);
        assert_eq!(controller.consecutive_low_frames(), 0);
        assert_eq!(controller.trend(), Trend::Steady);
        assert_eq!(controller.quality_level(), QualityLevel::High);
    }

    #[test]
    fn test_disabling_auto_adjust_zeroes_counters() {
        let (mut controller, changes) = recording_controller(auto_config(QualityLevel::Ultra));
        let mut clock = 0.0;

        feed(&mut controller, &mut clock, 100, 25.0);
        assert_eq!(controller.consecutive_low_frames(), 41);

        controller.set_auto_adjust(false);
        assert_eq!(controller.consecutive_low_frames(), 0);
        assert_eq!(controller.consecutive_high_frames(), 0);

        // Stays put while disabled
        feed(&mut controller, &mut clock, 200, 25.0);
        assert_eq!(controller.consecutive_low_frames(), 0);
        assert_eq!(controller.quality_level(), QualityLevel::Ultra);

        // Needs a full fresh streak after re-enabling
        controller.set_auto_adjust(true);
        feed(&mut controller, &mut clock, 47, 25.0);
        assert_eq!(controller.quality_level(), QualityLevel::Ultra);
        feed(&mut controller, &mut clock, 1, 25.0);
        assert_eq!(controller.quality_level(), QualityLevel::High);
        assert_eq!(changes.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_boundary_steps_are_noops() {
        let (mut controller, changes) = recording_controller(ControllerConfig {
            initial_level: QualityLevel::Low,
            ..ControllerConfig::default()
        });
        controller.decrease_quality();
        assert_eq!(controller.quality_level(), QualityLevel::Low);

        controller.set_quality_level(QualityLevel::Ultra);
        assert_eq!(changes.lock().unwrap().len(), 1);

        controller.increase_quality();
        assert_eq!(controller.quality_level(), QualityLevel::Ultra);
        assert_eq!(changes.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_auto_drop_at_low_still_starts_cooldown() {
        let (mut controller, changes) = recording_controller(auto_config(QualityLevel::Low));
        let mut clock = 0.0;

        feed(&mut controller, &mut clock, 107, 25.0);
        assert_eq!(controller.quality_level(), QualityLevel::Low);
        assert_eq!(controller.consecutive_low_frames(), 0);
        assert_eq!(controller.cooldown_frames_remaining(), 120);
        assert!(changes.lock().unwrap().is_empty());
    }

    #[test]
    fn test_set_quality_level_clears_samples_and_keeps_cooldown() {
        let (mut controller, changes) = recording_controller(ControllerConfig::default());
        let mut clock = 0.0;
        feed(&mut controller, &mut clock, 30, 16.0);
        assert_eq!(controller.sample_count(), 30);

        controller.set_quality_level(QualityLevel::Medium);
        assert_eq!(controller.sample_count(), 0);
        assert_eq!(controller.cooldown_frames_remaining(), 0);
        assert_eq!(controller.settings(), &QualityTable::default().medium);

        // Re-selecting the current level still notifies
        controller.set_quality_level(QualityLevel::Medium);
        assert_eq!(changes.lock().unwrap().len(), 2);
        assert_eq!(controller.stats().metrics.manual_count, 2);
    }

    #[test]
    fn test_set_quality_level_named_rejects_unknown() {
        let (mut controller, changes) = recording_controller(auto_config(QualityLevel::Ultra));
        let mut clock = 0.0;
        feed(&mut controller, &mut clock, 70, 25.0);

        let before = controller.stats();
        let result = controller.set_quality_level_named("bogus");

        assert_eq!(result, Err(QualityError::InvalidLevel("bogus".to_string())));
        assert_eq!(controller.stats(), before);
        assert!(changes.lock().unwrap().is_empty());

        assert!(controller.set_quality_level_named("LOW").is_ok());
        assert_eq!(controller.quality_level(), QualityLevel::Low);
    }

    #[test]
    fn test_set_target_fps() {
        let mut controller = QualityController::new(ControllerConfig::default(), 0.0);

        controller.set_target_fps(30.0).unwrap();
        assert_eq!(controller.target_fps(), 30.0);
        assert!((controller.target_frame_time_ms() - 1000.0 / 30.0).abs() < 1e-9);

        assert_eq!(
            controller.set_target_fps(0.0),
            Err(QualityError::InvalidTargetFps(0.0))
        );
        assert_eq!(controller.target_fps(), 30.0);
    }

    #[test]
    fn test_target_fps_drives_budget_classification() {
        // 20ms frames: slow against a 60 FPS target, comfortable at 30
        let mut at_60 = QualityController::new(auto_config(QualityLevel::Ultra), 0.0);
        let mut clock = 0.0;
        feed(&mut at_60, &mut clock, 100, 20.0);
        assert!(matches!(at_60.trend(), Trend::Degrading { .. }));

        let mut at_30 = QualityController::new(auto_config(QualityLevel::Ultra), 0.0);
        at_30.set_target_fps(30.0).unwrap();
        let mut clock = 0.0;
        feed(&mut at_30, &mut clock, 200, 20.0);
        assert_eq!(at_30.trend(), Trend::Steady);
        assert_eq!(at_30.consecutive_low_frames(), 0);
        assert_eq!(at_30.quality_level(), QualityLevel::Ultra);
    }

    #[test]
    fn test_try_new_rejects_invalid_config() {
        let config = ControllerConfig {
            target_fps: 0.0,
            ..ControllerConfig::default()
        };
        assert!(matches!(
            QualityController::try_new(config, 0.0),
            Err(ConfigError::ValidationError(_))
        ));

        let controller = QualityController::try_new(auto_config(QualityLevel::High), 0.0).unwrap();
        assert_eq!(controller.quality_level(), QualityLevel::High);
    }

    #[test]
    fn test_unsubscribed_handler_is_not_called() {
        let mut controller = QualityController::new(ControllerConfig::default(), 0.0);
        let hits = Arc::new(Mutex::new(0u32));
        let counter = Arc::clone(&hits);
        let id = controller.on_quality_change(move |_| *counter.lock().unwrap() += 1);

        controller.set_quality_level(QualityLevel::High);
        assert!(controller.off_quality_change(id));
        controller.set_quality_level(QualityLevel::Low);

        assert_eq!(*hits.lock().unwrap(), 1);
    }

    #[test]
    fn test_stats_serialize() {
        let controller = QualityController::new(ControllerConfig::default(), 0.0);
        let json = serde_json::to_value(controller.stats()).unwrap();
        assert_eq!(json["quality_level"], "ultra");
        assert_eq!(json["trend"]["state"], "steady");
        assert_eq!(json["settings"]["iterations"], 192);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        /// Levels move one rank at a time and the streak counters never
        /// overlap, for any strictly increasing clock.
        #[test]
        fn prop_transitions_are_adjacent(
            spacings in prop::collection::vec(1.0f64..=60.0f64, 1..800),
            start in prop::sample::select(QualityLevel::RANKED.to_vec()),
        ) {
            let (mut controller, changes) = recording_controller(auto_config(start));
            let mut clock = 0.0;
            let mut previous = start;
            let mut seen = 0;

            for spacing in spacings {
                clock += spacing;
                controller.update(clock);

                prop_assert!(
                    controller.consecutive_low_frames() == 0
                        || controller.consecutive_high_frames() == 0
                );
                prop_assert!(controller.sample_count() <= 120);

                let recorded = changes.lock().unwrap();
                for change in recorded.iter().skip(seen) {
                    let distance = (change.level.rank() as i64 - previous.rank() as i64).abs();
                    prop_assert_eq!(distance, 1);
                    prop_assert_eq!(controller.cooldown_frames_remaining(), 120);
                    prop_assert_eq!(controller.sample_count(), 0);
                    previous = change.level;
                }
                seen = recorded.len();
            }
        }

        #[test]
        fn prop_cooldown_never_increases_between_changes(
            spacings in prop::collection::vec(1.0f64..=60.0f64, 1..500),
        ) {
            let (mut controller, changes) = recording_controller(auto_config(QualityLevel::High));
            let mut clock = 0.0;
            let mut last_cooldown = controller.cooldown_frames_remaining();
            let mut seen = 0;

            for spacing in spacings {
                clock += spacing;
                controller.update(clock);

                let count = changes.lock().unwrap().len();
                let cooldown = controller.cooldown_frames_remaining();
                if count == seen {
                    prop_assert!(cooldown <= last_cooldown || last_cooldown == 0);
                }
                seen = count;
                last_cooldown = cooldown;
            }
        }
    }
}
