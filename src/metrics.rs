//! Adjustment metrics for the quality controller.
//!
//! Tracks how often the level changed, in which direction, and how many
//! frames were rendered at each level.

use crate::quality::QualityLevel;
use serde::{Deserialize, Serialize};

/// Metrics snapshot included in controller stats.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    /// Total number of level changes (automatic and manual)
    pub total_changes: u64,
    /// Automatic steps toward `low`
    pub drop_count: u64,
    /// Automatic steps toward `ultra`
    pub increase_count: u64,
    /// Changes requested through `set_quality_level`
    pub manual_count: u64,
    /// Frames observed at each level, indexed by rank (ultra first)
    pub frames_per_level: [u64; 4],
}

/// Cause of a level change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeCause {
    Drop,
    Increase,
    Manual,
}

#[derive(Debug, Default)]
pub struct MetricsCollector {
    snapshot: MetricsSnapshot,
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one rendered frame at `level`.
    pub fn record_frame(&mut self, level: QualityLevel) {
        self.snapshot.frames_per_level[level.rank()] += 1;
    }

    /// Record a level change.
    pub fn record_change(&mut self, cause: ChangeCause) {
        self.snapshot.total_changes += 1;
        match cause {
            ChangeCause::Drop => self.snapshot.drop_count += 1,
            ChangeCause::Increase => self.snapshot.increase_count += 1,
            ChangeCause::Manual => self.snapshot.manual_count += 1,
        }
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        self.snapshot.clone()
    }
}
