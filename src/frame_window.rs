//! Bounded window of recent frame times.
//!
//! Feeds the controller's averaging and variance math. The oldest sample
//! is evicted once the window is full.

use std::collections::VecDeque;

/// Default window capacity (120 samples = 2 seconds at 60fps).
pub const DEFAULT_WINDOW_CAPACITY: usize = 120;

/// Ring buffer of frame times in milliseconds with fixed capacity.
#[derive(Debug, Clone)]
pub struct FrameTimeWindow {
    samples: VecDeque<f64>,
    capacity: usize,
}

impl FrameTimeWindow {
    /// Create a window with the default capacity.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_WINDOW_CAPACITY)
    }

    /// Create a window with a specific capacity (at least 1).
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Push a frame time, removing the oldest if at capacity.
    pub fn push(&mut self, frame_time_ms: f64) {
        if self.samples.len() >= self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(frame_time_ms);
    }

    /// Arithmetic mean of the window. Returns 0.0 when empty.
    pub fn mean(&self) -> f64 {
        if self.samples.is_empty() {
            return 0.0;
        }
        self.samples.iter().sum::<f64>() / self.samples.len() as f64
    }

    /// Population variance of the window. Returns 0.0 with fewer than 2 samples.
    pub fn variance(&self) -> f64 {
        if self.samples.len() < 2 {
            return 0.0;
        }
        let mean = self.mean();
        let squared: f64 = self.samples.iter().map(|ft| (ft - mean).powi(2)).sum();
        squared / self.samples.len() as f64
    }

    /// Percentile of the frame times in the window.
    ///
    /// # Arguments
    /// * `p` - Percentile value between 0.0 and 1.0 (e.g., 0.99 for P99)
    ///
    /// Returns 0.0 if the window is empty.
    pub fn percentile(&self, p: f64) -> f64 {
        if self.samples.is_empty() {
            return 0.0;
        }

        let mut sorted: Vec<f64> = self.samples.iter().copied().collect();
        sorted.sort_unstable_by(|a, b| a.total_cmp(b));

        let index = ((sorted.len() as f64 - 1.0) * p.clamp(0.0, 1.0)).round() as usize;
        sorted[index]
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }

    /// Iterate from oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = &f64> {
        self.samples.iter()
    }
}

impl Default for FrameTimeWindow {
    fn default() -> Self {
        Self::new()
    }
}
