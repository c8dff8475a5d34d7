//! Randomized per-recipient stagger.

use std::time::Duration;

use rand::Rng;

/// Inclusive window a recipient's pre-send delay is drawn from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DelayWindow {
    min_ms: u64,
    max_ms: u64,
}

impl DelayWindow {
    /// Create a window. Bounds are swapped if given in the wrong order.
    pub fn new(min_ms: u64, max_ms: u64) -> Self {
        Self {
            min_ms: min_ms.min(max_ms),
            max_ms: min_ms.max(max_ms),
        }
    }

    /// A window that always yields `ms`.
    pub fn fixed(ms: u64) -> Self {
        Self::new(ms, ms)
    }

    /// Lower bound in milliseconds.
    pub fn min_ms(&self) -> u64 {
        self.min_ms
    }

    /// Upper bound in milliseconds.
    pub fn max_ms(&self) -> u64 {
        self.max_ms
    }

    /// Draw a delay uniformly from the window.
    pub fn sample(&self) -> Duration {
        let ms = rand::rng().random_range(self.min_ms..=self.max_ms);
        Duration::from_millis(ms)
    }
}

impl Default for DelayWindow {
    fn default() -> Self {
        Self::new(3000, 5000)
    }
}
