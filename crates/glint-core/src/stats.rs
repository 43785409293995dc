//! Advisory frame/time counters.
//!
//! Counts are relaxed atomics: readers may observe slightly stale values,
//! which the contract permits. Exact totals are not part of any API.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Per-instance frame and time counters.
#[derive(Debug, Default)]
pub struct PipelineStats {
    frames: AtomicU64,
    total_micros: AtomicU64,
}

/// Point-in-time copy of a [`PipelineStats`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub frames: u64,
    pub total_micros: u64,
}

impl PipelineStats {
    /// Create zeroed counters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one processed frame and the time it took.
    pub fn record(&self, elapsed: Duration) {
        self.frames.fetch_add(1, Ordering::Relaxed);
        self.total_micros
            .fetch_add(elapsed.as_micros() as u64, Ordering::Relaxed);
    }

    /// Frames processed so far.
    pub fn frames(&self) -> u64 {
        self.frames.load(Ordering::Relaxed)
    }

    /// Cumulative processing time in microseconds.
    pub fn total_micros(&self) -> u64 {
        self.total_micros.load(Ordering::Relaxed)
    }

    /// Mean per-frame time in microseconds, or 0 before the first frame.
    pub fn average_micros(&self) -> u64 {
        let frames = self.frames();
        if frames == 0 {
            0
        } else {
            self.total_micros() / frames
        }
    }

    /// Read both counters.
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            frames: self.frames(),
            total_micros: self.total_micros(),
        }
    }

    /// Reset both counters to zero.
    pub fn reset(&self) {
        self.frames.store(0, Ordering::Relaxed);
        self.total_micros.store(0, Ordering::Relaxed);
    }
}
