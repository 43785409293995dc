//! Per-window detector registry.
//!
//! The server tracks one [`ScrollDetector`] per forwarded window region.
//! Each entry sits behind its own mutex so a window's
//! `update -> calculate -> scroll_values` sequence is serialised while
//! different windows proceed in parallel.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

use crate::detector::ScrollDetector;

/// Registry of scroll detectors keyed by window id.
#[derive(Default)]
pub struct ScrollTracker {
    detectors: RwLock<HashMap<u64, Arc<Mutex<ScrollDetector>>>>,
}

impl ScrollTracker {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the detector for `window`, creating one on first use.
    pub fn detector(&self, window: u64) -> Arc<Mutex<ScrollDetector>> {
        if let Some(existing) = self.detectors.read().get(&window) {
            return Arc::clone(existing);
        }
        let mut map = self.detectors.write();
        Arc::clone(
            map.entry(window)
                .or_insert_with(|| Arc::new(Mutex::new(ScrollDetector::new()))),
        )
    }

    /// Drop the detector for a closed window.
    pub fn remove(&self, window: u64) {
        self.detectors.write().remove(&window);
    }

    /// Number of tracked windows.
    pub fn len(&self) -> usize {
        self.detectors.read().len()
    }

    /// Whether any window is tracked.
    pub fn is_empty(&self) -> bool {
        self.detectors.read().is_empty()
    }

    /// Drop all detectors.
    pub fn clear(&self) {
        self.detectors.write().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detector_is_created_once_per_window() {
        let tracker = ScrollTracker::new();
        let first = tracker.detector(7);
        let again = tracker.detector(7);
        assert!(Arc::ptr_eq(&first, &again));
        assert_eq!(tracker.len(), 1);

        tracker.detector(8);
        assert_eq!(tracker.len(), 2);
    }

    #[test]
    fn test_remove_forgets_state() {
        let tracker = ScrollTracker::new();
        {
            let entry = tracker.detector(1);
            let mut det = entry.lock();
            let pixels = vec![0u8; 16 * 4 * 4];
            det.update(&pixels, 0, 0, 16, 4, 64, 4).unwrap();
            assert_eq!(det.height(), 4);
        }
        tracker.remove(1);
        let entry = tracker.detector(1);
        assert_eq!(entry.lock().height(), 0);
    }

    #[test]
    fn test_windows_are_independent() {
        let tracker = ScrollTracker::new();
        let a = tracker.detector(1);
        let b = tracker.detector(2);
        let pixels = vec![0u8; 16 * 4 * 4];
        a.lock().update(&pixels, 0, 0, 16, 4, 64, 4).unwrap();
        assert_eq!(a.lock().height(), 4);
        assert_eq!(b.lock().height(), 0);
    }
}
