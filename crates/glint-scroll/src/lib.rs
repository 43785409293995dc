//! Glint Scroll - vertical scroll detection
//!
//! Consecutive frames of a window region usually differ by vertical
//! scrolling (terminals, editors, documents). This crate hashes each row of
//! the region, votes on candidate shift distances, and reports scroll moves
//! plus the residual rows that still need re-encoding.

pub mod detector;
pub mod tracker;

pub use detector::{RowSpan, ScrollDetector, ScrollMove, ScrollResult, MAX_SCROLLS, MIN_LINE_COUNT};
pub use tracker::ScrollTracker;
