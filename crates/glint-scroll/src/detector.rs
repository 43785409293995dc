//! Row-hash scroll detection.
//!
//! For a fixed region, keep one 64-bit hash per row for the previous and
//! the current frame. Equal hashes at a vertical offset are votes for that
//! scroll distance; the best-supported distances are turned into scroll
//! instructions and the rows no distance explains are reported as residual
//! dirty bands.

use std::time::Instant;

use serde::{Deserialize, Serialize};
use xxhash_rust::xxh64::xxh64;

use glint_core::{GlintError, PipelineStats, Rect, Result, StatsSnapshot};
use glint_region::RegionSet;

/// Shortest run of consecutive matching rows worth a scroll instruction.
pub const MIN_LINE_COUNT: usize = 5;

/// Maximum number of distances reported per frame.
pub const MAX_SCROLLS: usize = 20;

/// One scroll instruction: copy `count` rows to `start`, shifted by
/// `shift` (positive = content moved down).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScrollMove {
    pub shift: i32,
    pub start: u32,
    pub count: u32,
}

/// A band of consecutive rows, counted from the top of the region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowSpan {
    pub start: u32,
    pub count: u32,
}

/// Result of one detection pass: scroll instructions and the rows they do
/// not account for.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScrollResult {
    pub scrolls: Vec<ScrollMove>,
    pub residuals: Vec<RowSpan>,
}

impl ScrollResult {
    /// Residual bands as full-width rectangles in screen coordinates.
    pub fn residual_region(&self, x: i32, y: i32, width: u32) -> RegionSet {
        self.residuals
            .iter()
            .map(|span| {
                Rect::from_xywh(x, y + span.start as i32, width as i32, span.count as i32)
            })
            .collect()
    }
}

/// Per-region scroll detection state.
///
/// A single frame's `update -> calculate -> scroll_values` sequence must be
/// serialised per region; different regions are independent.
pub struct ScrollDetector {
    x: i32,
    y: i32,
    width: u32,
    height: u32,
    /// Row hashes of the previous frame. Zero never matches.
    a1: Vec<u64>,
    /// Row hashes of the current frame.
    a2: Vec<u64>,
    /// Vote histogram: `distances[height + d]` counts matches at offset `d`.
    distances: Vec<u32>,
    stats: PipelineStats,
}

impl ScrollDetector {
    /// Create an idle detector; the first `update` sets the region.
    pub fn new() -> Self {
        Self {
            x: 0,
            y: 0,
            width: 0,
            height: 0,
            a1: Vec::new(),
            a2: Vec::new(),
            distances: Vec::new(),
            stats: PipelineStats::new(),
        }
    }

    /// Region height currently tracked, 0 before the first update.
    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Advisory frame/time counters.
    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    /// Feed the current frame of the region.
    ///
    /// `pixels` holds `height` rows of `row_stride` bytes each; the first
    /// `width * bpp` bytes of every row are hashed. A region geometry
    /// change discards all prior state.
    ///
    /// # Errors
    /// - [`GlintError::InvalidArgument`] for a zero-sized region, a stride
    ///   below the row size, or pixel data shorter than the region
    pub fn update(
        &mut self,
        pixels: &[u8],
        x: i32,
        y: i32,
        width: u32,
        height: u32,
        row_stride: usize,
        bpp: usize,
    ) -> Result<()> {
        if width == 0 || height == 0 {
            return Err(GlintError::invalid("scroll region must be non-empty"));
        }
        let row_bytes = width as usize * bpp;
        if row_stride < row_bytes {
            return Err(GlintError::invalid(format!(
                "row stride {row_stride} below row size {row_bytes}"
            )));
        }
        let needed = row_stride * (height as usize - 1) + row_bytes;
        if pixels.len() < needed {
            return Err(GlintError::invalid(format!(
                "pixel data holds {} bytes, region needs {needed}",
                pixels.len()
            )));
        }

        let start = Instant::now();
        let h = height as usize;
        if (x, y, width, height) != (self.x, self.y, self.width, self.height) {
            tracing::debug!(x, y, width, height, "scroll region changed, resetting state");
            self.x = x;
            self.y = y;
            self.width = width;
            self.height = height;
            self.a1 = vec![0; h];
            self.a2 = vec![0; h];
            self.distances = vec![0; 2 * h];
        } else {
            std::mem::swap(&mut self.a1, &mut self.a2);
        }

        for (i, hash) in self.a2.iter_mut().enumerate() {
            let row = &pixels[i * row_stride..i * row_stride + row_bytes];
            *hash = xxh64(row, 0);
        }

        self.stats.record(start.elapsed());
        Ok(())
    }

    /// Vote on scroll distances up to `max_distance` rows in either
    /// direction. A no-op before the first `update`.
    pub fn calculate(&mut self, max_distance: u32) {
        let h = self.height as usize;
        if h == 0 {
            return;
        }
        self.distances.iter_mut().for_each(|d| *d = 0);

        let max_d = (max_distance as usize).min(h.saturating_sub(1)) as isize;
        for y2 in 0..h as isize {
            let hash = self.a2[y2 as usize];
            if hash == 0 {
                continue;
            }
            for d in -max_d..=max_d {
                let y1 = y2 + d;
                if y1 < 0 || y1 >= h as isize {
                    continue;
                }
                if self.a1[y1 as usize] == hash {
                    self.distances[(h as isize + d) as usize] += 1;
                }
            }
        }
    }

    /// Pick the best-supported distances and split the region into scroll
    /// instructions plus residual dirty bands.
    ///
    /// Distances are consumed in decreasing vote order; rows claimed by a
    /// stronger distance are off-limits to weaker ones, so the output never
    /// reports contradictory moves for the same destination row.
    pub fn scroll_values(&self, min_hits: u32) -> ScrollResult {
        let h = self.height as usize;
        let mut result = ScrollResult::default();
        if h == 0 {
            return result;
        }

        // (votes, d) for every offset with enough support
        let mut candidates: Vec<(u32, isize)> = self
            .distances
            .iter()
            .enumerate()
            .filter(|&(_, &votes)| votes > min_hits)
            .map(|(i, &votes)| (votes, i as isize - h as isize))
            .collect();
        candidates.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.abs().cmp(&b.1.abs())));
        candidates.truncate(MAX_SCROLLS);

        let mut claimed = vec![false; h];
        for (_, d) in candidates {
            let mut run_start = 0usize;
            let mut run_len = 0usize;
            for y2 in 0..=h {
                let matched = y2 < h && {
                    let y1 = y2 as isize + d;
                    !claimed[y2]
                        && y1 >= 0
                        && (y1 as usize) < h
                        && self.a2[y2] != 0
                        && self.a1[y1 as usize] == self.a2[y2]
                };
                if matched {
                    if run_len == 0 {
                        run_start = y2;
                    }
                    run_len += 1;
                } else if run_len > 0 {
                    if run_len >= MIN_LINE_COUNT {
                        for row in claimed.iter_mut().skip(run_start).take(run_len) {
                            *row = true;
                        }
                        result.scrolls.push(ScrollMove {
                            shift: -d as i32,
                            start: run_start as u32,
                            count: run_len as u32,
                        });
                    }
                    run_len = 0;
                }
            }
        }

        // Everything unclaimed becomes residual damage
        let mut span_start = 0usize;
        let mut span_len = 0usize;
        for y2 in 0..=h {
            if y2 < h && !claimed[y2] {
                if span_len == 0 {
                    span_start = y2;
                }
                span_len += 1;
            } else if span_len > 0 {
                result.residuals.push(RowSpan {
                    start: span_start as u32,
                    count: span_len as u32,
                });
                span_len = 0;
            }
        }
        result
    }

    /// Invalidate the rows of the current frame that intersect the given
    /// rectangle (screen coordinates).
    ///
    /// When more than half the rows end up invalidated the whole current
    /// frame is discarded, disabling scroll detection for the next frame.
    pub fn invalidate(&mut self, x: i32, y: i32, width: i32, height: i32) {
        let h = self.height as usize;
        if h == 0 {
            return;
        }
        let damage = Rect::from_xywh(x, y, width, height);
        let region = Rect::from_xywh(self.x, self.y, self.width as i32, self.height as i32);
        let Some(overlap) = region.intersection(damage) else {
            return;
        };

        let first = (overlap.y - self.y) as usize;
        let last = first + overlap.height as usize;
        for hash in &mut self.a2[first..last] {
            *hash = 0;
        }

        let zeroed = self.a2.iter().filter(|&&hash| hash == 0).count();
        if zeroed * 2 > h {
            tracing::debug!(zeroed, height = h, "majority of rows invalidated, dropping frame hashes");
            self.a2.iter_mut().for_each(|hash| *hash = 0);
        }
    }
}

impl Default for ScrollDetector {
    fn default() -> Self {
        Self::new()
    }
}
