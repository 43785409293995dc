//! Integration tests for scroll detection feeding the damage pipeline.
//!
//! Exercises the full server-side sequence: hash a frame pair, vote, pick
//! scrolls, and convert the residual bands into a damage region.

use glint_core::Rect;
use glint_region::RegionSet;
use glint_scroll::{RowSpan, ScrollDetector, ScrollMove, ScrollTracker};

// ── Helpers ────────────────────────────────────────────────────

const WIDTH: u32 = 64;
const BPP: usize = 4;
const STRIDE: usize = WIDTH as usize * BPP;

/// A frame whose row `i` is filled from `seeds[i]`.
fn frame(seeds: &[u64]) -> Vec<u8> {
    let mut pixels = Vec::with_capacity(seeds.len() * STRIDE);
    for &seed in seeds {
        for x in 0..WIDTH as u64 {
            pixels.extend_from_slice(&(seed.wrapping_mul(0x9E3779B9).wrapping_add(x) as u32).to_le_bytes());
        }
    }
    pixels
}

fn feed(det: &mut ScrollDetector, seeds: &[u64]) {
    det.update(&frame(seeds), 0, 0, WIDTH, seeds.len() as u32, STRIDE, BPP)
        .unwrap();
}

// ── The synthetic scroll scenario ──────────────────────────────

#[test]
fn scroll_up_with_fresh_tail_reports_one_move_and_residuals() {
    let a: Vec<u64> = (0..100).collect();
    // Rows 10..90 move up by ten; the freed bottom fills with new content.
    let mut b: Vec<u64> = a[10..90].to_vec();
    b.extend(5000..5020);

    let mut det = ScrollDetector::new();
    feed(&mut det, &a);
    feed(&mut det, &b);
    det.calculate(50);
    let result = det.scroll_values(2);

    assert_eq!(
        result.scrolls,
        vec![ScrollMove {
            shift: -10,
            start: 0,
            count: 80
        }]
    );
    assert_eq!(
        result.residuals,
        vec![RowSpan {
            start: 80,
            count: 20
        }]
    );
}

#[test]
fn residuals_become_damage_rectangles() {
    let a: Vec<u64> = (0..50).collect();
    let mut b: Vec<u64> = a[5..50].to_vec();
    b.extend(9000..9005);

    let mut det = ScrollDetector::new();
    feed(&mut det, &a);
    feed(&mut det, &b);
    det.calculate(20);
    let result = det.scroll_values(2);

    // Residual bands become full-width damage at the window position.
    let region = result.residual_region(120, 40, WIDTH);
    assert_eq!(region.rects(), &[Rect::from_xywh(120, 85, WIDTH as i32, 5)]);

    // Folding into a larger damage set keeps rectangles disjoint.
    let mut damage = RegionSet::new();
    damage.add(Rect::from_xywh(100, 40, 64, 20));
    for rect in region.iter() {
        damage.add(rect);
    }
    let rects = damage.rects();
    for (i, r) in rects.iter().enumerate() {
        for other in rects.iter().skip(i + 1) {
            assert!(!r.intersects(*other));
        }
    }
}

#[test]
fn identical_frames_cover_everything_with_zero_shift() {
    let seeds: Vec<u64> = (300..380).collect();
    let mut det = ScrollDetector::new();
    feed(&mut det, &seeds);
    feed(&mut det, &seeds);
    det.calculate(10);
    let result = det.scroll_values(0);
    assert_eq!(
        result.scrolls,
        vec![ScrollMove {
            shift: 0,
            start: 0,
            count: 80
        }]
    );
    assert!(result.residuals.is_empty());
    assert!(result.residual_region(0, 0, WIDTH).is_empty());
}

// ── Tracker-mediated flow ──────────────────────────────────────

#[test]
fn tracker_serialises_per_window_sequences() {
    let tracker = ScrollTracker::new();
    let seeds: Vec<u64> = (0..30).collect();

    let entry = tracker.detector(42);
    {
        let mut det = entry.lock();
        feed(&mut det, &seeds);
        feed(&mut det, &seeds);
        det.calculate(10);
        let result = det.scroll_values(0);
        assert_eq!(result.scrolls.len(), 1);
    }

    // A second window starts from scratch.
    let other = tracker.detector(43);
    {
        let mut det = other.lock();
        feed(&mut det, &seeds);
        det.calculate(10);
        assert!(det.scroll_values(0).scrolls.is_empty());
    }
    assert_eq!(tracker.len(), 2);
}

#[test]
fn damage_invalidation_flows_into_residuals() {
    let seeds: Vec<u64> = (700..760).collect();
    let mut det = ScrollDetector::new();
    feed(&mut det, &seeds);
    feed(&mut det, &seeds);

    // The host reports damage over rows 20..25 of the region.
    det.invalidate(0, 20, WIDTH as i32, 5);
    det.calculate(10);
    let result = det.scroll_values(0);
    assert!(result.residuals.contains(&RowSpan { start: 20, count: 5 }));
}
