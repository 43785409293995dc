//! Rectangle set operations.

use smallvec::SmallVec;

use glint_core::Rect;

/// Rectangles covering `rect` minus `cut`.
///
/// The cut order is width-first: the full-width top strip, then the left
/// and right strips spanning the remaining height, then the full-width
/// bottom strip. At most four pieces come back; if the two do not overlap
/// the result is `rect` itself.
pub fn subtract(rect: Rect, cut: Rect) -> SmallVec<[Rect; 4]> {
    let mut pieces = SmallVec::new();
    if rect.is_empty() {
        return pieces;
    }
    let Some(overlap) = rect.intersection(cut) else {
        pieces.push(rect);
        return pieces;
    };

    // Top strip, full width
    if overlap.y > rect.y {
        pieces.push(Rect::from_xywh(
            rect.x,
            rect.y,
            rect.width,
            overlap.y - rect.y,
        ));
    }
    // Left and right strips, overlap height only
    if overlap.x > rect.x {
        pieces.push(Rect::from_xywh(
            rect.x,
            overlap.y,
            overlap.x - rect.x,
            overlap.height,
        ));
    }
    if overlap.right() < rect.right() {
        pieces.push(Rect::from_xywh(
            overlap.right(),
            overlap.y,
            rect.right() - overlap.right(),
            overlap.height,
        ));
    }
    // Bottom strip, full width
    if overlap.bottom() < rect.bottom() {
        pieces.push(Rect::from_xywh(
            rect.x,
            overlap.bottom(),
            rect.width,
            rect.bottom() - overlap.bottom(),
        ));
    }
    pieces
}

/// A set of rectangles in which no two members intersect.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegionSet {
    rects: Vec<Rect>,
}

impl RegionSet {
    /// Create an empty region.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of member rectangles.
    #[inline]
    pub fn len(&self) -> usize {
        self.rects.len()
    }

    /// Whether the region covers nothing.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rects.is_empty()
    }

    /// Member rectangles as a slice.
    #[inline]
    pub fn rects(&self) -> &[Rect] {
        &self.rects
    }

    /// Iterate over the member rectangles.
    pub fn iter(&self) -> impl Iterator<Item = Rect> + '_ {
        self.rects.iter().copied()
    }

    /// Total covered area in pixels.
    pub fn area(&self) -> i64 {
        self.rects.iter().map(|r| r.area()).sum()
    }

    /// Add a rectangle to the covered area.
    ///
    /// Members that overlap `rect` are cut down to their uncovered parts
    /// first, so the no-overlap invariant holds afterwards. Adding an
    /// already-covered or empty rectangle changes nothing.
    pub fn add(&mut self, rect: Rect) {
        if rect.is_empty() {
            return;
        }
        if self.rects.iter().any(|r| r.contains_rect(rect)) {
            return;
        }
        let mut next = Vec::with_capacity(self.rects.len() + 1);
        for &existing in &self.rects {
            if existing.intersects(rect) {
                next.extend(subtract(existing, rect));
            } else {
                next.push(existing);
            }
        }
        next.push(rect);
        self.rects = next;
    }

    /// Remove a rectangle from the covered area.
    pub fn remove(&mut self, rect: Rect) {
        if rect.is_empty() {
            return;
        }
        self.rects = self
            .rects
            .iter()
            .flat_map(|&r| subtract(r, rect))
            .collect();
    }

    /// Bounding rectangle of all members, or `None` when empty.
    pub fn merge_all(&self) -> Option<Rect> {
        let mut iter = self.rects.iter();
        let first = *iter.next()?;
        Some(iter.fold(first, |acc, &r| acc.union(r)))
    }

    /// Whether `rect` lies entirely inside the covered area.
    pub fn contains(&self, rect: Rect) -> bool {
        if rect.is_empty() {
            return true;
        }
        let mut remaining: Vec<Rect> = vec![rect];
        for &member in &self.rects {
            remaining = remaining
                .iter()
                .flat_map(|&piece| subtract(piece, member))
                .collect();
            if remaining.is_empty() {
                return true;
            }
        }
        false
    }
}

impl FromIterator<Rect> for RegionSet {
    fn from_iter<I: IntoIterator<Item = Rect>>(iter: I) -> Self {
        let mut set = Self::new();
        for rect in iter {
            set.add(rect);
        }
        set
    }
}
