//! Core types shared across the crate.
//!
//! - [`Cleanup`] - teardown closure returned by effects and hooks
//! - [`BoundRect`] - absolute rectangle in terminal cells
//! - [`intersection_ratio`] - visible fraction of one rect inside another

// =============================================================================
// Cleanup Function
// =============================================================================

/// Cleanup function returned by effects and hooks.
///
/// Call this to stop the effect and release whatever it holds.
pub type Cleanup = Box<dyn FnOnce()>;

// =============================================================================
// Rectangles
// =============================================================================

/// An axis-aligned rectangle in absolute terminal coordinates.
///
/// Positions may be negative (content scrolled above or left of the root).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BoundRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl BoundRect {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    pub fn area(&self) -> f32 {
        self.width.max(0.0) * self.height.max(0.0)
    }

    /// Check whether a point lies inside the rect (edges inclusive).
    pub fn contains_point(&self, x: f32, y: f32) -> bool {
        x >= self.x && x <= self.right() && y >= self.y && y <= self.bottom()
    }

    /// Overlapping region of two rects, or `None` if they do not overlap.
    pub fn intersection(&self, other: &BoundRect) -> Option<BoundRect> {
        let left = self.x.max(other.x);
        let top = self.y.max(other.y);
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());

        if right <= left || bottom <= top {
            return None;
        }

        Some(BoundRect::new(left, top, right - left, bottom - top))
    }

    /// Grow the rect outward by the given edge offsets.
    ///
    /// Negative offsets shrink it. Width and height never go below zero.
    pub fn expand(&self, top: f32, right: f32, bottom: f32, left: f32) -> BoundRect {
        BoundRect::new(
            self.x - left,
            self.y - top,
            (self.width + left + right).max(0.0),
            (self.height + top + bottom).max(0.0),
        )
    }
}

/// Fraction of `target` that lies inside `boundary`, in `[0, 1]`.
///
/// A zero-area target counts as fully visible when its origin is inside the
/// boundary. A target or overlap without a finite area (infinite or NaN
/// extents) counts as not visible.
pub fn intersection_ratio(target: &BoundRect, boundary: &BoundRect) -> f64 {
    let target_area = target.area();
    if !target_area.is_finite() {
        return 0.0;
    }
    if target_area <= 0.0 {
        return if boundary.contains_point(target.x, target.y) { 1.0 } else { 0.0 };
    }

    let visible = target
        .intersection(boundary)
        .map(|overlap| overlap.area())
        .unwrap_or(0.0);
    if !visible.is_finite() {
        return 0.0;
    }

    (f64::from(visible) / f64::from(target_area)).clamp(0.0, 1.0)
}

// =============================================================================
// Tests
// =============================================================================
