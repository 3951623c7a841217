#![forbid(unsafe_code)]

//! Geometric primitives.
//!
//! All values are CSS pixels as `f64`. Element bounds are viewport-relative
//! (origin at the viewport's top-left), matching what a bounding-client-rect
//! query reports.

/// Vertical extent of a section element relative to the viewport top.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ElementBounds {
    /// Top edge (may be negative once scrolled past).
    pub top: f64,
    /// Height of the element.
    pub height: f64,
}

impl ElementBounds {
    #[inline]
    pub const fn new(top: f64, height: f64) -> Self {
        Self { top, height }
    }

    /// Bottom edge (exclusive).
    #[inline]
    pub fn bottom(&self) -> f64 {
        self.top + self.height.max(0.0)
    }

    /// Fraction of the element inside `[clip_top, clip_bottom)`, in `[0, 1]`.
    ///
    /// Zero-height elements count as fully visible when their top lies inside
    /// the clip range, the same convention intersection observers use.
    pub fn visible_ratio(&self, clip_top: f64, clip_bottom: f64) -> f64 {
        let height = self.height.max(0.0);
        if height == 0.0 {
            return if self.top >= clip_top && self.top < clip_bottom {
                1.0
            } else {
                0.0
            };
        }
        let top = self.top.max(clip_top);
        let bottom = self.bottom().min(clip_bottom);
        if bottom <= top {
            return 0.0;
        }
        ((bottom - top) / height).clamp(0.0, 1.0)
    }
}

/// Horizontal placement of a tab control relative to its strip.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TabBounds {
    /// Tab left edge in page coordinates.
    pub left: f64,
    /// Tab width.
    pub width: f64,
    /// Left edge of the tab's positioned container.
    pub strip_left: f64,
}

impl TabBounds {
    #[inline]
    pub const fn new(left: f64, width: f64, strip_left: f64) -> Self {
        Self {
            left,
            width,
            strip_left,
        }
    }

    /// Left offset of the tab inside its container.
    #[inline]
    pub fn offset_left(&self) -> f64 {
        self.left - self.strip_left
    }
}

/// Advisory geometry for the sliding highlight under the active tab.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct IndicatorGeometry {
    pub left: f64,
    pub width: f64,
}

impl IndicatorGeometry {
    /// Geometry for `tab`, shrunk by `inset` on both sides.
    ///
    /// The width never goes negative; a tab narrower than twice the inset
    /// yields a zero-width indicator.
    #[must_use]
    pub fn for_tab(tab: &TabBounds, inset: f64) -> Self {
        let inset = inset.max(0.0);
        Self {
            left: tab.offset_left() + inset,
            width: (tab.width - 2.0 * inset).max(0.0),
        }
    }

    /// Equality within half a pixel; sub-pixel jitter is not a layout change.
    #[must_use]
    pub fn approx_eq(&self, other: &Self) -> bool {
        (self.left - other.left).abs() < 0.5 && (self.width - other.width).abs() < 0.5
    }
}
