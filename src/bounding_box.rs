//! Overlay bounding boxes.
//!
//! [`BoundingBox`] describes the minimal rectangle of an overlay that a
//! subsequent [`render`](crate::SubtitleRenderer::render) call will touch.
//! It is recomputed on every [`prerender`](crate::SubtitleRenderer::prerender)
//! call so the caller can size and clear only the affected region instead of
//! redrawing the full overlay.

/// An axis-aligned rectangle in overlay pixel coordinates.
///
/// Coordinates are relative to the top-left corner of the subtitle overlay.
/// A box with zero `width` or `height` is *empty*: the render call it
/// describes will not write any pixels.
///
/// # Example
///
/// ```
/// use subrender::BoundingBox;
///
/// let a = BoundingBox::new(10, 10, 20, 5);
/// let b = BoundingBox::new(15, 12, 30, 4);
/// let u = a.union(&b);
/// assert_eq!(u, BoundingBox::new(10, 10, 35, 6));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BoundingBox {
    /// Horizontal offset of the left edge, in overlay pixels.
    pub x: i32,
    /// Vertical offset of the top edge, in overlay pixels.
    pub y: i32,
    /// Width in pixels. Zero means the box is empty.
    pub width: u32,
    /// Height in pixels. Zero means the box is empty.
    pub height: u32,
}

impl BoundingBox {
    /// Create a bounding box from its origin and size.
    pub fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        BoundingBox {
            x,
            y,
            width,
            height,
        }
    }

    /// The empty box anchored at the overlay origin.
    ///
    /// Returned by prerender when a cue produces no visible output (empty
    /// script, rasterization engine unavailable, all rectangles degenerate).
    pub fn empty() -> Self {
        BoundingBox::default()
    }

    /// Returns `true` if the box covers no pixels.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Number of pixels covered by the box.
    pub fn area(&self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }

    /// Build a box from inclusive-exclusive edge coordinates.
    ///
    /// Returns the empty box when `x1 > x2` or `y1 > y2`.
    pub fn from_extents(x1: i32, y1: i32, x2: i32, y2: i32) -> Self {
        if x2 <= x1 || y2 <= y1 {
            return BoundingBox::empty();
        }
        BoundingBox {
            x: x1,
            y: y1,
            width: (x2 - x1) as u32,
            height: (y2 - y1) as u32,
        }
    }

    /// Exclusive right edge.
    pub fn right(&self) -> i32 {
        self.x + self.width as i32
    }

    /// Exclusive bottom edge.
    pub fn bottom(&self) -> i32 {
        self.y + self.height as i32
    }

    /// Smallest box containing both `self` and `other`.
    ///
    /// Empty boxes are the identity element, so unions can be folded over a
    /// fragment list starting from [`BoundingBox::empty`].
    pub fn union(&self, other: &BoundingBox) -> BoundingBox {
        if self.is_empty() {
            return *other;
        }
        if other.is_empty() {
            return *self;
        }
        BoundingBox::from_extents(
            self.x.min(other.x),
            self.y.min(other.y),
            self.right().max(other.right()),
            self.bottom().max(other.bottom()),
        )
    }

    /// Clip the box to `[0, overlay_width) x [0, overlay_height)`.
    ///
    /// Fragments can extend past the overlay edges due to rounding or
    /// authoring; the clipped box is what prerender reports to the caller.
    pub fn clip(&self, overlay_width: u32, overlay_height: u32) -> BoundingBox {
        BoundingBox::from_extents(
            self.x.max(0),
            self.y.max(0),
            self.right().min(overlay_width as i32),
            self.bottom().min(overlay_height as i32),
        )
    }
}
