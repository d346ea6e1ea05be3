//! Integer rectangles for copy and draw operations.
//!
//! A [`Rect`] is defined by its top-left corner `(x, y)` and its `width`/`height`
//! in pixels. `(0, 0)` is the top-left of the target being drawn on.
//!
//! ```
//! use gosub_render2d::render::Rect;
//!
//! let section = Rect::new(10, 10, 20, 20);
//! assert!(section.fits_within(100, 100));
//! assert!(!Rect::new(90, 0, 20, 5).fits_within(100, 100));
//! ```

use crate::render::backend::SurfaceSize;

#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rect {
    /// Horizontal offset in pixels from the origin.
    pub x: i32,

    /// Vertical offset in pixels from the origin.
    pub y: i32,

    /// Width in pixels.
    pub width: u32,

    /// Height in pixels.
    pub height: u32,
}

impl std::fmt::Debug for Rect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Rect {{ x: {}, y: {}, width: {}, height: {} }}",
            self.x, self.y, self.width, self.height
        )
    }
}

impl Rect {
    pub fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    /// Rectangle at the origin covering `size`.
    pub fn from_size(size: SurfaceSize) -> Self {
        Self::new(0, 0, size.width, size.height)
    }

    pub fn right(&self) -> i64 {
        self.x as i64 + self.width as i64
    }

    pub fn bottom(&self) -> i64 {
        self.y as i64 + self.height as i64
    }

    pub fn size(&self) -> SurfaceSize {
        SurfaceSize {
            width: self.width,
            height: self.height,
        }
    }

    /// True if this rectangle lies entirely inside `0..width` x `0..height`.
    pub fn fits_within(&self, width: u32, height: u32) -> bool {
        self.x >= 0 && self.y >= 0 && self.right() <= width as i64 && self.bottom() <= height as i64
    }

    /// Overlap with `0..width` x `0..height`, or `None` when nothing is visible.
    pub fn clip_to(&self, width: u32, height: u32) -> Option<Rect> {
        let x0 = (self.x as i64).max(0);
        let y0 = (self.y as i64).max(0);
        let x1 = self.right().min(width as i64);
        let y1 = self.bottom().min(height as i64);
        if x0 >= x1 || y0 >= y1 {
            return None;
        }
        Some(Rect::new(x0 as i32, y0 as i32, (x1 - x0) as u32, (y1 - y0) as u32))
    }
}
