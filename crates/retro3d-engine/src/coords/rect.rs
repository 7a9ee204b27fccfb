use crate::driver::ClearRect;

/// Axis-aligned rectangle in render-target pixels (top-left origin).
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    #[inline]
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self { x, y, width, height }
    }

    /// Rectangle covering a whole `width × height` target.
    #[inline]
    pub const fn from_size(width: u32, height: u32) -> Self {
        Self::new(0, 0, width as i32, height as i32)
    }

    #[inline]
    pub fn is_empty(self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    /// Normalizes the rectangle so width/height are non-negative.
    #[inline]
    pub fn normalized(self) -> Self {
        let mut r = self;
        if r.width < 0 {
            r.x += r.width;
            r.width = -r.width;
        }
        if r.height < 0 {
            r.y += r.height;
            r.height = -r.height;
        }
        r
    }

    /// Corner form consumed by viewport clears.
    #[inline]
    pub fn to_clear_rect(self) -> ClearRect {
        let r = self.normalized();
        ClearRect {
            x1: r.x,
            y1: r.y,
            x2: r.x.saturating_add(r.width),
            y2: r.y.saturating_add(r.height),
        }
    }
}
