/// Normalized clip volume mapped onto the viewport.
///
/// `x`/`y` are the left/top edges in clip space, `width`/`height` its extent.
/// The conventional full-screen volume is `x = -1, width = 2, y = 1, height = 2`.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ClipRect {
    pub x: f32,
    pub width: f32,
    pub y: f32,
    pub height: f32,
}

impl ClipRect {
    #[inline]
    pub const fn new(x: f32, width: f32, y: f32, height: f32) -> Self {
        Self { x, width, y, height }
    }

    /// The full `[-1, 1]` clip square.
    #[inline]
    pub const fn full() -> Self {
        Self::new(-1.0, 2.0, 1.0, 2.0)
    }
}

impl Default for ClipRect {
    fn default() -> Self {
        Self::full()
    }
}

/// Viewport parameters: pixel size, clip volume and maximum normalized depth.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ViewportDesc {
    pub width: u32,
    pub height: u32,
    pub clip: ClipRect,
    pub max_z: f32,
}

impl ViewportDesc {
    #[inline]
    pub const fn new(width: u32, height: u32, clip: ClipRect, max_z: f32) -> Self {
        Self {
            width,
            height,
            clip,
            max_z,
        }
    }

    /// Full-target viewport with the default clip volume and depth range `[0, 1]`.
    #[inline]
    pub const fn full(width: u32, height: u32) -> Self {
        Self::new(width, height, ClipRect::full(), 1.0)
    }

    #[inline]
    pub fn is_valid(self) -> bool {
        self.width > 0
            && self.height > 0
            && self.clip.width.is_finite()
            && self.clip.height.is_finite()
            && self.max_z.is_finite()
    }
}
