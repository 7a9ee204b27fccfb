/// 8-bit-per-channel straight-alpha color.
///
/// Packs into the driver's 32-bit color word as `B | G << 8 | R << 16 | A << 24`
/// (ARGB in a little-endian dword), the layout used by clears and vertex
/// diffuse colors.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    #[inline]
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    #[inline]
    pub const fn black() -> Self {
        Self::new(0, 0, 0, 255)
    }

    #[inline]
    pub const fn white() -> Self {
        Self::new(255, 255, 255, 255)
    }

    #[inline]
    pub const fn packed(self) -> u32 {
        (self.b as u32) | ((self.g as u32) << 8) | ((self.r as u32) << 16) | ((self.a as u32) << 24)
    }

    #[inline]
    pub const fn from_packed(v: u32) -> Self {
        Self {
            r: (v >> 16) as u8,
            g: (v >> 8) as u8,
            b: v as u8,
            a: (v >> 24) as u8,
        }
    }
}

impl From<Color> for u32 {
    fn from(c: Color) -> u32 {
        c.packed()
    }
}

/// Floating-point RGBA color value as consumed by lights and materials.
///
/// Channels are nominally in `[0, 1]` but are not clamped; over-bright light
/// colors are legal.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct ColorValue {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl ColorValue {
    #[inline]
    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// RGB triple with zero alpha, the form lights and most material channels use.
    #[inline]
    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self::new(r, g, b, 0.0)
    }

    #[inline]
    pub fn is_finite(self) -> bool {
        self.r.is_finite() && self.g.is_finite() && self.b.is_finite() && self.a.is_finite()
    }
}

/// Packs a Win32-style `COLORREF` (`R | G << 8 | B << 16`).
///
/// Light states such as the ambient level take this layout, not [`Color::packed`].
#[inline]
pub const fn colorref(r: u8, g: u8, b: u8) -> u32 {
    (r as u32) | ((g as u32) << 8) | ((b as u32) << 16)
}
