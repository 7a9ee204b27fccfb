use bitflags::bitflags;

bitflags! {
    /// Pixel format classification bits.
    #[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
    pub struct PixelFormatFlags: u32 {
        const ALPHA_PIXELS = 0x0000_0001;
        const RGB          = 0x0000_0040;
        const ZBUFFER      = 0x0000_0400;
    }
}

/// Surface pixel layout described by channel bit masks.
///
/// Pixels are stored little-endian in `bytes_per_pixel()` bytes.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct PixelFormat {
    pub flags: PixelFormatFlags,
    /// Bits per pixel (color formats) or depth bits (depth formats).
    pub bit_count: u32,
    pub r_mask: u32,
    pub g_mask: u32,
    pub b_mask: u32,
    pub a_mask: u32,
}

impl PixelFormat {
    pub const RGB565: PixelFormat = PixelFormat::rgb(16, 0xF800, 0x07E0, 0x001F, 0);
    pub const XRGB1555: PixelFormat = PixelFormat::rgb(16, 0x7C00, 0x03E0, 0x001F, 0);
    pub const ARGB1555: PixelFormat = PixelFormat::rgb(16, 0x7C00, 0x03E0, 0x001F, 0x8000);
    pub const ARGB4444: PixelFormat = PixelFormat::rgb(16, 0x0F00, 0x00F0, 0x000F, 0xF000);
    pub const XRGB8888: PixelFormat = PixelFormat::rgb(32, 0x00FF_0000, 0x0000_FF00, 0x0000_00FF, 0);
    pub const Z16: PixelFormat = PixelFormat::depth(16);
    pub const Z24: PixelFormat = PixelFormat::depth(24);

    /// RGB color format; a non-zero `a_mask` adds `ALPHA_PIXELS`.
    pub const fn rgb(bit_count: u32, r_mask: u32, g_mask: u32, b_mask: u32, a_mask: u32) -> Self {
        let flags = if a_mask != 0 {
            PixelFormatFlags::RGB.union(PixelFormatFlags::ALPHA_PIXELS)
        } else {
            PixelFormatFlags::RGB
        };
        Self {
            flags,
            bit_count,
            r_mask,
            g_mask,
            b_mask,
            a_mask,
        }
    }

    pub const fn depth(bit_count: u32) -> Self {
        Self {
            flags: PixelFormatFlags::ZBUFFER,
            bit_count,
            r_mask: 0,
            g_mask: 0,
            b_mask: 0,
            a_mask: 0,
        }
    }

    #[inline]
    pub fn bytes_per_pixel(&self) -> usize {
        (self.bit_count as usize).div_ceil(8)
    }

    /// 16-bit color format with no alpha channel and no other classification bits.
    #[inline]
    pub fn is_opaque_rgb16(&self) -> bool {
        self.bit_count == 16 && self.flags == PixelFormatFlags::RGB
    }

    /// 16-bit depth-only format.
    #[inline]
    pub fn is_depth16(&self) -> bool {
        self.bit_count == 16 && self.flags == PixelFormatFlags::ZBUFFER
    }

    /// Packs 8-bit channels into this format's masks, truncating low bits.
    pub fn pack_rgba(&self, r: u8, g: u8, b: u8, a: u8) -> u32 {
        pack_channel(r, self.r_mask)
            | pack_channel(g, self.g_mask)
            | pack_channel(b, self.b_mask)
            | pack_channel(a, self.a_mask)
    }

    /// Writes one packed pixel into `dst` (little-endian, `bytes_per_pixel` bytes).
    pub fn write_pixel(&self, dst: &mut [u8], value: u32) {
        let n = self.bytes_per_pixel().min(4);
        dst[..n].copy_from_slice(&value.to_le_bytes()[..n]);
    }
}

impl std::fmt::Display for PixelFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.flags.contains(PixelFormatFlags::ZBUFFER) {
            return write!(f, "Z{}", self.bit_count);
        }
        write!(
            f,
            "{}-bit RGB (r {:#06x}, g {:#06x}, b {:#06x}, a {:#06x})",
            self.bit_count, self.r_mask, self.g_mask, self.b_mask, self.a_mask
        )
    }
}

fn pack_channel(value: u8, mask: u32) -> u32 {
    if mask == 0 {
        return 0;
    }
    let shift = mask.trailing_zeros();
    let bits = (mask >> shift).count_ones();
    let v = value as u32;
    let scaled = if bits >= 8 { v << (bits - 8) } else { v >> (8 - bits) };
    (scaled << shift) & mask
}
