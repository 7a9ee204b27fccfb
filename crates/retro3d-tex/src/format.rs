use crate::error::TexError;

// ── Pixel format ──────────────────────────────────────────────────────────

/// Pixel format of every mip payload in a container.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum TexFormat {
    /// 16-bit `RRRRRGGG GGGBBBBB`, little-endian.
    Rgb565,
}

impl TexFormat {
    pub fn code(self) -> u8 {
        match self {
            TexFormat::Rgb565 => 0,
        }
    }

    pub fn from_code(code: u8) -> Result<Self, TexError> {
        match code {
            0 => Ok(TexFormat::Rgb565),
            other => Err(TexError::UnsupportedFormat(other)),
        }
    }

    pub fn bytes_per_pixel(self) -> usize {
        match self {
            TexFormat::Rgb565 => 2,
        }
    }
}

// ── Header & records ──────────────────────────────────────────────────────

/// Fixed-size container header.
///
/// `compressed` is carried for compatibility; payloads are always raw.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct TexHeader {
    pub width: i32,
    pub height: i32,
    pub format: TexFormat,
    pub compressed: bool,
    pub mip_count: i32,
}

impl TexHeader {
    /// Encoded size in bytes.
    pub const SIZE: usize = 4 + 4 + 1 + 1 + 4;

    /// Header for a raw RGB565 chain.
    pub fn rgb565(width: u32, height: u32, mip_count: u32) -> Self {
        Self {
            width: width as i32,
            height: height as i32,
            format: TexFormat::Rgb565,
            compressed: false,
            mip_count: mip_count as i32,
        }
    }

    pub(crate) fn validate(&self) -> Result<(), TexError> {
        if self.width <= 0 || self.height <= 0 || self.mip_count <= 0 || self.mip_count > 32 {
            return Err(TexError::InvalidHeader {
                width: self.width,
                height: self.height,
                mip_count: self.mip_count,
            });
        }
        Ok(())
    }
}

/// One mip level: its size and raw pixels.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct MipRecord {
    pub width: u16,
    pub height: u16,
    pub pixels: Vec<u8>,
}

impl MipRecord {
    /// Size of the per-record prefix preceding the pixels.
    pub const PREFIX_SIZE: usize = 2 + 2 + 4;
}

/// Number of levels from `size` down to 1, halving each time.
///
/// `mip_level_count(256) == 9`, `mip_level_count(1) == 1`, `mip_level_count(0) == 0`.
pub fn mip_level_count(size: u32) -> u32 {
    u32::BITS - size.leading_zeros()
}

/// Edge lengths of each level of a chain starting at `size`.
pub fn mip_sizes(size: u32) -> impl Iterator<Item = u32> {
    std::iter::successors(Some(size), |s| (*s > 1).then_some(s / 2)).take_while(|s| *s > 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_count_reaches_one() {
        assert_eq!(mip_level_count(256), 9);
        assert_eq!(mip_level_count(8), 4);
        assert_eq!(mip_level_count(6), 3);
        assert_eq!(mip_level_count(1), 1);
        assert_eq!(mip_level_count(0), 0);
    }

    #[test]
    fn sizes_match_count() {
        for size in [1u32, 2, 6, 8, 64, 1000, 1024] {
            let sizes: Vec<u32> = mip_sizes(size).collect();
            assert_eq!(sizes.len() as u32, mip_level_count(size), "size {size}");
            assert_eq!(sizes.first(), Some(&size));
            assert_eq!(sizes.last(), Some(&1));
        }
        assert_eq!(mip_sizes(0).count(), 0);
    }

    #[test]
    fn format_codes() {
        assert_eq!(TexFormat::from_code(0).unwrap(), TexFormat::Rgb565);
        assert!(matches!(TexFormat::from_code(3), Err(TexError::UnsupportedFormat(3))));
    }

    #[test]
    fn header_rejects_nonpositive_fields() {
        assert!(TexHeader::rgb565(8, 8, 4).validate().is_ok());
        let mut h = TexHeader::rgb565(8, 8, 4);
        h.width = -8;
        assert!(h.validate().is_err());
        h = TexHeader::rgb565(8, 8, 0);
        assert!(h.validate().is_err());
    }
}
