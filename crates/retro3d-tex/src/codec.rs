use std::io::{Read, Write};

use crate::error::TexError;
use crate::format::{MipRecord, TexFormat, TexHeader};

// ── Primitive readers ─────────────────────────────────────────────────────

fn read_array<const N: usize>(r: &mut impl Read, what: &'static str) -> Result<[u8; N], TexError> {
    let mut buf = [0u8; N];
    r.read_exact(&mut buf).map_err(|e| TexError::from_io(e, what))?;
    Ok(buf)
}

fn read_i32(r: &mut impl Read, what: &'static str) -> Result<i32, TexError> {
    read_array::<4>(r, what).map(i32::from_le_bytes)
}

fn read_u32(r: &mut impl Read, what: &'static str) -> Result<u32, TexError> {
    read_array::<4>(r, what).map(u32::from_le_bytes)
}

fn read_u16(r: &mut impl Read, what: &'static str) -> Result<u16, TexError> {
    read_array::<2>(r, what).map(u16::from_le_bytes)
}

fn read_u8(r: &mut impl Read, what: &'static str) -> Result<u8, TexError> {
    read_array::<1>(r, what).map(|[b]| b)
}

// ── Header ────────────────────────────────────────────────────────────────

impl TexHeader {
    /// Reads and validates a header.
    pub fn read(r: &mut impl Read) -> Result<Self, TexError> {
        let width = read_i32(r, "header width")?;
        let height = read_i32(r, "header height")?;
        let format = TexFormat::from_code(read_u8(r, "header format")?)?;
        let compressed = read_u8(r, "header compression flag")? != 0;
        let mip_count = read_i32(r, "header mip count")?;

        let header = Self {
            width,
            height,
            format,
            compressed,
            mip_count,
        };
        header.validate()?;
        Ok(header)
    }

    pub fn write(&self, w: &mut impl Write) -> Result<(), TexError> {
        w.write_all(&self.width.to_le_bytes())?;
        w.write_all(&self.height.to_le_bytes())?;
        w.write_all(&[self.format.code(), self.compressed as u8])?;
        w.write_all(&self.mip_count.to_le_bytes())?;
        Ok(())
    }
}

// ── Mip records ───────────────────────────────────────────────────────────

impl MipRecord {
    /// Reads record `index`.
    ///
    /// A declared payload larger than `width * height` pixels of `format` is
    /// rejected before anything is allocated.
    pub fn read(r: &mut impl Read, format: TexFormat, index: usize) -> Result<Self, TexError> {
        let width = read_u16(r, "mip width")?;
        let height = read_u16(r, "mip height")?;
        let linear_size = read_u32(r, "mip size")?;

        let limit = width as usize * height as usize * format.bytes_per_pixel();
        if linear_size as usize > limit {
            return Err(TexError::InvalidRecord {
                index,
                width,
                height,
                linear_size,
            });
        }

        let mut pixels = vec![0u8; linear_size as usize];
        r.read_exact(&mut pixels)
            .map_err(|e| TexError::from_io(e, "mip pixels"))?;

        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    pub fn write(&self, w: &mut impl Write) -> Result<(), TexError> {
        w.write_all(&self.width.to_le_bytes())?;
        w.write_all(&self.height.to_le_bytes())?;
        w.write_all(&(self.pixels.len() as u32).to_le_bytes())?;
        w.write_all(&self.pixels)?;
        Ok(())
    }
}

// ── Whole file ────────────────────────────────────────────────────────────

/// A decoded container: header plus every mip record, largest first.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct TexFile {
    pub header: TexHeader,
    pub mips: Vec<MipRecord>,
}

impl TexFile {
    pub fn read(r: &mut impl Read) -> Result<Self, TexError> {
        let header = TexHeader::read(r)?;
        let mips = (0..header.mip_count as usize)
            .map(|i| MipRecord::read(r, header.format, i))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { header, mips })
    }

    pub fn write(&self, w: &mut impl Write) -> Result<(), TexError> {
        if self.header.mip_count < 0 || self.header.mip_count as usize != self.mips.len() {
            return Err(TexError::MipCountMismatch {
                declared: self.header.mip_count,
                actual: self.mips.len(),
            });
        }
        self.header.write(w)?;
        for mip in &self.mips {
            mip.write(w)?;
        }
        Ok(())
    }
}
