use image::DynamicImage;
use retro3d_tex::mip_level_count;

use crate::device::{InputError, Result};
use crate::driver::{ColorKey, Driver, PixelFormat, SurfaceCaps, SurfaceDesc, SurfaceId, TextureViewId};
use crate::guard;
use crate::provider::SurfaceProvider;

use super::staging::StagingSurface;

/// One level of a texture's mip chain.
///
/// `surface` is borrowed from the chain root and is never released on its own.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct MipLevel {
    pub index: u32,
    pub surface: SurfaceId,
    pub width: u32,
    pub height: u32,
}

/// A driver-resident texture with a fixed mip chain.
///
/// Dimensions and mip count are immutable; only surface contents change, via
/// [`from_pixel_array`](Self::from_pixel_array) and
/// [`from_bitmap`](Self::from_bitmap). The texture borrows the provider's
/// driver and so cannot outlive the provider.
pub struct Texture<'p> {
    driver: &'p dyn Driver,
    surface: SurfaceId,
    view: TextureViewId,
    width: u32,
    height: u32,
    mip_count: u32,
    format: PixelFormat,
    released: bool,
}

impl<'p> Texture<'p> {
    /// Creates a `width × height` texture with `mip_count` levels in the
    /// provider's texture format.
    ///
    /// `mip_count` must lie in `1..=mip_level_count(max(width, height))`: a
    /// chain stops at the level whose larger edge is 1.
    pub fn new(provider: &'p dyn SurfaceProvider, width: u32, height: u32, mip_count: u32) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(InputError::InvalidDimensions { width, height }.into());
        }
        let max_mips = mip_level_count(width.max(height));
        if mip_count == 0 || mip_count > max_mips {
            return Err(InputError::InvalidMipCount.into());
        }

        let driver = provider.driver();
        let format = provider.formats().texture;

        let mut caps = SurfaceCaps::TEXTURE | SurfaceCaps::TEXTURE_MANAGE;
        if mip_count > 1 {
            caps |= SurfaceCaps::COMPLEX | SurfaceCaps::MIPMAP;
        }

        let surface = guard!(driver.create_surface(&SurfaceDesc {
            width,
            height,
            format,
            caps,
            mip_count,
            src_color_key: Some(ColorKey { low: 0, high: 0 }),
        }))?;

        let view = match guard!(driver.create_texture_view(surface)) {
            Ok(view) => view,
            Err(err) => {
                if let Err(cleanup) = guard!(driver.release_surface(surface)) {
                    log::warn!("texture surface {:?} leaked: {cleanup}", surface);
                }
                return Err(err);
            }
        };

        log::debug!("texture {:?} created: {}x{}, {} mips", surface, width, height, mip_count);

        Ok(Self {
            driver,
            surface,
            view,
            width,
            height,
            mip_count,
            format,
            released: false,
        })
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    pub fn mip_count(&self) -> u32 {
        self.mip_count
    }

    #[inline]
    pub fn format(&self) -> PixelFormat {
        self.format
    }

    /// Root surface, which is also mip level 0.
    #[inline]
    pub fn surface(&self) -> SurfaceId {
        self.surface
    }

    #[inline]
    pub fn view(&self) -> TextureViewId {
        self.view
    }

    /// Walks the mip chain from level 0 and reports every level's size.
    pub fn levels(&self) -> Result<Vec<MipLevel>> {
        let mut levels = Vec::with_capacity(self.mip_count as usize);
        let mut next = Some(self.surface);
        while let Some(surface) = next {
            let info = guard!(self.driver.surface_desc(surface))?;
            levels.push(MipLevel {
                index: levels.len() as u32,
                surface,
                width: info.width,
                height: info.height,
            });
            next = guard!(self.driver.attached_surface(surface))?;
        }
        Ok(levels)
    }

    /// Uploads one tightly packed image into the mip level of size
    /// `width × height`.
    ///
    /// Bytes are copied verbatim, without format conversion. A buffer shorter
    /// than the level leaves the remainder zeroed; a longer one is rejected
    /// with [`InputError::PixelOverflow`]. Levels are matched by size, so
    /// `mip_level` is only a hint. No level other than the matched one is
    /// written, and nothing is written if no level matches.
    ///
    /// Input errors are reported before any driver call.
    pub fn from_pixel_array(&mut self, pixels: &[u8], width: u32, height: u32, mip_level: u32) -> Result<()> {
        if pixels.is_empty() {
            return Err(InputError::EmptyPixels.into());
        }
        if width == 0 || height == 0 {
            return Err(InputError::InvalidDimensions { width, height }.into());
        }
        let capacity = width as usize * height as usize * self.format.bytes_per_pixel();
        if pixels.len() > capacity {
            return Err(InputError::PixelOverflow {
                len: pixels.len(),
                capacity,
            }
            .into());
        }

        let format = guard!(self.driver.surface_desc(self.surface))?.format;
        let staging = StagingSurface::new(self.driver, width, height, format)?;

        let mut level = 0;
        let mut next = Some(self.surface);
        while let Some(surface) = next {
            let info = guard!(self.driver.surface_desc(surface))?;
            if info.width == width && info.height == height {
                if level != mip_level {
                    log::debug!("mip hint {mip_level} differs from level {level} matched by size");
                }

                staging.write_bytes(pixels)?;
                log::debug!("uploading mip {}x{}", width, height);
                staging.blit_to(surface)?;
                return staging.release();
            }
            next = guard!(self.driver.attached_surface(surface))?;
            level += 1;
        }

        Err(InputError::LevelNotFound { width, height }.into())
    }

    /// Imports `bitmap` into mip level 0.
    ///
    /// Pixels are converted to the texture format and clipped to the texture's
    /// size; texels the bitmap does not cover are zero. An empty bitmap fails
    /// with [`InputError::EmptyBitmap`].
    pub fn from_bitmap(&mut self, bitmap: &DynamicImage) -> Result<()> {
        if bitmap.width() == 0 || bitmap.height() == 0 {
            return Err(InputError::EmptyBitmap.into());
        }

        let format = guard!(self.driver.surface_desc(self.surface))?.format;
        let staging = StagingSurface::new(self.driver, self.width, self.height, format)?;

        let rgba = bitmap.to_rgba8();
        let bpp = format.bytes_per_pixel();
        staging.lock(|bytes, info| {
            let rows = rgba.height().min(info.height);
            let cols = rgba.width().min(info.width);
            for y in 0..rows {
                let row = y as usize * info.pitch;
                for x in 0..cols {
                    let [r, g, b, a] = rgba.get_pixel(x, y).0;
                    let at = row + x as usize * bpp;
                    format.write_pixel(&mut bytes[at..at + bpp], format.pack_rgba(r, g, b, a));
                }
            }
        })?;

        log::debug!(
            "bitmap {}x{} imported into {}x{} texture",
            bitmap.width(),
            bitmap.height(),
            self.width,
            self.height
        );
        staging.blit_to(self.surface)?;
        staging.release()
    }

    /// Releases the texture view and the surface with its mip chain.
    pub fn release(mut self) -> Result<()> {
        self.release_resources()
    }

    fn release_resources(&mut self) -> Result<()> {
        self.released = true;
        guard!(self.driver.release_texture_view(self.view))?;
        guard!(self.driver.release_surface(self.surface))?;
        log::debug!("texture {:?} released", self.surface);
        Ok(())
    }
}

impl Drop for Texture<'_> {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        if let Err(err) = self.release_resources() {
            log::warn!("texture {:?} release failed: {err}", self.surface);
        }
    }
}

impl std::fmt::Debug for Texture<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Texture")
            .field("surface", &self.surface)
            .field("view", &self.view)
            .field("width", &self.width)
            .field("height", &self.height)
            .field("mip_count", &self.mip_count)
            .finish()
    }
}
