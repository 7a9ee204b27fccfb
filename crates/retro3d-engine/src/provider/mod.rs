//! Surface providers: where devices and textures get their driver, render
//! target and pixel formats from.
//!
//! A windowing layer implements [`SurfaceProvider`] over its own primary and
//! back buffers. [`OffscreenProvider`] is a headless implementation over any
//! [`Driver`].

mod offscreen;

pub use offscreen::{OffscreenConfig, OffscreenProvider};

use crate::device::{Device, Error, FormatKind, Result};
use crate::driver::{Driver, EnumControl, PixelFormat, SurfaceId};
use crate::guard;

/// Pixel formats resolved once per adapter session.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct FormatConfig {
    /// Format of every texture created through the provider.
    pub texture: PixelFormat,
    /// Format of the depth buffer attached at device creation.
    pub depth: PixelFormat,
}

impl FormatConfig {
    /// Enumerates the adapter's formats and picks the first 16-bit pure RGB
    /// texture format and the first 16-bit depth-only format.
    pub fn resolve(driver: &dyn Driver) -> Result<Self> {
        let mut texture = None;
        let mut pick_texture = |f: &PixelFormat| {
            if f.is_opaque_rgb16() {
                texture = Some(*f);
                EnumControl::Stop
            } else {
                EnumControl::Continue
            }
        };
        guard!(driver.enum_texture_formats(&mut pick_texture))?;
        let texture = texture.ok_or(Error::FormatUnavailable(FormatKind::Texture))?;

        let mut depth = None;
        let mut pick_depth = |f: &PixelFormat| {
            if f.is_depth16() {
                depth = Some(*f);
                EnumControl::Stop
            } else {
                EnumControl::Continue
            }
        };
        guard!(driver.enum_depth_formats(&mut pick_depth))?;
        let depth = depth.ok_or(Error::FormatUnavailable(FormatKind::Depth))?;

        log::info!("texture format: {texture}");
        log::info!("depth format: {depth}");

        Ok(Self { texture, depth })
    }
}

/// The windowing collaborator consumed by the core.
///
/// Everything created through a provider borrows it, so a provider outlives
/// its devices and textures.
pub trait SurfaceProvider {
    fn driver(&self) -> &dyn Driver;

    /// Surface devices render into.
    fn render_target(&self) -> SurfaceId;

    /// Render target size in pixels.
    fn size(&self) -> (u32, u32);

    fn formats(&self) -> &FormatConfig;

    /// Creates a device over the render target with a depth buffer in the
    /// resolved depth format.
    fn create_device(&self) -> Result<Device<'_>> {
        Device::create(self.driver(), self.render_target(), self.size(), self.formats())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::SoftDriver;

    #[test]
    fn first_matching_format_wins() {
        let rgb565_alt = PixelFormat::rgb(16, 0x001F, 0x07E0, 0xF800, 0);
        let driver = SoftDriver::with_formats(
            vec![PixelFormat::ARGB1555, PixelFormat::RGB565, rgb565_alt],
            vec![PixelFormat::Z24, PixelFormat::Z16],
        );
        let config = FormatConfig::resolve(&driver).unwrap();
        assert_eq!(config.texture, PixelFormat::RGB565);
        assert_eq!(config.depth, PixelFormat::Z16);
    }

    #[test]
    fn missing_texture_format_is_reported() {
        let driver = SoftDriver::with_formats(vec![PixelFormat::ARGB4444], vec![PixelFormat::Z16]);
        let err = FormatConfig::resolve(&driver).unwrap_err();
        assert!(matches!(err, Error::FormatUnavailable(FormatKind::Texture)));
    }

    #[test]
    fn missing_depth_format_is_reported() {
        let driver = SoftDriver::with_formats(vec![PixelFormat::RGB565], vec![PixelFormat::Z24]);
        let err = FormatConfig::resolve(&driver).unwrap_err();
        assert!(matches!(err, Error::FormatUnavailable(FormatKind::Depth)));
    }
}
