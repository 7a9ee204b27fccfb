use crate::device::Result;
use crate::driver::{Driver, SoftDriver, SurfaceCaps, SurfaceDesc, SurfaceId};
use crate::guard;

use super::{FormatConfig, SurfaceProvider};

/// Offscreen render target configuration.
#[derive(Debug, Clone)]
pub struct OffscreenConfig {
    pub width: u32,
    pub height: u32,
}

impl Default for OffscreenConfig {
    fn default() -> Self {
        Self {
            width: 640,
            height: 480,
        }
    }
}

/// Headless [`SurfaceProvider`]: owns a driver and one offscreen render target.
///
/// Formats are resolved once at construction. The render target (and the depth
/// buffer a device attaches to it) is released when the provider drops.
pub struct OffscreenProvider<D: Driver = SoftDriver> {
    driver: D,
    render_target: SurfaceId,
    size: (u32, u32),
    formats: FormatConfig,
}

impl OffscreenProvider<SoftDriver> {
    /// Provider over a fresh [`SoftDriver`].
    pub fn new(config: OffscreenConfig) -> Result<Self> {
        Self::with_driver(SoftDriver::new(), config)
    }
}

impl<D: Driver> OffscreenProvider<D> {
    pub fn with_driver(driver: D, config: OffscreenConfig) -> Result<Self> {
        let formats = FormatConfig::resolve(&driver)?;

        let render_target = guard!(driver.create_surface(&SurfaceDesc {
            width: config.width,
            height: config.height,
            format: formats.texture,
            caps: SurfaceCaps::OFFSCREEN_PLAIN | SurfaceCaps::DEVICE_3D | SurfaceCaps::VIDEO_MEMORY,
            mip_count: 1,
            src_color_key: None,
        }))?;

        log::debug!(
            "offscreen render target {:?}: {}x{}",
            render_target,
            config.width,
            config.height
        );

        Ok(Self {
            driver,
            render_target,
            size: (config.width, config.height),
            formats,
        })
    }

    /// The concrete driver, for inspection.
    #[inline]
    pub fn backend(&self) -> &D {
        &self.driver
    }
}

impl<D: Driver> SurfaceProvider for OffscreenProvider<D> {
    fn driver(&self) -> &dyn Driver {
        &self.driver
    }

    fn render_target(&self) -> SurfaceId {
        self.render_target
    }

    fn size(&self) -> (u32, u32) {
        self.size
    }

    fn formats(&self) -> &FormatConfig {
        &self.formats
    }
}

impl<D: Driver> Drop for OffscreenProvider<D> {
    fn drop(&mut self) {
        if let Err(err) = guard!(self.driver.release_surface(self.render_target)) {
            log::warn!("render target {:?} leaked: {err}", self.render_target);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_target_is_640x480() {
        let provider = OffscreenProvider::new(OffscreenConfig::default()).unwrap();
        assert_eq!(provider.size(), (640, 480));
        let info = provider.backend().surface_desc(provider.render_target()).unwrap();
        assert_eq!((info.width, info.height), (640, 480));
        assert!(info.caps.contains(SurfaceCaps::DEVICE_3D));
    }

    #[test]
    fn device_gets_a_depth_buffer_in_the_resolved_format() {
        let provider = OffscreenProvider::new(OffscreenConfig { width: 64, height: 32 }).unwrap();
        let device = provider.create_device().unwrap();

        let children = provider.backend().attached_children(provider.render_target());
        assert_eq!(children.len(), 1);
        let depth = provider.backend().surface_desc(children[0]).unwrap();
        assert_eq!(depth.format, provider.formats().depth);
        assert_eq!((depth.width, depth.height), (64, 32));

        device.release().unwrap();
    }
}
