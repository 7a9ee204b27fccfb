use crate::device::{InputError, Result};
use crate::driver::{Driver, LockFlags, LockInfo, PixelFormat, SurfaceCaps, SurfaceDesc, SurfaceId};
use crate::guard;

/// A temporary CPU-visible surface used to move pixels into a texture level.
///
/// Lives for one upload. Released explicitly on success and by `Drop` on
/// every early return, so each staging surface is released exactly once.
pub(crate) struct StagingSurface<'p> {
    driver: &'p dyn Driver,
    id: SurfaceId,
    capacity: usize,
    released: bool,
}

impl<'p> StagingSurface<'p> {
    /// Allocates a `width × height` system-memory surface in `format`.
    pub(crate) fn new(driver: &'p dyn Driver, width: u32, height: u32, format: PixelFormat) -> Result<Self> {
        let id = guard!(driver.create_surface(&SurfaceDesc {
            width,
            height,
            format,
            caps: SurfaceCaps::TEXTURE | SurfaceCaps::SYSTEM_MEMORY,
            mip_count: 1,
            src_color_key: None,
        }))?;

        // From here on `Drop` owns the cleanup.
        let mut staging = Self {
            driver,
            id,
            capacity: 0,
            released: false,
        };
        staging.capacity = guard!(driver.surface_desc(id))?.capacity();
        Ok(staging)
    }

    /// Bytes addressable through a lock.
    #[inline]
    pub(crate) fn capacity(&self) -> usize {
        self.capacity
    }

    /// Copies `pixels` verbatim to the start of the surface.
    ///
    /// Fails with [`InputError::PixelOverflow`] before locking if the buffer
    /// is larger than the surface.
    pub(crate) fn write_bytes(&self, pixels: &[u8]) -> Result<()> {
        if pixels.len() > self.capacity {
            return Err(InputError::PixelOverflow {
                len: pixels.len(),
                capacity: self.capacity,
            }
            .into());
        }
        self.lock(|bytes, _| {
            let n = pixels.len().min(bytes.len());
            bytes[..n].copy_from_slice(&pixels[..n]);
        })
    }

    /// Locks the surface for writing and runs `write` over its bytes.
    pub(crate) fn lock(&self, mut write: impl FnMut(&mut [u8], LockInfo)) -> Result<()> {
        guard!(self
            .driver
            .lock_surface(self.id, LockFlags::WRITE_ONLY | LockFlags::WAIT, &mut write))
    }

    /// Copies the whole staging surface onto `dst`.
    pub(crate) fn blit_to(&self, dst: SurfaceId) -> Result<()> {
        guard!(self.driver.blit(dst, self.id))
    }

    pub(crate) fn release(mut self) -> Result<()> {
        self.released = true;
        guard!(self.driver.release_surface(self.id))
    }
}

impl Drop for StagingSurface<'_> {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        if let Err(err) = guard!(self.driver.release_surface(self.id)) {
            log::warn!("staging surface {:?} leaked: {err}", self.id);
        }
    }
}
