use crate::coords::ViewportDesc;
use crate::driver::{Driver, ViewportId};
use crate::guard;

use super::error::Result;

/// A driver viewport with unique ownership.
///
/// While attached, a viewport is owned by its [`Device`](super::Device).
/// Replacing or detaching it hands it back to the caller, who releases it
/// explicitly with [`Viewport::release`] or implicitly on drop.
pub struct Viewport<'p> {
    driver: &'p dyn Driver,
    id: ViewportId,
    desc: ViewportDesc,
    released: bool,
}

impl<'p> Viewport<'p> {
    /// Wraps a freshly created driver viewport; drop releases it.
    pub(crate) fn from_raw(driver: &'p dyn Driver, id: ViewportId, desc: ViewportDesc) -> Self {
        Self {
            driver,
            id,
            desc,
            released: false,
        }
    }

    #[inline]
    pub fn id(&self) -> ViewportId {
        self.id
    }

    #[inline]
    pub fn desc(&self) -> &ViewportDesc {
        &self.desc
    }

    /// Releases the driver viewport, detaching it from its device.
    pub fn release(mut self) -> Result<()> {
        self.released = true;
        guard!(self.driver.release_viewport(self.id))
    }
}

impl Drop for Viewport<'_> {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        if let Err(err) = guard!(self.driver.release_viewport(self.id)) {
            log::warn!("viewport {:?} leaked: {err}", self.id);
        }
    }
}

impl std::fmt::Debug for Viewport<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Viewport")
            .field("id", &self.id)
            .field("desc", &self.desc)
            .finish()
    }
}
