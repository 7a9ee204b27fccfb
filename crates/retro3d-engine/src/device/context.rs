use crate::coords::{Rect, ViewportDesc};
use crate::driver::{
    ClearFlags, ContextId, DrawFlags, Driver, LightState, MaterialId, SurfaceCaps, SurfaceDesc,
    SurfaceId,
};
use crate::guard;
use crate::paint::{colorref, Color, Material};
use crate::provider::FormatConfig;
use crate::resource::{Light, Texture};

use super::error::{InputError, Result};
use super::state::{StateWrite, SCENE_BASELINE};
use super::{
    Matrix4, PrimitiveType, RenderState, StateValue, TextureStageState, TransformKind, Vertex,
    VertexFormat, Viewport,
};

/// Ambient light level forced by every `set_material`, as a `COLORREF`.
pub const MATERIAL_AMBIENT: u32 = colorref(255, 254, 242);

/// Where the device is in the frame protocol.
///
/// This mirrors the driver after each successful call; it is informational.
/// Ordering violations are reported by the driver itself.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum SceneState {
    /// Context exists, no viewport attached.
    Created,
    ViewportAttached,
    InScene,
    /// Inside `begin`/`end`, nested in a scene.
    InPrimitive,
}

/// A fixed-function rendering context over a provider's render target.
///
/// Owns the driver context, the current viewport and one default material.
/// The driver is borrowed from the surface provider, which therefore outlives
/// the device.
///
/// Frame protocol:
/// `begin_scene` → state/resource binding → (`begin` → `vertex`* → `end`)* → `end_scene`.
pub struct Device<'p> {
    driver: &'p dyn Driver,
    render_target: SurfaceId,
    depth: SurfaceId,
    context: ContextId,
    material: MaterialId,
    viewport: Option<Viewport<'p>>,
    scene: SceneState,
    released: bool,
}

impl<'p> Device<'p> {
    /// Creates a depth buffer for `render_target`, the context over it and the
    /// default material.
    pub(crate) fn create(
        driver: &'p dyn Driver,
        render_target: SurfaceId,
        size: (u32, u32),
        formats: &FormatConfig,
    ) -> Result<Self> {
        let depth = guard!(driver.create_surface(&SurfaceDesc {
            width: size.0,
            height: size.1,
            format: formats.depth,
            caps: SurfaceCaps::ZBUFFER | SurfaceCaps::VIDEO_MEMORY,
            mip_count: 1,
            src_color_key: None,
        }))?;

        if let Err(err) = guard!(driver.attach_surface(render_target, depth)) {
            if let Err(cleanup) = guard!(driver.release_surface(depth)) {
                log::warn!("depth buffer leaked: {cleanup}");
            }
            return Err(err);
        }

        let context = match guard!(driver.create_context(render_target)) {
            Ok(c) => c,
            Err(err) => {
                if let Err(cleanup) = release_depth(driver, render_target, depth) {
                    log::warn!("depth buffer leaked: {cleanup}");
                }
                return Err(err);
            }
        };

        let material = match guard!(driver.create_material()) {
            Ok(m) => m,
            Err(err) => {
                if let Err(cleanup) = guard!(driver.release_context(context)) {
                    log::warn!("context leaked: {cleanup}");
                }
                if let Err(cleanup) = release_depth(driver, render_target, depth) {
                    log::warn!("depth buffer leaked: {cleanup}");
                }
                return Err(err);
            }
        };

        log::debug!(
            "device created: {:?} over {:?} ({}x{})",
            context,
            render_target,
            size.0,
            size.1
        );

        Ok(Self {
            driver,
            render_target,
            depth,
            context,
            material,
            viewport: None,
            scene: SceneState::Created,
            released: false,
        })
    }

    #[inline]
    pub fn context(&self) -> ContextId {
        self.context
    }

    #[inline]
    pub fn driver(&self) -> &'p dyn Driver {
        self.driver
    }

    /// Depth buffer attached to the render target for this device's lifetime.
    #[inline]
    pub fn depth_buffer(&self) -> SurfaceId {
        self.depth
    }

    /// Driver material backing `set_material`.
    #[inline]
    pub fn default_material(&self) -> MaterialId {
        self.material
    }

    #[inline]
    pub fn scene_state(&self) -> SceneState {
        self.scene
    }

    /// The current viewport, if one is attached.
    #[inline]
    pub fn viewport(&self) -> Option<&Viewport<'p>> {
        self.viewport.as_ref()
    }

    // ── viewports ─────────────────────────────────────────────────────────

    /// Creates a viewport, adds it to the context and makes it current.
    ///
    /// The previously current viewport is not released: it is returned to the
    /// caller, who now owns it.
    pub fn attach_viewport(&mut self, desc: ViewportDesc) -> Result<Option<Viewport<'p>>> {
        let id = guard!(self.driver.create_viewport())?;
        // Dropped (and released) on any failure below.
        let vp = Viewport::from_raw(self.driver, id, desc);

        guard!(self.driver.add_viewport(self.context, id))?;
        guard!(self.driver.set_viewport(id, &desc))?;
        guard!(self.driver.set_current_viewport(self.context, id))?;

        log::debug!("viewport {:?} attached: {}x{}", id, desc.width, desc.height);

        if self.scene == SceneState::Created {
            self.scene = SceneState::ViewportAttached;
        }
        Ok(self.viewport.replace(vp))
    }

    /// Hands the current viewport back to the caller.
    pub fn detach_viewport(&mut self) -> Option<Viewport<'p>> {
        let vp = self.viewport.take();
        if vp.is_some() && self.scene == SceneState::ViewportAttached {
            self.scene = SceneState::Created;
        }
        vp
    }

    /// Clears the current viewport's planes within `rects`.
    pub fn clear(
        &mut self,
        rects: &[Rect],
        targets: ClearFlags,
        color: Color,
        z: f32,
        stencil: u32,
    ) -> Result<()> {
        let vp = self.viewport.as_ref().ok_or(InputError::NoViewport)?;
        let rects: Vec<_> = rects.iter().map(|r| r.to_clear_rect()).collect();
        guard!(self
            .driver
            .clear_viewport(vp.id(), &rects, targets, color.packed(), z, stencil))
    }

    // ── scene ─────────────────────────────────────────────────────────────

    /// Opens a frame and installs [`SCENE_BASELINE`].
    pub fn begin_scene(&mut self) -> Result<()> {
        guard!(self.driver.begin_scene(self.context))?;
        self.scene = SceneState::InScene;

        for write in SCENE_BASELINE {
            match write {
                StateWrite::Render(state, value) => {
                    guard!(self.driver.set_render_state(self.context, state, value))?
                }
                StateWrite::Stage(stage, state, value) => guard!(self
                    .driver
                    .set_texture_stage_state(self.context, stage, state, value))?,
            }
        }
        Ok(())
    }

    pub fn end_scene(&mut self) -> Result<()> {
        guard!(self.driver.end_scene(self.context))?;
        self.scene = self.idle_state();
        Ok(())
    }

    // ── state ─────────────────────────────────────────────────────────────

    /// Writes a render state. Float values are passed as raw bits, see [`StateValue`].
    pub fn set_render_state(&mut self, state: RenderState, value: impl Into<StateValue>) -> Result<()> {
        let bits = value.into().bits();
        guard!(self.driver.set_render_state(self.context, state, bits))
    }

    /// Writes a texture-stage state. Float values are passed as raw bits.
    pub fn set_texture_stage_state(
        &mut self,
        stage: u32,
        state: TextureStageState,
        value: impl Into<StateValue>,
    ) -> Result<()> {
        let bits = value.into().bits();
        guard!(self
            .driver
            .set_texture_stage_state(self.context, stage, state, bits))
    }

    /// Binds `texture` to `stage`; `None` unbinds the stage.
    pub fn set_texture(&mut self, stage: u32, texture: Option<&Texture<'_>>) -> Result<()> {
        let view = texture.map(|t| t.view());
        guard!(self.driver.set_texture(self.context, stage, view))
    }

    /// Copies `material` into the default material and makes it the lighting
    /// material. Also forces the ambient light level to [`MATERIAL_AMBIENT`].
    ///
    /// `None` is a no-op: neither the material nor the ambient level change.
    pub fn set_material(&mut self, material: Option<&Material>) -> Result<()> {
        let Some(material) = material else {
            return Ok(());
        };

        guard!(self.driver.set_material(self.material, &material.to_desc()))?;
        let handle = guard!(self.driver.material_handle(self.material, self.context))?;
        guard!(self
            .driver
            .set_light_state(self.context, LightState::Material, handle.0))?;
        guard!(self
            .driver
            .set_light_state(self.context, LightState::Ambient, MATERIAL_AMBIENT))
    }

    pub fn set_transform(&mut self, kind: TransformKind, matrix: &Matrix4) -> Result<()> {
        guard!(self.driver.set_transform(self.context, kind, matrix))
    }

    /// Slice form of [`set_transform`](Self::set_transform).
    ///
    /// Fails with [`InputError::TransformLength`] unless exactly 16 floats are given.
    pub fn set_transform_slice(&mut self, kind: TransformKind, values: &[f32]) -> Result<()> {
        let m = Matrix4::try_from(values)?;
        self.set_transform(kind, &m)
    }

    // ── lights ────────────────────────────────────────────────────────────

    /// Binds `light` to the current viewport. `None` is a no-op.
    pub fn add_light(&mut self, light: Option<&Light<'_>>) -> Result<()> {
        let Some(light) = light else {
            return Ok(());
        };
        let vp = self.viewport.as_ref().ok_or(InputError::NoViewport)?;
        guard!(self.driver.viewport_add_light(vp.id(), light.id()))
    }

    /// Unbinds `light` from the current viewport. `None` is a no-op.
    pub fn remove_light(&mut self, light: Option<&Light<'_>>) -> Result<()> {
        let Some(light) = light else {
            return Ok(());
        };
        let vp = self.viewport.as_ref().ok_or(InputError::NoViewport)?;
        guard!(self.driver.viewport_delete_light(vp.id(), light.id()))
    }

    // ── primitives ────────────────────────────────────────────────────────

    /// Opens an immediate-mode batch. `lit = false` disables lighting for it.
    pub fn begin(&mut self, ty: PrimitiveType, format: VertexFormat, lit: bool) -> Result<()> {
        let flags = if lit {
            DrawFlags::empty()
        } else {
            DrawFlags::DO_NOT_LIGHT
        };
        guard!(self.driver.begin_primitive(self.context, ty, format, flags))?;
        self.scene = SceneState::InPrimitive;
        Ok(())
    }

    /// Appends one vertex to the open batch.
    pub fn vertex(&mut self, vertex: &Vertex) -> Result<()> {
        guard!(self.driver.vertex(self.context, bytemuck::bytes_of(vertex)))
    }

    /// Closes and submits the open batch.
    pub fn end(&mut self) -> Result<()> {
        guard!(self.driver.end_primitive(self.context))?;
        self.scene = SceneState::InScene;
        Ok(())
    }

    // ── lifetime ──────────────────────────────────────────────────────────

    /// Releases the current viewport, the default material, the context and
    /// the depth buffer.
    ///
    /// Stops at the first failure; remaining handles are not retried.
    pub fn release(mut self) -> Result<()> {
        self.release_resources()
    }

    fn release_resources(&mut self) -> Result<()> {
        self.released = true;
        if let Some(vp) = self.viewport.take() {
            vp.release()?;
        }
        guard!(self.driver.release_material(self.material))?;
        guard!(self.driver.release_context(self.context))?;
        release_depth(self.driver, self.render_target, self.depth)?;
        log::debug!("device {:?} released", self.context);
        Ok(())
    }

    fn idle_state(&self) -> SceneState {
        if self.viewport.is_some() {
            SceneState::ViewportAttached
        } else {
            SceneState::Created
        }
    }
}

fn release_depth(driver: &dyn Driver, render_target: SurfaceId, depth: SurfaceId) -> Result<()> {
    guard!(driver.detach_surface(render_target, depth))?;
    guard!(driver.release_surface(depth))
}

impl Drop for Device<'_> {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        if let Err(err) = self.release_resources() {
            log::warn!("device {:?} release failed: {err}", self.context);
        }
    }
}

impl std::fmt::Debug for Device<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Device")
            .field("context", &self.context)
            .field("depth", &self.depth)
            .field("material", &self.material)
            .field("viewport", &self.viewport)
            .field("scene", &self.scene)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::Error;
    use crate::driver::Status;
    use crate::provider::{OffscreenConfig, OffscreenProvider, SurfaceProvider};

    fn provider() -> OffscreenProvider {
        OffscreenProvider::new(OffscreenConfig { width: 32, height: 32 }).unwrap()
    }

    // ── creation ─────────────────────────────────────────────────────────

    #[test]
    fn failed_creation_leaves_nothing_behind() {
        let p = provider();
        let before = p.backend().live_objects();
        p.backend().fail_on("create_material", Status::OUT_OF_MEMORY);

        let err = p.create_device().unwrap_err();
        assert_eq!(err.status(), Some(Status::OUT_OF_MEMORY));
        assert_eq!(p.backend().live_objects(), before);
        assert!(p.backend().attached_children(p.render_target()).is_empty());
    }

    #[test]
    fn failed_context_creation_detaches_depth_buffer() {
        let p = provider();
        let before = p.backend().live_objects();
        p.backend().fail_on("create_context", Status::OUT_OF_MEMORY);

        assert!(p.create_device().is_err());
        assert_eq!(p.backend().live_objects(), before);
        assert!(p.backend().attached_children(p.render_target()).is_empty());
    }

    #[test]
    fn release_returns_every_handle() {
        let p = provider();
        let before = p.backend().live_objects();
        let mut device = p.create_device().unwrap();
        device.attach_viewport(ViewportDesc::full(32, 32)).unwrap();
        device.release().unwrap();
        assert_eq!(p.backend().live_objects(), before);
    }

    #[test]
    fn repeated_devices_reuse_the_render_target() {
        let p = provider();
        let rt = p.render_target();
        for _ in 0..3 {
            let mut device = p.create_device().unwrap();
            assert_eq!(p.backend().attached_children(rt), vec![device.depth_buffer()]);
            device.attach_viewport(ViewportDesc::full(32, 32)).unwrap();
            device.release().unwrap();
            assert!(p.backend().attached_children(rt).is_empty());
        }
    }

    #[test]
    fn dropped_device_releases_depth_buffer() {
        let p = provider();
        let before = p.backend().live_objects();
        drop(p.create_device().unwrap());
        assert_eq!(p.backend().live_objects(), before);
        p.create_device().unwrap().release().unwrap();
    }

    // ── scene state ──────────────────────────────────────────────────────

    #[test]
    fn scene_state_tracks_protocol() {
        let p = provider();
        let mut device = p.create_device().unwrap();
        assert_eq!(device.scene_state(), SceneState::Created);

        device.attach_viewport(ViewportDesc::full(32, 32)).unwrap();
        assert_eq!(device.scene_state(), SceneState::ViewportAttached);

        device.begin_scene().unwrap();
        assert_eq!(device.scene_state(), SceneState::InScene);
        device.begin(PrimitiveType::TriangleList, VertexFormat::STANDARD, true).unwrap();
        assert_eq!(device.scene_state(), SceneState::InPrimitive);
        device.end().unwrap();
        assert_eq!(device.scene_state(), SceneState::InScene);
        device.end_scene().unwrap();
        assert_eq!(device.scene_state(), SceneState::ViewportAttached);
    }

    #[test]
    fn driver_rejects_nested_scenes() {
        let p = provider();
        let mut device = p.create_device().unwrap();
        device.begin_scene().unwrap();
        let err = device.begin_scene().unwrap_err();
        assert_eq!(err.status(), Some(Status::SCENE_IN_SCENE));
    }

    #[test]
    fn unlit_batches_carry_do_not_light() {
        let p = provider();
        let mut device = p.create_device().unwrap();
        device.begin_scene().unwrap();
        device.begin(PrimitiveType::PointList, VertexFormat::STANDARD, false).unwrap();
        device.end().unwrap();
        device.end_scene().unwrap();

        let batches = p.backend().batches(device.context());
        assert_eq!(batches.len(), 1);
        assert!(batches[0].flags.contains(DrawFlags::DO_NOT_LIGHT));
    }

    // ── viewport-dependent calls ─────────────────────────────────────────

    #[test]
    fn clear_without_viewport_is_an_input_error() {
        let p = provider();
        let mut device = p.create_device().unwrap();
        let err = device
            .clear(&[Rect::from_size(32, 32)], ClearFlags::TARGET, Color::black(), 1.0, 0)
            .unwrap_err();
        assert!(matches!(err, Error::Input(InputError::NoViewport)));
    }

    #[test]
    fn clear_converts_rects_to_corners() {
        let p = provider();
        let mut device = p.create_device().unwrap();
        device.attach_viewport(ViewportDesc::full(32, 32)).unwrap();
        device
            .clear(
                &[Rect::new(4, 2, 10, 6)],
                ClearFlags::TARGET | ClearFlags::ZBUFFER,
                Color::new(10, 20, 30, 255),
                1.0,
                0,
            )
            .unwrap();

        let vp = device.viewport().unwrap().id();
        let clears = p.backend().clears(vp);
        assert_eq!(clears.len(), 1);
        let r = clears[0].rects[0];
        assert_eq!((r.x1, r.y1, r.x2, r.y2), (4, 2, 14, 8));
        assert_eq!(clears[0].color, 0xFF0A141E);
    }

    #[test]
    fn float_states_are_bit_reinterpreted() {
        let p = provider();
        let mut device = p.create_device().unwrap();
        device.set_render_state(RenderState::TextureFactor, 0.5f32).unwrap();
        assert_eq!(
            p.backend().render_state(device.context(), RenderState::TextureFactor),
            Some(0.5f32.to_bits())
        );
    }

    #[test]
    fn short_transform_is_rejected_before_the_driver() {
        let p = provider();
        let mut device = p.create_device().unwrap();
        p.backend().clear_call_log();
        let err = device.set_transform_slice(TransformKind::World, &[0.0; 12]).unwrap_err();
        assert!(matches!(err, Error::Input(InputError::TransformLength(12))));
        assert!(p.backend().call_log().is_empty());
    }
}
