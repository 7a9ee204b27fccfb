//! The fixed-function 3D subsystem seam.
//!
//! [`Driver`] is everything the engine asks of the underlying graphics
//! subsystem: surfaces and their mip chains, rendering contexts, viewports,
//! materials and lights. Each call returns a raw [`Status`] on failure; the
//! engine wraps every call with [`crate::guard!`] and never inspects codes.
//!
//! Calls are synchronous and the seam is single-threaded: implementations use
//! interior mutability and are not expected to be `Send` or `Sync`.
//!
//! [`SoftDriver`] is a complete in-memory implementation.

mod format;
mod handles;
mod soft;
mod status;
mod types;

pub use format::{PixelFormat, PixelFormatFlags};
pub use handles::{
    ContextId, LightId, MaterialHandle, MaterialId, SurfaceId, TextureViewId, ViewportId,
};
pub use soft::{Batch, Clear, SoftDriver};
pub use status::{DriverResult, Status};
pub use types::{
    ClearFlags, ClearRect, ColorKey, DrawFlags, EnumControl, LightDesc, LightFlags, LightState,
    LightType, LockFlags, LockInfo, MaterialDesc, SurfaceCaps, SurfaceDesc, SurfaceInfo,
};

use crate::coords::ViewportDesc;
use crate::device::{
    Matrix4, PrimitiveType, RenderState, TextureStageState, TransformKind, VertexFormat,
};

/// Receives each advertised format; return [`EnumControl::Stop`] to end early.
pub type FormatCallback<'a> = dyn FnMut(&PixelFormat) -> EnumControl + 'a;

/// Writer run while a surface is locked: `(bytes, geometry)`.
pub type LockWriter<'a> = dyn FnMut(&mut [u8], LockInfo) + 'a;

pub trait Driver {
    // ── surfaces ─────────────────────────────────────────────────────────

    fn create_surface(&self, desc: &SurfaceDesc) -> DriverResult<SurfaceId>;

    /// Releases a surface created by `create_surface`, including its attached chain.
    fn release_surface(&self, surface: SurfaceId) -> DriverResult<()>;

    fn surface_desc(&self, surface: SurfaceId) -> DriverResult<SurfaceInfo>;

    /// Next level of a mip chain, or `None` past the smallest level.
    ///
    /// Returned ids are owned by the chain root and must not be released.
    fn attached_surface(&self, surface: SurfaceId) -> DriverResult<Option<SurfaceId>>;

    /// Attaches `child` (e.g. a depth buffer) to `parent`. The parent takes ownership.
    ///
    /// A surface accepts at most one depth buffer.
    fn attach_surface(&self, parent: SurfaceId, child: SurfaceId) -> DriverResult<()>;

    /// Reverses `attach_surface`, handing ownership of `child` back to the caller.
    fn detach_surface(&self, parent: SurfaceId, child: SurfaceId) -> DriverResult<()>;

    /// Locks `surface`, runs `write` over its bytes, then unlocks it.
    fn lock_surface(
        &self,
        surface: SurfaceId,
        flags: LockFlags,
        write: &mut LockWriter<'_>,
    ) -> DriverResult<()>;

    /// Copies the whole of `src` onto `dst`. Sizes and formats must match.
    fn blit(&self, dst: SurfaceId, src: SurfaceId) -> DriverResult<()>;

    fn create_texture_view(&self, surface: SurfaceId) -> DriverResult<TextureViewId>;
    fn release_texture_view(&self, view: TextureViewId) -> DriverResult<()>;

    // ── formats ──────────────────────────────────────────────────────────

    fn enum_texture_formats(&self, callback: &mut FormatCallback<'_>) -> DriverResult<()>;
    fn enum_depth_formats(&self, callback: &mut FormatCallback<'_>) -> DriverResult<()>;

    // ── contexts ─────────────────────────────────────────────────────────

    fn create_context(&self, render_target: SurfaceId) -> DriverResult<ContextId>;
    fn release_context(&self, ctx: ContextId) -> DriverResult<()>;

    fn begin_scene(&self, ctx: ContextId) -> DriverResult<()>;
    fn end_scene(&self, ctx: ContextId) -> DriverResult<()>;

    fn set_render_state(&self, ctx: ContextId, state: RenderState, value: u32) -> DriverResult<()>;
    fn set_texture_stage_state(
        &self,
        ctx: ContextId,
        stage: u32,
        state: TextureStageState,
        value: u32,
    ) -> DriverResult<()>;
    fn set_light_state(&self, ctx: ContextId, state: LightState, value: u32) -> DriverResult<()>;
    fn set_texture(&self, ctx: ContextId, stage: u32, view: Option<TextureViewId>) -> DriverResult<()>;
    fn set_transform(&self, ctx: ContextId, kind: TransformKind, m: &Matrix4) -> DriverResult<()>;

    fn begin_primitive(
        &self,
        ctx: ContextId,
        ty: PrimitiveType,
        format: VertexFormat,
        flags: DrawFlags,
    ) -> DriverResult<()>;
    /// Appends one vertex, laid out as the open batch's [`VertexFormat`].
    fn vertex(&self, ctx: ContextId, data: &[u8]) -> DriverResult<()>;
    fn end_primitive(&self, ctx: ContextId) -> DriverResult<()>;

    // ── viewports ────────────────────────────────────────────────────────

    fn create_viewport(&self) -> DriverResult<ViewportId>;

    /// Releases a viewport, detaching it from any context first.
    fn release_viewport(&self, vp: ViewportId) -> DriverResult<()>;
    fn add_viewport(&self, ctx: ContextId, vp: ViewportId) -> DriverResult<()>;
    fn set_viewport(&self, vp: ViewportId, desc: &ViewportDesc) -> DriverResult<()>;
    fn set_current_viewport(&self, ctx: ContextId, vp: ViewportId) -> DriverResult<()>;
    fn clear_viewport(
        &self,
        vp: ViewportId,
        rects: &[ClearRect],
        flags: ClearFlags,
        color: u32,
        z: f32,
        stencil: u32,
    ) -> DriverResult<()>;
    fn viewport_add_light(&self, vp: ViewportId, light: LightId) -> DriverResult<()>;
    fn viewport_delete_light(&self, vp: ViewportId, light: LightId) -> DriverResult<()>;

    // ── materials ────────────────────────────────────────────────────────

    fn create_material(&self) -> DriverResult<MaterialId>;
    fn release_material(&self, material: MaterialId) -> DriverResult<()>;
    fn set_material(&self, material: MaterialId, desc: &MaterialDesc) -> DriverResult<()>;
    fn material_handle(&self, material: MaterialId, ctx: ContextId) -> DriverResult<MaterialHandle>;

    // ── lights ───────────────────────────────────────────────────────────

    fn create_light(&self) -> DriverResult<LightId>;
    fn release_light(&self, light: LightId) -> DriverResult<()>;
    fn set_light(&self, light: LightId, desc: &LightDesc) -> DriverResult<()>;
}
