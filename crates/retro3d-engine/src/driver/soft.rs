use std::cell::{Cell, RefCell};
use std::collections::HashMap;

use crate::coords::ViewportDesc;
use crate::device::{
    Matrix4, PrimitiveType, RenderState, TextureStageState, TransformKind, Vertex, VertexFormat,
};

use super::{
    ClearFlags, ClearRect, ContextId, DrawFlags, Driver, DriverResult, EnumControl,
    FormatCallback, LightDesc, LightId, LightState, LockFlags, LockInfo, LockWriter,
    MaterialDesc, MaterialHandle, MaterialId, PixelFormat, Status, SurfaceCaps, SurfaceDesc,
    SurfaceId, SurfaceInfo, TextureViewId, ViewportId,
};

/// One submitted immediate-mode batch.
#[derive(Debug, Clone, PartialEq)]
pub struct Batch {
    pub ty: PrimitiveType,
    pub format: VertexFormat,
    pub flags: DrawFlags,
    pub vertices: Vec<Vertex>,
}

/// One recorded viewport clear.
#[derive(Debug, Clone, PartialEq)]
pub struct Clear {
    pub rects: Vec<ClearRect>,
    pub flags: ClearFlags,
    pub color: u32,
    pub z: f32,
    pub stencil: u32,
}

#[derive(Debug)]
struct SurfaceEntry {
    width: u32,
    height: u32,
    pitch: usize,
    format: PixelFormat,
    caps: SurfaceCaps,
    bytes: Vec<u8>,
    /// Next mip level.
    next: Option<SurfaceId>,
    /// Owning surface for chain levels and attached children.
    owner: Option<SurfaceId>,
    /// Surfaces released together with this one.
    owned: Vec<SurfaceId>,
    locked: bool,
}

#[derive(Debug, Default)]
struct ContextEntry {
    in_scene: bool,
    open_batch: Option<Batch>,
    batches: Vec<Batch>,
    render_states: HashMap<RenderState, u32>,
    stage_states: HashMap<(u32, TextureStageState), u32>,
    light_states: HashMap<LightState, u32>,
    textures: HashMap<u32, TextureViewId>,
    transforms: HashMap<TransformKind, Matrix4>,
    viewports: Vec<ViewportId>,
    current_viewport: Option<ViewportId>,
}

#[derive(Debug, Default)]
struct ViewportEntry {
    desc: Option<ViewportDesc>,
    context: Option<ContextId>,
    lights: Vec<LightId>,
    clears: Vec<Clear>,
}

#[derive(Debug, Default)]
struct MaterialEntry {
    desc: MaterialDesc,
    handles: HashMap<ContextId, MaterialHandle>,
}

#[derive(Debug, Default)]
struct State {
    surfaces: HashMap<SurfaceId, SurfaceEntry>,
    views: HashMap<TextureViewId, SurfaceId>,
    contexts: HashMap<ContextId, ContextEntry>,
    viewports: HashMap<ViewportId, ViewportEntry>,
    materials: HashMap<MaterialId, MaterialEntry>,
    lights: HashMap<LightId, Option<LightDesc>>,
}

/// In-memory reference implementation of [`Driver`].
///
/// Surfaces are byte vectors with `pitch = width * bytes_per_pixel`. The scene
/// protocol is enforced the way fixed-function drivers do it, by returning
/// failure codes rather than panicking. All recorded state is observable
/// through the inspection methods, and [`SoftDriver::fail_on`] injects a
/// one-shot failure into a named call.
#[derive(Debug)]
pub struct SoftDriver {
    state: RefCell<State>,
    next_id: Cell<u32>,
    texture_formats: Vec<PixelFormat>,
    depth_formats: Vec<PixelFormat>,
    injected: RefCell<Option<(&'static str, Status)>>,
    call_log: RefCell<Vec<&'static str>>,
}

impl Default for SoftDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl SoftDriver {
    /// Driver advertising ARGB1555, RGB565 and XRGB8888 textures and Z16/Z24 depth.
    pub fn new() -> Self {
        Self::with_formats(
            vec![PixelFormat::ARGB1555, PixelFormat::RGB565, PixelFormat::XRGB8888],
            vec![PixelFormat::Z16, PixelFormat::Z24],
        )
    }

    pub fn with_formats(texture_formats: Vec<PixelFormat>, depth_formats: Vec<PixelFormat>) -> Self {
        Self {
            state: RefCell::new(State::default()),
            next_id: Cell::new(1),
            texture_formats,
            depth_formats,
            injected: RefCell::new(None),
            call_log: RefCell::new(Vec::new()),
        }
    }

    // ── test hooks ───────────────────────────────────────────────────────

    /// Makes the next call named `call` fail with `status`.
    ///
    /// Names are the [`Driver`] method names, e.g. `"blit"` or `"begin_scene"`.
    pub fn fail_on(&self, call: &'static str, status: Status) {
        *self.injected.borrow_mut() = Some((call, status));
    }

    /// Names of every driver call received, in order.
    pub fn call_log(&self) -> Vec<&'static str> {
        self.call_log.borrow().clone()
    }

    pub fn clear_call_log(&self) {
        self.call_log.borrow_mut().clear();
    }

    // ── inspection ───────────────────────────────────────────────────────

    /// Number of driver objects currently alive (chain levels included).
    pub fn live_objects(&self) -> usize {
        let s = self.state.borrow();
        s.surfaces.len()
            + s.views.len()
            + s.contexts.len()
            + s.viewports.len()
            + s.materials.len()
            + s.lights.len()
    }

    pub fn is_live_surface(&self, surface: SurfaceId) -> bool {
        self.state.borrow().surfaces.contains_key(&surface)
    }

    pub fn surface_bytes(&self, surface: SurfaceId) -> Option<Vec<u8>> {
        self.state.borrow().surfaces.get(&surface).map(|e| e.bytes.clone())
    }

    /// Surfaces attached to `surface` outside its mip chain (e.g. a depth buffer).
    pub fn attached_children(&self, surface: SurfaceId) -> Vec<SurfaceId> {
        let s = self.state.borrow();
        let Some(entry) = s.surfaces.get(&surface) else {
            return Vec::new();
        };
        entry
            .owned
            .iter()
            .copied()
            .filter(|id| s.surfaces.get(id).is_some_and(|c| c.caps.contains(SurfaceCaps::ZBUFFER)))
            .collect()
    }

    pub fn texture_view_surface(&self, view: TextureViewId) -> Option<SurfaceId> {
        self.state.borrow().views.get(&view).copied()
    }

    pub fn in_scene(&self, ctx: ContextId) -> bool {
        self.state.borrow().contexts.get(&ctx).is_some_and(|c| c.in_scene)
    }

    pub fn render_state(&self, ctx: ContextId, state: RenderState) -> Option<u32> {
        self.with_context(ctx, |c| c.render_states.get(&state).copied())
    }

    pub fn texture_stage_state(&self, ctx: ContextId, stage: u32, state: TextureStageState) -> Option<u32> {
        self.with_context(ctx, |c| c.stage_states.get(&(stage, state)).copied())
    }

    pub fn light_state(&self, ctx: ContextId, state: LightState) -> Option<u32> {
        self.with_context(ctx, |c| c.light_states.get(&state).copied())
    }

    pub fn bound_texture(&self, ctx: ContextId, stage: u32) -> Option<TextureViewId> {
        self.with_context(ctx, |c| c.textures.get(&stage).copied())
    }

    pub fn transform(&self, ctx: ContextId, kind: TransformKind) -> Option<Matrix4> {
        self.with_context(ctx, |c| c.transforms.get(&kind).copied())
    }

    pub fn current_viewport(&self, ctx: ContextId) -> Option<ViewportId> {
        self.with_context(ctx, |c| c.current_viewport)
    }

    /// Completed primitive batches submitted on `ctx`.
    pub fn batches(&self, ctx: ContextId) -> Vec<Batch> {
        self.with_context(ctx, |c| Some(c.batches.clone())).unwrap_or_default()
    }

    pub fn viewport_desc(&self, vp: ViewportId) -> Option<ViewportDesc> {
        self.state.borrow().viewports.get(&vp).and_then(|v| v.desc)
    }

    pub fn is_live_viewport(&self, vp: ViewportId) -> bool {
        self.state.borrow().viewports.contains_key(&vp)
    }

    pub fn viewport_lights(&self, vp: ViewportId) -> Vec<LightId> {
        self.state
            .borrow()
            .viewports
            .get(&vp)
            .map(|v| v.lights.clone())
            .unwrap_or_default()
    }

    pub fn clears(&self, vp: ViewportId) -> Vec<Clear> {
        self.state
            .borrow()
            .viewports
            .get(&vp)
            .map(|v| v.clears.clone())
            .unwrap_or_default()
    }

    pub fn material_desc(&self, material: MaterialId) -> Option<MaterialDesc> {
        self.state.borrow().materials.get(&material).map(|m| m.desc)
    }

    /// Material whose handle is `handle`, if any.
    pub fn material_for_handle(&self, handle: MaterialHandle) -> Option<MaterialId> {
        self.state
            .borrow()
            .materials
            .iter()
            .find(|(_, m)| m.handles.values().any(|h| *h == handle))
            .map(|(id, _)| *id)
    }

    pub fn light_desc(&self, light: LightId) -> Option<LightDesc> {
        self.state.borrow().lights.get(&light).copied().flatten()
    }

    pub fn is_live_light(&self, light: LightId) -> bool {
        self.state.borrow().lights.contains_key(&light)
    }

    // ── internals ────────────────────────────────────────────────────────

    fn check(&self, call: &'static str) -> DriverResult<()> {
        self.call_log.borrow_mut().push(call);
        let mut injected = self.injected.borrow_mut();
        if let Some((name, status)) = *injected {
            if name == call {
                *injected = None;
                log::trace!("soft driver: injected {status} into {call}");
                return Err(status);
            }
        }
        Ok(())
    }

    fn alloc_id(&self) -> u32 {
        let id = self.next_id.get();
        self.next_id.set(id.wrapping_add(1));
        id
    }

    fn with_context<T>(&self, ctx: ContextId, f: impl FnOnce(&ContextEntry) -> Option<T>) -> Option<T> {
        self.state.borrow().contexts.get(&ctx).and_then(f)
    }

    fn context_mut<'s>(state: &'s mut State, ctx: ContextId) -> DriverResult<&'s mut ContextEntry> {
        state.contexts.get_mut(&ctx).ok_or(Status::INVALID_OBJECT)
    }

    fn depth_child(state: &State, parent: SurfaceId) -> Option<SurfaceId> {
        let entry = state.surfaces.get(&parent)?;
        entry.owned.iter().copied().find(|id| {
            state
                .surfaces
                .get(id)
                .is_some_and(|c| c.caps.contains(SurfaceCaps::ZBUFFER))
        })
    }

    fn new_surface(&self, width: u32, height: u32, format: PixelFormat, caps: SurfaceCaps) -> SurfaceEntry {
        let pitch = width as usize * format.bytes_per_pixel();
        SurfaceEntry {
            width,
            height,
            pitch,
            format,
            caps,
            bytes: vec![0; pitch * height as usize],
            next: None,
            owner: None,
            owned: Vec::new(),
            locked: false,
        }
    }
}

impl Driver for SoftDriver {
    // ── surfaces ─────────────────────────────────────────────────────────

    fn create_surface(&self, desc: &SurfaceDesc) -> DriverResult<SurfaceId> {
        self.check("create_surface")?;
        if desc.width == 0 || desc.height == 0 {
            return Err(Status::INVALID_PARAMS);
        }

        let chained = desc.caps.contains(SurfaceCaps::COMPLEX | SurfaceCaps::MIPMAP);
        let levels = if chained { desc.mip_count } else { 1 };
        // Past the 1x1 level a chain has nothing left to halve.
        let max_levels = u32::BITS - desc.width.max(desc.height).leading_zeros();
        if levels == 0 || levels > max_levels {
            return Err(Status::INVALID_PARAMS);
        }

        let root = SurfaceId(self.alloc_id());
        let mut entries = Vec::with_capacity(levels as usize);
        let (mut w, mut h) = (desc.width, desc.height);
        for level in 0..levels {
            let id = if level == 0 { root } else { SurfaceId(self.alloc_id()) };
            let mut entry = self.new_surface(w, h, desc.format, desc.caps);
            if level > 0 {
                entry.owner = Some(root);
            }
            entries.push((id, entry));
            w = (w / 2).max(1);
            h = (h / 2).max(1);
        }

        for i in 1..entries.len() {
            let next = entries[i].0;
            entries[i - 1].1.next = Some(next);
            entries[0].1.owned.push(next);
        }

        let mut s = self.state.borrow_mut();
        for (id, entry) in entries {
            s.surfaces.insert(id, entry);
        }
        Ok(root)
    }

    fn release_surface(&self, surface: SurfaceId) -> DriverResult<()> {
        self.check("release_surface")?;
        let mut s = self.state.borrow_mut();
        let entry = s.surfaces.get(&surface).ok_or(Status::INVALID_OBJECT)?;
        if entry.owner.is_some() {
            return Err(Status::INVALID_OBJECT);
        }
        if entry.locked {
            return Err(Status::SURFACE_BUSY);
        }

        let mut pending = vec![surface];
        while let Some(id) = pending.pop() {
            if let Some(e) = s.surfaces.remove(&id) {
                pending.extend(e.owned);
            }
        }
        let state = &mut *s;
        state.views.retain(|_, target| state.surfaces.contains_key(target));
        Ok(())
    }

    fn surface_desc(&self, surface: SurfaceId) -> DriverResult<SurfaceInfo> {
        self.check("surface_desc")?;
        let s = self.state.borrow();
        let e = s.surfaces.get(&surface).ok_or(Status::INVALID_OBJECT)?;
        Ok(SurfaceInfo {
            width: e.width,
            height: e.height,
            pitch: e.pitch,
            format: e.format,
            caps: e.caps,
        })
    }

    fn attached_surface(&self, surface: SurfaceId) -> DriverResult<Option<SurfaceId>> {
        self.check("attached_surface")?;
        let s = self.state.borrow();
        let e = s.surfaces.get(&surface).ok_or(Status::INVALID_OBJECT)?;
        Ok(e.next)
    }

    fn attach_surface(&self, parent: SurfaceId, child: SurfaceId) -> DriverResult<()> {
        self.check("attach_surface")?;
        let mut s = self.state.borrow_mut();
        if parent == child || !s.surfaces.contains_key(&parent) {
            return Err(Status::INVALID_PARAMS);
        }
        let c = s.surfaces.get(&child).ok_or(Status::INVALID_OBJECT)?;
        if c.owner.is_some() {
            return Err(Status::INVALID_CALL);
        }
        if c.caps.contains(SurfaceCaps::ZBUFFER) && Self::depth_child(&s, parent).is_some() {
            return Err(Status::SURFACE_ALREADY_ATTACHED);
        }
        if let Some(c) = s.surfaces.get_mut(&child) {
            c.owner = Some(parent);
        }
        if let Some(p) = s.surfaces.get_mut(&parent) {
            p.owned.push(child);
        }
        Ok(())
    }

    fn detach_surface(&self, parent: SurfaceId, child: SurfaceId) -> DriverResult<()> {
        self.check("detach_surface")?;
        let mut s = self.state.borrow_mut();
        let p = s.surfaces.get(&parent).ok_or(Status::INVALID_OBJECT)?;
        // Mip levels belong to their chain and cannot be split off.
        let mut level = p.next;
        while let Some(id) = level {
            if id == child {
                return Err(Status::INVALID_CALL);
            }
            level = s.surfaces.get(&id).and_then(|e| e.next);
        }
        let c = s.surfaces.get_mut(&child).ok_or(Status::INVALID_OBJECT)?;
        if c.owner != Some(parent) {
            return Err(Status::NOT_FOUND);
        }
        c.owner = None;
        if let Some(p) = s.surfaces.get_mut(&parent) {
            p.owned.retain(|id| *id != child);
        }
        Ok(())
    }

    fn lock_surface(&self, surface: SurfaceId, _flags: LockFlags, write: &mut LockWriter<'_>) -> DriverResult<()> {
        self.check("lock_surface")?;

        // The writer runs without the state borrowed so it may call back into the driver.
        let (mut bytes, info) = {
            let mut s = self.state.borrow_mut();
            let e = s.surfaces.get_mut(&surface).ok_or(Status::INVALID_OBJECT)?;
            if e.locked {
                return Err(Status::SURFACE_BUSY);
            }
            e.locked = true;
            let info = LockInfo {
                width: e.width,
                height: e.height,
                pitch: e.pitch,
            };
            (std::mem::take(&mut e.bytes), info)
        };

        write(&mut bytes, info);

        let mut s = self.state.borrow_mut();
        let e = s.surfaces.get_mut(&surface).ok_or(Status::INVALID_OBJECT)?;
        e.bytes = bytes;
        e.locked = false;
        Ok(())
    }

    fn blit(&self, dst: SurfaceId, src: SurfaceId) -> DriverResult<()> {
        self.check("blit")?;
        let mut s = self.state.borrow_mut();
        let source = s.surfaces.get(&src).ok_or(Status::INVALID_OBJECT)?;
        if source.locked {
            return Err(Status::SURFACE_BUSY);
        }
        let (sw, sh, sf) = (source.width, source.height, source.format);
        let data = source.bytes.clone();

        let target = s.surfaces.get_mut(&dst).ok_or(Status::INVALID_OBJECT)?;
        if target.locked {
            return Err(Status::SURFACE_BUSY);
        }
        if target.width != sw || target.height != sh || target.format != sf {
            return Err(Status::INVALID_PARAMS);
        }
        target.bytes.copy_from_slice(&data);
        Ok(())
    }

    fn create_texture_view(&self, surface: SurfaceId) -> DriverResult<TextureViewId> {
        self.check("create_texture_view")?;
        let mut s = self.state.borrow_mut();
        let e = s.surfaces.get(&surface).ok_or(Status::INVALID_OBJECT)?;
        if !e.caps.contains(SurfaceCaps::TEXTURE) {
            return Err(Status::INVALID_CALL);
        }
        let view = TextureViewId(self.alloc_id());
        s.views.insert(view, surface);
        Ok(view)
    }

    fn release_texture_view(&self, view: TextureViewId) -> DriverResult<()> {
        self.check("release_texture_view")?;
        let mut s = self.state.borrow_mut();
        s.views.remove(&view).ok_or(Status::INVALID_OBJECT)?;
        for ctx in s.contexts.values_mut() {
            ctx.textures.retain(|_, v| *v != view);
        }
        Ok(())
    }

    // ── formats ──────────────────────────────────────────────────────────

    fn enum_texture_formats(&self, callback: &mut FormatCallback<'_>) -> DriverResult<()> {
        self.check("enum_texture_formats")?;
        for f in &self.texture_formats {
            if callback(f) == EnumControl::Stop {
                break;
            }
        }
        Ok(())
    }

    fn enum_depth_formats(&self, callback: &mut FormatCallback<'_>) -> DriverResult<()> {
        self.check("enum_depth_formats")?;
        for f in &self.depth_formats {
            if callback(f) == EnumControl::Stop {
                break;
            }
        }
        Ok(())
    }

    // ── contexts ─────────────────────────────────────────────────────────

    fn create_context(&self, render_target: SurfaceId) -> DriverResult<ContextId> {
        self.check("create_context")?;
        let mut s = self.state.borrow_mut();
        let rt = s.surfaces.get(&render_target).ok_or(Status::INVALID_OBJECT)?;
        if !rt.caps.contains(SurfaceCaps::DEVICE_3D) {
            return Err(Status::INVALID_CALL);
        }
        let ctx = ContextId(self.alloc_id());
        s.contexts.insert(ctx, ContextEntry::default());
        Ok(ctx)
    }

    fn release_context(&self, ctx: ContextId) -> DriverResult<()> {
        self.check("release_context")?;
        let mut s = self.state.borrow_mut();
        let entry = s.contexts.remove(&ctx).ok_or(Status::INVALID_OBJECT)?;
        for vp in entry.viewports {
            if let Some(v) = s.viewports.get_mut(&vp) {
                v.context = None;
            }
        }
        for m in s.materials.values_mut() {
            m.handles.remove(&ctx);
        }
        Ok(())
    }

    fn begin_scene(&self, ctx: ContextId) -> DriverResult<()> {
        self.check("begin_scene")?;
        let mut s = self.state.borrow_mut();
        let c = Self::context_mut(&mut s, ctx)?;
        if c.in_scene {
            return Err(Status::SCENE_IN_SCENE);
        }
        c.in_scene = true;
        Ok(())
    }

    fn end_scene(&self, ctx: ContextId) -> DriverResult<()> {
        self.check("end_scene")?;
        let mut s = self.state.borrow_mut();
        let c = Self::context_mut(&mut s, ctx)?;
        if !c.in_scene {
            return Err(Status::SCENE_NOT_IN_SCENE);
        }
        if c.open_batch.is_some() {
            return Err(Status::ALREADY_IN_PRIMITIVE);
        }
        c.in_scene = false;
        Ok(())
    }

    fn set_render_state(&self, ctx: ContextId, state: RenderState, value: u32) -> DriverResult<()> {
        self.check("set_render_state")?;
        let mut s = self.state.borrow_mut();
        Self::context_mut(&mut s, ctx)?.render_states.insert(state, value);
        Ok(())
    }

    fn set_texture_stage_state(
        &self,
        ctx: ContextId,
        stage: u32,
        state: TextureStageState,
        value: u32,
    ) -> DriverResult<()> {
        self.check("set_texture_stage_state")?;
        if stage >= 8 {
            return Err(Status::INVALID_PARAMS);
        }
        let mut s = self.state.borrow_mut();
        Self::context_mut(&mut s, ctx)?
            .stage_states
            .insert((stage, state), value);
        Ok(())
    }

    fn set_light_state(&self, ctx: ContextId, state: LightState, value: u32) -> DriverResult<()> {
        self.check("set_light_state")?;
        let mut s = self.state.borrow_mut();
        if state == LightState::Material {
            let handle = MaterialHandle(value);
            let known = s
                .materials
                .values()
                .any(|m| m.handles.get(&ctx) == Some(&handle));
            if !known {
                return Err(Status::INVALID_PARAMS);
            }
        }
        Self::context_mut(&mut s, ctx)?.light_states.insert(state, value);
        Ok(())
    }

    fn set_texture(&self, ctx: ContextId, stage: u32, view: Option<TextureViewId>) -> DriverResult<()> {
        self.check("set_texture")?;
        if stage >= 8 {
            return Err(Status::INVALID_PARAMS);
        }
        let mut s = self.state.borrow_mut();
        if let Some(v) = view {
            if !s.views.contains_key(&v) {
                return Err(Status::INVALID_OBJECT);
            }
        }
        let c = Self::context_mut(&mut s, ctx)?;
        if c.open_batch.is_some() {
            return Err(Status::INVALID_CALL);
        }
        match view {
            Some(v) => c.textures.insert(stage, v),
            None => c.textures.remove(&stage),
        };
        Ok(())
    }

    fn set_transform(&self, ctx: ContextId, kind: TransformKind, m: &Matrix4) -> DriverResult<()> {
        self.check("set_transform")?;
        let mut s = self.state.borrow_mut();
        Self::context_mut(&mut s, ctx)?.transforms.insert(kind, *m);
        Ok(())
    }

    fn begin_primitive(
        &self,
        ctx: ContextId,
        ty: PrimitiveType,
        format: VertexFormat,
        flags: DrawFlags,
    ) -> DriverResult<()> {
        self.check("begin_primitive")?;
        let mut s = self.state.borrow_mut();
        let c = Self::context_mut(&mut s, ctx)?;
        if !c.in_scene {
            return Err(Status::SCENE_NOT_IN_SCENE);
        }
        if c.open_batch.is_some() {
            return Err(Status::ALREADY_IN_PRIMITIVE);
        }
        c.open_batch = Some(Batch {
            ty,
            format,
            flags,
            vertices: Vec::new(),
        });
        Ok(())
    }

    fn vertex(&self, ctx: ContextId, data: &[u8]) -> DriverResult<()> {
        self.check("vertex")?;
        let mut s = self.state.borrow_mut();
        let batch = Self::context_mut(&mut s, ctx)?
            .open_batch
            .as_mut()
            .ok_or(Status::NOT_IN_PRIMITIVE)?;
        if batch.format != VertexFormat::STANDARD {
            return Err(Status::INVALID_PARAMS);
        }
        let v: Vertex = bytemuck::try_pod_read_unaligned(data).map_err(|_| Status::INVALID_PARAMS)?;
        batch.vertices.push(v);
        Ok(())
    }

    fn end_primitive(&self, ctx: ContextId) -> DriverResult<()> {
        self.check("end_primitive")?;
        let mut s = self.state.borrow_mut();
        let c = Self::context_mut(&mut s, ctx)?;
        let batch = c.open_batch.take().ok_or(Status::NOT_IN_PRIMITIVE)?;
        c.batches.push(batch);
        Ok(())
    }

    // ── viewports ────────────────────────────────────────────────────────

    fn create_viewport(&self) -> DriverResult<ViewportId> {
        self.check("create_viewport")?;
        let vp = ViewportId(self.alloc_id());
        self.state.borrow_mut().viewports.insert(vp, ViewportEntry::default());
        Ok(vp)
    }

    fn release_viewport(&self, vp: ViewportId) -> DriverResult<()> {
        self.check("release_viewport")?;
        let mut s = self.state.borrow_mut();
        let entry = s.viewports.remove(&vp).ok_or(Status::INVALID_OBJECT)?;
        if let Some(c) = entry.context.and_then(|ctx| s.contexts.get_mut(&ctx)) {
            c.viewports.retain(|v| *v != vp);
            if c.current_viewport == Some(vp) {
                c.current_viewport = None;
            }
        }
        Ok(())
    }

    fn add_viewport(&self, ctx: ContextId, vp: ViewportId) -> DriverResult<()> {
        self.check("add_viewport")?;
        let mut s = self.state.borrow_mut();
        if !s.contexts.contains_key(&ctx) {
            return Err(Status::INVALID_OBJECT);
        }
        let v = s.viewports.get_mut(&vp).ok_or(Status::INVALID_OBJECT)?;
        if v.context.is_some() {
            return Err(Status::INVALID_CALL);
        }
        v.context = Some(ctx);
        Self::context_mut(&mut s, ctx)?.viewports.push(vp);
        Ok(())
    }

    fn set_viewport(&self, vp: ViewportId, desc: &ViewportDesc) -> DriverResult<()> {
        self.check("set_viewport")?;
        if !desc.is_valid() {
            return Err(Status::INVALID_PARAMS);
        }
        let mut s = self.state.borrow_mut();
        let v = s.viewports.get_mut(&vp).ok_or(Status::INVALID_OBJECT)?;
        if v.context.is_none() {
            // Viewport geometry is validated against the owning context's target.
            return Err(Status::INVALID_CALL);
        }
        v.desc = Some(*desc);
        Ok(())
    }

    fn set_current_viewport(&self, ctx: ContextId, vp: ViewportId) -> DriverResult<()> {
        self.check("set_current_viewport")?;
        let mut s = self.state.borrow_mut();
        let c = Self::context_mut(&mut s, ctx)?;
        if !c.viewports.contains(&vp) {
            return Err(Status::INVALID_PARAMS);
        }
        c.current_viewport = Some(vp);
        Ok(())
    }

    fn clear_viewport(
        &self,
        vp: ViewportId,
        rects: &[ClearRect],
        flags: ClearFlags,
        color: u32,
        z: f32,
        stencil: u32,
    ) -> DriverResult<()> {
        self.check("clear_viewport")?;
        if rects.is_empty() {
            return Err(Status::INVALID_PARAMS);
        }
        let mut s = self.state.borrow_mut();
        let v = s.viewports.get_mut(&vp).ok_or(Status::INVALID_OBJECT)?;
        if v.desc.is_none() {
            return Err(Status::INVALID_CALL);
        }
        v.clears.push(Clear {
            rects: rects.to_vec(),
            flags,
            color,
            z,
            stencil,
        });
        Ok(())
    }

    fn viewport_add_light(&self, vp: ViewportId, light: LightId) -> DriverResult<()> {
        self.check("viewport_add_light")?;
        let mut s = self.state.borrow_mut();
        if !s.lights.contains_key(&light) {
            return Err(Status::INVALID_OBJECT);
        }
        let v = s.viewports.get_mut(&vp).ok_or(Status::INVALID_OBJECT)?;
        if v.lights.contains(&light) {
            return Err(Status::INVALID_CALL);
        }
        v.lights.push(light);
        Ok(())
    }

    fn viewport_delete_light(&self, vp: ViewportId, light: LightId) -> DriverResult<()> {
        self.check("viewport_delete_light")?;
        let mut s = self.state.borrow_mut();
        let v = s.viewports.get_mut(&vp).ok_or(Status::INVALID_OBJECT)?;
        let idx = v.lights.iter().position(|l| *l == light).ok_or(Status::INVALID_PARAMS)?;
        v.lights.remove(idx);
        Ok(())
    }

    // ── materials ────────────────────────────────────────────────────────

    fn create_material(&self) -> DriverResult<MaterialId> {
        self.check("create_material")?;
        let m = MaterialId(self.alloc_id());
        self.state.borrow_mut().materials.insert(m, MaterialEntry::default());
        Ok(m)
    }

    fn release_material(&self, material: MaterialId) -> DriverResult<()> {
        self.check("release_material")?;
        let mut s = self.state.borrow_mut();
        let entry = s.materials.remove(&material).ok_or(Status::INVALID_OBJECT)?;
        for (ctx, handle) in entry.handles {
            if let Some(c) = s.contexts.get_mut(&ctx) {
                if c.light_states.get(&LightState::Material) == Some(&handle.0) {
                    c.light_states.remove(&LightState::Material);
                }
            }
        }
        Ok(())
    }

    fn set_material(&self, material: MaterialId, desc: &MaterialDesc) -> DriverResult<()> {
        self.check("set_material")?;
        let mut s = self.state.borrow_mut();
        s.materials.get_mut(&material).ok_or(Status::INVALID_OBJECT)?.desc = *desc;
        Ok(())
    }

    fn material_handle(&self, material: MaterialId, ctx: ContextId) -> DriverResult<MaterialHandle> {
        self.check("material_handle")?;
        let mut s = self.state.borrow_mut();
        if !s.contexts.contains_key(&ctx) {
            return Err(Status::INVALID_OBJECT);
        }
        let m = s.materials.get_mut(&material).ok_or(Status::INVALID_OBJECT)?;
        if let Some(h) = m.handles.get(&ctx) {
            return Ok(*h);
        }
        let h = MaterialHandle(self.alloc_id());
        m.handles.insert(ctx, h);
        Ok(h)
    }

    // ── lights ───────────────────────────────────────────────────────────

    fn create_light(&self) -> DriverResult<LightId> {
        self.check("create_light")?;
        let l = LightId(self.alloc_id());
        self.state.borrow_mut().lights.insert(l, None);
        Ok(l)
    }

    fn release_light(&self, light: LightId) -> DriverResult<()> {
        self.check("release_light")?;
        let mut s = self.state.borrow_mut();
        s.lights.remove(&light).ok_or(Status::INVALID_OBJECT)?;
        for v in s.viewports.values_mut() {
            v.lights.retain(|l| *l != light);
        }
        Ok(())
    }

    fn set_light(&self, light: LightId, desc: &LightDesc) -> DriverResult<()> {
        self.check("set_light")?;
        let mut s = self.state.borrow_mut();
        *s.lights.get_mut(&light).ok_or(Status::INVALID_OBJECT)? = Some(*desc);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texture_desc(width: u32, height: u32, mip_count: u32) -> SurfaceDesc {
        SurfaceDesc {
            width,
            height,
            format: PixelFormat::RGB565,
            caps: SurfaceCaps::TEXTURE | SurfaceCaps::COMPLEX | SurfaceCaps::MIPMAP,
            mip_count,
            src_color_key: None,
        }
    }

    fn chain(d: &SoftDriver, root: SurfaceId) -> Vec<(u32, u32)> {
        let mut out = Vec::new();
        let mut cur = Some(root);
        while let Some(id) = cur {
            let info = d.surface_desc(id).unwrap();
            out.push((info.width, info.height));
            cur = d.attached_surface(id).unwrap();
        }
        out
    }

    // ── surfaces ──────────────────────────────────────────────────────────

    #[test]
    fn mip_chain_halves_and_clamps() {
        let d = SoftDriver::new();
        let root = d.create_surface(&texture_desc(8, 2, 4)).unwrap();
        assert_eq!(chain(&d, root), vec![(8, 2), (4, 1), (2, 1), (1, 1)]);
    }

    #[test]
    fn chain_longer_than_the_largest_edge_allows_is_rejected() {
        let d = SoftDriver::new();
        assert_eq!(d.create_surface(&texture_desc(8, 2, 5)), Err(Status::INVALID_PARAMS));
        assert_eq!(d.create_surface(&texture_desc(8, 8, u32::MAX)), Err(Status::INVALID_PARAMS));
        assert_eq!(d.live_objects(), 0);
    }

    fn depth_desc() -> SurfaceDesc {
        SurfaceDesc {
            width: 4,
            height: 4,
            format: PixelFormat::Z16,
            caps: SurfaceCaps::ZBUFFER,
            mip_count: 1,
            src_color_key: None,
        }
    }

    #[test]
    fn one_depth_buffer_per_surface() {
        let d = SoftDriver::new();
        let rt = d.create_surface(&texture_desc(4, 4, 1)).unwrap();
        let z1 = d.create_surface(&depth_desc()).unwrap();
        let z2 = d.create_surface(&depth_desc()).unwrap();

        d.attach_surface(rt, z1).unwrap();
        assert_eq!(d.attach_surface(rt, z2), Err(Status::SURFACE_ALREADY_ATTACHED));

        d.detach_surface(rt, z1).unwrap();
        assert!(d.attached_children(rt).is_empty());
        d.release_surface(z1).unwrap();
        d.attach_surface(rt, z2).unwrap();
        assert_eq!(d.attached_children(rt), vec![z2]);
    }

    #[test]
    fn detach_rejects_mip_levels_and_strangers() {
        let d = SoftDriver::new();
        let root = d.create_surface(&texture_desc(4, 4, 3)).unwrap();
        let level1 = d.attached_surface(root).unwrap().unwrap();
        assert_eq!(d.detach_surface(root, level1), Err(Status::INVALID_CALL));

        let z = d.create_surface(&depth_desc()).unwrap();
        assert_eq!(d.detach_surface(root, z), Err(Status::NOT_FOUND));
    }

    #[test]
    fn plain_surface_ignores_mip_count() {
        let d = SoftDriver::new();
        let mut desc = texture_desc(4, 4, 3);
        desc.caps = SurfaceCaps::TEXTURE;
        let root = d.create_surface(&desc).unwrap();
        assert_eq!(chain(&d, root).len(), 1);
    }

    #[test]
    fn releasing_root_releases_chain() {
        let d = SoftDriver::new();
        let root = d.create_surface(&texture_desc(4, 4, 3)).unwrap();
        assert_eq!(d.live_objects(), 3);
        let level1 = d.attached_surface(root).unwrap().unwrap();
        assert_eq!(d.release_surface(level1), Err(Status::INVALID_OBJECT));
        d.release_surface(root).unwrap();
        assert_eq!(d.live_objects(), 0);
        assert_eq!(d.release_surface(root), Err(Status::INVALID_OBJECT));
    }

    #[test]
    fn lock_writes_are_visible_and_blit_copies() {
        let d = SoftDriver::new();
        let mut desc = texture_desc(2, 2, 1);
        desc.caps = SurfaceCaps::TEXTURE | SurfaceCaps::SYSTEM_MEMORY;
        let src = d.create_surface(&desc).unwrap();
        let dst = d.create_surface(&desc).unwrap();

        d.lock_surface(src, LockFlags::WRITE_ONLY, &mut |bytes: &mut [u8], info: LockInfo| {
            assert_eq!(info.pitch, 4);
            bytes.fill(0xAB);
        })
        .unwrap();
        d.blit(dst, src).unwrap();
        assert_eq!(d.surface_bytes(dst).unwrap(), vec![0xAB; 8]);
    }

    #[test]
    fn blit_rejects_size_mismatch() {
        let d = SoftDriver::new();
        let a = d.create_surface(&texture_desc(2, 2, 1)).unwrap();
        let b = d.create_surface(&texture_desc(4, 4, 1)).unwrap();
        assert_eq!(d.blit(a, b), Err(Status::INVALID_PARAMS));
    }

    // ── scene protocol ────────────────────────────────────────────────────

    fn context(d: &SoftDriver) -> ContextId {
        let rt = d
            .create_surface(&SurfaceDesc {
                width: 16,
                height: 16,
                format: PixelFormat::RGB565,
                caps: SurfaceCaps::OFFSCREEN_PLAIN | SurfaceCaps::DEVICE_3D,
                mip_count: 1,
                src_color_key: None,
            })
            .unwrap();
        d.create_context(rt).unwrap()
    }

    #[test]
    fn scene_ordering_is_enforced() {
        let d = SoftDriver::new();
        let ctx = context(&d);
        let fmt = VertexFormat::STANDARD;

        assert_eq!(d.end_scene(ctx), Err(Status::SCENE_NOT_IN_SCENE));
        assert_eq!(
            d.begin_primitive(ctx, PrimitiveType::PointList, fmt, DrawFlags::empty()),
            Err(Status::SCENE_NOT_IN_SCENE)
        );
        d.begin_scene(ctx).unwrap();
        assert_eq!(d.begin_scene(ctx), Err(Status::SCENE_IN_SCENE));
        assert_eq!(
            d.vertex(ctx, bytemuck::bytes_of(&Vertex::default())),
            Err(Status::NOT_IN_PRIMITIVE)
        );
        d.begin_primitive(ctx, PrimitiveType::PointList, fmt, DrawFlags::empty()).unwrap();
        assert_eq!(d.set_texture(ctx, 0, None), Err(Status::INVALID_CALL));
        assert_eq!(d.end_scene(ctx), Err(Status::ALREADY_IN_PRIMITIVE));
        d.end_primitive(ctx).unwrap();
        d.end_scene(ctx).unwrap();
        assert_eq!(d.batches(ctx).len(), 1);
    }

    #[test]
    fn vertex_bytes_must_match_the_batch_layout() {
        let d = SoftDriver::new();
        let ctx = context(&d);
        let v = Vertex::new([1.0, 2.0, 3.0], [0.0, 0.0, 1.0], 0xFF10_2030, [0.5, 0.5]);
        d.begin_scene(ctx).unwrap();
        d.begin_primitive(ctx, PrimitiveType::PointList, VertexFormat::STANDARD, DrawFlags::empty())
            .unwrap();
        d.vertex(ctx, bytemuck::bytes_of(&v)).unwrap();
        assert_eq!(d.vertex(ctx, &[0u8; 12]), Err(Status::INVALID_PARAMS));
        d.end_primitive(ctx).unwrap();
        assert_eq!(d.batches(ctx)[0].vertices, vec![v]);
    }

    #[test]
    fn injected_failure_is_one_shot() {
        let d = SoftDriver::new();
        let ctx = context(&d);
        d.fail_on("begin_scene", Status::OUT_OF_MEMORY);
        assert_eq!(d.begin_scene(ctx), Err(Status::OUT_OF_MEMORY));
        d.begin_scene(ctx).unwrap();
    }

    #[test]
    fn format_enumeration_can_stop_early() {
        let d = SoftDriver::new();
        let mut seen = Vec::new();
        d.enum_texture_formats(&mut |f: &PixelFormat| {
            seen.push(*f);
            EnumControl::Stop
        })
        .unwrap();
        assert_eq!(seen, vec![PixelFormat::ARGB1555]);
    }
}
