use bitflags::bitflags;

use crate::paint::ColorValue;

use super::PixelFormat;

bitflags! {
    /// Surface capability bits requested at creation time.
    #[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
    pub struct SurfaceCaps: u32 {
        const OFFSCREEN_PLAIN = 0x0000_0040;
        const SYSTEM_MEMORY   = 0x0000_0800;
        const TEXTURE         = 0x0000_1000;
        const DEVICE_3D       = 0x0000_2000;
        const VIDEO_MEMORY    = 0x0000_4000;
        const ZBUFFER         = 0x0002_0000;
        const COMPLEX         = 0x0000_0008;
        const MIPMAP          = 0x0040_0000;
        /// Driver-managed residency.
        const TEXTURE_MANAGE  = 0x8000_0000;
    }
}

bitflags! {
    #[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
    pub struct LockFlags: u32 {
        const WAIT       = 0x0000_0001;
        const READ_ONLY  = 0x0000_0010;
        const WRITE_ONLY = 0x0000_0020;
    }
}

bitflags! {
    /// Planes cleared by a viewport clear.
    #[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
    pub struct ClearFlags: u32 {
        const TARGET  = 0x0000_0001;
        const ZBUFFER = 0x0000_0002;
        const STENCIL = 0x0000_0004;
    }
}

bitflags! {
    /// Flags for an immediate-mode primitive batch.
    #[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
    pub struct DrawFlags: u32 {
        const DO_NOT_LIGHT = 0x0000_0010;
    }
}

/// Source color key range (inclusive).
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash)]
pub struct ColorKey {
    pub low: u32,
    pub high: u32,
}

/// Surface creation request.
///
/// `mip_count` is only honored together with `COMPLEX | MIPMAP`; otherwise the
/// surface is single-level.
#[derive(Debug, Clone, PartialEq)]
pub struct SurfaceDesc {
    pub width: u32,
    pub height: u32,
    pub format: PixelFormat,
    pub caps: SurfaceCaps,
    pub mip_count: u32,
    pub src_color_key: Option<ColorKey>,
}

/// Surface description as reported by the driver.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct SurfaceInfo {
    pub width: u32,
    pub height: u32,
    /// Bytes per row.
    pub pitch: usize,
    pub format: PixelFormat,
    pub caps: SurfaceCaps,
}

impl SurfaceInfo {
    /// Bytes addressable through a lock of this surface.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.pitch * self.height as usize
    }
}

/// Geometry of a locked surface, handed to the lock writer.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct LockInfo {
    pub width: u32,
    pub height: u32,
    pub pitch: usize,
}

/// Clear rectangle in corner form (`x2`/`y2` exclusive).
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash)]
pub struct ClearRect {
    pub x1: i32,
    pub y1: i32,
    pub x2: i32,
    pub y2: i32,
}

/// Reply from a format enumeration callback.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum EnumControl {
    Continue,
    Stop,
}

/// Light source kind. Discriminants are the driver's light-type codes.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash)]
#[repr(u32)]
pub enum LightType {
    #[default]
    Point = 1,
    Spot = 2,
    Directional = 3,
}

bitflags! {
    #[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash)]
    pub struct LightFlags: u32 {
        const ACTIVE = 0x0000_0001;
    }
}

/// Driver-level light descriptor.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct LightDesc {
    pub kind: LightType,
    pub color: ColorValue,
    pub position: [f32; 3],
    pub direction: [f32; 3],
    pub range: f32,
    pub falloff: f32,
    pub attenuation0: f32,
    pub attenuation1: f32,
    pub attenuation2: f32,
    pub theta: f32,
    pub phi: f32,
    pub flags: LightFlags,
}

/// Driver-level material descriptor.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct MaterialDesc {
    pub diffuse: ColorValue,
    pub ambient: ColorValue,
    pub specular: ColorValue,
    pub emissive: ColorValue,
    pub power: f32,
}

/// Light-state slots.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
#[repr(u32)]
pub enum LightState {
    Material = 1,
    Ambient = 2,
}
